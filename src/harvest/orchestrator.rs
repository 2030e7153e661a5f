//! Harvest orchestrator - main run coordination logic
//!
//! This module wires the pipeline together and drives a run through its
//! phases:
//! - Loading resume state and either discovering or resuming the pending list
//! - Dispatching pending units to the worker pool
//! - Counting completions and reporting progress
//! - Ordered shutdown: close the queue, join workers, wait for the sink
//! - Removing the pending snapshot after a complete run

use crate::checkpoint::{
    load_resume_state, reconcile_pending, CompletedLog, PendingSnapshot, Reconciled, ResumeSource,
};
use crate::config::Config;
use crate::endpoint::Endpoints;
use crate::extract::{card_schema, overview_schema, FieldExtractor, FieldSchema};
use crate::harvest::discover::discover;
use crate::harvest::fetcher::Fetcher;
use crate::harvest::sink::{ResultSink, SinkReport};
use crate::harvest::worker::{Completion, Enricher, WorkerPool};
use crate::model::{Entity, PendingEntry};
use crate::state::{Progress, RunPhase};
use crate::HarvestError;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Where this run's pending list came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingOrigin {
    Discovery,
    Snapshot,
}

/// Summary of a finished run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub origin: PendingOrigin,

    /// Units dispatched to workers
    pub dispatched: usize,

    /// Candidates skipped because the results log already had them
    pub skipped_completed: usize,

    /// Candidates skipped because their id repeated
    pub skipped_duplicates: usize,

    /// Units written to the results log on this run
    pub written: usize,

    /// Units left pending
    pub remaining: usize,
}

impl RunReport {
    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }
}

/// Main harvest orchestrator structure
pub struct Orchestrator {
    config: Arc<Config>,
    endpoints: Endpoints,
    fetcher: Fetcher,
    card_schema: FieldSchema,
    overview_schema: FieldSchema,
    phase: RunPhase,
    fresh: bool,
}

impl Orchestrator {
    /// Creates a new orchestrator with the built-in field schemas
    ///
    /// # Arguments
    ///
    /// * `config` - The harvest configuration
    /// * `fresh` - Ignore an existing pending snapshot and re-discover
    ///
    /// # Returns
    ///
    /// * `Ok(Orchestrator)` - Successfully created orchestrator
    /// * `Err(HarvestError)` - Endpoints, HTTP client or schemas failed to build
    pub fn new(config: Config, fresh: bool) -> Result<Self, HarvestError> {
        let card = card_schema()?;
        let overview = overview_schema()?;
        Self::with_schemas(config, fresh, card, overview)
    }

    /// Creates an orchestrator with caller-supplied field schemas
    pub fn with_schemas(
        config: Config,
        fresh: bool,
        card_schema: FieldSchema,
        overview_schema: FieldSchema,
    ) -> Result<Self, HarvestError> {
        let endpoints = Endpoints::new(&config.source)?;
        let fetcher = Fetcher::new(&config.harvest)?;

        Ok(Self {
            config: Arc::new(config),
            endpoints,
            fetcher,
            card_schema,
            overview_schema,
            phase: RunPhase::Init,
            fresh,
        })
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    fn advance(&mut self, next: RunPhase) -> Result<(), HarvestError> {
        if !self.phase.can_transition_to(next) {
            return Err(HarvestError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        tracing::debug!("Run phase: {} -> {}", self.phase, next);
        self.phase = next;
        Ok(())
    }

    /// Runs the harvest to completion
    pub async fn run(&mut self) -> Result<RunReport, HarvestError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the harvest until it completes or `shutdown` resolves
    ///
    /// When `shutdown` resolves, dispatch stops, workers finish the unit they
    /// hold, the sink drains, and `HarvestError::Interrupted` is returned. The
    /// pending snapshot is kept so the next run resumes from it.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<RunReport, HarvestError>
    where
        F: Future<Output = ()>,
    {
        let started_at = Utc::now();
        let results_path = Path::new(&self.config.output.results_path).to_path_buf();
        let snapshot = self.config.output.snapshot_path().map(PendingSnapshot::new);

        // Discover or resume
        let resume = load_resume_state(&results_path, snapshot.as_ref(), self.fresh)?;
        let (origin, reconciled) = match resume.source {
            ResumeSource::Snapshot(entries) => {
                self.advance(RunPhase::Resuming)?;
                let reconciled = reconcile_pending(entries, &resume.completed);
                if reconciled.already_completed > 0 {
                    tracing::info!(
                        "Pending snapshot was stale: {} units already in results log",
                        reconciled.already_completed
                    );
                }
                (PendingOrigin::Snapshot, reconciled)
            }
            ResumeSource::Discovery => {
                self.advance(RunPhase::Discovering)?;
                let reconciled = discover(&self.fetcher, &self.endpoints, &resume.completed).await?;
                (PendingOrigin::Discovery, reconciled)
            }
        };

        let Reconciled {
            pending,
            already_completed,
            duplicates,
        } = reconciled;
        let total = pending.len();

        // Start the sink before any worker can produce
        let workers = self.config.harvest.worker_count();
        let capacity = self.config.harvest.queue_capacity_for(workers);
        let log = CompletedLog::open(&results_path)?;
        let entries: Vec<PendingEntry> = pending.iter().map(Entity::pending_entry).collect();
        let (sink_tx, sink_handle) =
            ResultSink::new(log, snapshot.clone(), entries, resume.completed).spawn(capacity);

        // Dispatch
        self.advance(RunPhase::Dispatching)?;
        tracing::info!(
            "Dispatching {} units to {} workers (queue capacity {})",
            total,
            workers,
            capacity
        );

        let enricher = Arc::new(Enricher::new(
            self.fetcher.clone(),
            self.endpoints.clone(),
            FieldExtractor::new(self.card_schema.clone()),
            FieldExtractor::new(self.overview_schema.clone()),
            self.config.harvest.overview_retries,
        ));
        let (stop_tx, stop_rx) = watch::channel(false);
        let (completion_tx, mut completion_rx) = mpsc::unbounded_channel();
        let (pool, queue_tx) = WorkerPool::spawn(
            workers,
            capacity,
            enricher,
            sink_tx.clone(),
            completion_tx,
            stop_rx.clone(),
        );
        let dispatcher = tokio::spawn(dispatch(pending, queue_tx, stop_rx));

        // Drain
        self.advance(RunPhase::Draining)?;
        let mut progress = Progress::new(total);
        let mut fatal: Option<HarvestError> = None;
        let mut interrupted = false;
        tokio::pin!(shutdown);

        while !progress.is_complete() {
            tokio::select! {
                completion = completion_rx.recv() => match completion {
                    Some(Completion::Done { .. }) => {
                        if let Some(percent) = progress.record() {
                            tracing::info!(
                                "{}% complete: {} of {} units ({:.2} units/sec)",
                                percent,
                                progress.completed(),
                                total,
                                progress.rate()
                            );
                        }
                    }
                    Some(Completion::Failed { id, error }) => {
                        tracing::error!("Unit {} failed, stopping harvest: {}", id, error);
                        fatal = Some(error);
                        break;
                    }
                    None => {
                        tracing::error!(
                            "All workers exited with {} units outstanding",
                            progress.remaining()
                        );
                        break;
                    }
                },
                _ = &mut shutdown => {
                    tracing::warn!("Interrupt received, finishing in-flight units");
                    interrupted = true;
                    break;
                }
            }
        }

        // Shut down: stop dispatch, let workers finish, then wait for the sink
        self.advance(RunPhase::ShuttingDown)?;
        if !progress.is_complete() {
            let _ = stop_tx.send(true);
        }
        let dispatched = dispatcher.await?;
        let pool_result = pool.join().await;
        drop(sink_tx);
        drop(completion_rx);
        let report: SinkReport = sink_handle.await??;
        pool_result?;

        tracing::info!(
            "Result sink finished: {} written, {} duplicates refused, {} still pending",
            report.written,
            report.duplicates,
            report.remaining.len()
        );

        if let Some(error) = fatal {
            return Err(error);
        }
        if interrupted || !report.remaining.is_empty() {
            return Err(HarvestError::Interrupted {
                remaining: report.remaining.len(),
            });
        }

        // Done
        self.advance(RunPhase::Done)?;
        if let Some(snapshot) = &snapshot {
            if snapshot.remove()? {
                tracing::info!("Removed pending snapshot {}", snapshot.path().display());
            }
        }

        let finished_at = Utc::now();
        tracing::info!(
            "Harvest complete: {} units in {:?}",
            report.written,
            progress.elapsed()
        );

        Ok(RunReport {
            started_at,
            finished_at,
            origin,
            dispatched,
            skipped_completed: already_completed,
            skipped_duplicates: duplicates,
            written: report.written,
            remaining: report.remaining.len(),
        })
    }
}

/// Feeds pending units into the worker queue until done or stopped
///
/// Returns the number of units dispatched. Dropping the queue sender on
/// return lets workers exit once the queue is empty.
async fn dispatch(
    pending: Vec<Entity>,
    queue: mpsc::Sender<Entity>,
    mut stop: watch::Receiver<bool>,
) -> usize {
    let mut dispatched = 0;

    for entity in pending {
        if *stop.borrow() {
            break;
        }
        tokio::select! {
            sent = queue.send(entity) => {
                if sent.is_err() {
                    break;
                }
                dispatched += 1;
            }
            Ok(()) = stop.changed() => break,
        }
    }

    tracing::debug!("Dispatcher finished after {} units", dispatched);
    dispatched
}

/// Runs a harvest that stops cleanly on Ctrl-C
///
/// # Example
///
/// ```no_run
/// use unit_harvest::config::load_config;
/// use unit_harvest::harvest::run_harvest;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("harvest.toml"))?;
/// let report = run_harvest(config, false).await?;
/// println!("{} units written", report.written);
/// # Ok(())
/// # }
/// ```
pub async fn run_harvest(config: Config, fresh: bool) -> Result<RunReport, HarvestError> {
    let mut orchestrator = Orchestrator::new(config, fresh)?;
    orchestrator
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("Unable to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
}
