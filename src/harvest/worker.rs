//! Worker pool for unit enrichment
//!
//! This module handles:
//! - Per-unit enrichment (custom card fetch, overview fetch, extraction, role backfill)
//! - A fixed number of worker tasks sharing one bounded pending queue
//! - Forwarding finished units to the result sink and signalling completion
//!
//! Each unit is received by exactly one worker, so no two workers ever hold the
//! same unit.

use crate::endpoint::Endpoints;
use crate::extract::FieldExtractor;
use crate::harvest::fetcher::{FetchOutcome, Fetcher};
use crate::model::{CardFacts, Entity, OverviewFacts};
use crate::HarvestError;
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;

/// Fetches and extracts everything known about one unit
#[derive(Debug)]
pub struct Enricher {
    fetcher: Fetcher,
    endpoints: Endpoints,
    card: FieldExtractor,
    overview: FieldExtractor,
    overview_retries: u32,
}

impl Enricher {
    pub fn new(
        fetcher: Fetcher,
        endpoints: Endpoints,
        card: FieldExtractor,
        overview: FieldExtractor,
        overview_retries: u32,
    ) -> Self {
        Self {
            fetcher,
            endpoints,
            card,
            overview,
            overview_retries,
        }
    }

    /// Enriches one unit
    ///
    /// # Steps
    ///
    /// 1. Fetch the custom card page; a redirect or a non-success status
    ///    means the unit has no card and its card facts stay at their defaults
    /// 2. Extract card facts
    /// 3. Fetch the overview page, retrying transient failures
    /// 4. Extract overview facts
    /// 5. Backfill an empty card role from the overview's unit role
    ///
    /// # Errors
    ///
    /// A failed overview fetch, or a custom card fetch that fails at the
    /// transport level, is returned as an error and ends the run.
    pub async fn enrich(&self, mut entity: Entity) -> Result<Entity, HarvestError> {
        let started = std::time::Instant::now();

        let card_url = self.endpoints.custom_card_url(&entity)?;
        match self.fetcher.fetch_no_redirect(&card_url).await {
            Ok(FetchOutcome::Document { body, .. }) => {
                let fields = self.card.extract(&body, &entity.designation);
                entity.card = CardFacts::from_fields(&fields);
            }
            Ok(FetchOutcome::Redirected { location, .. }) => {
                tracing::info!(
                    "No custom card for {} (redirected to {})",
                    entity.designation,
                    location.as_deref().unwrap_or("unknown")
                );
            }
            Err(HarvestError::HttpStatus { status, .. }) => {
                tracing::warn!(
                    "No custom card for {} (HTTP {}), keeping default card facts",
                    entity.designation,
                    status
                );
            }
            Err(e) => return Err(e),
        }

        let overview_url = self.endpoints.overview_url(&entity)?;
        let body = self
            .fetcher
            .fetch_document_with_retry(&overview_url, self.overview_retries)
            .await?;
        let fields = self.overview.extract(&body, &entity.designation);
        entity.overview = OverviewFacts::from_fields(&fields);

        if entity.backfill_role() {
            tracing::debug!(
                "Backfilled card role for {} from overview: {}",
                entity.designation,
                entity.card.role
            );
        }

        tracing::info!(
            "Finished loading details for {} in {:?}",
            entity.designation,
            started.elapsed()
        );

        Ok(entity)
    }
}

/// Signal sent to the orchestrator once per dequeued unit
#[derive(Debug)]
pub enum Completion {
    /// The unit was enriched and handed to the sink
    Done { id: String },

    /// The unit could not be processed; the run must stop
    Failed { id: String, error: HarvestError },
}

/// A fixed set of workers pulling from one bounded queue
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `workers` tasks and returns the pool with the queue's sending half
    ///
    /// # Arguments
    ///
    /// * `workers` - Number of concurrent workers
    /// * `capacity` - Pending queue capacity
    /// * `enricher` - Shared enrichment logic
    /// * `sink` - Sending half of the result sink channel
    /// * `completions` - Completion signal channel to the orchestrator
    /// * `shutdown` - Set to true to stop workers taking new units
    pub fn spawn(
        workers: usize,
        capacity: usize,
        enricher: Arc<Enricher>,
        sink: mpsc::Sender<Entity>,
        completions: mpsc::UnboundedSender<Completion>,
        shutdown: watch::Receiver<bool>,
    ) -> (Self, mpsc::Sender<Entity>) {
        let (queue_tx, queue_rx) = mpsc::channel(capacity.max(1));
        let queue = Arc::new(Mutex::new(queue_rx));

        let handles = (0..workers.max(1))
            .map(|worker_id| {
                tokio::spawn(run_worker(
                    worker_id,
                    queue.clone(),
                    enricher.clone(),
                    sink.clone(),
                    completions.clone(),
                    shutdown.clone(),
                ))
            })
            .collect();

        tracing::debug!("Spawned {} workers (queue capacity {})", workers, capacity);

        (Self { handles }, queue_tx)
    }

    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Waits for every worker to exit
    ///
    /// # Errors
    ///
    /// Returns the first join error if a worker panicked.
    pub async fn join(self) -> Result<(), HarvestError> {
        let mut first_error = None;
        for handle in self.handles {
            if let Err(e) = handle.await {
                tracing::error!("Worker task failed: {}", e);
                first_error.get_or_insert(HarvestError::Task(e));
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

async fn run_worker(
    worker_id: usize,
    queue: Arc<Mutex<mpsc::Receiver<Entity>>>,
    enricher: Arc<Enricher>,
    sink: mpsc::Sender<Entity>,
    completions: mpsc::UnboundedSender<Completion>,
    mut shutdown: watch::Receiver<bool>,
) {
    while let Some(entity) = next_entity(&queue, &mut shutdown).await {
        let id = entity.id.clone();
        tracing::debug!("Worker {} took {} ({})", worker_id, entity.designation, id);

        let completion = match enricher.enrich(entity).await {
            Ok(entity) => match sink.send(entity).await {
                Ok(()) => Completion::Done { id },
                Err(_) => Completion::Failed {
                    error: HarvestError::SinkClosed { id: id.clone() },
                    id,
                },
            },
            Err(error) => Completion::Failed { id, error },
        };

        let failed = matches!(completion, Completion::Failed { .. });
        if completions.send(completion).is_err() || failed {
            break;
        }
    }

    tracing::debug!("Worker {} exiting", worker_id);
}

/// Takes the next unit, or `None` once the queue is closed or shutdown is set
async fn next_entity(
    queue: &Mutex<mpsc::Receiver<Entity>>,
    shutdown: &mut watch::Receiver<bool>,
) -> Option<Entity> {
    if *shutdown.borrow() {
        return None;
    }

    let mut rx = queue.lock().await;
    if *shutdown.borrow() {
        return None;
    }

    tokio::select! {
        entity = rx.recv() => entity,
        Ok(()) = shutdown.changed() => None,
    }
}
