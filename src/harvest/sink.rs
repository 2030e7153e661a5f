//! Result sink
//!
//! The only writer of the results log and the pending snapshot. Many workers
//! feed it through one channel; it runs on a dedicated blocking thread and
//! handles one unit at a time, so writes are never interleaved.
//!
//! Per unit the log append is flushed before the snapshot is rewritten. A
//! crash between the two leaves a stale snapshot, which the next run repairs
//! by subtracting the results log.

use crate::checkpoint::{CheckpointResult, CompletedLog, PendingSnapshot};
use crate::model::{Entity, PendingEntry};
use std::collections::HashSet;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Summary returned when the sink shuts down
#[derive(Debug, Clone, Default)]
pub struct SinkReport {
    /// Units appended to the results log during this run
    pub written: usize,

    /// Units dropped because their id was already written
    pub duplicates: usize,

    /// Units still pending when the sink closed
    pub remaining: Vec<PendingEntry>,
}

/// Serial consumer of completed units
#[derive(Debug)]
pub struct ResultSink {
    log: CompletedLog,
    snapshot: Option<PendingSnapshot>,
    pending: Vec<PendingEntry>,
    written_ids: HashSet<String>,
    report: SinkReport,
}

impl ResultSink {
    /// Creates a sink
    ///
    /// # Arguments
    ///
    /// * `log` - The results log, opened for appending
    /// * `snapshot` - Pending snapshot to maintain, if snapshot mode is on
    /// * `pending` - Units dispatched on this run, in dispatch order
    /// * `completed` - Ids already present in the results log
    pub fn new(
        log: CompletedLog,
        snapshot: Option<PendingSnapshot>,
        pending: Vec<PendingEntry>,
        completed: HashSet<String>,
    ) -> Self {
        Self {
            log,
            snapshot,
            pending,
            written_ids: completed,
            report: SinkReport::default(),
        }
    }

    /// Writes the initial snapshot so a crash before the first completion
    /// still skips re-discovery
    pub fn start(&mut self) -> CheckpointResult<()> {
        if let Some(snapshot) = &self.snapshot {
            snapshot.save(&self.pending)?;
            tracing::debug!(
                "Wrote pending snapshot {} with {} units",
                snapshot.path().display(),
                self.pending.len()
            );
        }
        Ok(())
    }

    /// Appends one completed unit and updates the snapshot
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The unit was written
    /// * `Ok(false)` - The id was already written; nothing changed
    pub fn write(&mut self, entity: &Entity) -> CheckpointResult<bool> {
        if self.written_ids.contains(&entity.id) {
            tracing::warn!(
                "Refusing to write {} ({}) twice",
                entity.designation,
                entity.id
            );
            self.report.duplicates += 1;
            return Ok(false);
        }

        let bytes = self.log.append(entity)?;
        self.written_ids.insert(entity.id.clone());
        self.report.written += 1;
        tracing::debug!(
            "Wrote {} bytes for {} to {}",
            bytes,
            entity.designation,
            self.log.path().display()
        );

        if let Some(position) = self.pending.iter().position(|p| p.id == entity.id) {
            self.pending.remove(position);
        }

        if let Some(snapshot) = &self.snapshot {
            snapshot.save(&self.pending)?;
        }

        Ok(true)
    }

    pub fn pending(&self) -> &[PendingEntry] {
        &self.pending
    }

    pub fn finish(self) -> SinkReport {
        SinkReport {
            remaining: self.pending,
            ..self.report
        }
    }

    /// Moves the sink onto a blocking thread and returns its input channel
    ///
    /// The returned handle resolves once every sender has been dropped and
    /// the channel is drained; awaiting it is the sink's finished
    /// acknowledgement.
    pub fn spawn(
        mut self,
        capacity: usize,
    ) -> (
        mpsc::Sender<Entity>,
        JoinHandle<CheckpointResult<SinkReport>>,
    ) {
        let (tx, mut rx) = mpsc::channel::<Entity>(capacity.max(1));

        let handle = tokio::task::spawn_blocking(move || -> CheckpointResult<SinkReport> {
            self.start()?;
            while let Some(entity) = rx.blocking_recv() {
                self.write(&entity)?;
            }
            tracing::debug!("Result sink input closed");
            Ok(self.finish())
        });

        (tx, handle)
    }
}
