//! Checkpoint module for resumable harvests
//!
//! This module owns the two pieces of state that survive a restart:
//! - `CompletedLog`: the append-only results log, replayed strictly on startup
//! - `PendingSnapshot`: an optional list of units still to do, which lets a
//!   resumed run skip the listing fetch
//!
//! It also reconciles candidates against the log so nothing already written is
//! enriched twice, even when the snapshot is stale.

mod log;
mod snapshot;

pub use log::CompletedLog;
pub use snapshot::PendingSnapshot;

use crate::model::{Entity, PendingEntry};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while reading or writing checkpoint state
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Corrupt record at {path}:{line}: {source}")]
    Corrupt {
        path: PathBuf,
        line: usize,
        source: serde_json::Error,
    },

    #[error("Malformed pending snapshot {path}: {source}")]
    Snapshot {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialize(serde_json::Error),
}

/// Result type for checkpoint operations
pub type CheckpointResult<T> = Result<T, CheckpointError>;

/// Where the pending work list comes from on this run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeSource {
    /// A pending snapshot was found; discovery is skipped
    Snapshot(Vec<PendingEntry>),

    /// No usable snapshot; the listing must be fetched
    Discovery,
}

/// Everything known about previous progress at startup
#[derive(Debug, Clone)]
pub struct ResumeState {
    /// Identifiers already present in the results log
    pub completed: HashSet<String>,

    pub source: ResumeSource,
}

/// Loads resume state from the results log and the optional snapshot
///
/// # Arguments
///
/// * `results_path` - Path to the results log (may not exist yet)
/// * `snapshot` - The pending snapshot, if snapshot mode is enabled
/// * `fresh` - Ignore an existing snapshot and re-discover
///
/// # Errors
///
/// A corrupt results log or a malformed snapshot is fatal.
pub fn load_resume_state(
    results_path: &Path,
    snapshot: Option<&PendingSnapshot>,
    fresh: bool,
) -> CheckpointResult<ResumeState> {
    let completed = CompletedLog::replay(results_path)?;
    tracing::info!(
        "Results log {} lists {} completed units",
        results_path.display(),
        completed.len()
    );

    let source = match snapshot {
        Some(snapshot) if fresh => {
            if snapshot.exists() {
                tracing::info!(
                    "Ignoring pending snapshot {} (fresh discovery requested)",
                    snapshot.path().display()
                );
            }
            ResumeSource::Discovery
        }
        Some(snapshot) => match snapshot.load()? {
            Some(entries) => {
                tracing::info!(
                    "Loaded pending snapshot {} with {} units",
                    snapshot.path().display(),
                    entries.len()
                );
                ResumeSource::Snapshot(entries)
            }
            None => ResumeSource::Discovery,
        },
        None => ResumeSource::Discovery,
    };

    Ok(ResumeState { completed, source })
}

/// Outcome of filtering candidates against completed work
#[derive(Debug, Clone, Default)]
pub struct Reconciled {
    /// Units still to enrich, in candidate order
    pub pending: Vec<Entity>,

    /// Candidates dropped because the results log already has them
    pub already_completed: usize,

    /// Candidates dropped because an earlier candidate had the same id
    pub duplicates: usize,
}

/// Drops candidates that are already completed or repeat an earlier id
///
/// Order of the surviving candidates is preserved.
pub fn reconcile_pending(
    candidates: impl IntoIterator<Item = PendingEntry>,
    completed: &HashSet<String>,
) -> Reconciled {
    let mut seen = HashSet::new();
    let mut reconciled = Reconciled::default();

    for candidate in candidates {
        if completed.contains(&candidate.id) {
            tracing::debug!(
                "Skipping {} ({}): already in results log",
                candidate.designation,
                candidate.id
            );
            reconciled.already_completed += 1;
            continue;
        }

        if !seen.insert(candidate.id.clone()) {
            tracing::debug!(
                "Skipping duplicate listing entry {} ({})",
                candidate.designation,
                candidate.id
            );
            reconciled.duplicates += 1;
            continue;
        }

        reconciled.pending.push(Entity::from(candidate));
    }

    reconciled
}
