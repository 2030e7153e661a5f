//! Pending snapshot file
//!
//! A JSON array of the units that still need enriching. When it exists at
//! startup it replaces the listing fetch entirely. It is rewritten after every
//! completed unit and removed once a run finishes.

use crate::checkpoint::{CheckpointError, CheckpointResult};
use crate::model::PendingEntry;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Handle to the pending snapshot location
#[derive(Debug, Clone)]
pub struct PendingSnapshot {
    path: PathBuf,
}

impl PendingSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Loads the snapshot
    ///
    /// # Returns
    ///
    /// * `Ok(None)` - No snapshot file exists
    /// * `Ok(Some(entries))` - The pending entries, in saved order
    /// * `Err(CheckpointError)` - The file exists but could not be read or parsed
    pub fn load(&self) -> CheckpointResult<Option<Vec<PendingEntry>>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(CheckpointError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let entries = serde_json::from_str(&content).map_err(|source| {
            CheckpointError::Snapshot {
                path: self.path.clone(),
                source,
            }
        })?;

        Ok(Some(entries))
    }

    /// Rewrites the snapshot with `entries`
    ///
    /// The new content is written to a sibling temp file and renamed over the
    /// old snapshot, so a crash mid-write leaves the previous snapshot intact.
    pub fn save(&self, entries: &[PendingEntry]) -> CheckpointResult<()> {
        let json = serde_json::to_vec(entries).map_err(CheckpointError::Serialize)?;
        let tmp_path = self.tmp_path();

        let io_err = |source| CheckpointError::Io {
            path: tmp_path.clone(),
            source,
        };

        let mut file = std::fs::File::create(&tmp_path).map_err(io_err)?;
        file.write_all(&json).map_err(io_err)?;
        file.sync_data().map_err(io_err)?;
        drop(file);

        std::fs::rename(&tmp_path, &self.path).map_err(|source| CheckpointError::Io {
            path: self.path.clone(),
            source,
        })?;

        Ok(())
    }

    /// Deletes the snapshot
    ///
    /// Returns true if a file was removed, false if none existed.
    pub fn remove(&self) -> CheckpointResult<bool> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(source) => Err(CheckpointError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
