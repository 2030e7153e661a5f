//! Append-only results log
//!
//! One JSON-encoded `Entity` per line. The log is the source of truth for which
//! units are already done: on startup every line is replayed, and a line that
//! does not parse stops the run rather than being skipped.

use crate::checkpoint::{CheckpointError, CheckpointResult};
use crate::model::Entity;
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Writer half of the results log
#[derive(Debug)]
pub struct CompletedLog {
    path: PathBuf,
    file: File,
}

impl CompletedLog {
    /// Opens the log for appending, creating it if necessary
    pub fn open(path: &Path) -> CheckpointResult<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| CheckpointError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        tracing::debug!("Opened results log for appending: {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one entity as a single line and flushes it to disk
    ///
    /// # Returns
    ///
    /// The number of bytes written, including the trailing newline.
    pub fn append(&mut self, entity: &Entity) -> CheckpointResult<usize> {
        let mut line = serde_json::to_vec(entity).map_err(CheckpointError::Serialize)?;
        line.push(b'\n');

        let io_err = |source| CheckpointError::Io {
            path: self.path.clone(),
            source,
        };
        self.file.write_all(&line).map_err(io_err)?;
        self.file.flush().map_err(io_err)?;
        self.file.sync_data().map_err(io_err)?;

        Ok(line.len())
    }

    /// Replays the log and returns the identifiers it contains
    ///
    /// A missing log is treated as empty.
    ///
    /// # Errors
    ///
    /// * `CheckpointError::Corrupt` - a non-blank line is not a valid record
    /// * `CheckpointError::Io` - the log exists but cannot be read
    pub fn replay(path: &Path) -> CheckpointResult<HashSet<String>> {
        let mut ids = HashSet::new();
        for_each_record(path, |entity| {
            if !ids.insert(entity.id.clone()) {
                tracing::warn!("Results log lists unit {} more than once", entity.id);
            }
        })?;
        Ok(ids)
    }

    /// Reads every record in the log, in file order
    pub fn read_all(path: &Path) -> CheckpointResult<Vec<Entity>> {
        let mut entities = Vec::new();
        for_each_record(path, |entity| entities.push(entity))?;
        Ok(entities)
    }
}

fn for_each_record(path: &Path, mut visit: impl FnMut(Entity)) -> CheckpointResult<()> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!("No results log at {}", path.display());
            return Ok(());
        }
        Err(source) => {
            return Err(CheckpointError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|source| CheckpointError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        if line.trim().is_empty() {
            continue;
        }

        let entity: Entity =
            serde_json::from_str(&line).map_err(|source| CheckpointError::Corrupt {
                path: path.to_path_buf(),
                line: index + 1,
                source,
            })?;
        visit(entity);
    }

    Ok(())
}
