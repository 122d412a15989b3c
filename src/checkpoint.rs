//! # Build Checkpoint
//!
//! The durable record of an in-flight `build merge`. It exists on disk if
//! and only if a build has started and has neither finished nor been
//! abandoned. One JSON object per working copy, stored at
//! `<git-dir>/forklift_build_state.json` with owner-only permissions.
//!
//! The file is written to a sibling temporary path and renamed into place,
//! so a crash mid-write never leaves a truncated checkpoint behind.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// File name of the checkpoint inside the repository's control directory.
pub const CHECKPOINT_FILE: &str = "forklift_build_state.json";

/// State captured before the first destructive branch operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Branch the operator was on before the build started.
    pub original_branch: String,
    /// Branch being merged into, as read from the ledger at start.
    pub merge_branch: String,
    /// Whether a stash entry must be restored on cleanup.
    pub stashed: bool,
    /// `org/repo` ledger key, used to re-query the ledger on resume.
    #[serde(alias = "repo_name")]
    pub repo_identifier: String,
    /// Ledger row at the time the build started.
    #[serde(alias = "row_idx")]
    pub row_index: usize,
}

/// Reads and writes the checkpoint file for one working copy.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    /// Store rooted in a repository control directory.
    pub fn in_git_dir(git_dir: &Path) -> Self {
        Self {
            path: git_dir.join(CHECKPOINT_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Loads the checkpoint, or `None` when no build is in flight.
    pub fn load(&self) -> Result<Option<Checkpoint>> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.error(e)),
        };
        serde_json::from_str(&data)
            .map(Some)
            .map_err(|e| Error::Checkpoint {
                path: self.path.clone(),
                message: format!(
                    "{} (delete the file or run 'forklift build abort' to start over)",
                    e
                ),
            })
    }

    /// Durably writes the checkpoint, replacing any previous one.
    pub fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        let data = serde_json::to_vec_pretty(checkpoint)?;
        let tmp = self.path.with_extension("json.tmp");

        let mut file = open_private(&tmp).map_err(|e| self.error(e))?;
        file.write_all(&data).map_err(|e| self.error(e))?;
        file.sync_all().map_err(|e| self.error(e))?;
        drop(file);

        fs::rename(&tmp, &self.path).map_err(|e| self.error(e))?;
        debug!("saved build checkpoint to {}", self.path.display());
        Ok(())
    }

    /// Deletes the checkpoint. Missing files are not an error.
    pub fn remove(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("removed build checkpoint {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.error(e)),
        }
    }

    fn error(&self, e: std::io::Error) -> Error {
        Error::Checkpoint {
            path: self.path.clone(),
            message: e.to_string(),
        }
    }
}

#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}
