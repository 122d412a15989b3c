//! Explicit abandonment of an in-flight build.

use log::info;

use super::finish::restore_operator;
use crate::checkpoint::{Checkpoint, CheckpointStore};
use crate::error::{Error, Result};
use crate::output::{Reporter, Step};
use crate::repository::GitOperations;

/// Abandons the build recorded in a working copy's checkpoint. Works from
/// local state alone; the ledger is never consulted.
pub struct BuildAbort<'a> {
    git: &'a dyn GitOperations,
    store: CheckpointStore,
    reporter: Reporter,
}

impl<'a> BuildAbort<'a> {
    pub fn new(git: &'a dyn GitOperations, reporter: Reporter) -> Result<Self> {
        let store = CheckpointStore::in_git_dir(&git.git_dir()?);
        Ok(Self::with_store(git, store, reporter))
    }

    pub fn with_store(
        git: &'a dyn GitOperations,
        store: CheckpointStore,
        reporter: Reporter,
    ) -> Self {
        Self {
            git,
            store,
            reporter,
        }
    }

    /// Aborts an unresolved merge, returns to the original branch and
    /// restores the stash. Returns the checkpoint that was abandoned.
    pub fn run(&self) -> Result<Checkpoint> {
        let checkpoint = self.store.load()?.ok_or_else(|| Error::Config {
            message: "no build in progress".to_string(),
            hint: None,
        })?;

        if self.git.merge_in_progress() {
            self.reporter.step(Step::Merge, "Aborting merge in progress...");
            self.git.merge_abort()?;
        }

        restore_operator(self.git, &self.store, &self.reporter, &checkpoint);
        info!(
            "abandoned build of {} into {}",
            checkpoint.original_branch, checkpoint.merge_branch
        );
        Ok(checkpoint)
    }
}
