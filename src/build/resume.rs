use log::warn;

use super::{BuildOrchestrator, BuildOutcome};
use crate::checkpoint::Checkpoint;
use crate::error::{Error, Result};
use crate::output::Step;

impl BuildOrchestrator<'_> {
    /// Continues a build interrupted by a conflict or by process death.
    ///
    /// Inspection only until both guards pass: no ledger call and no
    /// mutation happens while the working copy disagrees with the checkpoint.
    pub(super) fn resume(&self, checkpoint: Checkpoint) -> Result<BuildOutcome> {
        self.reporter.step(
            Step::Resume,
            "Detected previous build in progress. Resuming...",
        );

        if self.git.merge_in_progress() {
            return Err(Error::MergeStillInProgress);
        }

        let current = self.git.current_branch()?;
        if current != checkpoint.merge_branch {
            return Err(Error::BranchMismatch {
                current,
                expected: checkpoint.merge_branch,
            });
        }

        // Fresh read: another operator may have tagged in the meantime.
        let target = self
            .ledger
            .resolve_repo_target(&checkpoint.repo_identifier)?
            .ok_or_else(|| Error::RepoNotInLedger {
                repo: checkpoint.repo_identifier.clone(),
            })?;
        if target.merge_branch != checkpoint.merge_branch {
            warn!(
                "ledger now assigns {} to {}, finishing the build into {}",
                target.merge_branch, checkpoint.repo_identifier, checkpoint.merge_branch
            );
        }

        // On failure the checkpoint stays so the resume can be retried.
        let tag = self.finish(&checkpoint, &target)?;
        self.cleanup(&checkpoint);
        Ok(BuildOutcome::Released {
            tag,
            merge_branch: checkpoint.merge_branch,
        })
    }
}
