//! Finish and cleanup phases, shared by fresh runs and resumes.
//!
//! Finish is written to be re-runnable: if an earlier attempt created the
//! tag but died before pushing it or before updating the ledger, the retry
//! finds the tag already on `HEAD`, reuses it, and carries on.

use log::{info, warn};

use super::BuildOrchestrator;
use crate::checkpoint::{Checkpoint, CheckpointStore};
use crate::error::{advise, Error, Result};
use crate::ledger::RepoTarget;
use crate::output::{Reporter, Step};
use crate::repository::GitOperations;
use crate::sequencer;

impl BuildOrchestrator<'_> {
    /// Tags the merge branch, pushes branch and tag, and records the tag in
    /// the ledger. Returns the new tag.
    pub(super) fn finish(&self, checkpoint: &Checkpoint, target: &RepoTarget) -> Result<String> {
        let remote = &self.options.remote;
        let merge_branch = &checkpoint.merge_branch;

        // A tag already on HEAD is ours from an interrupted attempt.
        let tag = sequencer::next_free_tag(
            &target.last_tag,
            merge_branch,
            self.options.max_tag_attempts,
            |candidate| {
                let taken =
                    self.git.tag_exists(candidate) && !self.git.tag_points_at_head(candidate);
                if taken {
                    self.reporter.note(&format!(
                        "Tag {} already exists, incrementing further...",
                        candidate
                    ));
                }
                taken
            },
        )?;
        self.reporter.step(Step::Tag, &format!("New tag: {}", tag));

        self.reporter.step(Step::Push, "Pushing merge commit...");
        self.git.push_branch(remote, merge_branch)?;

        if self.git.tag_exists(&tag) {
            self.reporter.step(
                Step::Tag,
                &format!("Reusing tag {} from an earlier attempt...", tag),
            );
        } else {
            self.reporter.step(Step::Tag, "Creating tag...");
            self.git.create_tag(&tag)?;
        }

        self.reporter.step(Step::Push, "Pushing tag...");
        self.git.push_tag(remote, &tag)?;

        self.reporter.step(Step::Ledger, "Updating ledger...");
        let identity = self.git.user_identity();
        self.ledger
            .record_new_tag(target.row, &tag, &identity)
            .map_err(|err| match err {
                Error::Ledger { .. } => err,
                other => Error::ledger("record tag", other),
            })?;

        info!("released {} on {}", tag, merge_branch);
        self.reporter
            .step(Step::Done, "Build merge completed successfully!");
        Ok(tag)
    }

    /// Puts the operator back where they started. Every step is best effort.
    pub(super) fn cleanup(&self, checkpoint: &Checkpoint) {
        restore_operator(self.git, &self.store, &self.reporter, checkpoint);
    }
}

/// Returns to the original branch, restores the stash and removes the
/// checkpoint. Failures are logged and reported, never returned.
pub(super) fn restore_operator(
    git: &dyn GitOperations,
    store: &CheckpointStore,
    reporter: &Reporter,
    checkpoint: &Checkpoint,
) {
    let on_original = match git.current_branch() {
        Ok(current) if current == checkpoint.original_branch => true,
        _ => {
            reporter.step(
                Step::Restore,
                &format!("Switching back to {}...", checkpoint.original_branch),
            );
            advise(
                "switch back to original branch",
                git.checkout(&checkpoint.original_branch),
            )
            .is_some()
        }
    };

    if checkpoint.stashed {
        if on_original {
            reporter.step(Step::Restore, "Popping stash...");
            advise("restore stash", git.stash_pop());
        } else {
            warn!(
                "stash kept because {} could not be checked out",
                checkpoint.original_branch
            );
            reporter.step(
                Step::Warning,
                &format!(
                    "Your changes are still stashed; run 'git checkout {} && git stash pop' to restore them.",
                    checkpoint.original_branch
                ),
            );
        }
    }

    advise("remove build checkpoint", store.remove());
}
