//! # Build Orchestration
//!
//! Drives `forklift build merge`: merge the operator's branch into the
//! repository's assigned merge branch, tag the result, push both, and record
//! the tag in the ledger. The sequence survives process death and merge
//! conflicts through a checkpoint written before the first branch switch.
//!
//! ## States
//!
//! ```text
//! Idle -> Started -> MergeBranchReady -> Merged(conflict | clean) -> Finished
//!                                              ^
//!                  Resuming -------------------+ (re-enters at Merged(clean))
//! ```
//!
//! ## Fresh run
//!
//! 1. If a checkpoint exists, hand over to the resume path and stop.
//! 2. Resolve the repository's ledger row; no row or no merge branch is a
//!    configuration error.
//! 3. Record the current branch and stash local changes.
//! 4. Persist the checkpoint (best effort: a failure is logged, not fatal).
//! 5. Check out and pull the merge branch.
//! 6. Merge the original branch. A failure with a merge left in progress is
//!    a conflict: guidance is printed, the checkpoint and working copy are
//!    left as they are, and the run returns [`BuildOutcome::ConflictPending`].
//! 7. Finish (see [`finish`](self::finish)).
//!
//! Any other failure in steps 5-6 runs the cleanup before returning the
//! error, so the operator is put back on their branch with their changes.
//!
//! ## Resume
//!
//! Refuses while a merge is still unresolved or when the working copy is not
//! on the checkpoint's merge branch. Otherwise re-reads the ledger for a fresh
//! last tag and enters Finish. The checkpoint is only deleted after Finish
//! succeeds.
//!
//! ## Abort
//!
//! [`BuildAbort`] abandons the recorded build from local state alone: it
//! aborts an unresolved merge, puts the operator back on their branch with
//! their stash, and deletes the checkpoint.

mod abort;
mod finish;
mod resume;


use log::info;

pub use abort::BuildAbort;

use crate::checkpoint::{Checkpoint, CheckpointStore};
use crate::defaults;
use crate::error::{advise, Error, Result};
use crate::ledger::{Ledger, RepoTarget};
use crate::output::{Reporter, Step};
use crate::repository::GitOperations;

/// Tunables for a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Remote the merge branch is pulled from and pushed to.
    pub remote: String,
    /// Upper bound on tag candidates tried by the collision loop.
    pub max_tag_attempts: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            remote: defaults::DEFAULT_REMOTE.to_string(),
            max_tag_attempts: defaults::DEFAULT_MAX_TAG_ATTEMPTS,
        }
    }
}

/// How a `build merge` invocation ended without error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// The merge branch was tagged, pushed and recorded in the ledger.
    Released { tag: String, merge_branch: String },
    /// The merge stopped on conflicts; the operator resolves, commits, and
    /// runs `build merge` again.
    ConflictPending {
        merge_branch: String,
        original_branch: String,
    },
}

enum MergeStatus {
    Clean,
    Conflict,
}

/// Runs the merge-and-tag workflow for one working copy.
pub struct BuildOrchestrator<'a> {
    git: &'a dyn GitOperations,
    ledger: &'a dyn Ledger,
    store: CheckpointStore,
    options: BuildOptions,
    reporter: Reporter,
}

impl<'a> BuildOrchestrator<'a> {
    /// Creates an orchestrator whose checkpoint lives in the working copy's
    /// control directory.
    pub fn new(
        git: &'a dyn GitOperations,
        ledger: &'a dyn Ledger,
        options: BuildOptions,
        reporter: Reporter,
    ) -> Result<Self> {
        let store = CheckpointStore::in_git_dir(&git.git_dir()?);
        Ok(Self::with_store(git, ledger, store, options, reporter))
    }

    pub fn with_store(
        git: &'a dyn GitOperations,
        ledger: &'a dyn Ledger,
        store: CheckpointStore,
        options: BuildOptions,
        reporter: Reporter,
    ) -> Self {
        Self {
            git,
            ledger,
            store,
            options,
            reporter,
        }
    }

    pub fn checkpoint_store(&self) -> &CheckpointStore {
        &self.store
    }

    /// The in-flight build, if any.
    pub fn status(&self) -> Result<Option<Checkpoint>> {
        self.store.load()
    }

    /// Entry point of `build merge`: resumes an interrupted build if one is
    /// recorded, otherwise starts a fresh one for `repo`.
    pub fn run(&self, repo: &str) -> Result<BuildOutcome> {
        if let Some(checkpoint) = self.store.load()? {
            return self.resume(checkpoint);
        }
        self.run_fresh(repo)
    }

    fn run_fresh(&self, repo: &str) -> Result<BuildOutcome> {
        let target = self.resolve_target(repo)?;

        let original_branch = self.git.current_branch()?;
        if original_branch == "HEAD" {
            return Err(Error::DetachedHead);
        }

        self.reporter.step(Step::Stash, "Stashing changes...");
        let stashed = self.git.stash()?;

        let checkpoint = Checkpoint {
            original_branch,
            merge_branch: target.merge_branch.clone(),
            stashed,
            repo_identifier: repo.to_string(),
            row_index: target.row.index(),
        };
        let persisted = advise("save build checkpoint", self.store.save(&checkpoint)).is_some();
        info!(
            "build started for {}: {} -> {}",
            repo, checkpoint.original_branch, checkpoint.merge_branch
        );

        match self.switch_and_merge(&checkpoint) {
            Ok(MergeStatus::Clean) => {}
            Ok(MergeStatus::Conflict) => {
                self.print_conflict_guidance(&checkpoint, persisted);
                return Ok(BuildOutcome::ConflictPending {
                    merge_branch: checkpoint.merge_branch,
                    original_branch: checkpoint.original_branch,
                });
            }
            Err(err) => {
                self.cleanup(&checkpoint);
                return Err(err);
            }
        }

        match self.finish(&checkpoint, &target) {
            Ok(tag) => {
                self.cleanup(&checkpoint);
                Ok(BuildOutcome::Released {
                    tag,
                    merge_branch: checkpoint.merge_branch,
                })
            }
            Err(err) => {
                // Stay on the merge branch so `build merge` can resume.
                // Without a checkpoint there is nothing to resume from.
                if !persisted {
                    self.cleanup(&checkpoint);
                }
                Err(err)
            }
        }
    }

    fn resolve_target(&self, repo: &str) -> Result<RepoTarget> {
        let target = self
            .ledger
            .resolve_repo_target(repo)?
            .ok_or_else(|| Error::RepoNotInLedger {
                repo: repo.to_string(),
            })?;
        if target.merge_branch.is_empty() {
            return Err(Error::MergeBranchUnset {
                repo: repo.to_string(),
            });
        }
        Ok(target)
    }

    fn switch_and_merge(&self, checkpoint: &Checkpoint) -> Result<MergeStatus> {
        let merge_branch = &checkpoint.merge_branch;

        self.reporter.step(
            Step::Checkout,
            &format!("Switching to merge branch: {}...", merge_branch),
        );
        self.git.checkout(merge_branch)?;

        self.reporter
            .step(Step::Pull, &format!("Pulling latest for {}...", merge_branch));
        self.git.pull(&self.options.remote, merge_branch)?;

        self.reporter.step(
            Step::Merge,
            &format!(
                "Merging {} into {}...",
                checkpoint.original_branch, merge_branch
            ),
        );
        match self.git.merge(&checkpoint.original_branch) {
            Ok(()) => Ok(MergeStatus::Clean),
            Err(_) if self.git.merge_in_progress() => Ok(MergeStatus::Conflict),
            Err(err) => Err(err),
        }
    }

    fn print_conflict_guidance(&self, checkpoint: &Checkpoint, persisted: bool) {
        self.reporter.note("");
        self.reporter.step(Step::Warning, "MERGE CONFLICTS DETECTED!");
        self.reporter.note(
            "Please resolve the conflicts manually, commit the changes, and then run 'forklift build merge' again to finish.",
        );
        self.reporter.note(&format!(
            "Note: You are currently on the {} branch.",
            checkpoint.merge_branch
        ));
        if !persisted {
            self.reporter.step(
                Step::Warning,
                "The build checkpoint could not be saved, so the next run cannot resume automatically.",
            );
        }
    }
}
