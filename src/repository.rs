//! # Version-Control Adapter
//!
//! The build orchestrator never shells out directly. It talks to the working
//! copy through the [`GitOperations`] trait: one method per atomic local
//! operation, each returning success or a structured [`Error`](crate::error::Error).
//! Nothing here retries.
//!
//! [`DefaultGitOperations`] is the production implementation, wrapping the
//! functions in [`crate::git`] for one working directory. Tests swap in mock
//! implementations to drive the orchestrator through conflict and failure
//! paths without touching a real repository.

use crate::error::Result;
use crate::git;
use std::path::{Path, PathBuf};

/// Trait for local version-control operations - allows mocking in tests
pub trait GitOperations {
    /// Absolute path of the control directory. The build checkpoint lives
    /// here, which scopes it to one clone.
    fn git_dir(&self) -> Result<PathBuf>;

    /// Stashes uncommitted changes, reporting whether anything was stashed.
    fn stash(&self) -> Result<bool>;

    /// Restores the most recent stash entry.
    fn stash_pop(&self) -> Result<()>;

    /// The checked-out branch (`HEAD` when detached).
    fn current_branch(&self) -> Result<String>;

    fn checkout(&self, branch: &str) -> Result<()>;

    fn pull(&self, remote: &str, branch: &str) -> Result<()>;

    /// Merges `branch` into the current branch without an editor.
    fn merge(&self, branch: &str) -> Result<()>;

    /// Abandons a conflicted merge.
    fn merge_abort(&self) -> Result<()>;

    /// Pure inspection: is a merge stopped mid-way?
    fn merge_in_progress(&self) -> bool;

    fn tag_exists(&self, tag: &str) -> bool;

    /// True when `tag` exists locally and points at `HEAD`.
    fn tag_points_at_head(&self, tag: &str) -> bool;

    fn create_tag(&self, tag: &str) -> Result<()>;

    fn push_branch(&self, remote: &str, branch: &str) -> Result<()>;

    fn push_tag(&self, remote: &str, tag: &str) -> Result<()>;

    /// The `org/repo` identifier derived from the remote's URL.
    fn repo_identifier(&self, remote: &str) -> Result<String>;

    /// Identity recorded in the ledger for updates made by this operator.
    fn user_identity(&self) -> String;
}

/// The default implementation of `GitOperations`, which uses the system's
/// `git` command inside one working directory.
#[derive(Debug, Clone)]
pub struct DefaultGitOperations {
    workdir: PathBuf,
}

impl DefaultGitOperations {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }
}

impl GitOperations for DefaultGitOperations {
    fn git_dir(&self) -> Result<PathBuf> {
        git::git_dir(&self.workdir)
    }

    fn stash(&self) -> Result<bool> {
        git::stash(&self.workdir)
    }

    fn stash_pop(&self) -> Result<()> {
        git::stash_pop(&self.workdir)
    }

    fn current_branch(&self) -> Result<String> {
        git::current_branch(&self.workdir)
    }

    fn checkout(&self, branch: &str) -> Result<()> {
        git::checkout(&self.workdir, branch)
    }

    fn pull(&self, remote: &str, branch: &str) -> Result<()> {
        git::pull(&self.workdir, remote, branch)
    }

    fn merge(&self, branch: &str) -> Result<()> {
        git::merge(&self.workdir, branch)
    }

    fn merge_abort(&self) -> Result<()> {
        git::merge_abort(&self.workdir)
    }

    fn merge_in_progress(&self) -> bool {
        git::is_merge_in_progress(&self.workdir)
    }

    fn tag_exists(&self, tag: &str) -> bool {
        git::tag_exists(&self.workdir, tag)
    }

    fn tag_points_at_head(&self, tag: &str) -> bool {
        git::tag_points_at_head(&self.workdir, tag)
    }

    fn create_tag(&self, tag: &str) -> Result<()> {
        git::create_tag(&self.workdir, tag)
    }

    fn push_branch(&self, remote: &str, branch: &str) -> Result<()> {
        git::push_branch(&self.workdir, remote, branch)
    }

    fn push_tag(&self, remote: &str, tag: &str) -> Result<()> {
        git::push_tag(&self.workdir, remote, tag)
    }

    fn repo_identifier(&self, remote: &str) -> Result<String> {
        let url = git::remote_url(&self.workdir, remote)?;
        git::parse_repo_identifier(&url)
    }

    fn user_identity(&self) -> String {
        git::user_identity(&self.workdir)
    }
}
