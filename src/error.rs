//! # Error Handling
//!
//! This module defines the centralized error type for `forklift`. It uses the
//! `thiserror` library to create an `Error` enum whose variants follow the
//! failure classes of a build:
//!
//! - **Configuration errors**: the repository has no ledger row, no merge
//!   branch is assigned, or credentials are missing. Never retried; the
//!   operator has to run `forklift init` or `forklift set merge-branch`.
//! - **Local tool errors**: a `git` invocation failed for a reason other than
//!   a merge conflict.
//! - **State mismatch on resume**: the working copy does not match the
//!   checkpoint (wrong branch, merge still unresolved).
//! - **Ledger and network errors**: the spreadsheet or GitHub could not be
//!   read or written.
//! - **Advisory failures**: best-effort side channels (checkpoint
//!   persistence, notifications, post-release cleanup). These are routed
//!   through [`advise`], which logs them and never hands them to the caller.
//!
//! The `Result` type alias is used to return `Result<T, Error>` from
//! functions throughout the library.

use log::warn;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for forklift operations
#[derive(Error, Debug)]
pub enum Error {
    /// The configuration is missing or invalid.
    ///
    /// Includes an optional hint telling the operator how to fix it.
    #[error("Configuration error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    Config {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// The repository has no row in the ledger.
    #[error("repo {repo} not found in ledger\n  hint: run 'forklift set merge-branch <name>' first")]
    RepoNotInLedger { repo: String },

    /// The repository has a ledger row but no merge branch assigned.
    #[error("merge-branch not set for {repo}\n  hint: run 'forklift set merge-branch <name>' first")]
    MergeBranchUnset { repo: String },

    /// A `git` invocation exited unsuccessfully.
    #[error("Git command failed: git {command} - {stderr}")]
    GitCommand { command: String, stderr: String },

    /// The working copy is on a detached `HEAD`, so there is no branch to
    /// return to after the build.
    #[error("HEAD is detached; check out the branch you want to merge first")]
    DetachedHead,

    /// A merge is still textually in progress while trying to resume.
    #[error("merge is still in progress. Please resolve conflicts and commit first.")]
    MergeStillInProgress,

    /// The current branch differs from the branch recorded in the checkpoint.
    #[error("you are on branch {current}, but the build in progress is merging into {expected}. Please switch back to {expected} and resolve conflicts.")]
    BranchMismatch { current: String, expected: String },

    /// A tag could not be incremented.
    #[error("cannot increment tag {tag}: {message}")]
    TagParse { tag: String, message: String },

    /// The collision-avoidance loop ran out of attempts.
    #[error("no free tag found after {attempts} attempts starting from {start}")]
    TagSpaceExhausted { start: String, attempts: usize },

    /// A ledger read or write failed.
    #[error("Ledger {operation} failed: {message}")]
    Ledger { operation: String, message: String },

    /// The GitHub API answered with a non-success status.
    #[error("GitHub API error (status {status}): {message}")]
    GithubApi { status: u16, message: String },

    /// The build checkpoint could not be read or written.
    #[error("Checkpoint error at {}: {message}", path.display())]
    Checkpoint { path: PathBuf, message: String },

    /// A best-effort operation failed. Only ever passed to [`advise`].
    #[error("{operation} failed: {message}")]
    Advisory { operation: String, message: String },

    /// An HTTP error, wrapped from `reqwest::Error`.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A URL parsing error, wrapped from `url::ParseError`.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl Error {
    /// Convenience constructor for configuration errors with a hint.
    pub fn config(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    /// Wraps any error as a ledger failure for the named operation.
    pub fn ledger(operation: &str, err: impl std::fmt::Display) -> Self {
        Error::Ledger {
            operation: operation.to_string(),
            message: err.to_string(),
        }
    }

    /// Returns true for errors the operator fixes by changing configuration
    /// or ledger assignments.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::Config { .. } | Error::RepoNotInLedger { .. } | Error::MergeBranchUnset { .. }
        )
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Runs a best-effort operation result through the advisory channel.
///
/// Failures are re-labelled as [`Error::Advisory`], logged at `warn` level,
/// and swallowed. Returns the value on success.
pub fn advise<T>(operation: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            let advisory = Error::Advisory {
                operation: operation.to_string(),
                message: err.to_string(),
            };
            warn!("{}", advisory);
            None
        }
    }
}
