//! # Ledger
//!
//! The ledger is the shared store of record: one row per repository holding
//! its assigned merge branch, the last issued tag, when it was last updated,
//! and by whom. It is last-write-wins; nothing here locks rows.
//!
//! The build core only sees the [`Ledger`] trait. Two backends implement it:
//!
//! - [`SheetsLedger`]: a Google Sheets spreadsheet, the shared team ledger.
//! - [`FileLedger`]: the same row model in a local JSON file.
//!
//! Rows are addressed by a [`RowHandle`], a positional index. Handles are only
//! valid for the invocation that resolved them; callers always re-resolve by
//! repository identifier instead of caching a handle across runs.

mod file;
mod sheets;

pub use file::{FileLedger, FileRow};
pub use sheets::{extract_sheet_id, AccessToken, SheetsLedger};

use crate::error::Result;

/// Positional handle of a repository's ledger row (0-based).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowHandle(pub usize);

impl RowHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A repository's ledger row as read at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RepoTarget {
    pub row: RowHandle,
    /// Empty when no merge branch is assigned.
    pub merge_branch: String,
    /// Empty when no tag has been issued on the current merge branch.
    pub last_tag: String,
    pub updated_at: String,
    pub last_user: String,
}

/// Read/update access to the ledger.
pub trait Ledger {
    /// Looks up the row for `repo`. `Ok(None)` when the repository has no row.
    fn resolve_repo_target(&self, repo: &str) -> Result<Option<RepoTarget>>;

    /// Assigns `branch` as the merge branch of `repo`, starting a new tag
    /// sequence. Updates `row` in place, or appends a new row when `None`.
    fn assign_merge_branch(
        &self,
        repo: &str,
        branch: &str,
        row: Option<RowHandle>,
        identity: &str,
    ) -> Result<()>;

    /// Records `tag` as the newest tag of `row`, stamping time and identity.
    fn record_new_tag(&self, row: RowHandle, tag: &str, identity: &str) -> Result<()>;
}

impl<L: Ledger + ?Sized> Ledger for Box<L> {
    fn resolve_repo_target(&self, repo: &str) -> Result<Option<RepoTarget>> {
        (**self).resolve_repo_target(repo)
    }

    fn assign_merge_branch(
        &self,
        repo: &str,
        branch: &str,
        row: Option<RowHandle>,
        identity: &str,
    ) -> Result<()> {
        (**self).assign_merge_branch(repo, branch, row, identity)
    }

    fn record_new_tag(&self, row: RowHandle, tag: &str, identity: &str) -> Result<()> {
        (**self).record_new_tag(row, tag, identity)
    }
}

/// Current UTC time in the RFC 3339 form stored in the ledger.
pub(crate) fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

/// Cell value at `column`, trimmed, or empty when the row is short.
pub(crate) fn cell(row: &[String], column: usize) -> String {
    row.get(column).map(|v| v.trim().to_string()).unwrap_or_default()
}

/// Finds `repo` in column A of `rows`.
pub(crate) fn find_row(rows: &[Vec<String>], repo: &str) -> Option<RepoTarget> {
    rows.iter().enumerate().find_map(|(i, row)| {
        let name = row.first()?;
        if name.trim() != repo {
            return None;
        }
        Some(RepoTarget {
            row: RowHandle(i),
            merge_branch: cell(row, 1),
            updated_at: cell(row, 2),
            last_tag: cell(row, 3),
            last_user: cell(row, 4),
        })
    })
}
