//! Local JSON ledger backend.
//!
//! Stores the same five columns as the spreadsheet, one object per row, in a
//! single JSON document. Useful offline and for exercising the build
//! workflow without network access.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{timestamp, Ledger, RepoTarget, RowHandle};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRow {
    pub repo: String,
    #[serde(default)]
    pub merge_branch: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub last_tag: String,
    #[serde(default)]
    pub last_user: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct FileDocument {
    #[serde(default)]
    rows: Vec<FileRow>,
}

/// Ledger persisted as a JSON file on the local filesystem.
#[derive(Debug, Clone)]
pub struct FileLedger {
    path: PathBuf,
}

impl FileLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All rows, in ledger order. A missing file is an empty ledger.
    pub fn rows(&self) -> Result<Vec<FileRow>> {
        Ok(self.read()?.rows)
    }

    fn read(&self) -> Result<FileDocument> {
        match fs::read_to_string(&self.path) {
            Ok(data) => serde_json::from_str(&data).map_err(|e| Error::ledger("read", e)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FileDocument::default()),
            Err(e) => Err(Error::ledger("read", e)),
        }
    }

    fn write(&self, operation: &str, document: &FileDocument) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::ledger(operation, e))?;
        }
        let data = serde_json::to_vec_pretty(document)?;
        let tmp = self.path.with_extension("json.tmp");
        let io = |e: std::io::Error| Error::ledger(operation, e);

        let mut file = fs::File::create(&tmp).map_err(io)?;
        file.write_all(&data).map_err(io)?;
        file.sync_all().map_err(io)?;
        drop(file);

        fs::rename(&tmp, &self.path).map_err(io)
    }

    fn row_mut<'a>(
        operation: &str,
        document: &'a mut FileDocument,
        row: RowHandle,
    ) -> Result<&'a mut FileRow> {
        document
            .rows
            .get_mut(row.index())
            .ok_or_else(|| Error::Ledger {
                operation: operation.to_string(),
                message: format!("row {} does not exist", row.index()),
            })
    }
}

impl Ledger for FileLedger {
    fn resolve_repo_target(&self, repo: &str) -> Result<Option<RepoTarget>> {
        let document = self.read()?;
        Ok(document
            .rows
            .iter()
            .enumerate()
            .find(|(_, r)| r.repo.trim() == repo)
            .map(|(i, r)| RepoTarget {
                row: RowHandle(i),
                merge_branch: r.merge_branch.trim().to_string(),
                last_tag: r.last_tag.trim().to_string(),
                updated_at: r.updated_at.clone(),
                last_user: r.last_user.clone(),
            }))
    }

    fn assign_merge_branch(
        &self,
        repo: &str,
        branch: &str,
        row: Option<RowHandle>,
        identity: &str,
    ) -> Result<()> {
        let mut document = self.read()?;
        let fresh = FileRow {
            repo: repo.to_string(),
            merge_branch: branch.to_string(),
            updated_at: timestamp(),
            last_tag: String::new(),
            last_user: identity.to_string(),
        };
        match row {
            Some(row) => {
                let existing = Self::row_mut("assign merge branch", &mut document, row)?;
                *existing = FileRow {
                    repo: existing.repo.clone(),
                    ..fresh
                };
            }
            None => document.rows.push(fresh),
        }
        self.write("assign merge branch", &document)
    }

    fn record_new_tag(&self, row: RowHandle, tag: &str, identity: &str) -> Result<()> {
        let mut document = self.read()?;
        let existing = Self::row_mut("record tag", &mut document, row)?;
        existing.last_tag = tag.to_string();
        existing.updated_at = timestamp();
        existing.last_user = identity.to_string();
        self.write("record tag", &document)
    }
}
