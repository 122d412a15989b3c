//! Shared test utilities for integration and E2E tests.
//!
//! Builds a throwaway release setup on disk: a bare "origin" repository, a
//! working clone with `main`, `release` and `feature` branches, a local JSON
//! ledger, and a forklift configuration pointing at that ledger.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = GitFixture::new().with_ledger_row("release", "v-release-3");
//!     fixture.command().args(["build", "merge"]).assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};
use std::process::Command;

use forklift::ledger::{FileLedger, FileRow};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    #[allow(unused_imports)]
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::git;
    pub use super::GitFixture;
}

/// Runs git in `dir`, panicking with its stderr on failure. Returns stdout.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {} failed: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// A working clone with a bare remote, a ledger file and a config file.
pub struct GitFixture {
    temp_dir: assert_fs::TempDir,
}

impl GitFixture {
    /// Creates the repositories. The clone is left on `feature`, one commit
    /// ahead of `release`.
    pub fn new() -> Self {
        let temp_dir = assert_fs::TempDir::new().expect("Failed to create temp directory");
        let fixture = Self { temp_dir };

        let remote = fixture.remote_path();
        let work = fixture.work_path();
        std::fs::create_dir_all(&remote).unwrap();
        std::fs::create_dir_all(&work).unwrap();

        git(&remote, &["init", "--bare", "--quiet"]);
        git(&work, &["init", "--quiet"]);
        git(&work, &["checkout", "--quiet", "-b", "main"]);
        git(&work, &["config", "user.name", "Test Operator"]);
        git(&work, &["config", "user.email", "ops@example.com"]);
        git(&work, &["config", "commit.gpgsign", "false"]);
        git(&work, &["config", "tag.gpgsign", "false"]);
        git(
            &work,
            &["remote", "add", "origin", remote.to_str().unwrap()],
        );

        fixture.commit_file("README.md", "# widgets\n", "initial commit");
        git(&work, &["push", "--quiet", "-u", "origin", "main"]);

        git(&work, &["checkout", "--quiet", "-b", "release"]);
        git(&work, &["push", "--quiet", "-u", "origin", "release"]);

        git(&work, &["checkout", "--quiet", "-b", "feature", "main"]);
        fixture.commit_file("feature.txt", "new feature\n", "add feature");

        fixture
            .temp_dir
            .child("config.json")
            .write_str(&format!(
                "{{\n  \"ledger_file\": {:?}\n}}\n",
                fixture.ledger_path().display().to_string()
            ))
            .expect("Failed to write config file");

        fixture
    }

    /// Adds a ledger row for this repository.
    pub fn with_ledger_row(self, merge_branch: &str, last_tag: &str) -> Self {
        let mut rows = self.ledger_rows();
        rows.push(FileRow {
            repo: self.repo_id(),
            merge_branch: merge_branch.to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
            last_tag: last_tag.to_string(),
            last_user: "Previous Operator".to_string(),
        });
        self.write_ledger(&rows);
        self
    }

    /// Adds a ledger row for some other repository.
    #[allow(dead_code)]
    pub fn with_foreign_row(self, repo: &str, merge_branch: &str) -> Self {
        let mut rows = self.ledger_rows();
        rows.push(FileRow {
            repo: repo.to_string(),
            merge_branch: merge_branch.to_string(),
            ..FileRow::default()
        });
        self.write_ledger(&rows);
        self
    }

    fn write_ledger(&self, rows: &[FileRow]) {
        let document = serde_json::json!({ "rows": rows });
        std::fs::write(
            self.ledger_path(),
            serde_json::to_string_pretty(&document).unwrap(),
        )
        .expect("Failed to write ledger");
    }

    /// Writes and commits a file on the current branch.
    pub fn commit_file(&self, name: &str, content: &str, message: &str) {
        std::fs::write(self.work_path().join(name), content).expect("Failed to write file");
        git(&self.work_path(), &["add", name]);
        git(&self.work_path(), &["commit", "--quiet", "-m", message]);
    }

    /// Pushes a commit to `branch` from a second clone, as another operator.
    #[allow(dead_code)]
    pub fn commit_upstream(&self, branch: &str, name: &str, content: &str) {
        let other = self.temp_dir.path().join("other");
        if !other.exists() {
            git(
                self.temp_dir.path(),
                &[
                    "clone",
                    "--quiet",
                    self.remote_path().to_str().unwrap(),
                    "other",
                ],
            );
            git(&other, &["config", "user.name", "Other Operator"]);
            git(&other, &["config", "user.email", "other@example.com"]);
        }
        git(&other, &["fetch", "--quiet", "origin"]);
        git(&other, &["checkout", "--quiet", "-B", branch, &format!("origin/{}", branch)]);
        std::fs::write(other.join(name), content).unwrap();
        git(&other, &["add", name]);
        git(&other, &["commit", "--quiet", "-m", &format!("upstream change to {}", name)]);
        git(&other, &["push", "--quiet", "origin", branch]);
    }

    pub fn work_path(&self) -> PathBuf {
        self.temp_dir.path().join("work")
    }

    pub fn remote_path(&self) -> PathBuf {
        self.temp_dir.path().join("remote.git")
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.temp_dir.path().join("ledger.json")
    }

    pub fn config_path(&self) -> PathBuf {
        self.temp_dir.path().join("config.json")
    }

    /// Ledger key of the working clone, derived the same way forklift does.
    pub fn repo_id(&self) -> String {
        forklift::git::parse_repo_identifier(self.remote_path().to_str().unwrap())
            .expect("remote path yields a repo id")
    }

    pub fn ledger(&self) -> FileLedger {
        FileLedger::new(self.ledger_path())
    }

    pub fn ledger_rows(&self) -> Vec<FileRow> {
        self.ledger().rows().expect("ledger is readable")
    }

    pub fn current_branch(&self) -> String {
        git(&self.work_path(), &["rev-parse", "--abbrev-ref", "HEAD"])
    }

    /// Tags present in the bare remote.
    #[allow(dead_code)]
    pub fn remote_tags(&self) -> Vec<String> {
        let out = git(&self.remote_path(), &["tag", "--list"]);
        out.lines().map(str::to_string).collect()
    }

    #[allow(dead_code)]
    pub fn checkpoint_path(&self) -> PathBuf {
        self.work_path()
            .join(".git")
            .join(forklift::checkpoint::CHECKPOINT_FILE)
    }

    /// Command for the forklift binary, run inside the working clone with
    /// this fixture's configuration.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("forklift");
        cmd.current_dir(self.work_path())
            .env("FORKLIFT_CONFIG", self.config_path())
            .env("NO_COLOR", "1")
            .env_remove("FORKLIFT_LEDGER_FILE")
            .env_remove("FORKLIFT_SHEET_ID")
            .env_remove("RUST_LOG");
        cmd
    }
}

impl Default for GitFixture {
    fn default() -> Self {
        Self::new()
    }
}
