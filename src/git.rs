//! Thin wrappers around the system `git` command.
//!
//! Every function runs a single `git` invocation inside `repo_dir` and maps
//! a non-zero exit into [`Error::GitCommand`]. Nothing here retries. Using the
//! system binary means SSH keys, credential helpers and `~/.gitconfig` are
//! honoured exactly as they are in the operator's shell.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::OnceLock;

use log::debug;
use regex::Regex;

use crate::error::{Error, Result};

/// Message attached to stashes created by a build.
pub const STASH_MESSAGE: &str = "forklift-auto-stash";

fn git(repo_dir: &Path, args: &[&str]) -> Result<Output> {
    debug!("git {} (in {})", args.join(" "), repo_dir.display());
    Command::new("git")
        .args(args)
        .current_dir(repo_dir)
        .output()
        .map_err(|e| Error::GitCommand {
            command: args.join(" "),
            stderr: e.to_string(),
        })
}

/// Runs `git` and fails unless it exits successfully. Returns trimmed stdout.
fn run(repo_dir: &Path, args: &[&str]) -> Result<String> {
    let output = git(repo_dir, args)?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        // `git merge` reports conflicts on stdout
        let message = if stderr.trim().is_empty() {
            stdout.trim().to_string()
        } else {
            stderr.trim().to_string()
        };
        return Err(Error::GitCommand {
            command: args.join(" "),
            stderr: message,
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Runs `git` purely for its exit status.
fn succeeds(repo_dir: &Path, args: &[&str]) -> bool {
    git(repo_dir, args)
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Absolute path of the repository's control directory (usually `.git`).
pub fn git_dir(repo_dir: &Path) -> Result<PathBuf> {
    run(repo_dir, &["rev-parse", "--absolute-git-dir"]).map(PathBuf::from)
}

/// Name of the checked-out branch, or `HEAD` when detached.
pub fn current_branch(repo_dir: &Path) -> Result<String> {
    run(repo_dir, &["rev-parse", "--abbrev-ref", "HEAD"])
}

fn stash_head(repo_dir: &Path) -> Option<String> {
    run(repo_dir, &["rev-parse", "-q", "--verify", "refs/stash"]).ok()
}

/// Stashes uncommitted changes. Returns whether a stash entry was created.
///
/// Compares `refs/stash` before and after instead of parsing git's
/// (localised) "No local changes to save" message.
pub fn stash(repo_dir: &Path) -> Result<bool> {
    let before = stash_head(repo_dir);
    run(repo_dir, &["stash", "push", "-m", STASH_MESSAGE])?;
    let after = stash_head(repo_dir);
    Ok(after.is_some() && after != before)
}

/// Restores the most recent stash entry.
pub fn stash_pop(repo_dir: &Path) -> Result<()> {
    run(repo_dir, &["stash", "pop"]).map(|_| ())
}

pub fn checkout(repo_dir: &Path, branch: &str) -> Result<()> {
    run(repo_dir, &["checkout", branch]).map(|_| ())
}

pub fn pull(repo_dir: &Path, remote: &str, branch: &str) -> Result<()> {
    run(repo_dir, &["pull", "--no-rebase", "--no-edit", remote, branch]).map(|_| ())
}

/// Merges `branch` into the current branch without opening an editor.
pub fn merge(repo_dir: &Path, branch: &str) -> Result<()> {
    run(repo_dir, &["merge", branch, "--no-edit"]).map(|_| ())
}

pub fn merge_abort(repo_dir: &Path) -> Result<()> {
    run(repo_dir, &["merge", "--abort"]).map(|_| ())
}

/// True while `MERGE_HEAD` exists, i.e. a merge stopped on conflicts and
/// has not been committed or aborted yet.
pub fn is_merge_in_progress(repo_dir: &Path) -> bool {
    succeeds(repo_dir, &["rev-parse", "-q", "--verify", "MERGE_HEAD"])
}

pub fn tag_exists(repo_dir: &Path, tag: &str) -> bool {
    let refname = format!("refs/tags/{}", tag);
    succeeds(repo_dir, &["rev-parse", "-q", "--verify", &refname])
}

/// True when `tag` exists and resolves to the commit `HEAD` points at.
pub fn tag_points_at_head(repo_dir: &Path, tag: &str) -> bool {
    let target = format!("refs/tags/{}^{{commit}}", tag);
    match (
        run(repo_dir, &["rev-parse", "-q", "--verify", &target]),
        run(repo_dir, &["rev-parse", "HEAD"]),
    ) {
        (Ok(tagged), Ok(head)) => tagged == head,
        _ => false,
    }
}

/// Creates a lightweight tag on `HEAD`.
pub fn create_tag(repo_dir: &Path, tag: &str) -> Result<()> {
    run(repo_dir, &["tag", tag]).map(|_| ())
}

pub fn push_branch(repo_dir: &Path, remote: &str, branch: &str) -> Result<()> {
    run(repo_dir, &["push", remote, branch]).map(|_| ())
}

pub fn push_tag(repo_dir: &Path, remote: &str, tag: &str) -> Result<()> {
    let refspec = format!("refs/tags/{}", tag);
    run(repo_dir, &["push", remote, &refspec]).map(|_| ())
}

/// URL of the named remote.
pub fn remote_url(repo_dir: &Path, remote: &str) -> Result<String> {
    let url = run(repo_dir, &["remote", "get-url", remote])?;
    if url.is_empty() {
        return Err(Error::GitCommand {
            command: format!("remote get-url {}", remote),
            stderr: format!("{} remote is empty", remote),
        });
    }
    Ok(url)
}

fn config_value(repo_dir: &Path, key: &str) -> String {
    run(repo_dir, &["config", key]).unwrap_or_default()
}

/// Identity recorded in the ledger next to every update.
///
/// `Name <email>` from git config, either one alone, or `user@host` when git
/// has no identity configured.
pub fn user_identity(repo_dir: &Path) -> String {
    let name = config_value(repo_dir, "user.name");
    let email = config_value(repo_dir, "user.email");
    format_identity(&name, &email, fallback_identity)
}

fn format_identity(name: &str, email: &str, fallback: impl FnOnce() -> String) -> String {
    match (name.is_empty(), email.is_empty()) {
        (false, false) => format!("{} <{}>", name, email),
        (false, true) => name.to_string(),
        (true, false) => email.to_string(),
        (true, true) => fallback(),
    }
}

fn fallback_identity() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_default();
    let host = std::env::var("HOSTNAME")
        .ok()
        .filter(|h| !h.is_empty())
        .or_else(|| {
            Command::new("hostname")
                .output()
                .ok()
                .filter(|o| o.status.success())
                .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        })
        .unwrap_or_else(|| "localhost".to_string());
    format!("{}@{}", user, host)
}

fn remote_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"^git@[^:]+:([^/]+)/([^/]+)$",
            r"^https?://[^/]+/([^/]+)/([^/]+)$",
            r"^ssh://git@[^/]+/([^/]+)/([^/]+)$",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("static remote pattern"))
        .collect()
    })
}

/// Derives the stable `org/repo` identifier used as the ledger key.
///
/// Handles these remote forms, with or without a trailing `.git`:
/// - `git@github.com:org/repo`
/// - `https://github.com/org/repo`
/// - `ssh://git@github.com/org/repo`
///
/// Anything else falls back to its last two path segments.
pub fn parse_repo_identifier(remote: &str) -> Result<String> {
    let trimmed = remote.trim();
    let remote = trimmed.strip_suffix(".git").unwrap_or(trimmed);

    for pattern in remote_patterns() {
        if let Some(caps) = pattern.captures(remote) {
            return Ok(format!("{}/{}", &caps[1], &caps[2]));
        }
    }

    let parts: Vec<&str> = remote
        .trim_end_matches('/')
        .split(['/', ':'])
        .filter(|p| !p.is_empty())
        .collect();
    match parts.as_slice() {
        [] => Err(Error::Config {
            message: format!("unable to parse repo from remote: {:?}", remote),
            hint: None,
        }),
        [only] => Ok(only.to_string()),
        [.., org, repo] => Ok(format!("{}/{}", org, repo)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_repo_identifier_scp_form() {
        assert_eq!(
            parse_repo_identifier("git@github.com:org/repo.git").unwrap(),
            "org/repo"
        );
        assert_eq!(
            parse_repo_identifier("git@gitlab.example.com:team/service").unwrap(),
            "team/service"
        );
    }

    #[test]
    fn test_parse_repo_identifier_https_form() {
        assert_eq!(
            parse_repo_identifier("https://github.com/org/repo").unwrap(),
            "org/repo"
        );
        assert_eq!(
            parse_repo_identifier("http://git.internal/org/repo.git").unwrap(),
            "org/repo"
        );
    }

    #[test]
    fn test_parse_repo_identifier_ssh_url_form() {
        assert_eq!(
            parse_repo_identifier("ssh://git@github.com/org/repo.git").unwrap(),
            "org/repo"
        );
    }

    #[test]
    fn test_parse_repo_identifier_fallback_uses_last_two_segments() {
        assert_eq!(
            parse_repo_identifier("/srv/git/platform/api.git").unwrap(),
            "platform/api"
        );
        assert_eq!(
            parse_repo_identifier("https://gitlab.com/group/sub/project.git").unwrap(),
            "sub/project"
        );
        assert_eq!(parse_repo_identifier("standalone").unwrap(), "standalone");
    }

    #[test]
    fn test_parse_repo_identifier_empty() {
        assert!(parse_repo_identifier("").is_err());
        assert!(parse_repo_identifier(".git").is_err());
    }

    #[test]
    fn test_format_identity() {
        let never = || panic!("fallback should not be used");
        assert_eq!(
            format_identity("Ada", "ada@example.com", never),
            "Ada <ada@example.com>"
        );
        assert_eq!(format_identity("Ada", "", never), "Ada");
        assert_eq!(format_identity("", "ada@example.com", never), "ada@example.com");
        assert_eq!(
            format_identity("", "", || "ada@box".to_string()),
            "ada@box"
        );
    }
}
