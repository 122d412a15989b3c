//! # CLI Command Implementations
//!
//! One file per subcommand of the `forklift` command-line tool.
//!
//! ## Structure
//!
//! Each command module contains:
//! - An `Args` struct (and, for grouped commands, a nested `Subcommand`
//!   enum) derived using `clap`.
//! - An `execute` function taking the shared [`Context`] and the parsed
//!   arguments, calling into the `forklift` library for the actual work.

pub mod build;
pub mod get;
pub mod init;
pub mod poll;
pub mod set;

use anyhow::{Context as _, Result};
use std::path::PathBuf;

use forklift::config::Config;
use forklift::ledger::{Ledger, RepoTarget};
use forklift::output::{OutputConfig, Reporter};
use forklift::repository::{DefaultGitOperations, GitOperations};

/// Global settings shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub config_path: PathBuf,
    pub output: OutputConfig,
    pub quiet: bool,
}

impl Context {
    pub fn load_config(&self) -> Result<Config> {
        Config::load(&self.config_path).with_context(|| {
            format!(
                "failed to load config from {}",
                self.config_path.display()
            )
        })
    }

    pub fn reporter(&self) -> Reporter {
        Reporter::new(self.output.clone(), self.quiet)
    }

    /// Git adapter for the working copy in the current directory.
    pub fn git(&self) -> Result<DefaultGitOperations> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(DefaultGitOperations::new(cwd))
    }

    /// Prints a line unless `--quiet` was given.
    pub fn say(&self, message: &str) {
        if !self.quiet {
            println!("{}", message);
        }
    }
}

/// Opens the configured ledger.
pub fn open_ledger(config: &Config) -> Result<Box<dyn Ledger>> {
    Ok(config.open_ledger()?)
}

/// `org/repo` of the working copy, from the configured remote.
pub fn detect_repo(git: &dyn GitOperations, config: &Config) -> Result<String> {
    git.repo_identifier(config.remote())
        .context("failed to detect repo name")
}

/// Resolves the current repository's ledger row.
pub fn fetch_target(ctx: &Context) -> Result<(String, Option<RepoTarget>)> {
    let config = ctx.load_config()?;
    let ledger = open_ledger(&config)?;
    let git = ctx.git()?;
    let repo = detect_repo(&git, &config)?;
    let target = ledger
        .resolve_repo_target(&repo)
        .context("failed to read repo info")?;
    Ok((repo, target))
}
