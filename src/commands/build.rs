//! # Build Command Implementation
//!
//! - `build merge`: run or resume the merge-and-tag workflow.
//! - `build status`: show the in-flight build recorded in the checkpoint.
//! - `build abort`: abandon the in-flight build and restore the operator's
//!   branch and stash.

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use log::debug;

use forklift::build::{BuildAbort, BuildOrchestrator, BuildOutcome};
use forklift::checkpoint::CheckpointStore;
use forklift::repository::GitOperations;

use super::{detect_repo, open_ledger, Context};

/// Merge the current branch into the merge branch and release a tag
#[derive(Args, Debug)]
pub struct BuildArgs {
    #[command(subcommand)]
    action: BuildAction,
}

#[derive(Subcommand, Debug)]
enum BuildAction {
    /// Merge, tag, push and record the tag (resumes after conflicts)
    Merge,

    /// Show the build in progress, if any
    Status,

    /// Abandon the build in progress and restore the original branch
    Abort,
}

/// Execute the `build` command.
pub fn execute(ctx: &Context, args: BuildArgs) -> Result<()> {
    match args.action {
        BuildAction::Merge => merge(ctx),
        BuildAction::Status => status(ctx),
        BuildAction::Abort => abort(ctx),
    }
}

fn merge(ctx: &Context) -> Result<()> {
    let config = ctx.load_config()?;
    let ledger = open_ledger(&config)?;
    let git = ctx.git()?;

    let orchestrator =
        BuildOrchestrator::new(&git, ledger.as_ref(), config.build_options(), ctx.reporter())?;

    // Mid-merge the remote may be unreadable; a resume carries its own id.
    let repo = match detect_repo(&git, &config) {
        Ok(repo) => repo,
        Err(err) => match orchestrator.status()? {
            Some(checkpoint) => {
                debug!("using repo from checkpoint: {:#}", err);
                checkpoint.repo_identifier
            }
            None => return Err(err),
        },
    };

    match orchestrator.run(&repo).context("build failed")? {
        BuildOutcome::Released { tag, merge_branch } => {
            ctx.say(&format!("Released {} on {}.", tag, merge_branch));
        }
        BuildOutcome::ConflictPending {
            merge_branch,
            original_branch,
        } => {
            // --quiet silences the reporter; a pending conflict is still reported.
            if ctx.quiet {
                eprintln!(
                    "Merge conflicts merging {} into {}: resolve, commit, then run 'forklift build merge' again.",
                    original_branch, merge_branch
                );
            }
        }
    }
    Ok(())
}

fn status(ctx: &Context) -> Result<()> {
    let git = ctx.git()?;
    let store = CheckpointStore::in_git_dir(&git.git_dir()?);

    match store.load()? {
        None => println!("No build in progress."),
        Some(checkpoint) => {
            println!("Build in progress for {}", checkpoint.repo_identifier);
            println!("  merging:  {} -> {}", checkpoint.original_branch, checkpoint.merge_branch);
            println!(
                "  stashed:  {}",
                if checkpoint.stashed { "yes" } else { "no" }
            );
            println!("  ledger row: {}", checkpoint.row_index);
            if git.merge_in_progress() {
                println!("Conflicts are unresolved. Resolve them, commit, then run 'forklift build merge'.");
            } else {
                println!("Run 'forklift build merge' to finish, or 'forklift build abort' to abandon.");
            }
        }
    }
    Ok(())
}

fn abort(ctx: &Context) -> Result<()> {
    let git = ctx.git()?;
    let checkpoint = BuildAbort::new(&git, ctx.reporter())?.run()?;
    ctx.say(&format!(
        "Abandoned build of {} into {}.",
        checkpoint.original_branch, checkpoint.merge_branch
    ));
    Ok(())
}
