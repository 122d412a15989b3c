//! # Set Command Implementation
//!
//! `forklift set merge-branch <name>` assigns the release branch for the
//! current repository. A new assignment starts a new tag sequence: the last
//! tag is cleared, so the next build seeds `v-<name>-0.0.1`.

use anyhow::{bail, Context as _, Result};
use clap::{Args, Subcommand};
use dialoguer::{theme::ColorfulTheme, Confirm};

use forklift::repository::GitOperations;

use super::{detect_repo, open_ledger, Context};

/// Change ledger assignments for the current repository
#[derive(Args, Debug)]
pub struct SetArgs {
    #[command(subcommand)]
    target: SetTarget,
}

#[derive(Subcommand, Debug)]
enum SetTarget {
    /// Assign the merge branch and start a new tag sequence
    MergeBranch(MergeBranchArgs),
}

#[derive(Args, Debug)]
struct MergeBranchArgs {
    /// Name of the branch releases are merged into
    name: String,

    /// Override an existing assignment without asking
    #[arg(short, long)]
    yes: bool,
}

/// Execute the `set` command.
pub fn execute(ctx: &Context, args: SetArgs) -> Result<()> {
    match args.target {
        SetTarget::MergeBranch(args) => set_merge_branch(ctx, args),
    }
}

fn set_merge_branch(ctx: &Context, args: MergeBranchArgs) -> Result<()> {
    let branch = args.name.trim();
    if branch.is_empty() {
        bail!("merge-branch name cannot be empty");
    }

    let config = ctx.load_config()?;
    let ledger = open_ledger(&config)?;
    let git = ctx.git()?;
    let repo = detect_repo(&git, &config)?;

    let existing = ledger
        .resolve_repo_target(&repo)
        .context("failed to read repo info")?;

    if let Some(current) = existing.as_ref().filter(|t| !t.merge_branch.is_empty()) {
        if !args.yes && !confirm_override(&repo, &current.merge_branch)? {
            ctx.say("Aborted.");
            return Ok(());
        }
    }

    let identity = git.user_identity();
    ledger
        .assign_merge_branch(&repo, branch, existing.map(|t| t.row), &identity)
        .context("failed to set merge-branch")?;

    ctx.say(&format!("merge-branch set for {}: {}", repo, branch));
    Ok(())
}

fn confirm_override(repo: &str, current: &str) -> Result<bool> {
    if !console::Term::stderr().is_term() {
        bail!(
            "merge branch already set for {}: {}. Re-run with --yes to override.",
            repo,
            current
        );
    }
    let confirmed = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(format!(
            "Merge branch already set for {}: {}. Override and start new tag sequence?",
            repo, current
        ))
        .default(false)
        .interact()?;
    Ok(confirmed)
}
