//! # Get Command Implementation
//!
//! Read-only views of the current repository's ledger row.

use anyhow::Result;
use clap::{Args, Subcommand};
use log::warn;

use forklift::clipboard;

use super::{fetch_target, Context};

/// Read ledger assignments for the current repository
#[derive(Args, Debug)]
pub struct GetArgs {
    #[command(subcommand)]
    target: GetTarget,
}

#[derive(Subcommand, Debug)]
enum GetTarget {
    /// Show the assigned merge branch
    Branch,

    /// Show the last tag issued on the merge branch
    Tag(TagArgs),
}

#[derive(Args, Debug)]
struct TagArgs {
    /// Copy the tag to the clipboard
    #[arg(short, long)]
    copy: bool,
}

/// Execute the `get` command.
pub fn execute(ctx: &Context, args: GetArgs) -> Result<()> {
    let (_, target) = fetch_target(ctx)?;

    match args.target {
        GetTarget::Branch => match target.filter(|t| !t.merge_branch.is_empty()) {
            None => println!("Merge branch not set."),
            Some(target) => {
                println!("Merge branch: {}", target.merge_branch);
                if !target.last_user.is_empty() {
                    println!("Last updated by: {}", target.last_user);
                }
            }
        },
        GetTarget::Tag(tag_args) => match target.filter(|t| !t.last_tag.is_empty()) {
            None => println!("No tag found."),
            Some(target) => {
                println!("Latest tag: {}", target.last_tag);
                if tag_args.copy {
                    match clipboard::copy(&target.last_tag) {
                        Ok(()) => ctx.say("📋 Tag copied to clipboard!"),
                        Err(err) => {
                            warn!("{}", err);
                            println!("Failed to copy to clipboard: {}", err);
                        }
                    }
                }
            }
        },
    }
    Ok(())
}
