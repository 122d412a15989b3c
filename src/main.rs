//! # forklift CLI
//!
//! Binary entry point for the `forklift` command-line tool. Parses arguments
//! with `clap` and dispatches to the command implementations in `commands/`.
//! A failed command surfaces as a non-zero exit with the error on stderr.
//!
//! The workflow logic lives in the `forklift` library crate; the binary is a
//! thin wrapper around it.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
