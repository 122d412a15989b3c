//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use forklift::defaults::default_config_path;
use forklift::output::OutputConfig;

use crate::commands::{self, Context};

/// forklift - merge, tag and track release branches across repositories
#[derive(Parser, Debug)]
#[command(name = "forklift")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,

    /// Path to the configuration file
    #[arg(long, global = true, value_name = "PATH", env = "FORKLIFT_CONFIG")]
    config: Option<PathBuf>,

    /// Suppress progress output
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Set up the ledger spreadsheet, credentials and polling defaults
    Init(commands::init::InitArgs),

    /// Change ledger assignments for the current repository
    Set(commands::set::SetArgs),

    /// Read ledger assignments for the current repository
    Get(commands::get::GetArgs),

    /// Merge the current branch into the merge branch and release a tag
    Build(commands::build::BuildArgs),

    /// Watch the CI workflow triggered by a release tag
    Poll(commands::poll::PollArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);

        let ctx = Context {
            config_path: self.config.unwrap_or_else(default_config_path),
            output: OutputConfig::from_env_and_flag(&self.color),
            quiet: self.quiet,
        };

        match self.command {
            Commands::Init(args) => commands::init::execute(&ctx, args),
            Commands::Set(args) => commands::set::execute(&ctx, args),
            Commands::Get(args) => commands::get::execute(&ctx, args),
            Commands::Build(args) => commands::build::execute(&ctx, args),
            Commands::Poll(args) => commands::poll::execute(&ctx, args),
        }
    }
}

/// `RUST_LOG` wins over `--log-level` when set.
fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .try_init();
}
