//! # Poll Command Implementation
//!
//! `forklift poll tag [TAG]` watches the GitHub Actions run triggered by a
//! pushed release tag and notifies the operator when it finishes. Without a
//! tag (or with `--latest`) the ledger's last tag is used.

use anyhow::{bail, Context as _, Result};
use chrono::Utc;
use clap::{Args, Subcommand};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::warn;
use std::time::{Duration, Instant};

use forklift::github::{format_duration, GithubClient, WorkflowStatus};
use forklift::notification;

use super::{detect_repo, open_ledger, Context};

/// Watch the CI workflow triggered by a release tag
#[derive(Args, Debug)]
pub struct PollArgs {
    #[command(subcommand)]
    target: PollTarget,
}

#[derive(Subcommand, Debug)]
enum PollTarget {
    /// Poll the workflow run for a tag
    Tag(PollTagArgs),
}

#[derive(Args, Debug)]
struct PollTagArgs {
    /// Tag to watch (defaults to the ledger's latest tag)
    tag: Option<String>,

    /// Watch the latest tag from the ledger
    #[arg(short, long)]
    latest: bool,

    /// Seconds between checks (default from config, else 30)
    #[arg(short, long, value_name = "SECONDS")]
    interval: Option<u64>,

    /// Minutes before giving up (default from config, else 30)
    #[arg(short, long, value_name = "MINUTES")]
    timeout: Option<u64>,

    /// Disable desktop notifications
    #[arg(long)]
    no_notify: bool,
}

/// How polling ended.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PollResult {
    Completed(WorkflowStatus),
    TimedOut { run_seen: bool },
}

/// Execute the `poll` command.
pub fn execute(ctx: &Context, args: PollArgs) -> Result<()> {
    match args.target {
        PollTarget::Tag(args) => poll_tag(ctx, args),
    }
}

fn poll_tag(ctx: &Context, args: PollTagArgs) -> Result<()> {
    let config = ctx.load_config()?;
    let git = ctx.git()?;
    let repo = detect_repo(&git, &config)?;

    let tag = match args.tag.filter(|t| !args.latest && !t.is_empty()) {
        Some(tag) => tag,
        None => {
            let ledger = open_ledger(&config)?;
            let target = ledger
                .resolve_repo_target(&repo)
                .context("failed to read repo info")?;
            match target.filter(|t| !t.last_tag.is_empty()) {
                Some(target) => {
                    ctx.say(&format!("📋 Using latest tag from ledger: {}", target.last_tag));
                    target.last_tag
                }
                None => bail!("no tag found in ledger for {}", repo),
            }
        }
    };

    let token = config.github_token().map(str::to_string);
    if token.is_none() {
        ctx.say("⚠️  No GitHub token configured. API rate limits will be very restrictive.");
        ctx.say("   Run 'forklift init' to add your GitHub token.");
    }
    let client = GithubClient::new(&repo, token)?;

    let interval = Duration::from_secs(args.interval.unwrap_or_else(|| config.poll_interval_secs()));
    let timeout_mins = args.timeout.unwrap_or_else(|| config.poll_timeout_mins());
    let timeout = Duration::from_secs(timeout_mins * 60);

    ctx.say(&format!("🏷️  Polling workflow for tag {}...", tag));
    ctx.say(&format!(
        "⏱️  Interval: {}s | Timeout: {}m\n",
        interval.as_secs(),
        timeout_mins
    ));

    let spinner = wait_spinner(ctx);
    let result = poll_until_done(
        || client.workflow_status_for_tag(&tag),
        interval,
        timeout,
        |line| spinner.suspend(|| ctx.say(line)),
        |wait| {
            spinner.set_message(format!("next check in {}", format_duration(wait)));
            std::thread::sleep(wait);
        },
    );
    spinner.finish_and_clear();

    match result {
        PollResult::Completed(run) => report_completion(ctx, &tag, &run, !args.no_notify),
        PollResult::TimedOut { run_seen } => {
            if run_seen {
                ctx.say("\n⏰ Timeout reached.");
            } else {
                ctx.say("\n⏰ Timeout reached. No workflow found.");
            }
        }
    }
    Ok(())
}

fn wait_spinner(ctx: &Context) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if ctx.quiet || !ctx.output.use_color {
        spinner.set_draw_target(ProgressDrawTarget::hidden());
    } else if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg}") {
        spinner.set_style(style);
        spinner.enable_steady_tick(Duration::from_millis(120));
    }
    spinner
}

/// Checks `fetch` every `interval` until the run completes or `timeout`
/// elapses. Fetch errors count as "not started yet".
fn poll_until_done<F, P, S>(
    mut fetch: F,
    interval: Duration,
    timeout: Duration,
    mut print: P,
    mut sleep: S,
) -> PollResult
where
    F: FnMut() -> forklift::error::Result<Option<WorkflowStatus>>,
    P: FnMut(&str),
    S: FnMut(Duration),
{
    let started = Instant::now();
    let mut run_seen = false;

    loop {
        let run = fetch().unwrap_or_else(|err| {
            warn!("workflow status check failed: {}", err);
            None
        });

        match run {
            None => print(&format!(
                "⏳ Waiting for workflow to start... ({} elapsed)",
                format_duration(started.elapsed())
            )),
            Some(run) if run.is_completed() => return PollResult::Completed(run),
            Some(run) => {
                run_seen = true;
                if run.status == "queued" {
                    print("⏳ Status: queued (waiting to start)");
                } else {
                    let running = (Utc::now() - run.created_at).to_std().unwrap_or_default();
                    print(&format!(
                        "⏳ Status: {} (running for {})",
                        run.status,
                        format_duration(running)
                    ));
                }
            }
        }

        if started.elapsed() >= timeout {
            return PollResult::TimedOut { run_seen };
        }
        sleep(interval);
    }
}

fn report_completion(ctx: &Context, tag: &str, run: &WorkflowStatus, notify: bool) {
    ctx.say("");
    let conclusion = run.conclusion.as_deref().unwrap_or("unknown");
    let notice = match conclusion {
        "success" => {
            ctx.say("✅ Workflow completed successfully! 🎉");
            Some(("Forklift Build Complete", format!("Tag {} built successfully!", tag)))
        }
        "failure" => {
            ctx.say("❌ Workflow failed.");
            Some(("Forklift Build Failed", format!("Tag {} build failed.", tag)))
        }
        "cancelled" => {
            ctx.say("⚠️  Workflow was cancelled.");
            Some(("Forklift Build Cancelled", format!("Tag {} build was cancelled.", tag)))
        }
        other => {
            ctx.say(&format!("⚠️  Workflow completed with status: {}", other));
            None
        }
    };
    ctx.say(&format!("🔗 {}", run.html_url));

    if let (true, Some((title, message))) = (notify, notice) {
        notification::notify(title, &message);
    }
}
