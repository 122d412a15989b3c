//! # Init Command Implementation
//!
//! Interactive wizard that writes the forklift configuration: the ledger
//! spreadsheet, the service-account credentials, and the optional GitHub
//! polling settings. Existing values are offered as defaults, so re-running
//! `init` edits the configuration in place.

use anyhow::{bail, Context as _, Result};
use clap::Args;
use dialoguer::{theme::ColorfulTheme, Input};
use std::path::{Path, PathBuf};

use forklift::config::Config;
use forklift::defaults;
use forklift::ledger::extract_sheet_id;

use super::Context;

/// Set up the ledger spreadsheet, credentials and polling defaults
#[derive(Args, Debug)]
pub struct InitArgs {}

/// Raw wizard input; empty strings keep the current value.
#[derive(Debug, Default)]
struct Answers {
    sheet: String,
    credentials: String,
    sheet_name: String,
    github_token: String,
    poll_interval: String,
    poll_timeout: String,
}

/// Execute the `init` command.
pub fn execute(ctx: &Context, _args: InitArgs) -> Result<()> {
    if !console::Term::stderr().is_term() {
        bail!("'forklift init' is interactive and needs a terminal");
    }

    let current = Config::read(&ctx.config_path).unwrap_or_default();
    let answers = prompt_answers(&current)?;
    let cwd = std::env::current_dir().context("failed to get current directory")?;
    let config = apply_answers(&current, answers, &cwd)?;

    config
        .save(&ctx.config_path)
        .context("Failed to save config")?;
    ctx.say("🏗️  Configuration saved successfully! You're ready to roll.");
    Ok(())
}

fn prompt_answers(current: &Config) -> Result<Answers> {
    let theme = ColorfulTheme::default();
    let ask = |label: &str, current: &str| -> Result<String> {
        let mut input = Input::<String>::with_theme(&theme)
            .with_prompt(label)
            .allow_empty(true);
        if !current.is_empty() {
            input = input.default(current.to_string()).show_default(true);
        }
        Ok(input.interact_text()?)
    };

    let mut answers = Answers {
        sheet: ask(
            "Enter Google Sheet URL or ID",
            current.sheet_id.as_deref().unwrap_or_default(),
        )?,
        credentials: ask(
            "Enter path to credentials.json",
            &current
                .credentials_path
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        )?,
        sheet_name: ask("Enter Sheet Name", current.sheet_name())?,
        ..Answers::default()
    };

    println!("\n--- GitHub Actions Polling (Optional) ---");
    answers.github_token = ask(
        "Enter GitHub Token (press Enter to skip/keep)",
        current.github_token().unwrap_or_default(),
    )?;
    if !answers.github_token.is_empty() || current.github_token().is_some() {
        answers.poll_interval = ask(
            "Enter polling interval in seconds",
            &current.poll_interval_secs().to_string(),
        )?;
        answers.poll_timeout = ask(
            "Enter polling timeout in minutes",
            &current.poll_timeout_mins().to_string(),
        )?;
    }
    Ok(answers)
}

/// Folds the wizard answers into the current configuration.
fn apply_answers(current: &Config, answers: Answers, cwd: &Path) -> Result<Config> {
    let mut config = current.clone();

    let sheet = answers.sheet.trim();
    if sheet.is_empty() {
        if current.sheet_id.is_none() {
            bail!("Sheet ID is required");
        }
    } else {
        config.sheet_id = Some(
            extract_sheet_id(sheet).with_context(|| format!("Invalid Sheet URL/ID: {}", sheet))?,
        );
    }

    let credentials = answers.credentials.trim();
    if credentials.is_empty() {
        if current.credentials_path.is_none() {
            bail!("Credentials path is required");
        }
    } else {
        config.credentials_path = Some(absolute(credentials, cwd));
    }

    let sheet_name = answers.sheet_name.trim();
    config.sheet_name = Some(if sheet_name.is_empty() {
        current.sheet_name().to_string()
    } else {
        sheet_name.to_string()
    });

    let token = answers.github_token.trim();
    if !token.is_empty() {
        config.github_token = Some(token.to_string());
    }

    if let Some(secs) = parse_positive(&answers.poll_interval, "polling interval")? {
        config.poll_interval = Some(secs);
    } else if config.poll_interval.is_none() {
        config.poll_interval = Some(defaults::DEFAULT_POLL_INTERVAL_SECS);
    }
    if let Some(mins) = parse_positive(&answers.poll_timeout, "polling timeout")? {
        config.poll_timeout = Some(mins);
    } else if config.poll_timeout.is_none() {
        config.poll_timeout = Some(defaults::DEFAULT_POLL_TIMEOUT_MINS);
    }

    Ok(config)
}

fn absolute(path: &str, cwd: &Path) -> PathBuf {
    let path = PathBuf::from(path);
    if path.is_absolute() {
        path
    } else {
        cwd.join(path)
    }
}

fn parse_positive(input: &str, what: &str) -> Result<Option<u64>> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    match input.parse::<u64>() {
        Ok(0) | Err(_) => bail!("Invalid {}: {} (expected a positive number)", what, input),
        Ok(n) => Ok(Some(n)),
    }
}
