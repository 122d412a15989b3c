//! # Output Configuration
//!
//! Controls how progress lines look on the console. Every major build
//! transition (stash, checkout, pull, merge, tag, push, ledger update) prints
//! one line prefixed with an emoji, or a bracketed plain-text marker when
//! colour is disabled.
//!
//! ## Respecting User Preferences
//!
//! - `--color=never|always|auto` - CLI flag for color control
//! - `NO_COLOR` - Disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - Disables colors
//! - `CLICOLOR_FORCE=1` - Forces colors even in non-TTY
//! - `TERM=dumb` - Disables colors for dumb terminals
//!
//! Progress lines are observational only; nothing parses them.

use std::env;

/// Output configuration for controlling colors and emojis.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors and emojis should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// Create an output configuration from environment and CLI flag.
    ///
    /// - `always`: force colors on (overrides NO_COLOR)
    /// - `never`: force colors off
    /// - anything else: detect based on environment
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    /// Detect whether color output is supported based on environment.
    fn detect_color_support() -> bool {
        // The presence of the variable (even if empty) disables colors
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }

        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }

        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }

        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        console::Term::stdout().features().colors_supported()
    }

    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Returns the emoji when colors are enabled, otherwise the plain text.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}

/// Kinds of progress line, each with its own marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Stash,
    Checkout,
    Pull,
    Merge,
    Tag,
    Push,
    Ledger,
    Resume,
    Restore,
    Done,
    Warning,
}

impl Step {
    fn markers(self) -> (&'static str, &'static str) {
        match self {
            Step::Stash => ("📦", "[STASH]"),
            Step::Checkout => ("🔄", "[CHECKOUT]"),
            Step::Pull => ("📥", "[PULL]"),
            Step::Merge => ("🔀", "[MERGE]"),
            Step::Tag => ("🏷️ ", "[TAG]"),
            Step::Push => ("🚀", "[PUSH]"),
            Step::Ledger => ("📊", "[LEDGER]"),
            Step::Resume => ("⏯️ ", "[RESUME]"),
            Step::Restore => ("⬅️ ", "[RESTORE]"),
            Step::Done => ("🎉", "[DONE]"),
            Step::Warning => ("⚠️ ", "[WARN]"),
        }
    }
}

/// Prints progress lines to stdout.
#[derive(Debug, Clone)]
pub struct Reporter {
    config: OutputConfig,
    quiet: bool,
}

impl Reporter {
    pub fn new(config: OutputConfig, quiet: bool) -> Self {
        Self { config, quiet }
    }

    /// A reporter that prints nothing.
    pub fn silent() -> Self {
        Self::new(OutputConfig::without_color(), true)
    }

    /// Formats one progress line.
    pub fn line(&self, step: Step, message: &str) -> String {
        let (emoji_str, plain) = step.markers();
        format!("{} {}", emoji(&self.config, emoji_str, plain), message)
    }

    pub fn step(&self, step: Step, message: &str) {
        if !self.quiet {
            println!("{}", self.line(step, message));
        }
    }

    /// Free-form text (guidance after a conflict, status output).
    pub fn note(&self, message: &str) {
        if !self.quiet {
            println!("{}", message);
        }
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(OutputConfig::default(), false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_always() {
        let config = OutputConfig::from_env_and_flag("always");
        assert!(config.use_color);
    }

    #[test]
    fn test_color_never() {
        let config = OutputConfig::from_env_and_flag("never");
        assert!(!config.use_color);
    }

    #[test]
    fn test_emoji_helper() {
        assert_eq!(emoji(&OutputConfig::with_color(), "📦", "[STASH]"), "📦");
        assert_eq!(emoji(&OutputConfig::without_color(), "📦", "[STASH]"), "[STASH]");
    }

    #[test]
    fn test_reporter_line_plain() {
        let reporter = Reporter::new(OutputConfig::without_color(), false);
        assert_eq!(
            reporter.line(Step::Pull, "Pulling latest for release..."),
            "[PULL] Pulling latest for release..."
        );
    }

    #[test]
    fn test_reporter_line_emoji() {
        let reporter = Reporter::new(OutputConfig::with_color(), false);
        assert!(reporter.line(Step::Push, "Pushing tag...").starts_with("🚀"));
    }
}
