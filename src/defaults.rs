//! Default values for forklift configuration.
//!
//! Centralised so the config loader, the CLI flags and the orchestrator
//! agree on them.

use std::path::PathBuf;

/// Remote the merge branch is pulled from and pushed to.
pub const DEFAULT_REMOTE: &str = "origin";

/// Worksheet (tab) holding the ledger rows.
pub const DEFAULT_SHEET_NAME: &str = "merge_branches";

/// Upper bound on candidates the tag collision loop will try.
pub const DEFAULT_MAX_TAG_ATTEMPTS: usize = 100;

/// Seconds between workflow status checks.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

/// Minutes before `poll tag` gives up.
pub const DEFAULT_POLL_TIMEOUT_MINS: u64 = 30;

/// Returns the default configuration file path.
///
/// Uses the platform configuration directory:
/// - Linux: `~/.config/forklift/config.json`
/// - macOS: `~/Library/Application Support/forklift/config.json`
/// - Windows: `{FOLDERID_RoamingAppData}\forklift\config.json`
///
/// Falls back to `.forklift/config.json` in the current directory if the
/// platform directory cannot be determined. Overridden by `--config` or
/// `FORKLIFT_CONFIG`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".forklift"))
        .join("forklift")
        .join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_path_file_name() {
        let path = default_config_path();
        assert!(path.ends_with("forklift/config.json"));
    }

    #[test]
    fn test_default_config_path_is_absolute_or_fallback() {
        let path = default_config_path();
        assert!(
            path.is_absolute() || path.starts_with(".forklift"),
            "Expected absolute path or fallback, got: {:?}",
            path
        );
    }
}
