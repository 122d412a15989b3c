//! # Configuration
//!
//! forklift keeps its per-operator settings in a JSON file, by default at
//! `<config dir>/forklift/config.json` (see [`default_config_path`]). The
//! file is written by `forklift init` and holds secrets (a GitHub token, the
//! path to a service-account key), so it is saved owner-only.
//!
//! ## Format
//!
//! ```json
//! {
//!   "sheet_id": "1AbC...",
//!   "sheet_name": "merge_branches",
//!   "credentials_path": "/home/me/.config/forklift/credentials.json",
//!   "github_token": "ghp_...",
//!   "poll_interval": 30,
//!   "poll_timeout": 30
//! }
//! ```
//!
//! Every field is optional. `ledger_file` switches from the spreadsheet to a
//! local JSON ledger; `remote` and `max_tag_attempts` tune builds.
//!
//! ## Environment overrides
//!
//! Applied by [`Config::load`] on top of the file:
//! `FORKLIFT_SHEET_ID`, `FORKLIFT_SHEET_NAME`, `FORKLIFT_GOOGLE_CREDENTIALS`,
//! `FORKLIFT_GITHUB_TOKEN`, `FORKLIFT_LEDGER_FILE`.
//!
//! [`default_config_path`]: crate::defaults::default_config_path

use log::debug;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::build::BuildOptions;
use crate::defaults;
use crate::error::{Error, Result};
use crate::ledger::{AccessToken, FileLedger, Ledger, SheetsLedger};

/// Operator configuration as stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet_name: Option<String>,
    /// Service-account key for the Sheets API. Must be absolute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_token: Option<String>,
    /// Seconds between workflow status checks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_interval: Option<u64>,
    /// Minutes before polling gives up.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_timeout: Option<u64>,
    /// Local JSON ledger used instead of the spreadsheet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tag_attempts: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,
}

impl Config {
    /// Reads the configuration file and applies environment overrides.
    ///
    /// A missing file is an empty configuration.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = Self::read(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Reads the configuration file as stored, without environment
    /// overrides. Used by `init` so overrides are never persisted.
    pub fn read(path: &Path) -> Result<Self> {
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no configuration at {}", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&data).map_err(|e| {
            Error::config(
                format!("invalid configuration file {}: {}", path.display(), e),
                "fix the file by hand or run 'forklift init' again",
            )
        })
    }

    /// Writes the configuration, creating its directory owner-only.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            create_private_dir(parent)?;
        }
        let data = serde_json::to_string_pretty(self)?;

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(path)?;
        file.write_all(data.as_bytes())?;
        file.write_all(b"\n")?;
        debug!("saved configuration to {}", path.display());
        Ok(())
    }

    /// Overlays the `FORKLIFT_*` environment variables that are set and
    /// non-empty.
    pub fn apply_env_overrides(&mut self) {
        if let Some(v) = env_value("FORKLIFT_SHEET_ID") {
            self.sheet_id = Some(v);
        }
        if let Some(v) = env_value("FORKLIFT_SHEET_NAME") {
            self.sheet_name = Some(v);
        }
        if let Some(v) = env_value("FORKLIFT_GOOGLE_CREDENTIALS") {
            self.credentials_path = Some(PathBuf::from(v));
        }
        if let Some(v) = env_value("FORKLIFT_GITHUB_TOKEN") {
            self.github_token = Some(v);
        }
        if let Some(v) = env_value("FORKLIFT_LEDGER_FILE") {
            self.ledger_file = Some(PathBuf::from(v));
        }
    }

    pub fn sheet_name(&self) -> &str {
        self.sheet_name
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults::DEFAULT_SHEET_NAME)
    }

    pub fn github_token(&self) -> Option<&str> {
        self.github_token.as_deref().filter(|t| !t.is_empty())
    }

    pub fn poll_interval_secs(&self) -> u64 {
        self.poll_interval
            .filter(|v| *v > 0)
            .unwrap_or(defaults::DEFAULT_POLL_INTERVAL_SECS)
    }

    pub fn poll_timeout_mins(&self) -> u64 {
        self.poll_timeout
            .filter(|v| *v > 0)
            .unwrap_or(defaults::DEFAULT_POLL_TIMEOUT_MINS)
    }

    pub fn remote(&self) -> &str {
        self.remote
            .as_deref()
            .filter(|r| !r.is_empty())
            .unwrap_or(defaults::DEFAULT_REMOTE)
    }

    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            remote: self.remote().to_string(),
            max_tag_attempts: self
                .max_tag_attempts
                .filter(|n| *n > 0)
                .unwrap_or(defaults::DEFAULT_MAX_TAG_ATTEMPTS),
        }
    }

    /// True when a ledger backend is configured.
    pub fn has_ledger(&self) -> bool {
        self.ledger_file.is_some() || self.sheet_id.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// Opens the configured ledger: the local file when `ledger_file` is
    /// set, otherwise the spreadsheet.
    pub fn open_ledger(&self) -> Result<Box<dyn Ledger>> {
        if let Some(path) = &self.ledger_file {
            debug!("using file ledger {}", path.display());
            return Ok(Box::new(FileLedger::new(path.clone())));
        }

        let sheet_id = match self.sheet_id.as_deref().filter(|s| !s.is_empty()) {
            Some(id) => id,
            None => return Err(not_initialised()),
        };
        let credentials = self.credentials_path.as_deref().ok_or_else(not_initialised)?;
        if !credentials.is_absolute() {
            return Err(Error::config(
                format!(
                    "credentials path must be absolute: {}",
                    credentials.display()
                ),
                "run 'forklift init' again to store an absolute path",
            ));
        }

        let token = AccessToken::from_env_or_credentials(credentials).resolve()?;
        debug!("using sheet {} ({})", sheet_id, self.sheet_name());
        Ok(Box::new(SheetsLedger::new(
            sheet_id,
            self.sheet_name(),
            token,
        )?))
    }
}

fn not_initialised() -> Error {
    Error::config(
        "configuration not found. run 'forklift init' first.",
        "or set ledger_file / FORKLIFT_LEDGER_FILE to use a local ledger",
    )
}

fn env_value(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn create_private_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(dir, fs::Permissions::from_mode(0o700))?;
    }
    Ok(())
}
