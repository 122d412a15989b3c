//! GitHub Actions client used by `forklift poll tag`.
//!
//! Pushing a release tag triggers a workflow run whose `head_branch` is the
//! tag name. The client lists the most recent push-triggered runs and picks
//! the newest one for the tag.

use chrono::{DateTime, Utc};
use log::debug;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::error::{Error, Result};

pub const GITHUB_API_BASE: &str = "https://api.github.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const RUNS_PER_PAGE: &str = "10";

/// One workflow run as reported by the Actions API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorkflowStatus {
    #[serde(rename = "id")]
    pub run_id: u64,
    /// `queued`, `in_progress` or `completed`.
    pub status: String,
    /// `success`, `failure`, `cancelled`, ...; `None` until completed.
    pub conclusion: Option<String>,
    pub html_url: String,
    #[serde(default)]
    pub head_branch: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl WorkflowStatus {
    pub fn is_completed(&self) -> bool {
        self.status == "completed"
    }
}

#[derive(Debug, Deserialize)]
struct WorkflowRuns {
    #[serde(default)]
    workflow_runs: Vec<WorkflowStatus>,
}

/// Read-only client for one repository's workflow runs.
pub struct GithubClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    owner: String,
    repo: String,
}

impl GithubClient {
    /// `repository` is the `owner/name` identifier.
    pub fn new(repository: &str, token: Option<String>) -> Result<Self> {
        Self::with_base_url(GITHUB_API_BASE, repository, token)
    }

    pub fn with_base_url(base_url: &str, repository: &str, token: Option<String>) -> Result<Self> {
        let (owner, repo) = match repository.split('/').collect::<Vec<_>>().as_slice() {
            [owner, repo] if !owner.is_empty() && !repo.is_empty() => {
                (owner.to_string(), repo.to_string())
            }
            _ => {
                return Err(Error::config(
                    format!("invalid repo format: {} (expected org/repo)", repository),
                    "check the URL of the 'origin' remote",
                ))
            }
        };
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            owner,
            repo,
        })
    }

    fn runs_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| {
                Error::config(
                    format!("invalid GitHub API base URL: {}", self.base_url),
                    "use an http(s) URL",
                )
            })?
            .extend(["repos", &self.owner, &self.repo, "actions", "runs"]);
        url.query_pairs_mut()
            .append_pair("event", "push")
            .append_pair("per_page", RUNS_PER_PAGE);
        Ok(url)
    }

    /// The newest run triggered by pushing `tag`, or `None` if no run has
    /// started yet.
    pub fn workflow_status_for_tag(&self, tag: &str) -> Result<Option<WorkflowStatus>> {
        let url = self.runs_url()?;
        debug!("GET {}", url);
        let mut request = self
            .client
            .get(url)
            .header(ACCEPT, "application/vnd.github.v3+json")
            .header(USER_AGENT, concat!("forklift/", env!("CARGO_PKG_VERSION")));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::GithubApi {
                status: status.as_u16(),
                message: body.trim().to_string(),
            });
        }

        let runs: WorkflowRuns = response.json()?;
        Ok(runs
            .workflow_runs
            .into_iter()
            .find(|run| run.head_branch.as_deref() == Some(tag)))
    }
}

/// Formats an elapsed time as `1h2m3s`, `4m5s` or `6s`.
pub fn format_duration(elapsed: Duration) -> String {
    let total = elapsed.as_secs() + u64::from(elapsed.subsec_millis() >= 500);
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{}h{}m{}s", h, m, s)
    } else if m > 0 {
        format!("{}m{}s", m, s)
    } else {
        format!("{}s", s)
    }
}
