//! Google Sheets ledger backend.
//!
//! Talks to the Sheets v4 `values` REST API. Each repository is one row:
//!
//! | A    | B            | C                 | D        | E        |
//! |------|--------------|-------------------|----------|----------|
//! | repo | merge branch | updated (RFC3339) | last tag | identity |

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;
use std::time::Duration;

use log::debug;
use regex::Regex;
use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use super::{find_row, timestamp, Ledger, RepoTarget, RowHandle};
use crate::error::{Error, Result};

/// Public Sheets API endpoint.
pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the OAuth access token for the Sheets API comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessToken {
    /// A token supplied directly (e.g. `FORKLIFT_GOOGLE_ACCESS_TOKEN`).
    Static(String),
    /// Minted by `gcloud` from a service-account credentials file.
    Gcloud { credentials_path: PathBuf },
}

impl AccessToken {
    /// Picks the token source: the explicit environment token if present,
    /// otherwise `gcloud` with the configured credentials file.
    pub fn from_env_or_credentials(credentials_path: &Path) -> Self {
        match std::env::var("FORKLIFT_GOOGLE_ACCESS_TOKEN") {
            Ok(token) if !token.trim().is_empty() => AccessToken::Static(token.trim().to_string()),
            _ => AccessToken::Gcloud {
                credentials_path: credentials_path.to_path_buf(),
            },
        }
    }

    /// Produces a bearer token.
    pub fn resolve(&self) -> Result<String> {
        match self {
            AccessToken::Static(token) => Ok(token.clone()),
            AccessToken::Gcloud { credentials_path } => {
                debug!(
                    "minting Sheets access token with gcloud for {}",
                    credentials_path.display()
                );
                let output = Command::new("gcloud")
                    .args(["auth", "application-default", "print-access-token"])
                    .env("GOOGLE_APPLICATION_CREDENTIALS", credentials_path)
                    .output()
                    .map_err(|e| {
                        Error::config(
                            format!("failed to run gcloud: {}", e),
                            "install the Google Cloud CLI or set FORKLIFT_GOOGLE_ACCESS_TOKEN",
                        )
                    })?;
                if !output.status.success() {
                    return Err(Error::config(
                        format!(
                            "gcloud could not mint an access token: {}",
                            String::from_utf8_lossy(&output.stderr).trim()
                        ),
                        "check FORKLIFT_GOOGLE_CREDENTIALS points at a valid service-account key",
                    ));
                }
                let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if token.is_empty() {
                    return Err(Error::config(
                        "gcloud returned an empty access token",
                        "run 'gcloud auth application-default login' or set FORKLIFT_GOOGLE_ACCESS_TOKEN",
                    ));
                }
                Ok(token)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Ledger stored in one tab of a Google spreadsheet.
pub struct SheetsLedger {
    client: Client,
    base_url: String,
    sheet_id: String,
    sheet_name: String,
    token: String,
}

impl SheetsLedger {
    pub fn new(sheet_id: &str, sheet_name: &str, token: String) -> Result<Self> {
        Self::with_base_url(SHEETS_API_BASE, sheet_id, sheet_name, token)
    }

    /// Like [`SheetsLedger::new`] against a different API host.
    pub fn with_base_url(
        base_url: &str,
        sheet_id: &str,
        sheet_name: &str,
        token: String,
    ) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            sheet_id: sheet_id.to_string(),
            sheet_name: sheet_name.to_string(),
            token,
        })
    }

    /// `.../v4/spreadsheets/{id}/values/{range}{suffix}`
    fn values_url(&self, range: &str, suffix: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| Error::config(format!("invalid Sheets API base URL: {}", self.base_url), "use an http(s) URL"))?
            .extend([
                "v4",
                "spreadsheets",
                &self.sheet_id,
                "values",
                &format!("{}{}", range, suffix),
            ]);
        Ok(url)
    }

    fn range(&self, cells: &str) -> String {
        format!("{}!{}", self.sheet_name, cells)
    }

    fn check(operation: &str, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        Err(Error::Ledger {
            operation: operation.to_string(),
            message: format!("Sheets API returned {}: {}", status, body.trim()),
        })
    }

    fn read_rows(&self) -> Result<Vec<Vec<String>>> {
        let url = self.values_url(&self.range("A:E"), "")?;
        debug!("GET {}", url);
        let response = self.client.get(url).bearer_auth(&self.token).send()?;
        let body: ValueRange = Self::check("read", response)?.json()?;
        Ok(body
            .values
            .iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect())
    }

    fn update(&self, operation: &str, cells: &str, values: Vec<String>) -> Result<()> {
        let url = self.values_url(&self.range(cells), "")?;
        debug!("PUT {}", url);
        let response = self
            .client
            .put(url)
            .bearer_auth(&self.token)
            .query(&[("valueInputOption", "RAW")])
            .json(&json!({ "values": [values] }))
            .send()?;
        Self::check(operation, response).map(|_| ())
    }

    fn append(&self, operation: &str, values: Vec<String>) -> Result<()> {
        let url = self.values_url(&self.range("A:E"), ":append")?;
        debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
            .json(&json!({ "values": [values] }))
            .send()?;
        Self::check(operation, response).map(|_| ())
    }
}

impl Ledger for SheetsLedger {
    fn resolve_repo_target(&self, repo: &str) -> Result<Option<RepoTarget>> {
        let rows = self.read_rows()?;
        Ok(find_row(&rows, repo))
    }

    fn assign_merge_branch(
        &self,
        repo: &str,
        branch: &str,
        row: Option<RowHandle>,
        identity: &str,
    ) -> Result<()> {
        let now = timestamp();
        match row {
            Some(row) => {
                // Sheet rows are 1-indexed; the tag is cleared for a new sequence
                let line = row.index() + 1;
                self.update(
                    "assign merge branch",
                    &format!("B{}:E{}", line, line),
                    vec![branch.to_string(), now, String::new(), identity.to_string()],
                )
            }
            None => self.append(
                "assign merge branch",
                vec![
                    repo.to_string(),
                    branch.to_string(),
                    now,
                    String::new(),
                    identity.to_string(),
                ],
            ),
        }
    }

    fn record_new_tag(&self, row: RowHandle, tag: &str, identity: &str) -> Result<()> {
        let line = row.index() + 1;
        self.update(
            "record tag",
            &format!("C{}:E{}", line, line),
            vec![timestamp(), tag.to_string(), identity.to_string()],
        )
    }
}

fn sheet_url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^https?://docs\.google\.com/spreadsheets/d/([^/]+)/?").expect("static sheet URL pattern")
    })
}

/// Extracts the spreadsheet ID from a full URL, or accepts a bare ID.
pub fn extract_sheet_id(input: &str) -> Result<String> {
    let input = input.trim();
    if input.is_empty() {
        return Err(Error::config("sheet URL cannot be empty", "paste the spreadsheet URL or its ID"));
    }
    if let Some(caps) = sheet_url_pattern().captures(input) {
        return Ok(caps[1].to_string());
    }
    if !input.contains('/') {
        return Ok(input.to_string());
    }
    Err(Error::Config {
        message: format!("unable to parse sheet id from URL: {}", input),
        hint: Some("expected https://docs.google.com/spreadsheets/d/<id>/...".to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const VALUES_PATH: &str = "/v4/spreadsheets/sheet123/values/merge_branches!A:E";

    fn ledger(server: &mockito::ServerGuard) -> SheetsLedger {
        SheetsLedger::with_base_url(&server.url(), "sheet123", "merge_branches", "tok".to_string())
            .unwrap()
    }

    #[test]
    fn test_extract_sheet_id_from_url() {
        assert_eq!(
            extract_sheet_id("https://docs.google.com/spreadsheets/d/abc123XYZ/edit#gid=0").unwrap(),
            "abc123XYZ"
        );
        assert_eq!(
            extract_sheet_id("https://docs.google.com/spreadsheets/d/abc123XYZ").unwrap(),
            "abc123XYZ"
        );
    }

    #[test]
    fn test_extract_sheet_id_bare_id() {
        assert_eq!(extract_sheet_id("  abc123XYZ ").unwrap(), "abc123XYZ");
    }

    #[test]
    fn test_extract_sheet_id_rejects_other_urls() {
        assert!(extract_sheet_id("https://example.com/some/sheet").is_err());
        assert!(extract_sheet_id("").is_err());
    }

    #[test]
    fn test_resolve_repo_target_reads_row() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", VALUES_PATH)
            .match_header("authorization", "Bearer tok")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"range":"merge_branches!A1:E3","majorDimension":"ROWS","values":[
                    ["repo","branch","time","tag","user"],
                    ["org/web","main"],
                    ["org/api","release","2026-01-01T00:00:00Z","v-release-3","Ada <ada@example.com>"]
                ]}"#,
            )
            .create();

        let target = ledger(&server).resolve_repo_target("org/api").unwrap().unwrap();

        mock.assert();
        assert_eq!(target.row, RowHandle(2));
        assert_eq!(target.merge_branch, "release");
        assert_eq!(target.last_tag, "v-release-3");
        assert_eq!(target.last_user, "Ada <ada@example.com>");
    }

    #[test]
    fn test_resolve_repo_target_empty_sheet() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", VALUES_PATH)
            .with_status(200)
            .with_body(r#"{"range":"merge_branches!A1:E1","majorDimension":"ROWS"}"#)
            .create();

        assert_eq!(ledger(&server).resolve_repo_target("org/api").unwrap(), None);
    }

    #[test]
    fn test_resolve_repo_target_api_error() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", VALUES_PATH)
            .with_status(403)
            .with_body(r#"{"error":{"message":"The caller does not have permission"}}"#)
            .create();

        let err = ledger(&server).resolve_repo_target("org/api").unwrap_err();
        assert!(matches!(err, Error::Ledger { .. }));
        assert!(err.to_string().contains("403"));
    }

    #[test]
    fn test_record_new_tag_updates_columns_c_to_e() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("PUT", "/v4/spreadsheets/sheet123/values/merge_branches!C3:E3")
            .match_query(Matcher::UrlEncoded("valueInputOption".into(), "RAW".into()))
            .match_body(Matcher::Regex(
                r#"^\{"values":\[\["[^"]+","v-release-4","Ada"\]\]\}$"#.to_string(),
            ))
            .with_status(200)
            .with_body("{}")
            .create();

        ledger(&server)
            .record_new_tag(RowHandle(2), "v-release-4", "Ada")
            .unwrap();
        mock.assert();
    }

    #[test]
    fn test_assign_existing_row_clears_tag() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("PUT", "/v4/spreadsheets/sheet123/values/merge_branches!B2:E2")
            .match_query(Matcher::Any)
            .match_body(Matcher::Regex(
                r#"^\{"values":\[\["hotfix","[^"]+","","Ada"\]\]\}$"#.to_string(),
            ))
            .with_status(200)
            .with_body("{}")
            .create();

        ledger(&server)
            .assign_merge_branch("org/api", "hotfix", Some(RowHandle(1)), "Ada")
            .unwrap();
        mock.assert();
    }

    #[test]
    fn test_assign_new_row_appends() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/v4/spreadsheets/sheet123/values/merge_branches!A:E:append")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("valueInputOption".into(), "RAW".into()),
                Matcher::UrlEncoded("insertDataOption".into(), "INSERT_ROWS".into()),
            ]))
            .match_body(Matcher::Regex(
                r#"^\{"values":\[\["org/api","release","[^"]+","","Ada"\]\]\}$"#.to_string(),
            ))
            .with_status(200)
            .with_body("{}")
            .create();

        ledger(&server)
            .assign_merge_branch("org/api", "release", None, "Ada")
            .unwrap();
        mock.assert();
    }

    #[test]
    fn test_static_access_token_resolves_verbatim() {
        assert_eq!(
            AccessToken::Static("abc".to_string()).resolve().unwrap(),
            "abc"
        );
    }
}
