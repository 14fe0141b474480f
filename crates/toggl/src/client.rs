use std::fmt;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use serde_json::Value;
use timesheet_core::{DateRange, RawEntry};
use timesheet_report::{EntryPage, PageFetcher, SourceError};

pub const DEFAULT_BASE_URL: &str = "https://api.track.toggl.com";
const DETAILS_PATH: &str = "/reports/api/v2/details";
/// Toggl expects the literal `api_token` as the basic-auth password.
const API_PASSWORD: &str = "api_token";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings, as found in the `[toggl]` config section.
#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TogglSettings {
    pub api_token: String,
    pub workspace_id: String,
    /// Contact address sent as the `user_agent` query parameter.
    pub user_agent: String,
    pub base_url: Option<String>,
}

// Manual Debug impl to redact the api_token secret
impl fmt::Debug for TogglSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TogglSettings")
            .field("api_token", &"[REDACTED]")
            .field("workspace_id", &self.workspace_id)
            .field("user_agent", &self.user_agent)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    #[serde(default)]
    data: Option<Vec<DetailsEntry>>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct DetailsEntry {
    start: DateTime<FixedOffset>,
    end: Option<DateTime<FixedOffset>>,
    /// Duration in milliseconds, used when `end` is missing.
    dur: Option<i64>,
    project: Option<String>,
    client: Option<String>,
    description: Option<String>,
}

impl From<DetailsEntry> for RawEntry {
    fn from(e: DetailsEntry) -> Self {
        let end = e
            .end
            .or_else(|| e.dur.map(|ms| e.start + chrono::Duration::milliseconds(ms)))
            .unwrap_or(e.start);
        RawEntry {
            start: e.start,
            end,
            project: e.project.unwrap_or_default(),
            client: e.client.unwrap_or_default(),
            description: e.description.unwrap_or_default(),
        }
    }
}

/// Renders an error payload, which Toggl sends either as a string or as an
/// object with `message` and optional `tip`.
fn error_message(error: &Value) -> String {
    match error {
        Value::String(s) => s.clone(),
        Value::Object(map) => {
            let message = map.get("message").and_then(Value::as_str);
            let tip = map.get("tip").and_then(Value::as_str);
            match (message, tip) {
                (Some(m), Some(t)) => format!("{m} ({t})"),
                (Some(m), None) => m.to_string(),
                _ => error.to_string(),
            }
        }
        other => other.to_string(),
    }
}

/// Client for the Toggl Reports API v2 "details" listing.
pub struct TogglClient {
    http: reqwest::Client,
    base_url: String,
    api_token: String,
    workspace_id: String,
    user_agent: String,
}

impl TogglClient {
    pub fn new(settings: TogglSettings) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self::with_http_client(http, settings))
    }

    pub fn with_http_client(http: reqwest::Client, settings: TogglSettings) -> Self {
        let base_url = settings
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        Self {
            http,
            base_url,
            api_token: settings.api_token,
            workspace_id: settings.workspace_id,
            user_agent: settings.user_agent,
        }
    }
}

impl PageFetcher for TogglClient {
    async fn fetch_page(&self, range: DateRange, page: u32) -> Result<EntryPage, SourceError> {
        let url = format!("{}{DETAILS_PATH}", self.base_url);
        let since = range.start.format("%Y-%m-%d").to_string();
        let until = range.end.format("%Y-%m-%d").to_string();
        let page_param = page.to_string();

        let resp = self
            .http
            .get(&url)
            .basic_auth(&self.api_token, Some(API_PASSWORD))
            .query(&[
                ("user_agent", self.user_agent.as_str()),
                ("workspace_id", self.workspace_id.as_str()),
                ("since", since.as_str()),
                ("until", until.as_str()),
                ("page", page_param.as_str()),
            ])
            .send()
            .await
            .map_err(|e| SourceError::Transport(format!("could not reach {url}: {e}")))?;

        let status = resp.status();
        let body = resp.json::<DetailsResponse>().await.map_err(|e| {
            SourceError::Transport(format!("invalid response from server (HTTP {status}): {e}"))
        })?;

        let error = match body.error.as_ref() {
            Some(Value::Null) | None if status.is_success() => None,
            Some(Value::Null) | None => Some(format!("server returned HTTP {status}")),
            Some(payload) => Some(error_message(payload)),
        };

        let data = body.data.unwrap_or_default();
        tracing::debug!(page, entries = data.len(), "Fetched entries page");

        Ok(EntryPage {
            entries: data.into_iter().map(RawEntry::from).collect(),
            error,
        })
    }
}
