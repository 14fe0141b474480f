use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

const ORGANIZATION_DATA_PATH: &str = "/XRMServices/2011/OrganizationData.svc";
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/74.0.3729.157 Safari/537.36";
/// Keeps `$filter` expressions well below typical URL length limits.
const MAX_KEYS_PER_QUERY: usize = 40;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum CrmError {
    #[error("could not reach {url}: {source}")]
    Http { url: String, source: reqwest::Error },
    #[error("CRM returned HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("invalid response from CRM: {0}")]
    InvalidResponse(String),
}

/// The kinds of CRM record a timesheet row refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReferenceKind {
    SalesOrder,
    Case,
    User,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceKind::SalesOrder => write!(f, "order"),
            ReferenceKind::Case => write!(f, "case"),
            ReferenceKind::User => write!(f, "user"),
        }
    }
}

impl ReferenceKind {
    pub fn entity_set(self) -> &'static str {
        match self {
            ReferenceKind::SalesOrder => "SalesOrderSet",
            ReferenceKind::Case => "IncidentSet",
            ReferenceKind::User => "SystemUserSet",
        }
    }

    /// Field holding the internal identifier.
    pub fn id_field(self) -> &'static str {
        match self {
            ReferenceKind::SalesOrder => "SalesOrderId",
            ReferenceKind::Case => "IncidentId",
            ReferenceKind::User => "SystemUserId",
        }
    }

    /// Field holding the human-facing key used in timesheets.
    pub fn key_field(self) -> &'static str {
        match self {
            ReferenceKind::SalesOrder => "OrderNumber",
            ReferenceKind::Case => "TicketNumber",
            ReferenceKind::User => "DomainName",
        }
    }
}

/// `Field eq 'a' or Field eq 'b'`, with single quotes doubled.
pub fn build_filter(key_field: &str, keys: &[String]) -> String {
    keys.iter()
        .map(|k| format!("{key_field} eq '{}'", k.replace('\'', "''")))
        .collect::<Vec<_>>()
        .join(" or ")
}

/// Resolves external keys to internal CRM identifiers.
///
/// Keys the service does not know are simply absent from the result.
pub trait ReferenceLookup {
    fn lookup(
        &self,
        kind: ReferenceKind,
        keys: &[String],
    ) -> impl Future<Output = Result<HashMap<String, String>, CrmError>> + Send;
}

/// Connection settings, as found in the `[crm]` config section.
#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CrmSettings {
    /// Domain login of the timesheet owner, e.g. `DOMAIN\jdoe`.
    pub username: String,
    pub base_url: Option<String>,
    /// Session cookies as `name=value` pairs.
    #[serde(default)]
    pub cookies: Vec<String>,
    pub user_agent: Option<String>,
}

// Manual Debug impl to redact the session cookies
impl fmt::Debug for CrmSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrmSettings")
            .field("username", &self.username)
            .field("base_url", &self.base_url)
            .field("cookies", &format_args!("[{} REDACTED]", self.cookies.len()))
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct ODataEnvelope {
    d: ODataResults,
}

#[derive(Debug, Deserialize)]
struct ODataResults {
    results: Vec<serde_json::Map<String, Value>>,
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Client for the CRM 2011 OData organization-data endpoint.
pub struct OrganizationDataClient {
    http: reqwest::Client,
    base_url: String,
    cookie_header: String,
    user_agent: String,
}

impl OrganizationDataClient {
    /// Returns `None` when no CRM base URL is configured.
    pub fn from_settings(settings: &CrmSettings) -> Result<Option<Self>, reqwest::Error> {
        let Some(base_url) = settings.base_url.as_deref() else {
            return Ok(None);
        };
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Some(Self::new(
            http,
            base_url,
            &settings.cookies,
            settings.user_agent.as_deref(),
        )))
    }

    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        cookies: &[String],
        user_agent: Option<&str>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            cookie_header: cookies.join("; "),
            user_agent: user_agent.unwrap_or(DEFAULT_USER_AGENT).to_string(),
        }
    }

    async fn query(
        &self,
        kind: ReferenceKind,
        keys: &[String],
    ) -> Result<HashMap<String, String>, CrmError> {
        let url = format!(
            "{}{ORGANIZATION_DATA_PATH}/{}",
            self.base_url,
            kind.entity_set()
        );
        let select = format!("{},{}", kind.id_field(), kind.key_field());
        let filter = build_filter(kind.key_field(), keys);

        let resp = self
            .http
            .get(&url)
            .query(&[("$select", select.as_str()), ("$filter", filter.as_str())])
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .header(reqwest::header::COOKIE, &self.cookie_header)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|source| CrmError::Http {
                url: url.clone(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CrmError::Status(status));
        }

        let envelope = resp
            .json::<ODataEnvelope>()
            .await
            .map_err(|e| CrmError::InvalidResponse(e.to_string()))?;

        let mut found = HashMap::new();
        for record in envelope.d.results {
            let key = record.get(kind.key_field()).and_then(value_text);
            let id = record.get(kind.id_field()).and_then(value_text);
            if let (Some(key), Some(id)) = (key, id) {
                found.insert(key, id);
            }
        }
        Ok(found)
    }
}

impl ReferenceLookup for OrganizationDataClient {
    async fn lookup(
        &self,
        kind: ReferenceKind,
        keys: &[String],
    ) -> Result<HashMap<String, String>, CrmError> {
        let mut found = HashMap::new();
        for chunk in keys.chunks(MAX_KEYS_PER_QUERY) {
            tracing::debug!(%kind, keys = chunk.len(), "Querying CRM");
            found.extend(self.query(kind, chunk).await?);
        }
        Ok(found)
    }
}
