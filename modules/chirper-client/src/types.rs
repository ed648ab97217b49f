use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// --- Session types ---

/// One transport-level session token. A set of these is the opaque
/// credential the poller persists across restarts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default = "root_path")]
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

fn root_path() -> String {
    "/".to_string()
}

/// Body for POST /v1/session.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    #[serde(rename = "otpCode")]
    pub otp_code: String,
}

/// Response from POST /v1/session.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub tokens: Vec<SessionToken>,
}

// --- Search types ---

/// Result ordering for the search endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Most recent posts first. The poller always uses this.
    Latest,
    Top,
}

impl SearchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMode::Latest => "latest",
            SearchMode::Top => "top",
        }
    }
}

/// A single post from GET /v1/search. The provider materializes items
/// lazily and attaches `error` to items it failed to hydrate; callers
/// must treat those as absent.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchItem {
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    pub username: String,
    /// Post creation time as unix seconds.
    pub timestamp: i64,
    pub text: String,
    #[serde(default)]
    pub error: Option<String>,
}

/// Wrapper for GET /v1/search responses.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub items: Vec<SearchItem>,
}
