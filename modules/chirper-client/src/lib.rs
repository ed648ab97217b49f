pub mod error;
pub mod types;

pub use error::{ChirperError, Result};
pub use types::{LoginRequest, LoginResponse, SearchItem, SearchMode, SearchResponse, SessionToken};

use std::sync::RwLock;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.chirper.example";

/// Per-request timeout. Bounded by the default poll cadence so a stuck
/// fetch cannot stall a cycle indefinitely.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct ChirperClient {
    client: reqwest::Client,
    base_url: String,
    tokens: RwLock<Vec<SessionToken>>,
}

impl ChirperClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            tokens: RwLock::new(Vec::new()),
        }
    }

    /// Extract the current session tokens (empty before login).
    pub fn session_tokens(&self) -> Vec<SessionToken> {
        self.tokens.read().expect("token lock poisoned").clone()
    }

    /// Install previously persisted session tokens, replacing any held.
    pub fn set_session_tokens(&self, tokens: Vec<SessionToken>) {
        *self.tokens.write().expect("token lock poisoned") = tokens;
    }

    fn cookie_header(&self) -> String {
        self.tokens
            .read()
            .expect("token lock poisoned")
            .iter()
            .map(|t| format!("{}={}", t.name, t.value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Authenticate with primary and secondary factors. On success the
    /// returned tokens are installed on this client.
    pub async fn login(&self, username: &str, password: &str, otp_code: &str) -> Result<()> {
        tracing::info!(username, "Logging in to Chirper");

        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
            otp_code: otp_code.to_string(),
        };

        let url = format!("{}/v1/session", self.base_url);
        let resp = self
            .client
            .post(&url)
            .timeout(REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            let body = resp.text().await.unwrap_or_default();
            return Err(ChirperError::LoginFailed(body));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ChirperError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let login: LoginResponse = resp.json().await?;
        tracing::info!(token_count = login.tokens.len(), "Login succeeded");
        self.set_session_tokens(login.tokens);
        Ok(())
    }

    /// Liveness probe for the installed session. Only an explicit 401
    /// means "not logged in"; transport failures and other statuses are
    /// errors so a network blip never looks like an expired session.
    pub async fn is_logged_in(&self) -> Result<bool> {
        let url = format!("{}/v1/account/verify", self.base_url);
        let resp = self
            .client
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .header(reqwest::header::COOKIE, self.cookie_header())
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(true);
        }
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Ok(false);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(ChirperError::Api {
            status: status.as_u16(),
            message: body,
        })
    }

    /// Fetch one page of posts matching `query`, at most `limit` items.
    pub async fn search_posts(
        &self,
        query: &str,
        limit: u32,
        mode: SearchMode,
    ) -> Result<Vec<SearchItem>> {
        tracing::debug!(query, limit, mode = mode.as_str(), "Searching posts");

        let url = format!("{}/v1/search", self.base_url);
        let resp = self
            .client
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .header(reqwest::header::COOKIE, self.cookie_header())
            .query(&[
                ("q", query),
                ("limit", &limit.to_string()),
                ("mode", mode.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ChirperError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let page: SearchResponse = resp.json().await?;
        tracing::debug!(count = page.items.len(), "Fetched search page");
        Ok(page.items)
    }
}

impl Default for ChirperClient {
    fn default() -> Self {
        Self::new()
    }
}
