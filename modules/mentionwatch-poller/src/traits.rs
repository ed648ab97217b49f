// Trait abstraction for the search transport.
//
// SearchTransport is everything the session manager and poll loop need
// from the remote platform: authenticate, probe liveness, move session
// tokens in and out, fetch one page of results. Implemented for
// ChirperClient; tests substitute in-process mocks so `cargo test`
// needs no network.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use chirper_client::{ChirperClient, SearchItem, SearchMode, SessionToken};
use mentionwatch_common::SearchQuery;

#[async_trait]
pub trait SearchTransport: Send + Sync {
    /// Authenticate with primary and secondary factors. A failure here
    /// is fatal to startup — there is nothing to poll without a session.
    async fn login(&self, username: &str, password: &str, otp_code: &str) -> Result<()>;

    /// Probe whether the installed session is still accepted.
    async fn is_logged_in(&self) -> Result<bool>;

    /// Extract the opaque credential for persistence.
    fn session_tokens(&self) -> Vec<SessionToken>;

    /// Install a previously persisted credential.
    fn install_session_tokens(&self, tokens: Vec<SessionToken>);

    /// Fetch one recency-ordered page of results for `query`.
    async fn search_posts(&self, query: &SearchQuery) -> Result<Vec<SearchItem>>;
}

#[async_trait]
impl SearchTransport for ChirperClient {
    async fn login(&self, username: &str, password: &str, otp_code: &str) -> Result<()> {
        Ok(self.login(username, password, otp_code).await?)
    }

    async fn is_logged_in(&self) -> Result<bool> {
        Ok(self.is_logged_in().await?)
    }

    fn session_tokens(&self) -> Vec<SessionToken> {
        self.session_tokens()
    }

    fn install_session_tokens(&self, tokens: Vec<SessionToken>) {
        self.set_session_tokens(tokens);
    }

    async fn search_posts(&self, query: &SearchQuery) -> Result<Vec<SearchItem>> {
        Ok(self
            .search_posts(&query.query, query.page_size, SearchMode::Latest)
            .await?)
    }
}

// Arc<T> blanket — lets tests keep a handle on the transport they hand
// to the session manager or poll loop.
#[async_trait]
impl<T: SearchTransport + ?Sized> SearchTransport for Arc<T> {
    async fn login(&self, username: &str, password: &str, otp_code: &str) -> Result<()> {
        (**self).login(username, password, otp_code).await
    }

    async fn is_logged_in(&self) -> Result<bool> {
        (**self).is_logged_in().await
    }

    fn session_tokens(&self) -> Vec<SessionToken> {
        (**self).session_tokens()
    }

    fn install_session_tokens(&self, tokens: Vec<SessionToken>) {
        (**self).install_session_tokens(tokens)
    }

    async fn search_posts(&self, query: &SearchQuery) -> Result<Vec<SearchItem>> {
        (**self).search_posts(query).await
    }
}
