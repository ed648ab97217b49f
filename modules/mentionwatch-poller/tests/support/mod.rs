//! In-process doubles for the search transport and sink.
//! No network, no database — MOCK → FUNCTION → OUTPUT.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use chirper_client::{SearchItem, SessionToken};
use mentionwatch_common::{MentionRecord, SearchQuery};
use mentionwatch_poller::SearchTransport;
use mentionwatch_store::{InsertOutcome, MemorySink, MentionSink};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LoginBehavior {
    Succeeds,
    Fails,
    /// Fails the test if login is ever invoked.
    PanicsIfCalled,
}

#[derive(Debug)]
pub struct MockTransport {
    login_behavior: LoginBehavior,
    /// What the liveness probe reports for installed tokens.
    live: AtomicBool,
    pub login_count: AtomicU32,
    tokens: Mutex<Vec<SessionToken>>,
    /// One entry per poll cycle; empty queue yields empty pages.
    pages: Mutex<VecDeque<Result<Vec<SearchItem>>>>,
    /// When set, raised once the page queue drains — lets run() tests
    /// terminate the loop.
    stop_when_drained: Mutex<Option<Arc<AtomicBool>>>,
}

impl MockTransport {
    pub fn new(login_behavior: LoginBehavior) -> Self {
        Self {
            login_behavior,
            live: AtomicBool::new(false),
            login_count: AtomicU32::new(0),
            tokens: Mutex::new(Vec::new()),
            pages: Mutex::new(VecDeque::new()),
            stop_when_drained: Mutex::new(None),
        }
    }

    pub fn set_live(&self, live: bool) {
        self.live.store(live, Ordering::SeqCst);
    }

    pub fn push_page(&self, page: Result<Vec<SearchItem>>) {
        self.pages.lock().unwrap().push_back(page);
    }

    pub fn stop_when_drained(&self, stop: Arc<AtomicBool>) {
        *self.stop_when_drained.lock().unwrap() = Some(stop);
    }

    pub fn installed_tokens(&self) -> Vec<SessionToken> {
        self.tokens.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchTransport for MockTransport {
    async fn login(&self, _username: &str, _password: &str, _otp_code: &str) -> Result<()> {
        match self.login_behavior {
            LoginBehavior::PanicsIfCalled => panic!("login must not be called"),
            LoginBehavior::Fails => Err(anyhow!("invalid password")),
            LoginBehavior::Succeeds => {
                self.login_count.fetch_add(1, Ordering::SeqCst);
                *self.tokens.lock().unwrap() = vec![fresh_token()];
                self.live.store(true, Ordering::SeqCst);
                Ok(())
            }
        }
    }

    async fn is_logged_in(&self) -> Result<bool> {
        Ok(self.live.load(Ordering::SeqCst))
    }

    fn session_tokens(&self) -> Vec<SessionToken> {
        self.tokens.lock().unwrap().clone()
    }

    fn install_session_tokens(&self, tokens: Vec<SessionToken>) {
        *self.tokens.lock().unwrap() = tokens;
    }

    async fn search_posts(&self, _query: &SearchQuery) -> Result<Vec<SearchItem>> {
        let next = self.pages.lock().unwrap().pop_front();
        match next {
            Some(page) => page,
            None => {
                if let Some(stop) = self.stop_when_drained.lock().unwrap().as_ref() {
                    stop.store(true, Ordering::SeqCst);
                }
                Ok(Vec::new())
            }
        }
    }
}

pub fn fresh_token() -> SessionToken {
    SessionToken {
        name: "auth".to_string(),
        value: "fresh".to_string(),
        domain: "chirper.example".to_string(),
        path: "/".to_string(),
        expires_at: None,
    }
}

pub fn saved_token() -> SessionToken {
    SessionToken {
        name: "auth".to_string(),
        value: "saved".to_string(),
        domain: "chirper.example".to_string(),
        path: "/".to_string(),
        expires_at: None,
    }
}

pub fn item(id: &str) -> SearchItem {
    SearchItem {
        id: id.to_string(),
        user_id: "u1".to_string(),
        username: "alice".to_string(),
        timestamp: 1_700_000_000,
        text: format!("post {id}"),
        error: None,
    }
}

pub fn errored_item(id: &str) -> SearchItem {
    SearchItem {
        error: Some("rate limited".to_string()),
        ..item(id)
    }
}

// ---------------------------------------------------------------------------
// CountingSink — MemorySink that counts dedup-path calls
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct CountingSink {
    inner: MemorySink,
    pub exists_calls: AtomicU32,
    pub insert_calls: AtomicU32,
}

impl CountingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<MentionRecord> {
        self.inner.records()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }
}

#[async_trait]
impl MentionSink for CountingSink {
    async fn exists(&self, post_id: &str) -> Result<bool> {
        self.exists_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.exists(post_id).await
    }

    async fn insert_if_absent(&self, record: &MentionRecord) -> Result<InsertOutcome> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.insert_if_absent(record).await
    }
}
