// tests/common/mod.rs
//
// Shared helpers for integration tests: an in-memory transport that replays
// scripted replies per URL and records every call it receives.
#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;

use reddit_feed_fetcher::config::FetchConfig;
use reddit_feed_fetcher::ingest::error::TransportError;
use reddit_feed_fetcher::ingest::transport::{HeaderProfile, HttpReply, TlsMode, Transport};

#[derive(Debug, Clone)]
pub enum Scripted {
    Reply(u16, String),
    Fail(TransportError),
}

impl Scripted {
    pub fn ok(body: impl Into<String>) -> Self {
        Scripted::Reply(200, body.into())
    }

    pub fn status(code: u16) -> Self {
        Scripted::Reply(code, String::new())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub url: String,
    pub profile: HeaderProfile,
    pub tls: TlsMode,
}

/// Per-URL queues are consumed front to back; when a queue is empty (or the
/// URL was never scripted) the fallback reply is used.
pub struct ScriptedTransport {
    routes: Mutex<HashMap<String, VecDeque<Scripted>>>,
    fallback: Scripted,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedTransport {
    pub fn new(fallback: Scripted) -> Self {
        Self {
            routes: Mutex::new(HashMap::new()),
            fallback,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn route(self, url: &str, replies: impl IntoIterator<Item = Scripted>) -> Self {
        self.routes
            .lock()
            .entry(url.to_string())
            .or_default()
            .extend(replies);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.calls.lock().iter().map(|c| c.url.clone()).collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(
        &self,
        url: &str,
        profile: HeaderProfile,
        tls: TlsMode,
    ) -> Result<HttpReply, TransportError> {
        self.calls.lock().push(Call {
            url: url.to_string(),
            profile,
            tls,
        });
        let next = self
            .routes
            .lock()
            .get_mut(url)
            .and_then(|q| q.pop_front())
            .unwrap_or_else(|| self.fallback.clone());
        match next {
            Scripted::Reply(status, body) => Ok(HttpReply::new(status, body)),
            Scripted::Fail(e) => Err(e),
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Default mirrors, no sleeps, no transport retries.
pub fn quiet_config() -> FetchConfig {
    let mut cfg = FetchConfig::default().without_delays();
    cfg.retry.max_retries = 0;
    cfg
}

pub fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("reading fixture {}: {e}", path.display()))
}
