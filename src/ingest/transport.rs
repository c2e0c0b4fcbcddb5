// src/ingest/transport.rs
use async_trait::async_trait;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION, DNT, UPGRADE_INSECURE_REQUESTS,
    USER_AGENT,
};
use reqwest::Client;

use crate::config::FetchConfig;
use crate::ingest::error::TransportError;

/// Which header set to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderProfile {
    /// Full desktop-browser set.
    Browser,
    /// Bare user agent; used after a 403.
    Minimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsMode {
    Verified,
    /// Certificate checks off; only after a failed handshake.
    Unverified,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// One GET, no retries. Retry and fallback policy live in the executor.
///
/// Implementations must tolerate sequential reuse within one fetch. The
/// service keeps one fetch in flight at a time.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(
        &self,
        url: &str,
        profile: HeaderProfile,
        tls: TlsMode,
    ) -> Result<HttpReply, TransportError>;

    fn name(&self) -> &'static str;
}

pub struct ReqwestTransport {
    verified: Client,
    unverified: Option<Client>,
    browser_headers: HeaderMap,
    minimal_headers: HeaderMap,
}

impl ReqwestTransport {
    pub fn from_config(cfg: &FetchConfig) -> Result<Self, TransportError> {
        let verified = Client::builder()
            .timeout(cfg.request_timeout())
            .build()
            .map_err(|e| TransportError::Other(format!("building http client: {e}")))?;

        let unverified = if cfg.insecure_tls_fallback {
            let client = Client::builder()
                .timeout(cfg.request_timeout())
                .danger_accept_invalid_certs(true)
                .build()
                .map_err(|e| TransportError::Other(format!("building insecure client: {e}")))?;
            Some(client)
        } else {
            None
        };

        Ok(Self {
            verified,
            unverified,
            browser_headers: browser_headers(&cfg.user_agent)?,
            minimal_headers: minimal_headers(&cfg.fallback_user_agent)?,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(
        &self,
        url: &str,
        profile: HeaderProfile,
        tls: TlsMode,
    ) -> Result<HttpReply, TransportError> {
        let client = match tls {
            TlsMode::Verified => &self.verified,
            TlsMode::Unverified => self.unverified.as_ref().ok_or_else(|| {
                TransportError::Tls("insecure TLS fallback is disabled".to_string())
            })?,
        };
        let headers = match profile {
            HeaderProfile::Browser => self.browser_headers.clone(),
            HeaderProfile::Minimal => self.minimal_headers.clone(),
        };

        let resp = client
            .get(url)
            .headers(headers)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(map_reqwest_error)?;
        Ok(HttpReply { status, body })
    }

    fn name(&self) -> &'static str {
        "reqwest"
    }
}

fn header_value(v: &str) -> Result<HeaderValue, TransportError> {
    HeaderValue::from_str(v).map_err(|e| TransportError::Other(format!("invalid header {v:?}: {e}")))
}

fn browser_headers(user_agent: &str) -> Result<HeaderMap, TransportError> {
    let mut h = HeaderMap::new();
    h.insert(USER_AGENT, header_value(user_agent)?);
    h.insert(ACCEPT, HeaderValue::from_static("application/json"));
    h.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    h.insert(DNT, HeaderValue::from_static("1"));
    h.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    h.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    Ok(h)
}

fn minimal_headers(user_agent: &str) -> Result<HeaderMap, TransportError> {
    let mut h = HeaderMap::new();
    h.insert(USER_AGENT, header_value(user_agent)?);
    Ok(h)
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    // Drop the URL so a path segment can't look like a TLS marker.
    let err = err.without_url();
    let detail = error_chain(&err);
    if err.is_timeout() {
        TransportError::Timeout(detail)
    } else if looks_like_tls(&detail) {
        TransportError::Tls(detail)
    } else if err.is_connect() {
        TransportError::Connect(detail)
    } else {
        TransportError::Other(detail)
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(e) = source {
        out.push_str(": ");
        out.push_str(&e.to_string());
        source = e.source();
    }
    out
}

fn looks_like_tls(detail: &str) -> bool {
    let d = detail.to_ascii_lowercase();
    ["certificate", "tls", "ssl", "handshake"]
        .iter()
        .any(|m| d.contains(m))
}
