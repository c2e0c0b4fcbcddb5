// src/ingest/executor.rs
//! Per-endpoint request loop. Every error class is handled locally by moving
//! on to another strategy; the caller only sees "payload" or "nothing, and
//! here is the last thing that went wrong".

use metrics::{counter, histogram};
use once_cell::sync::OnceCell;
use regex::Regex;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::FetchConfig;
use crate::ingest::error::{AttemptError, TransportError};
use crate::ingest::transport::{HeaderProfile, HttpReply, TlsMode, Transport};
use crate::ingest::types::FetchRequest;
use crate::ingest::validate::is_valid_listing;

#[derive(Debug, Default)]
pub struct EndpointOutcome {
    /// Accepted listing payload, if any variant produced one.
    pub payload: Option<Value>,
    pub last_error: Option<AttemptError>,
}

pub struct FetchExecutor<'a> {
    transport: &'a dyn Transport,
    config: &'a FetchConfig,
}

impl<'a> FetchExecutor<'a> {
    pub fn new(transport: &'a dyn Transport, config: &'a FetchConfig) -> Self {
        Self { transport, config }
    }

    /// Try every request variant of one endpoint in order and return the first
    /// accepted payload.
    pub async fn fetch_endpoint(&self, endpoint: &str) -> EndpointOutcome {
        let mut outcome = EndpointOutcome::default();
        for req in FetchRequest::variants(endpoint, self.config.page_size) {
            sleep_for(self.config.politeness_delay()).await;
            match self.attempt(&req).await {
                Ok(payload) => {
                    info!(url = %req.url, variant = req.attempt_variant.label(), "payload accepted");
                    outcome.payload = Some(payload);
                    return outcome;
                }
                Err(e) => {
                    debug!(url = %req.url, variant = req.attempt_variant.label(), error = %e, "variant failed");
                    outcome.last_error = Some(e);
                }
            }
        }
        outcome
    }

    async fn attempt(&self, req: &FetchRequest) -> Result<Value, AttemptError> {
        let url = req.url.as_str();
        match self.send(url, HeaderProfile::Browser, TlsMode::Verified).await {
            Ok(reply) => self.handle_reply(url, reply).await,
            Err(TransportError::Tls(detail)) if self.config.insecure_tls_fallback => {
                warn!(url = %url, error = %detail, "TLS handshake failed; retrying without verification");
                counter!("fetch_fallbacks_total", "kind" => "tls_unverified").increment(1);
                let reply = self
                    .send(url, HeaderProfile::Browser, TlsMode::Unverified)
                    .await?;
                accept_ok(reply)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn handle_reply(&self, url: &str, reply: HttpReply) -> Result<Value, AttemptError> {
        match reply.status {
            200 => decode_payload(&reply.body),
            403 => {
                debug!(url = %url, "403; retrying with minimal headers");
                counter!("fetch_fallbacks_total", "kind" => "minimal_headers").increment(1);
                let alt = self
                    .send(url, HeaderProfile::Minimal, TlsMode::Verified)
                    .await?;
                accept_ok(alt)
            }
            429 => {
                warn!(url = %url, cooldown_ms = self.config.rate_limit_cooldown_ms, "rate limited");
                sleep_for(self.config.rate_limit_cooldown()).await;
                Err(AttemptError::from_status(429))
            }
            other => Err(AttemptError::from_status(other)),
        }
    }

    /// One logical GET with the transport retry policy applied.
    async fn send(
        &self,
        url: &str,
        profile: HeaderProfile,
        tls: TlsMode,
    ) -> Result<HttpReply, TransportError> {
        let policy = &self.config.retry;
        let mut retry: u32 = 0;
        loop {
            counter!("fetch_attempts_total").increment(1);
            let started = Instant::now();
            let res = self.transport.get(url, profile, tls).await;
            histogram!("fetch_request_ms").record(started.elapsed().as_secs_f64() * 1000.0);

            let transient = match &res {
                Ok(reply) => {
                    counter!("fetch_status_total", "status" => reply.status.to_string())
                        .increment(1);
                    policy.retries_status(reply.status)
                }
                Err(TransportError::Timeout(_) | TransportError::Connect(_)) => true,
                Err(_) => false,
            };
            if !transient || retry >= policy.max_retries {
                return res;
            }

            retry += 1;
            let wait = policy.backoff(retry);
            debug!(url = %url, retry, wait_ms = wait.as_millis() as u64, "transient failure; backing off");
            sleep_for(wait).await;
        }
    }
}

fn accept_ok(reply: HttpReply) -> Result<Value, AttemptError> {
    if reply.status == 200 {
        decode_payload(&reply.body)
    } else {
        Err(AttemptError::from_status(reply.status))
    }
}

/// Decode a 200 body, falling back to an embedded `window.__x = {...};`
/// assignment when the body is HTML. The result must pass the listing validator.
pub fn decode_payload(body: &str) -> Result<Value, AttemptError> {
    let payload = match serde_json::from_str::<Value>(body) {
        Ok(v) => v,
        Err(e) => {
            let embedded = extract_embedded_json(body).ok_or_else(|| AttemptError::from(e))?;
            counter!("fetch_fallbacks_total", "kind" => "embedded_json").increment(1);
            embedded
        }
    };
    if is_valid_listing(&payload) {
        Ok(payload)
    } else {
        Err(AttemptError::Rejected)
    }
}

/// First `window.__<name> = {...}` assignment whose right-hand side parses as
/// a JSON object. Parsing starts right after the `=`, so braces inside string
/// values don't end the object early.
pub fn extract_embedded_json(body: &str) -> Option<Value> {
    static RE_ASSIGN: OnceCell<Regex> = OnceCell::new();
    let re = RE_ASSIGN.get_or_init(|| Regex::new(r"window\.__\w*\s*=\s*").unwrap());
    re.find_iter(body).find_map(|m| {
        serde_json::Deserializer::from_str(&body[m.end()..])
            .into_iter::<Value>()
            .next()
            .and_then(Result::ok)
            .filter(Value::is_object)
    })
}

async fn sleep_for(d: Duration) {
    if !d.is_zero() {
        tokio::time::sleep(d).await;
    }
}
