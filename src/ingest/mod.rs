// src/ingest/mod.rs
pub mod error;
pub mod executor;
pub mod extract;
pub mod filter;
pub mod outcome;
pub mod params;
pub mod transport;
pub mod types;
pub mod urls;
pub mod validate;

use metrics::{counter, describe_counter, describe_histogram};
use once_cell::sync::OnceCell;
use std::sync::Arc;

use crate::config::FetchConfig;
use crate::ingest::error::AttemptError;
use crate::ingest::executor::FetchExecutor;
use crate::ingest::extract::extract_posts;
use crate::ingest::filter::PostFilter;
use crate::ingest::outcome::{
    classify_failure, FailureKind, FetchFailure, FetchResult, FetchSuccess,
};
use crate::ingest::params::FetchParams;
use crate::ingest::transport::{ReqwestTransport, Transport};
use crate::ingest::urls::build_candidate_urls;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("fetch_attempts_total", "GET requests issued, retries included.");
        describe_counter!("fetch_status_total", "HTTP responses by status code.");
        describe_counter!(
            "fetch_fallbacks_total",
            "Fallback strategies taken (minimal headers, TLS downgrade, embedded JSON)."
        );
        describe_histogram!("fetch_request_ms", "Single GET latency in milliseconds.");
        describe_counter!(
            "fetch_endpoints_exhausted_total",
            "Endpoints where every request variant failed."
        );
        describe_counter!("posts_admitted_total", "Posts that passed the content filter.");
        describe_counter!("fetch_results_total", "Fetch results by outcome code.");
    });
}

/// Owns the transport and configuration; one `fetch` walks the mirrors in
/// priority order until some endpoint yields posts.
pub struct PostFetcher {
    transport: Arc<dyn Transport>,
    config: FetchConfig,
}

impl PostFetcher {
    pub fn new(transport: Arc<dyn Transport>, config: FetchConfig) -> Self {
        tracing::debug!(transport = transport.name(), mirrors = config.mirrors.len(), "post fetcher ready");
        Self { transport, config }
    }

    /// Real HTTP transport built from the config.
    pub fn from_config(config: FetchConfig) -> anyhow::Result<Self> {
        let transport = ReqwestTransport::from_config(&config)?;
        Ok(Self::new(Arc::new(transport), config))
    }

    pub async fn fetch(&self, params: &FetchParams) -> FetchResult {
        ensure_metrics_described();
        let result = self.run(params).await;
        counter!("fetch_results_total", "outcome" => result.outcome_label()).increment(1);
        if let FetchResult::Failure(f) = &result {
            tracing::warn!(
                source = %params.source,
                source_type = %params.source_type,
                code = f.error_code.code(),
                "fetch failed"
            );
        }
        result
    }

    async fn run(&self, params: &FetchParams) -> FetchResult {
        let ctx = params.failure_context();
        let Some(descriptor) = params.descriptor() else {
            return FetchResult::Failure(FetchFailure::new(FailureKind::InvalidSource, &ctx));
        };
        let endpoints = build_candidate_urls(&descriptor, params.sort_mode(), &self.config);
        if endpoints.is_empty() {
            return FetchResult::Failure(FetchFailure::new(FailureKind::InvalidSource, &ctx));
        }

        let executor = FetchExecutor::new(self.transport.as_ref(), &self.config);
        let filter = PostFilter::new(params.criteria(), &self.config.permalink_base);
        let mut last_error: Option<AttemptError> = None;

        for (i, endpoint) in endpoints.iter().enumerate() {
            let outcome = executor.fetch_endpoint(endpoint).await;
            if outcome.last_error.is_some() {
                last_error = outcome.last_error;
            }

            match outcome.payload {
                Some(payload) => {
                    let raw = extract_posts(payload);
                    let posts = filter.apply(&raw);
                    tracing::debug!(url = %endpoint, extracted = raw.len(), admitted = posts.len(), "filtered");
                    if !posts.is_empty() {
                        counter!("posts_admitted_total").increment(posts.len() as u64);
                        return FetchResult::Success(FetchSuccess {
                            total_found: posts.len(),
                            posts,
                            source: params.source.clone(),
                            source_type: params.source_type.clone(),
                            url_used: endpoint.clone(),
                        });
                    }
                    last_error = Some(AttemptError::NothingAdmitted);
                }
                None => {
                    tracing::warn!(url = %endpoint, error = ?last_error, "endpoint exhausted");
                    counter!("fetch_endpoints_exhausted_total").increment(1);
                }
            }

            if i + 1 < endpoints.len() {
                let pause = self.config.endpoint_cooldown();
                if !pause.is_zero() {
                    tokio::time::sleep(pause).await;
                }
            }
        }

        let kind = classify_failure(last_error.as_ref());
        FetchResult::Failure(FetchFailure::new(kind, &ctx))
    }
}

/// Build a fetcher from `config`, run one fetch, and drop it. Transport setup
/// problems come back as `UNEXPECTED_ERROR` rather than an `Err`.
pub async fn fetch_once(params: &FetchParams, config: FetchConfig) -> FetchResult {
    match PostFetcher::from_config(config) {
        Ok(fetcher) => fetcher.fetch(params).await,
        Err(e) => {
            tracing::warn!(error = ?e, "could not build HTTP transport");
            FetchResult::Failure(FetchFailure::new(
                FailureKind::UnexpectedError,
                &params.failure_context(),
            ))
        }
    }
}
