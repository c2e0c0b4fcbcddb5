// src/api.rs
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;

use crate::ingest::outcome::{FailureContext, FailureKind, FetchFailure, FetchResult};
use crate::ingest::params::FetchParams;
use crate::ingest::PostFetcher;

/// Shared service state. `in_flight` keeps one upstream fetch running at a
/// time so concurrent callers never interleave requests on the same mirrors.
#[derive(Clone)]
pub struct AppState {
    pub fetcher: Arc<PostFetcher>,
    in_flight: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(fetcher: PostFetcher) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            in_flight: Arc::new(Mutex::new(())),
        }
    }
}

/// Public router builder used by the binary and tests.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/tool", get(tool))
        .route("/fetch", post(fetch))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn tool() -> Json<Value> {
    Json(FetchParams::tool_descriptor())
}

/// Always 200: failures travel in the body with `success: false`, including
/// bodies that don't deserialize into `FetchParams`.
async fn fetch(
    State(state): State<AppState>,
    body: Result<Json<FetchParams>, JsonRejection>,
) -> Json<FetchResult> {
    let params = match body {
        Ok(Json(params)) => params,
        Err(rejection) => {
            tracing::warn!(error = %rejection.body_text(), "unreadable fetch request");
            let ctx = FailureContext {
                source: "",
                source_type: "",
                min_words: 0,
                min_score: 0,
            };
            return Json(FetchResult::Failure(FetchFailure::new(
                FailureKind::InvalidSource,
                &ctx,
            )));
        }
    };

    let _guard = state.in_flight.lock().await;
    tracing::info!(source = %params.source, source_type = %params.source_type, "fetch requested");
    Json(state.fetcher.fetch(&params).await)
}
