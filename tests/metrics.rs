// tests/metrics.rs
//
// Installs the global Prometheus recorder, so it lives in its own test binary
// and only runs with `--features strict-metrics`.
#![cfg(feature = "strict-metrics")]

mod common;

use std::sync::Arc;

use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use common::{fixture, quiet_config, Scripted, ScriptedTransport};
use reddit_feed_fetcher::ingest::params::FetchParams;
use reddit_feed_fetcher::ingest::types::SourceKind;
use reddit_feed_fetcher::metrics::Metrics;
use reddit_feed_fetcher::PostFetcher;

#[tokio::test]
async fn metrics_endpoint_contains_fetch_series() {
    let cfg = quiet_config();
    let metrics = Metrics::init(&cfg).expect("install recorder");

    let t = ScriptedTransport::new(Scripted::status(500)).route(
        "https://www.reddit.com/r/rust/hot.json",
        [
            Scripted::status(403),
            Scripted::ok(fixture("listing_mixed.json")),
        ],
    );
    let fetcher = PostFetcher::new(Arc::new(t), cfg);
    let result = fetcher
        .fetch(&FetchParams::new("rust", SourceKind::Subreddit).with_thresholds(10, 10))
        .await;
    assert!(result.is_success());

    let resp = metrics
        .router()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let text = String::from_utf8(
        body::to_bytes(resp.into_body(), 1024 * 1024)
            .await
            .unwrap()
            .to_vec(),
    )
    .unwrap();

    for series in [
        "fetch_attempts_total",
        "fetch_status_total",
        "fetch_fallbacks_total",
        "posts_admitted_total",
        "fetch_results_total",
        "fetch_config_mirrors",
    ] {
        assert!(text.contains(series), "missing {series} in:\n{text}");
    }
    assert!(text.contains(r#"kind="minimal_headers""#));
    assert!(text.contains(r#"outcome="success""#));
}
