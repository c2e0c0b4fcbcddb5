// tests/pipeline.rs
//
// End-to-end orchestration through `PostFetcher` with a scripted transport.
//
// Covered:
// - success result shape and short-circuit across mirrors
// - mirror fallback after an exhausted endpoint
// - rate limiting everywhere → RATE_LIMITED
// - payloads without posts everywhere → NO_VALID_CONTENT
// - malformed sources → INVALID_SOURCE without any network call
// - nothing passing the filter → NO_VALID_CONTENT guidance with thresholds

mod common;

use std::sync::Arc;

use common::{fixture, quiet_config, Scripted, ScriptedTransport};
use reddit_feed_fetcher::ingest::outcome::{FailureKind, FetchResult, FALLBACK_SUGGESTION};
use reddit_feed_fetcher::ingest::params::FetchParams;
use reddit_feed_fetcher::ingest::types::SourceKind;
use reddit_feed_fetcher::PostFetcher;

const WWW: &str = "https://www.reddit.com/r/rust/hot.json";
const OLD: &str = "https://old.reddit.com/r/rust/hot.json";

fn fetcher(t: &Arc<ScriptedTransport>) -> PostFetcher {
    PostFetcher::new(t.clone(), quiet_config())
}

fn rust_params() -> FetchParams {
    FetchParams::new("rust", SourceKind::Subreddit).with_thresholds(10, 10)
}

#[tokio::test]
async fn success_reports_posts_and_url_used() {
    let t = Arc::new(
        ScriptedTransport::new(Scripted::status(500))
            .route(WWW, [Scripted::ok(fixture("listing_mixed.json"))]),
    );
    let result = fetcher(&t).fetch(&rust_params().with_limit(3)).await;

    let FetchResult::Success(s) = result else {
        panic!("expected success");
    };
    assert_eq!(s.url_used, WWW);
    assert_eq!(s.source, "rust");
    assert_eq!(s.source_type, "subreddit");
    assert_eq!(s.total_found, s.posts.len());
    assert_eq!(s.posts[0].author, "ferris_fan");
    // Second mirror never contacted.
    assert!(t.urls().iter().all(|u| u.starts_with("https://www.")));
}

#[tokio::test]
async fn falls_back_to_next_mirror() {
    let t = Arc::new(
        ScriptedTransport::new(Scripted::status(503))
            .route(OLD, [Scripted::ok(fixture("listing_mixed.json"))]),
    );
    let result = fetcher(&t).fetch(&rust_params()).await;

    assert!(result.is_success(), "{result:?}");
    let FetchResult::Success(s) = result else { unreachable!() };
    assert_eq!(s.url_used, OLD);
    assert_eq!(s.posts.len(), 1);
    let urls = t.urls();
    assert_eq!(urls.len(), 4);
    assert_eq!(urls[3], OLD);
}

#[tokio::test]
async fn rate_limited_on_every_mirror() {
    let t = Arc::new(ScriptedTransport::new(Scripted::status(429)));
    let result = fetcher(&t).fetch(&rust_params()).await;

    let FetchResult::Failure(f) = &result else {
        panic!("expected failure");
    };
    assert_eq!(f.error_code, FailureKind::RateLimited);
    assert!(f.timestamp > 0.0);
    assert_eq!(f.fallback_suggestion, FALLBACK_SUGGESTION);
    // Two mirrors × three variants.
    assert_eq!(t.calls().len(), 6);
}

#[tokio::test]
async fn payloads_without_children_everywhere() {
    let t = Arc::new(ScriptedTransport::new(Scripted::ok(r#"{"data": {"after": null}}"#)));
    let result = fetcher(&t).fetch(&rust_params()).await;
    assert_eq!(result.failure_kind(), Some(FailureKind::NoValidContent));
}

#[tokio::test]
async fn malformed_url_source_never_touches_network() {
    let t = Arc::new(ScriptedTransport::new(Scripted::ok(fixture("listing_mixed.json"))));
    let params = FetchParams::new("badname!!", SourceKind::Url);
    let result = fetcher(&t).fetch(&params).await;

    assert_eq!(result.failure_kind(), Some(FailureKind::InvalidSource));
    assert!(t.calls().is_empty());
}

#[tokio::test]
async fn unknown_source_type_is_invalid() {
    let t = Arc::new(ScriptedTransport::new(Scripted::ok(fixture("listing_mixed.json"))));
    let mut params = rust_params();
    params.source_type = "forum".into();
    let result = fetcher(&t).fetch(&params).await;

    let FetchResult::Failure(f) = result else {
        panic!("expected failure");
    };
    assert_eq!(f.error_code, FailureKind::InvalidSource);
    assert!(f.error.contains("forum"));
    assert!(t.calls().is_empty());
}

#[tokio::test]
async fn nothing_admitted_tries_next_mirror_then_fails() {
    let t = Arc::new(ScriptedTransport::new(Scripted::ok(fixture("listing_mixed.json"))));
    let params = rust_params().with_thresholds(500, 10);
    let result = fetcher(&t).fetch(&params).await;

    let FetchResult::Failure(f) = result else {
        panic!("expected failure");
    };
    assert_eq!(f.error_code, FailureKind::NoValidContent);
    assert!(f.user_guidance.contains("min_words: 500"));
    // First variant of each mirror is accepted, then filtered to nothing.
    assert_eq!(t.urls(), vec![WWW, OLD]);
}

#[tokio::test]
async fn sort_mode_picks_the_listing_path() {
    let t = Arc::new(ScriptedTransport::new(Scripted::ok(fixture("listing_mixed.json"))));
    let result = fetcher(&t).fetch(&rust_params().with_sort("top")).await;

    assert!(result.is_success());
    assert_eq!(t.urls(), vec!["https://www.reddit.com/r/rust/top.json"]);
}

#[tokio::test]
async fn not_found_is_classified_from_last_status() {
    let t = Arc::new(ScriptedTransport::new(Scripted::status(404)));
    let params = FetchParams::new("u/ghost", SourceKind::User);
    let result = fetcher(&t).fetch(&params).await;
    assert_eq!(result.failure_kind(), Some(FailureKind::NotFound));
    assert!(t
        .urls()
        .iter()
        .all(|u| u.contains("/user/ghost/submitted.json")));
}

#[tokio::test]
async fn connection_errors_classify_as_connection_failure() {
    let t = Arc::new(ScriptedTransport::new(Scripted::Fail(
        reddit_feed_fetcher::ingest::error::TransportError::Connect("refused".into()),
    )));
    let result = fetcher(&t).fetch(&rust_params()).await;
    assert_eq!(result.failure_kind(), Some(FailureKind::ConnectionFailure));
}

#[tokio::test]
async fn permalink_source_uses_post_path() {
    let post = "https://www.reddit.com/r/rust/comments/b1/show_off/";
    let t = Arc::new(
        ScriptedTransport::new(Scripted::status(404)).route(
            "https://www.reddit.com/r/rust/comments/b1/show_off.json",
            [Scripted::ok(fixture("permalink_thread.json"))],
        ),
    );
    let params = FetchParams::new(post, SourceKind::Url).with_thresholds(10, 10);
    let result = fetcher(&t).fetch(&params).await;

    assert_eq!(result.posts().len(), 1);
    assert_eq!(result.posts()[0].author, "weekend_hacker");
}
