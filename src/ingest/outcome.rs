// src/ingest/outcome.rs
//! The one value that leaves the pipeline: posts, or a failure the caller can
//! act on. Failures are data, never raised.

use serde::ser::{Serialize, Serializer};
use serde::Deserialize;

use crate::ingest::error::AttemptError;
use crate::ingest::filter::NormalizedPost;

pub const FALLBACK_SUGGESTION: &str =
    "As a backup, you can manually copy/paste Reddit content and provide it directly for analysis.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, Deserialize)]
pub enum FailureKind {
    #[serde(rename = "INVALID_SOURCE")]
    InvalidSource,
    #[serde(rename = "TIMEOUT_ERROR")]
    Timeout,
    #[serde(rename = "CONNECTION_ERROR")]
    ConnectionFailure,
    #[serde(rename = "ACCESS_FORBIDDEN")]
    AccessForbidden,
    #[serde(rename = "NOT_FOUND")]
    NotFound,
    #[serde(rename = "RATE_LIMITED")]
    RateLimited,
    #[serde(rename = "NO_VALID_CONTENT")]
    NoValidContent,
    #[serde(rename = "UNEXPECTED_ERROR")]
    UnexpectedError,
}

impl FailureKind {
    pub const ALL: [FailureKind; 8] = [
        FailureKind::InvalidSource,
        FailureKind::Timeout,
        FailureKind::ConnectionFailure,
        FailureKind::AccessForbidden,
        FailureKind::NotFound,
        FailureKind::RateLimited,
        FailureKind::NoValidContent,
        FailureKind::UnexpectedError,
    ];

    pub fn code(self) -> &'static str {
        match self {
            FailureKind::InvalidSource => "INVALID_SOURCE",
            FailureKind::Timeout => "TIMEOUT_ERROR",
            FailureKind::ConnectionFailure => "CONNECTION_ERROR",
            FailureKind::AccessForbidden => "ACCESS_FORBIDDEN",
            FailureKind::NotFound => "NOT_FOUND",
            FailureKind::RateLimited => "RATE_LIMITED",
            FailureKind::NoValidContent => "NO_VALID_CONTENT",
            FailureKind::UnexpectedError => "UNEXPECTED_ERROR",
        }
    }
}

/// Request details quoted back in guidance text.
#[derive(Debug, Clone, Copy)]
pub struct FailureContext<'a> {
    pub source: &'a str,
    pub source_type: &'a str,
    pub min_words: usize,
    pub min_score: i64,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct FetchSuccess {
    pub posts: Vec<NormalizedPost>,
    pub total_found: usize,
    pub source: String,
    pub source_type: String,
    pub url_used: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct FetchFailure {
    pub error: String,
    pub error_code: FailureKind,
    pub user_guidance: String,
    pub fallback_suggestion: String,
    /// Unix seconds with sub-second precision.
    pub timestamp: f64,
}

impl FetchFailure {
    pub fn new(kind: FailureKind, ctx: &FailureContext<'_>) -> Self {
        let (error, user_guidance) = describe(kind, ctx);
        Self {
            error,
            error_code: kind,
            user_guidance,
            fallback_suggestion: FALLBACK_SUGGESTION.to_string(),
            timestamp: now_unix_secs(),
        }
    }
}

fn describe(kind: FailureKind, ctx: &FailureContext<'_>) -> (String, String) {
    let FailureContext {
        source,
        source_type,
        min_words,
        min_score,
    } = *ctx;
    match kind {
        FailureKind::InvalidSource => (
            format!("Invalid source type '{source_type}' or unable to parse URL"),
            "Please check your source format and try again. For subreddits, use the name \
             without 'r/'. For users, use the username without 'u/'. For URLs, ensure they are \
             valid Reddit post URLs."
                .to_string(),
        ),
        FailureKind::Timeout => (
            "All requests timed out after multiple attempts".to_string(),
            "Reddit's servers are responding slowly. Try again in a few minutes, or consider \
             using manual copy/paste as a backup method."
                .to_string(),
        ),
        FailureKind::ConnectionFailure => (
            "Unable to connect to Reddit servers".to_string(),
            "Network connection issue. Check your internet connection or try again later."
                .to_string(),
        ),
        FailureKind::AccessForbidden => (
            format!("Access to '{source}' is forbidden"),
            format!(
                "The {source_type} '{source}' may be private, banned, or restricted. Try a \
                 different {source_type} or use manual copy/paste method."
            ),
        ),
        FailureKind::NotFound => (
            format!("'{source}' does not exist"),
            format!(
                "The {source_type} '{source}' was not found. Check the spelling and try again."
            ),
        ),
        FailureKind::RateLimited => (
            "Rate limited by Reddit after multiple attempts".to_string(),
            "Reddit is blocking requests due to high traffic. Wait 10-15 minutes before trying \
             again, or use manual copy/paste as an alternative."
                .to_string(),
        ),
        FailureKind::NoValidContent => (
            "No posts found meeting criteria after trying all fallback methods".to_string(),
            format!(
                "No posts in '{source}' meet your criteria (min_words: {min_words}, min_score: \
                 {min_score}). Try lowering the thresholds or choosing a different {source_type}."
            ),
        ),
        FailureKind::UnexpectedError => (
            "Unexpected error while preparing the request".to_string(),
            "An unexpected error occurred. Please try again or contact support if the issue \
             persists."
                .to_string(),
        ),
    }
}

/// Map the last observed attempt error to a failure kind. Total: anything
/// unrecognized (including no error at all) is `NoValidContent`.
pub fn classify_failure(last: Option<&AttemptError>) -> FailureKind {
    match last {
        None => FailureKind::NoValidContent,
        Some(AttemptError::Timeout(_)) => FailureKind::Timeout,
        Some(AttemptError::Connection(_) | AttemptError::Tls(_)) => FailureKind::ConnectionFailure,
        Some(AttemptError::Status { status: 403, .. }) => FailureKind::AccessForbidden,
        Some(AttemptError::Status { status: 404, .. }) => FailureKind::NotFound,
        Some(AttemptError::Status { status: 429, .. }) => FailureKind::RateLimited,
        Some(other) => classify_message(&other.to_string()),
    }
}

fn classify_message(msg: &str) -> FailureKind {
    if msg.contains("403") || msg.contains("Forbidden") {
        FailureKind::AccessForbidden
    } else if msg.contains("404") || msg.contains("Not Found") {
        FailureKind::NotFound
    } else if msg.contains("429") || msg.to_lowercase().contains("rate limit") {
        FailureKind::RateLimited
    } else {
        FailureKind::NoValidContent
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchResult {
    Success(FetchSuccess),
    Failure(FetchFailure),
}

impl FetchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchResult::Success(_))
    }

    pub fn posts(&self) -> &[NormalizedPost] {
        match self {
            FetchResult::Success(s) => &s.posts,
            FetchResult::Failure(_) => &[],
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            FetchResult::Success(_) => None,
            FetchResult::Failure(f) => Some(f.error_code),
        }
    }

    pub fn outcome_label(&self) -> &'static str {
        match self {
            FetchResult::Success(_) => "success",
            FetchResult::Failure(f) => f.error_code.code(),
        }
    }

    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{\"success\":false}".to_string())
    }
}

/// Flat record with a leading `success` flag, as consumers expect.
impl Serialize for FetchResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(serde::Serialize)]
        struct Tagged<'a, T> {
            success: bool,
            #[serde(flatten)]
            inner: &'a T,
        }
        match self {
            FetchResult::Success(s) => Tagged {
                success: true,
                inner: s,
            }
            .serialize(serializer),
            FetchResult::Failure(f) => Tagged {
                success: false,
                inner: f,
            }
            .serialize(serializer),
        }
    }
}

fn now_unix_secs() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> FailureContext<'static> {
        FailureContext {
            source: "rust",
            source_type: "subreddit",
            min_words: 30,
            min_score: 5,
        }
    }

    #[test]
    fn classification_by_kind() {
        assert_eq!(
            classify_failure(Some(&AttemptError::Timeout("x".into()))),
            FailureKind::Timeout
        );
        assert_eq!(
            classify_failure(Some(&AttemptError::Tls("x".into()))),
            FailureKind::ConnectionFailure
        );
        assert_eq!(
            classify_failure(Some(&AttemptError::from_status(404))),
            FailureKind::NotFound
        );
        assert_eq!(
            classify_failure(Some(&AttemptError::from_status(500))),
            FailureKind::NoValidContent
        );
        assert_eq!(classify_failure(None), FailureKind::NoValidContent);
        assert_eq!(
            classify_failure(Some(&AttemptError::Rejected)),
            FailureKind::NoValidContent
        );
    }

    #[test]
    fn classification_by_message() {
        assert_eq!(
            classify_failure(Some(&AttemptError::Other("upstream said Forbidden".into()))),
            FailureKind::AccessForbidden
        );
        assert_eq!(
            classify_failure(Some(&AttemptError::Other("hit a Rate Limit".into()))),
            FailureKind::RateLimited
        );
        assert_eq!(
            classify_failure(Some(&AttemptError::Other("weird".into()))),
            FailureKind::NoValidContent
        );
    }

    #[test]
    fn guidance_quotes_real_thresholds() {
        let f = FetchFailure::new(FailureKind::NoValidContent, &ctx());
        assert!(f.user_guidance.contains("min_words: 30"));
        assert!(f.user_guidance.contains("min_score: 5"));
        assert_eq!(f.fallback_suggestion, FALLBACK_SUGGESTION);
        assert!(f.timestamp > 0.0);
    }

    #[test]
    fn failure_serializes_flat_with_success_flag() {
        let r = FetchResult::Failure(FetchFailure::new(FailureKind::RateLimited, &ctx()));
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["success"], false);
        assert_eq!(v["error_code"], "RATE_LIMITED");
        for key in ["error", "user_guidance", "fallback_suggestion", "timestamp"] {
            assert!(v.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn codes_match_serde_names() {
        for kind in FailureKind::ALL {
            let v = serde_json::to_value(kind).unwrap();
            assert_eq!(v, kind.code());
        }
    }
}
