// src/ingest/params.rs
//! Inbound call contract: what the consuming layer sends to ask for posts.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::ingest::filter::FilterCriteria;
use crate::ingest::outcome::FailureContext;
use crate::ingest::types::{SortMode, SourceDescriptor, SourceKind};

pub const TOOL_NAME: &str = "reddit_api_tool";

fn default_source_type() -> String {
    "subreddit".to_string()
}
fn default_min_words() -> usize {
    50
}
fn default_min_score() -> i64 {
    10
}
fn default_sort_type() -> String {
    "hot".to_string()
}
fn default_limit() -> usize {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchParams {
    /// Subreddit name, username, or direct post URL.
    pub source: String,
    /// "subreddit" | "user" | "url"; anything else is an invalid source.
    #[serde(default = "default_source_type")]
    pub source_type: String,
    #[serde(default = "default_min_words")]
    pub min_words: usize,
    #[serde(default = "default_min_score")]
    pub min_score: i64,
    /// "hot" | "new" | "top" | "rising"; anything else means "hot".
    #[serde(default = "default_sort_type")]
    pub sort_type: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl FetchParams {
    pub fn new(source: impl Into<String>, kind: SourceKind) -> Self {
        Self {
            source: source.into(),
            source_type: kind.as_str().to_string(),
            min_words: default_min_words(),
            min_score: default_min_score(),
            sort_type: default_sort_type(),
            limit: default_limit(),
        }
    }

    pub fn with_thresholds(mut self, min_words: usize, min_score: i64) -> Self {
        self.min_words = min_words;
        self.min_score = min_score;
        self
    }

    pub fn with_sort(mut self, sort_type: impl Into<String>) -> Self {
        self.sort_type = sort_type.into();
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// `None` when `source_type` names no known kind.
    pub fn descriptor(&self) -> Option<SourceDescriptor> {
        let kind = self.source_type.parse::<SourceKind>().ok()?;
        Some(SourceDescriptor::new(self.source.clone(), kind))
    }

    pub fn sort_mode(&self) -> SortMode {
        SortMode::parse_or_default(&self.sort_type)
    }

    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            min_words: self.min_words,
            min_score: self.min_score,
            limit: self.limit.max(1),
        }
    }

    pub fn failure_context(&self) -> FailureContext<'_> {
        FailureContext {
            source: &self.source,
            source_type: &self.source_type,
            min_words: self.min_words,
            min_score: self.min_score,
        }
    }

    /// Name, description and argument schema advertised to tool-calling agents.
    pub fn tool_descriptor() -> Value {
        json!({
            "name": TOOL_NAME,
            "description": "Fetches Reddit posts through the public JSON API with retries, \
                mirror fallbacks and content validation. Supports subreddit listings, user \
                submissions and direct post URLs. Handles rate limiting, TLS errors and \
                blocked endpoints by degrading gracefully.",
            "parameters": {
                "source": {
                    "type": "string",
                    "required": true,
                    "description": "Subreddit name (e.g. 'politics'), username, or direct post URL"
                },
                "source_type": {
                    "type": "string",
                    "enum": ["subreddit", "user", "url"],
                    "default": default_source_type()
                },
                "min_words": {
                    "type": "integer",
                    "minimum": 0,
                    "default": default_min_words()
                },
                "min_score": {
                    "type": "integer",
                    "minimum": 0,
                    "default": default_min_score()
                },
                "sort_type": {
                    "type": "string",
                    "enum": ["hot", "new", "top", "rising"],
                    "default": default_sort_type()
                },
                "limit": {
                    "type": "integer",
                    "minimum": 1,
                    "default": default_limit()
                }
            }
        })
    }
}
