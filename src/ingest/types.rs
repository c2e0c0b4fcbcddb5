// src/ingest/types.rs
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Subreddit,
    User,
    Url,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Subreddit => "subreddit",
            SourceKind::User => "user",
            SourceKind::Url => "url",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "subreddit" => Ok(SourceKind::Subreddit),
            "user" => Ok(SourceKind::User),
            "url" => Ok(SourceKind::Url),
            other => Err(format!("unknown source type '{other}'")),
        }
    }
}

/// What the caller asked for: a subreddit, a user, or a post URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub raw: String,
    pub kind: SourceKind,
}

impl SourceDescriptor {
    pub fn new(raw: impl Into<String>, kind: SourceKind) -> Self {
        Self {
            raw: raw.into(),
            kind,
        }
    }
}

/// Listing sort. Unknown input falls back to `Hot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    #[default]
    Hot,
    New,
    Top,
    Rising,
}

impl SortMode {
    pub fn parse_or_default(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "new" => SortMode::New,
            "top" => SortMode::Top,
            "rising" => SortMode::Rising,
            _ => SortMode::Hot,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortMode::Hot => "hot",
            SortMode::New => "new",
            SortMode::Top => "top",
            SortMode::Rising => "rising",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestVariant {
    Bare,
    WithLimit,
    WithSortAndLimit,
}

impl RequestVariant {
    /// Attempt order within one endpoint.
    pub const ORDER: [RequestVariant; 3] = [
        RequestVariant::Bare,
        RequestVariant::WithLimit,
        RequestVariant::WithSortAndLimit,
    ];

    pub fn apply(self, endpoint: &str, page_size: u32) -> String {
        match self {
            RequestVariant::Bare => endpoint.to_string(),
            RequestVariant::WithLimit => format!("{endpoint}?limit={page_size}"),
            RequestVariant::WithSortAndLimit => format!("{endpoint}?sort=hot&limit={page_size}"),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RequestVariant::Bare => "bare",
            RequestVariant::WithLimit => "limit",
            RequestVariant::WithSortAndLimit => "sort_limit",
        }
    }
}

/// One concrete GET, generated per attempt and never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub attempt_variant: RequestVariant,
}

impl FetchRequest {
    pub fn variants(endpoint: &str, page_size: u32) -> Vec<FetchRequest> {
        RequestVariant::ORDER
            .iter()
            .map(|v| FetchRequest {
                url: v.apply(endpoint, page_size),
                attempt_variant: *v,
            })
            .collect()
    }
}

/// One listing entry's `data` block, read through tolerant accessors.
/// A missing or mistyped field yields the supplied default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPost(Map<String, Value>);

impl RawPost {
    pub fn str_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.0.get(key).and_then(Value::as_str).unwrap_or(default)
    }

    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        self.0.get(key).and_then(Value::as_bool).unwrap_or(default)
    }

    pub fn i64_or(&self, key: &str, default: i64) -> i64 {
        match self.0.get(key) {
            Some(v) => v
                .as_i64()
                .or_else(|| v.as_f64().map(|f| f as i64))
                .unwrap_or(default),
            None => default,
        }
    }

    pub fn f64_or(&self, key: &str, default: f64) -> f64 {
        self.0.get(key).and_then(Value::as_f64).unwrap_or(default)
    }

    /// Truthiness as a loosely-typed feed means it: null, false, 0, "" and
    /// empty containers are all "unset".
    pub fn is_set(&self, key: &str) -> bool {
        match self.0.get(key) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Array(a)) => !a.is_empty(),
            Some(Value::Object(o)) => !o.is_empty(),
        }
    }
}

impl From<Map<String, Value>> for RawPost {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
