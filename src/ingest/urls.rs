// src/ingest/urls.rs
//! Candidate endpoint construction. One URL per mirror, in mirror order;
//! that order is the fallback priority.

use reqwest::Url;

use crate::config::FetchConfig;
use crate::ingest::types::{SortMode, SourceDescriptor, SourceKind};

/// Build the ordered candidate list. Empty means the source is malformed.
pub fn build_candidate_urls(
    source: &SourceDescriptor,
    sort: SortMode,
    cfg: &FetchConfig,
) -> Vec<String> {
    let mut urls = Vec::with_capacity(cfg.mirrors.len());
    for mirror in &cfg.mirrors {
        let base = mirror.trim_end_matches('/');
        let candidate = match source.kind {
            SourceKind::Subreddit => clean_name(&source.raw, "r/")
                .map(|name| format!("{base}/r/{name}/{}.json", sort.as_str())),
            SourceKind::User => {
                clean_name(&source.raw, "u/").map(|name| format!("{base}/user/{name}/submitted.json"))
            }
            SourceKind::Url => {
                post_path(&source.raw, &cfg.canonical_domain).map(|path| format!("{base}{path}.json"))
            }
        };
        if let Some(url) = candidate {
            urls.push(url);
        }
    }
    urls
}

/// "r/rust/" → "rust". Empty after cleaning → `None`.
fn clean_name<'a>(raw: &'a str, prefix: &str) -> Option<&'a str> {
    let s = raw.trim().trim_start_matches('/');
    let s = s.strip_prefix(prefix).unwrap_or(s).trim_matches('/');
    (!s.is_empty()).then_some(s)
}

/// Path of a post URL on the canonical domain, trailing slash stripped.
fn post_path(raw: &str, canonical_domain: &str) -> Option<String> {
    let url = Url::parse(raw.trim()).ok()?;
    let host = url.host_str()?;
    if !host.contains(canonical_domain) {
        return None;
    }
    let path = url.path().trim_end_matches('/');
    (!path.is_empty()).then(|| path.to_string())
}
