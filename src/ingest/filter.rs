// src/ingest/filter.rs
//! Content-quality gate: turns raw posts into normalized records and keeps
//! the first `limit` that clear the thresholds.

use once_cell::sync::OnceCell;
use regex::Regex;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::ingest::types::RawPost;

pub const DELETION_MARKERS: [&str; 2] = ["[deleted]", "[removed]"];
pub const SPAM_MARKERS: [&str; 4] = [
    "[removed]",
    "[deleted]",
    "this post was removed",
    "comment deleted",
];
pub const MIN_CONTENT_CHARS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    Text,
    Image,
    Video,
    Link,
    Crosspost,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPost {
    pub title: String,
    pub selftext: String,
    pub full_content: String,
    pub author: String,
    pub subreddit: String,
    pub score: i64,
    pub upvote_ratio: f64,
    pub num_comments: i64,
    pub created_utc: f64,
    pub permalink: String,
    pub word_count: usize,
    pub post_type: PostType,
    pub url: String,
    pub domain: String,
    pub is_self: bool,
    pub flair: String,
    pub nsfw: bool,
    pub spoiler: bool,
    pub stickied: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterCriteria {
    pub min_words: usize,
    pub min_score: i64,
    pub limit: usize,
}

pub struct PostFilter<'a> {
    criteria: FilterCriteria,
    permalink_base: &'a str,
}

impl<'a> PostFilter<'a> {
    pub fn new(criteria: FilterCriteria, permalink_base: &'a str) -> Self {
        Self {
            criteria,
            permalink_base,
        }
    }

    /// Admit posts in input order, stopping at `limit`. Never reorders.
    pub fn apply(&self, posts: &[RawPost]) -> Vec<NormalizedPost> {
        let limit = self.criteria.limit.max(1);
        let mut out = Vec::with_capacity(limit.min(posts.len()));
        for post in posts {
            if let Some(normalized) = self.admit(post) {
                out.push(normalized);
                if out.len() >= limit {
                    break;
                }
            }
        }
        out
    }

    fn admit(&self, post: &RawPost) -> Option<NormalizedPost> {
        if is_removed(post) {
            return None;
        }

        let title = post.str_or("title", "").trim().to_string();
        let mut selftext = post.str_or("selftext", "").trim().to_string();
        let is_self = post.bool_or("is_self", false);
        let url = post.str_or("url", "");

        if selftext.is_empty() && !is_self && !url.is_empty() {
            selftext = format!("Link to: {}", extract_domain(url));
        }

        let full_content = format!("{title} {selftext}").trim().to_string();
        let words = word_count(&full_content);
        let score = post.i64_or("score", 0).max(0);
        if words < self.criteria.min_words || score < self.criteria.min_score {
            return None;
        }

        let normalized = NormalizedPost {
            title,
            selftext,
            full_content,
            author: post.str_or("author", "").to_string(),
            subreddit: post.str_or("subreddit", "").to_string(),
            score,
            upvote_ratio: post.f64_or("upvote_ratio", 0.0),
            num_comments: post.i64_or("num_comments", 0),
            created_utc: post.f64_or("created_utc", 0.0),
            permalink: format!("{}{}", self.permalink_base, post.str_or("permalink", "")),
            word_count: words,
            post_type: classify_post_type(post, self.permalink_base),
            url: url.to_string(),
            domain: extract_domain(url),
            is_self,
            flair: post.str_or("link_flair_text", "").to_string(),
            nsfw: post.bool_or("over_18", false),
            spoiler: post.bool_or("spoiler", false),
            stickied: post.bool_or("stickied", false),
        };

        has_meaningful_content(&normalized).then_some(normalized)
    }
}

fn is_removed(post: &RawPost) -> bool {
    post.is_set("removed_by_category")
        || DELETION_MARKERS.contains(&post.str_or("author", ""))
        || DELETION_MARKERS.contains(&post.str_or("selftext", ""))
}

fn has_meaningful_content(post: &NormalizedPost) -> bool {
    if post.title.trim().is_empty() {
        return false;
    }
    let content = post.full_content.trim();
    if content.chars().count() < MIN_CONTENT_CHARS {
        return false;
    }
    let lower = content.to_lowercase();
    !SPAM_MARKERS.iter().any(|m| lower.contains(m))
}

/// Count tokens longer than two characters after blanking HTML entities and
/// markdown punctuation.
pub fn word_count(text: &str) -> usize {
    static RE_ENTITY: OnceCell<Regex> = OnceCell::new();
    static RE_MARKDOWN: OnceCell<Regex> = OnceCell::new();
    let re_entity = RE_ENTITY.get_or_init(|| Regex::new(r"&[a-zA-Z]+;").unwrap());
    let re_markdown = RE_MARKDOWN.get_or_init(|| Regex::new(r"[*_`#\[\]()]").unwrap());

    let clean = re_entity.replace_all(text, " ");
    let clean = re_markdown.replace_all(&clean, " ");
    clean
        .split_whitespace()
        .filter(|w| w.chars().count() > 2)
        .count()
}

/// `host[:port]` of an http(s) URL, otherwise empty.
pub fn extract_domain(url: &str) -> String {
    if !url.starts_with("http") {
        return String::new();
    }
    let Ok(parsed) = Url::parse(url) else {
        return String::new();
    };
    match (parsed.host_str(), parsed.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        _ => String::new(),
    }
}

/// First matching rule wins: self → image → video → link → crosspost → other.
pub fn classify_post_type(post: &RawPost, permalink_base: &str) -> PostType {
    let hint = post.str_or("post_hint", "");
    if post.bool_or("is_self", false) {
        PostType::Text
    } else if hint == "image" {
        PostType::Image
    } else if hint == "rich:video" || post.bool_or("is_video", false) {
        PostType::Video
    } else if hint == "link" {
        PostType::Link
    } else if post.str_or("url", "").starts_with(permalink_base) {
        PostType::Crosspost
    } else {
        PostType::Other
    }
}
