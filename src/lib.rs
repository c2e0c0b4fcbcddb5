// src/lib.rs
// Public library surface for the service binary and integration tests.

pub mod api;
pub mod config;
pub mod ingest;
pub mod metrics;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::config::{FetchConfig, RetryPolicy};
pub use crate::ingest::outcome::{FailureKind, FetchResult};
pub use crate::ingest::params::FetchParams;
pub use crate::ingest::{fetch_once, PostFetcher};
