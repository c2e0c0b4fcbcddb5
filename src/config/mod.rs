// src/config/mod.rs
pub mod fetch;

pub use fetch::{FetchConfig, RetryPolicy, ENV_FETCH_CONFIG_PATH};
