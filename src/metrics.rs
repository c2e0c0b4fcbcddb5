use anyhow::{anyhow, Result};
use axum::{routing::get, Router};
use metrics::gauge;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::config::FetchConfig;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder and publish the pacing settings
    /// as static gauges. Fails if a recorder is already installed.
    pub fn init(cfg: &FetchConfig) -> Result<Self> {
        // Use default buckets to avoid API differences across crate versions.
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| anyhow!("prometheus: install recorder: {e}"))?;

        gauge!("fetch_config_mirrors").set(cfg.mirrors.len() as f64);
        gauge!("fetch_config_politeness_delay_ms").set(cfg.politeness_delay_ms as f64);
        gauge!("fetch_config_max_retries").set(cfg.retry.max_retries as f64);

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
