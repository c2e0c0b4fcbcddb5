//! Reddit feed fetcher: binary entrypoint.
//! Boots the Axum HTTP server with the fetch pipeline, tool descriptor and
//! Prometheus metrics.

use anyhow::Context;
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use reddit_feed_fetcher::metrics::Metrics;
use reddit_feed_fetcher::{router, AppState, FetchConfig, PostFetcher};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("reddit_feed_fetcher=info,warn"));

    // Shuttle may already have installed a subscriber; keep theirs if so.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    // This enables FEED_FETCH_CONFIG_PATH and RUST_LOG from .env.
    let _ = dotenvy::dotenv();

    init_tracing();

    let config = FetchConfig::load_default().context("loading fetch config")?;
    tracing::info!(
        mirrors = config.mirrors.len(),
        politeness_delay_ms = config.politeness_delay_ms,
        "fetch config loaded"
    );

    let metrics = Metrics::init(&config)?;
    let fetcher = PostFetcher::from_config(config).context("building HTTP transport")?;

    let app = router(AppState::new(fetcher)).merge(metrics.router());

    Ok(app.into())
}
