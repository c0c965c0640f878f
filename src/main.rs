//! GOD score service: binary entrypoint.
//! Boots the Axum HTTP server over the scoring library: weights registry,
//! runtime flags, stores, optional Prometheus metrics.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use shuttle_axum::ShuttleAxum;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use god_score_engine::metrics::Metrics;
use god_score_engine::store::{FileSignalStore, SignalStore};
use god_score_engine::versioning::start_hot_reload_thread;
use god_score_engine::weights::{DEFAULT_WEIGHTS_CONFIG_PATH, ENV_WEIGHTS_CONFIG_PATH};
use god_score_engine::{
    create_router, AppState, EngineStores, RuntimeConfig, ScoringEngine, WeightsHandle,
    WeightsRegistry,
};

const ENV_SIGNAL_STATE_PATH: &str = "SIGNAL_STATE_PATH";

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - SCORING_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("SCORING_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("god_score_engine=info,persist=info,kill_switch=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    enable_dev_tracing();

    let registry = WeightsRegistry::load_default().context("load weights registry")?;
    let weights = WeightsHandle::new(registry);
    let runtime = RuntimeConfig::from_env();

    let path = std::env::var(ENV_WEIGHTS_CONFIG_PATH)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_WEIGHTS_CONFIG_PATH));
    start_hot_reload_thread(weights.clone(), path);

    let mut stores = EngineStores::in_memory();
    if let Ok(p) = std::env::var(ENV_SIGNAL_STATE_PATH) {
        let file: Arc<dyn SignalStore> = Arc::new(FileSignalStore::new(p));
        stores.signals = file;
    }

    info!(
        frozen = runtime.frozen,
        dry_run = runtime.dry_run,
        version_override = ?runtime.version_override,
        "scoring runtime configured"
    );

    let state = AppState::new(ScoringEngine::new(weights, stores), runtime);
    let mut router = create_router(state);
    if Metrics::enabled_from_env() {
        let metrics = Metrics::init()?;
        router = router.merge(metrics.router());
    }

    Ok(router.into())
}
