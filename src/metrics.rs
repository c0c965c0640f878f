//! Prometheus exporter and metric descriptions.

use anyhow::Context;
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub const ENV_METRICS_ENABLED: &str = "SCORING_METRICS";

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder and describe the pipeline's metrics.
    /// Fails if a recorder is already installed in this process.
    pub fn init() -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;

        describe_counter!(
            "god_score_evaluations_total",
            "Evaluations that produced a ScoreResult"
        );
        describe_counter!(
            "god_score_failures_total",
            "Evaluations that failed, labelled by error kind"
        );
        describe_counter!(
            "god_score_signal_updates_total",
            "Significant market-signal changes written to the store"
        );
        describe_gauge!("god_score_last_batch_mean", "Mean total of the last batch run");

        Ok(Self { handle })
    }

    pub fn enabled_from_env() -> bool {
        std::env::var(ENV_METRICS_ENABLED).ok().as_deref() == Some("1")
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
