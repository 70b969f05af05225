// src/metrics.rs
use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

#[derive(Clone)]
pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder. Call once per process.
    pub fn init() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        describe();
        Ok(Self { handle })
    }

    /// Prometheus exposition text.
    pub fn render(&self) -> String {
        self.handle.render()
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

fn describe() {
    describe_counter!(
        "brief_source_unavailable_total",
        "Feeds that could not be read and were replaced by an empty snapshot"
    );
    describe_counter!(
        "brief_generation_total",
        "Narrative generation attempts by outcome"
    );
    describe_histogram!(
        "brief_generation_ms",
        Unit::Milliseconds,
        "Wall time of the text-generation call"
    );
    describe_counter!("brief_documents_written_total", "Briefs persisted to the store");
    describe_counter!("brief_pages_written_total", "HTML pages written by the site assembler");
    describe_counter!(
        "brief_notifications_total",
        "Notification attempts by channel and outcome"
    );
}
