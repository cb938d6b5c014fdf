//! Pipeline metrics exposed on `GET /metrics`.

use chrono::{DateTime, Utc};
use cote_utils::PipelineStage;
use prometheus::{
    Gauge, Histogram, HistogramOpts, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use std::time::Duration;

#[derive(Clone)]
pub struct PipelineMetrics {
    registry: Registry,
    runs: IntCounterVec,
    failures: IntCounterVec,
    records: IntGauge,
    last_success: Gauge,
    duration: Histogram,
}

impl PipelineMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let runs = IntCounterVec::new(
            Opts::new("cote_pipeline_runs_total", "Pipeline ticks by outcome"),
            &["outcome"],
        )?;
        let failures = IntCounterVec::new(
            Opts::new("cote_pipeline_failures_total", "Failed pipeline runs by stage"),
            &["stage"],
        )?;
        let records = IntGauge::new("cote_snapshot_records", "Records in the cached snapshot")?;
        let last_success = Gauge::new(
            "cote_last_success_timestamp_seconds",
            "Unix time of the last successful run",
        )?;
        let duration = Histogram::with_opts(
            HistogramOpts::new("cote_pipeline_run_duration_seconds", "Wall time of pipeline runs")
                .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]),
        )?;

        registry.register(Box::new(runs.clone()))?;
        registry.register(Box::new(failures.clone()))?;
        registry.register(Box::new(records.clone()))?;
        registry.register(Box::new(last_success.clone()))?;
        registry.register(Box::new(duration.clone()))?;

        Ok(Self {
            registry,
            runs,
            failures,
            records,
            last_success,
            duration,
        })
    }

    pub fn record_success(&self, records: usize, at: DateTime<Utc>, elapsed: Duration) {
        self.runs.with_label_values(&["completed"]).inc();
        self.records.set(records as i64);
        self.last_success.set(at.timestamp() as f64);
        self.duration.observe(elapsed.as_secs_f64());
    }

    pub fn record_failure(&self, stage: PipelineStage, elapsed: Duration) {
        self.runs.with_label_values(&["failed"]).inc();
        self.failures.with_label_values(&[&stage.to_string()]).inc();
        self.duration.observe(elapsed.as_secs_f64());
    }

    pub fn record_skipped(&self) {
        self.runs.with_label_values(&["skipped"]).inc();
    }

    pub fn render(&self) -> Result<String, prometheus::Error> {
        TextEncoder::new().encode_to_string(&self.registry.gather())
    }
}
