//! Pipeline Scheduler
//!
//! Drives the pipeline on a fixed interval and guarantees that at most one
//! run is in flight, whether it was started by the timer or by a manual
//! refresh.

use chrono::{DateTime, Utc};
use cote_utils::{log_error, PipelineStage, SchedulerConfig};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::metrics::PipelineMetrics;
use crate::pipeline::Pipeline;
use crate::state_machine::SchedulerState;

/// Most recent failure, kept until the next one replaces it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastError {
    pub stage: PipelineStage,
    pub message: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerStatus {
    pub state: SchedulerState,
    pub last_run_at: Option<DateTime<Utc>>,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_error: Option<LastError>,
    pub next_run_at: Option<DateTime<Utc>>,
    pub runs: u64,
    pub failures: u64,
    pub skipped: u64,
}

/// Result of one tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum TickOutcome {
    #[serde(rename_all = "camelCase")]
    Completed {
        records: usize,
        updated_at: DateTime<Utc>,
    },
    Failed {
        stage: PipelineStage,
        error: String,
    },
    /// Another run was already in flight.
    Skipped,
}

/// Clears the in-flight flag even if the tick future is dropped.
struct InFlight<'a> {
    flag: &'a AtomicBool,
    finished: &'a Notify,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
        self.finished.notify_waiters();
    }
}

pub struct PipelineScheduler {
    pipeline: Pipeline,
    config: SchedulerConfig,
    metrics: PipelineMetrics,
    clock: Arc<dyn Clock>,
    in_flight: AtomicBool,
    run_finished: Notify,
    status: RwLock<SchedulerStatus>,
}

impl PipelineScheduler {
    pub fn new(
        pipeline: Pipeline,
        config: SchedulerConfig,
        metrics: PipelineMetrics,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            pipeline,
            config,
            metrics,
            clock,
            in_flight: AtomicBool::new(false),
            run_finished: Notify::new(),
            status: RwLock::new(SchedulerStatus::default()),
        }
    }

    pub async fn status(&self) -> SchedulerStatus {
        self.status.read().await.clone()
    }

    /// Runs the pipeline once unless a run is already in flight.
    pub async fn tick(&self) -> TickOutcome {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Pipeline run already in flight, skipping tick");
            self.status.write().await.skipped += 1;
            self.metrics.record_skipped();
            return TickOutcome::Skipped;
        }
        let _in_flight = InFlight {
            flag: &self.in_flight,
            finished: &self.run_finished,
        };

        {
            let mut status = self.status.write().await;
            transition(&mut status, SchedulerState::Running);
            status.last_run_at = Some(self.clock.now());
            status.runs += 1;
        }

        let started = Instant::now();
        let result = self.pipeline.run().await;
        let elapsed = started.elapsed();
        let elapsed_ms = elapsed.as_millis() as u64;

        let mut status = self.status.write().await;
        match result {
            Ok(report) => {
                info!(
                    records = report.records,
                    warnings = report.warnings,
                    lines_skipped = report.lines_skipped,
                    bulletin_date = ?report.bulletin_date,
                    elapsed_ms,
                    "Pipeline run completed"
                );
                transition(&mut status, SchedulerState::Idle);
                status.last_success_at = Some(report.updated_at);
                self.metrics
                    .record_success(report.records, report.updated_at, elapsed);

                TickOutcome::Completed {
                    records: report.records,
                    updated_at: report.updated_at,
                }
            }
            Err(err) => {
                let stage = err.stage();
                log_error!(
                    err,
                    "Pipeline run failed",
                    stage = %stage,
                    url = %self.pipeline.source_url(),
                    elapsed_ms
                );

                transition(&mut status, SchedulerState::IdleWithError);
                status.failures += 1;
                status.last_error = Some(LastError {
                    stage,
                    message: err.to_string(),
                    at: self.clock.now(),
                });
                self.metrics.record_failure(stage, elapsed);

                TickOutcome::Failed {
                    stage,
                    error: err.to_string(),
                }
            }
        }
    }

    /// Timer loop. Returns once `shutdown` flips to true or its sender is dropped.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_seconds = self.config.interval_seconds,
            retry_delay_seconds = self.config.retry_delay().as_secs(),
            run_on_start = self.config.run_on_start,
            "Scheduler started"
        );

        let mut delay = if self.config.run_on_start {
            Duration::ZERO
        } else {
            self.config.interval()
        };

        loop {
            if *shutdown.borrow() {
                break;
            }
            self.set_next_run(delay).await;

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
            }

            delay = match self.tick().await {
                TickOutcome::Failed { .. } => self.config.retry_delay(),
                TickOutcome::Completed { .. } => self.config.interval(),
                TickOutcome::Skipped => self.delay_after_concurrent_run().await,
            };
        }

        self.status.write().await.next_run_at = None;
        info!("Scheduler stopped");
    }

    /// Waits for the run that caused a skip, then follows its outcome.
    async fn delay_after_concurrent_run(&self) -> Duration {
        let finished = self.run_finished.notified();
        tokio::pin!(finished);
        finished.as_mut().enable();
        if self.in_flight.load(Ordering::Acquire) {
            finished.await;
        }

        match self.status.read().await.state {
            SchedulerState::IdleWithError => self.config.retry_delay(),
            _ => self.config.interval(),
        }
    }

    async fn set_next_run(&self, delay: Duration) {
        let next = chrono::Duration::from_std(delay)
            .ok()
            .map(|d| self.clock.now() + d);
        self.status.write().await.next_run_at = next;
    }
}

fn transition(status: &mut SchedulerStatus, to: SchedulerState) {
    if !status.state.can_transition_to(to) {
        warn!(from = %status.state, to = %to, "Unexpected scheduler transition");
    }
    status.state = to;
}
