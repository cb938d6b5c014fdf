//! Bulletin Pipeline
//!
//! One run: fetch the document, extract its text, parse and check the
//! records, then publish them as the new snapshot.

use chrono::{DateTime, NaiveDate, Utc};
use cote_models::Snapshot;
use cote_utils::{
    BulletinParser, BulletinValidator, ExtractionError, ParseError, PipelineError, ValidationSeverity,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::cache::SnapshotCache;
use crate::clock::Clock;
use crate::fetcher::DocumentSource;
use crate::pdf_processor::TextExtractor;

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub records: usize,
    pub warnings: usize,
    pub lines_skipped: usize,
    pub bulletin_date: Option<NaiveDate>,
    pub updated_at: DateTime<Utc>,
}

pub struct Pipeline {
    source: Arc<dyn DocumentSource>,
    extractor: Arc<dyn TextExtractor>,
    parser: BulletinParser,
    validator: BulletinValidator,
    cache: SnapshotCache,
    clock: Arc<dyn Clock>,
    max_run: Duration,
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn DocumentSource>,
        extractor: Arc<dyn TextExtractor>,
        parser: BulletinParser,
        validator: BulletinValidator,
        cache: SnapshotCache,
        clock: Arc<dyn Clock>,
        max_run: Duration,
    ) -> Self {
        Self {
            source,
            extractor,
            parser,
            validator,
            cache,
            clock,
            max_run,
        }
    }

    pub fn source_url(&self) -> &str {
        self.source.url()
    }

    /// Runs all stages within `max_run`. The cache is only written when every
    /// stage succeeds; an abandoned run leaves it as it was.
    pub async fn run(&self) -> Result<RunReport, PipelineError> {
        match tokio::time::timeout(self.max_run, self.execute()).await {
            Ok(result) => result,
            Err(_) => Err(PipelineError::Timeout(self.max_run)),
        }
    }

    async fn execute(&self) -> Result<RunReport, PipelineError> {
        let document = self.source.fetch().await?;
        let source_url = document.source_url.clone();
        debug!(url = %source_url, bytes = document.len(), "Fetched bulletin");

        let extractor = Arc::clone(&self.extractor);
        let text = tokio::task::spawn_blocking(move || extractor.extract(&document))
            .await
            .map_err(|e| ExtractionError::Aborted {
                message: e.to_string(),
            })??;

        let parsed = self.parser.parse(&text.text, self.clock.now().date_naive())?;
        let lines_scanned = parsed.lines_scanned;
        let lines_skipped = parsed.lines_skipped;
        let bulletin_date = parsed.bulletin_date;

        let checked = self.validator.validate(parsed.records);
        for issue in &checked.issues {
            match issue.severity {
                ValidationSeverity::Error => warn!(
                    station = %issue.station,
                    index = issue.index,
                    "Dropping record: {}",
                    issue.message
                ),
                ValidationSeverity::Warning => warn!(
                    station = %issue.station,
                    index = issue.index,
                    "Suspicious record: {}",
                    issue.message
                ),
            }
        }

        if checked.records.is_empty() {
            return Err(ParseError::NoRecords {
                lines_scanned,
                lines_skipped: lines_scanned,
            }
            .into());
        }

        let updated_at = self.clock.now();
        let report = RunReport {
            records: checked.records.len(),
            warnings: checked.warning_count,
            lines_skipped,
            bulletin_date,
            updated_at,
        };

        let snapshot =
            Snapshot::new(checked.records, updated_at, source_url).with_bulletin_date(bulletin_date);
        self.cache.update(snapshot).await;

        debug!(records = report.records, "Published new snapshot");
        Ok(report)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::cache::CacheRead;
    use crate::clock::testing::ManualClock;
    use chrono::TimeZone;
    use cote_models::{MeasurementRecord, StatusView};
    use cote_utils::{FetchError, PipelineStage};

    const BULLETIN: &str = "Station A: 3,45 m\nStation B: 2,10 m\n";

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 1, 28, 8, 0, 0).unwrap()))
    }

    #[tokio::test]
    async fn test_end_to_end_publishes_records() {
        let cache = SnapshotCache::new();
        let clock = clock();
        let pipeline = pipeline(
            Arc::new(FakeSource::default()),
            Arc::new(FakeExtractor::new(BULLETIN)),
            cache.clone(),
            clock.clone(),
            Duration::from_secs(120),
        );

        let report = pipeline.run().await.unwrap();
        assert_eq!(report.records, 2);
        assert_eq!(report.updated_at, clock.now());

        let CacheRead::Ready(snapshot) = cache.read().await else {
            panic!("cache should hold a snapshot");
        };
        let view = StatusView::from(snapshot.as_ref());
        assert_eq!(
            view.records,
            vec![
                MeasurementRecord::new("Station A", 3.45, "m"),
                MeasurementRecord::new("Station B", 2.10, "m"),
            ]
        );
        assert!(view.updated_at.is_some());
        assert_eq!(snapshot.source_url, SOURCE_URL);
    }

    #[tokio::test]
    async fn test_parse_failure_keeps_previous_snapshot() {
        let cache = SnapshotCache::new();
        let clock = clock();
        let extractor = Arc::new(FakeExtractor::new(BULLETIN));
        let pipeline = pipeline(
            Arc::new(FakeSource::default()),
            extractor.clone(),
            cache.clone(),
            clock.clone(),
            Duration::from_secs(120),
        );

        pipeline.run().await.unwrap();
        let before = cache.read().await.snapshot().cloned().unwrap();

        clock.advance(chrono::Duration::hours(1));
        extractor.set_text("Serviciul de hidrologie\nnu sunt date disponibile\n");
        let err = pipeline.run().await.unwrap_err();

        assert_eq!(err.stage(), PipelineStage::Parse);
        let after = cache.read().await.snapshot().cloned().unwrap();
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(after.updated_at, before.updated_at);
    }

    #[tokio::test]
    async fn test_fetch_failure_leaves_cache_empty() {
        let cache = SnapshotCache::new();
        let source = Arc::new(FakeSource::default());
        source.set_failing(true);
        let pipeline = pipeline(
            source,
            Arc::new(FakeExtractor::new(BULLETIN)),
            cache.clone(),
            clock(),
            Duration::from_secs(120),
        );

        let err = pipeline.run().await.unwrap_err();
        assert!(matches!(err, PipelineError::Fetch(FetchError::Status { status: 503, .. })));
        assert!(cache.read().await.snapshot().is_none());
    }

    #[tokio::test]
    async fn test_fetch_timeout_keeps_previous_snapshot() {
        let cache = SnapshotCache::new();
        let clock = clock();
        let source = Arc::new(FakeSource::default());
        let pipeline = pipeline(
            source.clone(),
            Arc::new(FakeExtractor::new(BULLETIN)),
            cache.clone(),
            clock.clone(),
            Duration::from_secs(120),
        );

        pipeline.run().await.unwrap();
        let before = cache.read().await.snapshot().cloned().unwrap();

        clock.advance(chrono::Duration::hours(1));
        source.set_timing_out(true);
        let err = pipeline.run().await.unwrap_err();

        assert!(matches!(err, PipelineError::Fetch(FetchError::Timeout { .. })));
        assert_eq!(err.stage(), PipelineStage::Fetch);
        let after = cache.read().await.snapshot().cloned().unwrap();
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(after.updated_at, before.updated_at);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_run_is_abandoned() {
        let cache = SnapshotCache::new();
        let clock = clock();
        let source = Arc::new(FakeSource::default());
        let pipeline = pipeline(
            source.clone(),
            Arc::new(FakeExtractor::new(BULLETIN)),
            cache.clone(),
            clock.clone(),
            Duration::from_secs(120),
        );

        pipeline.run().await.unwrap();
        let before = cache.read().await.snapshot().cloned().unwrap();

        clock.advance(chrono::Duration::hours(1));
        source.set_delay(Some(Duration::from_secs(600)));
        let err = pipeline.run().await.unwrap_err();

        assert!(matches!(err, PipelineError::Timeout(d) if d == Duration::from_secs(120)));
        assert_eq!(err.stage(), PipelineStage::Run);
        let after = cache.read().await.snapshot().cloned().unwrap();
        assert_eq!(after.updated_at, before.updated_at);
    }

    #[tokio::test]
    async fn test_records_dropped_by_validation_fail_the_run() {
        let cache = SnapshotCache::new();
        let pipeline = pipeline(
            Arc::new(FakeSource::default()),
            Arc::new(FakeExtractor::new("Station A: 3,45 abcdefghijklmnopqrstuvwxyz\n")),
            cache.clone(),
            clock(),
            Duration::from_secs(120),
        );

        let err = pipeline.run().await.unwrap_err();
        assert!(matches!(err, PipelineError::Parse(ParseError::NoRecords { .. })));
        assert!(cache.read().await.snapshot().is_none());
    }
}
