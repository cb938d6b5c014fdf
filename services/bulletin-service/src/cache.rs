//! Snapshot Cache
//!
//! In-memory holder of the latest successful parse. Writers replace the whole
//! snapshot; readers get a shared handle and never see a half-written update.

use cote_models::Snapshot;
use std::sync::Arc;
use tokio::sync::RwLock;

/// What a reader sees.
#[derive(Debug, Clone)]
pub enum CacheRead {
    /// No run has succeeded yet.
    Empty,
    Ready(Arc<Snapshot>),
}

impl CacheRead {
    pub fn snapshot(&self) -> Option<&Arc<Snapshot>> {
        match self {
            Self::Empty => None,
            Self::Ready(snapshot) => Some(snapshot),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SnapshotCache {
    inner: Arc<RwLock<Option<Arc<Snapshot>>>>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current snapshot. The snapshot is built before the lock is
    /// taken; the write guard only covers the pointer swap.
    pub async fn update(&self, snapshot: Snapshot) {
        let next = Arc::new(snapshot);
        let mut slot = self.inner.write().await;
        *slot = Some(next);
    }

    pub async fn read(&self) -> CacheRead {
        match self.inner.read().await.as_ref() {
            Some(snapshot) => CacheRead::Ready(Arc::clone(snapshot)),
            None => CacheRead::Empty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use cote_models::MeasurementRecord;
    use proptest::prelude::*;

    /// Every record in generation `n` carries the value `n`.
    fn generation(n: usize, size: usize) -> Snapshot {
        let records = (0..size)
            .map(|i| MeasurementRecord::new(format!("Station {i}"), n as f64, "cm"))
            .collect();
        let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::seconds(n as i64);
        Snapshot::new(records, at, "https://example.test/bhcote.pdf")
    }

    fn assert_consistent(snapshot: &Snapshot) {
        let Some(first) = snapshot.records.first() else {
            return;
        };
        assert!(snapshot.records.iter().all(|r| r.value == first.value));
        assert_eq!(snapshot.updated_at.timestamp() % 86_400, first.value as i64);
    }

    #[tokio::test]
    async fn test_empty_until_first_update() {
        let cache = SnapshotCache::new();
        assert!(cache.read().await.snapshot().is_none());

        cache.update(generation(1, 2)).await;
        let read = cache.read().await;
        let snapshot = read.snapshot().unwrap();
        assert_eq!(snapshot.len(), 2);
    }

    #[tokio::test]
    async fn test_readers_keep_their_snapshot() {
        let cache = SnapshotCache::new();
        cache.update(generation(1, 3)).await;

        let held = cache.read().await;
        cache.update(generation(2, 5)).await;

        assert_eq!(held.snapshot().unwrap().len(), 3);
        assert_eq!(cache.read().await.snapshot().unwrap().len(), 5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_readers_never_see_partial_update() {
        let cache = SnapshotCache::new();
        cache.update(generation(0, 8)).await;

        let writer = {
            let cache = cache.clone();
            tokio::spawn(async move {
                for n in 1..200 {
                    cache.update(generation(n, 8)).await;
                    tokio::task::yield_now().await;
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move {
                    for _ in 0..500 {
                        if let CacheRead::Ready(snapshot) = cache.read().await {
                            assert_eq!(snapshot.len(), 8);
                            assert_consistent(&snapshot);
                        }
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();

        writer.await.unwrap();
        for reader in readers {
            reader.await.unwrap();
        }
    }

    proptest! {
        #[test]
        fn prop_last_update_wins(sizes in prop::collection::vec(0usize..20, 1..10)) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            runtime.block_on(async {
                let cache = SnapshotCache::new();
                for (n, size) in sizes.iter().enumerate() {
                    cache.update(generation(n, *size)).await;
                }
                let read = cache.read().await;
                let snapshot = read.snapshot().unwrap();
                prop_assert_eq!(snapshot.len(), *sizes.last().unwrap());
                assert_consistent(snapshot);
                Ok(())
            })?;
        }
    }
}
