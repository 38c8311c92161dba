use pulsemon_common::{Metric, MetricId, MetricKind};
use pulsemon_storage::{Storage, StorageError};
use std::collections::HashMap;
use std::sync::Arc;

/// Aggregation/merge service applied to every incoming update batch.
///
/// The merge is a four step pass: pre-merge the batch locally, look up any
/// previously stored values in one bulk filter, fold the stored counter
/// deltas into the pre-merged readings, persist. Counters accumulate;
/// gauges replace.
pub struct MetricService {
    storage: Arc<dyn Storage>,
}

impl MetricService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Applies a batch of metric updates to stored state.
    ///
    /// Persistence aborts on the first failing save; readings persisted
    /// before the failure stay persisted (there is no atomic batch
    /// guarantee).
    pub fn update(&self, batch: Vec<Metric>) -> Result<(), StorageError> {
        if batch.is_empty() {
            return Ok(());
        }

        let merged = premerge(batch);

        let ids: Vec<MetricId> = merged.iter().map(Metric::id).collect();
        let stored = self.storage.filter(&ids).inspect_err(|err| {
            tracing::error!(error = %err, "failed to filter stored metrics");
        })?;

        for mut metric in merged {
            if metric.kind == MetricKind::Counter {
                if let Some(prior) = stored.get(&metric.id()) {
                    if let (Some(delta), Some(prior_delta)) = (metric.delta, prior.delta) {
                        metric.delta = Some(delta + prior_delta);
                    }
                }
            }
            let id = metric.id();
            self.storage.save(metric).inspect_err(|err| {
                tracing::error!(metric = %id, error = %err, "failed to save metric");
            })?;
        }

        Ok(())
    }

    pub fn get(&self, id: &MetricId) -> Result<Option<Metric>, StorageError> {
        self.storage.get(id)
    }

    pub fn list(&self) -> Result<Vec<Metric>, StorageError> {
        self.storage.list()
    }
}

/// Combines same-identity readings within one batch.
///
/// Counters sum their deltas; gauges keep the last reading seen, so batch
/// order is load-bearing here. The first-seen order of identities is
/// preserved, which makes the persist order (and abort-on-error behavior)
/// deterministic.
fn premerge(batch: Vec<Metric>) -> Vec<Metric> {
    let mut slots: HashMap<MetricId, usize> = HashMap::new();
    let mut merged: Vec<Metric> = Vec::with_capacity(batch.len());

    for metric in batch {
        match slots.get(&metric.id()) {
            Some(&idx) => match metric.kind {
                MetricKind::Counter => {
                    if let (Some(prev), Some(next)) = (merged[idx].delta, metric.delta) {
                        merged[idx].delta = Some(prev + next);
                    }
                }
                MetricKind::Gauge => {
                    merged[idx] = metric;
                }
            },
            None => {
                slots.insert(metric.id(), merged.len());
                merged.push(metric);
            }
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulsemon_storage::MemoryStorage;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn service() -> MetricService {
        MetricService::new(Arc::new(MemoryStorage::new()))
    }

    #[test]
    fn counters_accumulate_across_updates() {
        let svc = service();

        svc.update(vec![Metric::counter("PollCount", 1)]).unwrap();
        svc.update(vec![Metric::counter("PollCount", 1)]).unwrap();

        let stored = svc
            .get(&MetricId::new("PollCount", MetricKind::Counter))
            .unwrap()
            .unwrap();
        assert_eq!(stored.delta, Some(2));
    }

    #[test]
    fn gauges_replace_across_updates() {
        let svc = service();

        svc.update(vec![Metric::gauge("Alloc", 100.0)]).unwrap();
        svc.update(vec![Metric::gauge("Alloc", 150.0)]).unwrap();

        let stored = svc
            .get(&MetricId::new("Alloc", MetricKind::Gauge))
            .unwrap()
            .unwrap();
        assert_eq!(stored.value, Some(150.0));
    }

    #[test]
    fn counters_in_one_batch_are_summed_before_merge() {
        let svc = service();

        svc.update(vec![Metric::counter("hits", 2)]).unwrap();
        svc.update(vec![
            Metric::counter("hits", 3),
            Metric::counter("hits", 4),
        ])
        .unwrap();

        let stored = svc
            .get(&MetricId::new("hits", MetricKind::Counter))
            .unwrap()
            .unwrap();
        assert_eq!(stored.delta, Some(9));
    }

    #[test]
    fn gauges_in_one_batch_keep_the_last_reading() {
        let svc = service();

        svc.update(vec![
            Metric::gauge("Alloc", 10.0),
            Metric::gauge("Alloc", 20.0),
            Metric::gauge("Alloc", 30.0),
        ])
        .unwrap();

        let stored = svc
            .get(&MetricId::new("Alloc", MetricKind::Gauge))
            .unwrap()
            .unwrap();
        assert_eq!(stored.value, Some(30.0));
    }

    #[test]
    fn mixed_batch_keeps_identities_apart() {
        let svc = service();

        svc.update(vec![
            Metric::counter("PollCount", 1),
            Metric::gauge("Alloc", 5.0),
            Metric::counter("PollCount", 1),
            Metric::gauge("RandomValue", 42.0),
        ])
        .unwrap();

        let list = svc.list().unwrap();
        assert_eq!(list.len(), 3);
        let poll = svc
            .get(&MetricId::new("PollCount", MetricKind::Counter))
            .unwrap()
            .unwrap();
        assert_eq!(poll.delta, Some(2));
    }

    #[test]
    fn empty_batch_is_a_no_op() {
        let svc = service();
        svc.update(vec![]).unwrap();
        assert!(svc.list().unwrap().is_empty());
    }

    #[test]
    fn premerge_preserves_first_seen_order() {
        let merged = premerge(vec![
            Metric::gauge("b", 1.0),
            Metric::counter("a", 1),
            Metric::gauge("b", 2.0),
            Metric::counter("a", 2),
        ]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].name, "b");
        assert_eq!(merged[0].value, Some(2.0));
        assert_eq!(merged[1].name, "a");
        assert_eq!(merged[1].delta, Some(3));
    }

    /// Storage stub that fails every save after the first `allowed` calls.
    struct FlakyStorage {
        inner: MemoryStorage,
        saves: AtomicUsize,
        allowed: usize,
    }

    impl Storage for FlakyStorage {
        fn get(&self, id: &MetricId) -> Result<Option<Metric>, StorageError> {
            self.inner.get(id)
        }

        fn filter(
            &self,
            ids: &[MetricId],
        ) -> Result<HashMap<MetricId, Metric>, StorageError> {
            self.inner.filter(ids)
        }

        fn save(&self, metric: Metric) -> Result<(), StorageError> {
            if self.saves.fetch_add(1, Ordering::SeqCst) >= self.allowed {
                return Err(StorageError::Other("disk full".to_string()));
            }
            self.inner.save(metric)
        }

        fn list(&self) -> Result<Vec<Metric>, StorageError> {
            self.inner.list()
        }
    }

    #[test]
    fn update_aborts_on_first_save_error() {
        // Two readings, one allowed save: the first persists, the batch
        // errors, the second is never written. Pins the documented
        // non-atomicity of batch persistence.
        let storage = Arc::new(FlakyStorage {
            inner: MemoryStorage::new(),
            saves: AtomicUsize::new(0),
            allowed: 1,
        });
        let svc = MetricService::new(storage.clone());

        let err = svc
            .update(vec![
                Metric::gauge("first", 1.0),
                Metric::gauge("second", 2.0),
            ])
            .unwrap_err();
        assert!(matches!(err, StorageError::Other(_)));

        assert!(storage
            .get(&MetricId::new("first", MetricKind::Gauge))
            .unwrap()
            .is_some());
        assert!(storage
            .get(&MetricId::new("second", MetricKind::Gauge))
            .unwrap()
            .is_none());
    }
}
