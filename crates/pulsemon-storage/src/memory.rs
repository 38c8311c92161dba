use crate::{Storage, StorageError};
use pulsemon_common::{Metric, MetricId};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory metric store guarded by a single reader/writer lock.
///
/// Reads take the shared lock, writes the exclusive lock. The map itself is
/// never handed out; every accessor copies data out under the lock.
pub struct MemoryStorage {
    data: RwLock<HashMap<MetricId, Metric>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, id: &MetricId) -> Result<Option<Metric>, StorageError> {
        let data = self.data.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(data.get(id).cloned())
    }

    fn filter(&self, ids: &[MetricId]) -> Result<HashMap<MetricId, Metric>, StorageError> {
        let data = self.data.read().map_err(|_| StorageError::LockPoisoned)?;
        let mut result = HashMap::with_capacity(ids.len());
        for id in ids {
            if let Some(metric) = data.get(id) {
                result.insert(id.clone(), metric.clone());
            }
        }
        Ok(result)
    }

    fn save(&self, metric: Metric) -> Result<(), StorageError> {
        let mut data = self.data.write().map_err(|_| StorageError::LockPoisoned)?;
        data.insert(metric.id(), metric);
        Ok(())
    }

    fn list(&self) -> Result<Vec<Metric>, StorageError> {
        let data = self.data.read().map_err(|_| StorageError::LockPoisoned)?;
        let mut metrics: Vec<Metric> = data.values().cloned().collect();
        metrics.sort_by(|a, b| a.id().cmp(&b.id()));
        Ok(metrics)
    }
}
