//! Storage layer for merged metric state.
//!
//! The default implementation ([`memory::MemoryStorage`]) keeps the whole
//! map in process memory behind a single reader/writer lock. The
//! [`Storage`] trait is fallible throughout so a durable backend could be
//! substituted without changing callers.

pub mod error;
pub mod memory;


use std::collections::HashMap;

pub use error::StorageError;
pub use memory::MemoryStorage;
use pulsemon_common::{Metric, MetricId};

/// Persistence backend for merged metric state.
///
/// Implementations must be safe to share across threads (`Send + Sync`)
/// because the store is reached from every request handler concurrently.
pub trait Storage: Send + Sync {
    /// Point lookup. A missing key is not an error and yields `Ok(None)`.
    fn get(&self, id: &MetricId) -> Result<Option<Metric>, StorageError>;

    /// Bulk lookup restricted to the requested identities. Absent identities
    /// are omitted from the result, never reported as errors.
    fn filter(&self, ids: &[MetricId]) -> Result<HashMap<MetricId, Metric>, StorageError>;

    /// Upserts one metric under its identity.
    fn save(&self, metric: Metric) -> Result<(), StorageError>;

    /// Full snapshot sorted by identity (name, then kind).
    fn list(&self) -> Result<Vec<Metric>, StorageError>;
}
