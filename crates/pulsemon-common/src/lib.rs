//! Shared metric data model for the pulsemon agent and server.

pub mod types;

pub use types::{Metric, MetricError, MetricId, MetricKind};
