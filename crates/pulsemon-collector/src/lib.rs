//! Metric collection framework for the pulsemon agent.
//!
//! Each [`Collector`] implementation produces a snapshot of named, typed
//! readings on every invocation. Collection is synchronous and cannot fail
//! by contract: a reading that cannot be computed is simply omitted from
//! the returned batch.

pub mod heartbeat;
pub mod memory;
pub mod random;

use pulsemon_common::Metric;

/// A runtime metric collector polled by the agent pipeline.
///
/// Implementations are invoked in registration order on every poll tick and
/// must be cheap enough to call repeatedly. The trait requires `Send` so the
/// poller task can own the collector set.
pub trait Collector: Send {
    /// Returns the collector name (e.g. `"memory"`), used for logging.
    fn name(&self) -> &str;

    /// Collects the current readings.
    fn collect(&mut self) -> Vec<Metric>;
}

/// The default collector set wired up by the agent binary.
pub fn default_collectors() -> Vec<Box<dyn Collector>> {
    vec![
        Box::new(heartbeat::HeartbeatCollector::new()),
        Box::new(memory::MemoryCollector::new()),
        Box::new(random::RandomCollector),
    ]
}
