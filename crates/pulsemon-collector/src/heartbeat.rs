use crate::Collector;
use pulsemon_common::Metric;

/// Emits the `PollCount` heartbeat counter.
///
/// Every invocation yields a delta of 1; the server accumulates the running
/// total, so the stored value counts poll ticks since the server started.
pub struct HeartbeatCollector;

impl HeartbeatCollector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HeartbeatCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Collector for HeartbeatCollector {
    fn name(&self) -> &str {
        "heartbeat"
    }

    fn collect(&mut self) -> Vec<Metric> {
        vec![Metric::counter("PollCount", 1)]
    }
}
