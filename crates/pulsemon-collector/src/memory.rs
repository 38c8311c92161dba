use crate::Collector;
use pulsemon_common::Metric;
use sysinfo::System;

/// Gauges describing host memory and swap usage.
pub struct MemoryCollector {
    system: System,
}

impl MemoryCollector {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }
}

impl Default for MemoryCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Collector for MemoryCollector {
    fn name(&self) -> &str {
        "memory"
    }

    fn collect(&mut self) -> Vec<Metric> {
        self.system.refresh_memory();

        let total = self.system.total_memory();
        let used = self.system.used_memory();
        let usage_pct = if total > 0 {
            (used as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        vec![
            Metric::gauge("TotalMemory", total as f64),
            Metric::gauge("UsedMemory", used as f64),
            Metric::gauge("AvailableMemory", self.system.available_memory() as f64),
            Metric::gauge("FreeMemory", self.system.free_memory() as f64),
            Metric::gauge("UsedMemoryPercent", usage_pct),
            Metric::gauge("TotalSwap", self.system.total_swap() as f64),
            Metric::gauge("UsedSwap", self.system.used_swap() as f64),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulsemon_common::MetricKind;

    #[test]
    fn all_readings_are_gauges() {
        let mut c = MemoryCollector::new();
        let readings = c.collect();
        assert!(!readings.is_empty());
        for m in &readings {
            assert_eq!(m.kind, MetricKind::Gauge, "{} should be a gauge", m.name);
            assert!(m.value.is_some());
        }
    }

    #[test]
    fn repeated_collection_is_safe() {
        let mut c = MemoryCollector::new();
        let first = c.collect().len();
        let second = c.collect().len();
        assert_eq!(first, second);
    }
}
