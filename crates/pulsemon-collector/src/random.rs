use crate::Collector;
use pulsemon_common::Metric;
use rand::Rng;

/// Emits the `RandomValue` gauge, drawn uniformly from [0, 100) on every
/// call so downstream stages always see a changing reading.
pub struct RandomCollector;

impl Collector for RandomCollector {
    fn name(&self) -> &str {
        "random"
    }

    fn collect(&mut self) -> Vec<Metric> {
        let value = rand::thread_rng().gen_range(0.0..100.0);
        vec![Metric::gauge("RandomValue", value)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_stays_in_range() {
        let mut c = RandomCollector;
        for _ in 0..100 {
            let readings = c.collect();
            let v = readings[0].value.unwrap();
            assert!((0.0..100.0).contains(&v));
        }
    }
}
