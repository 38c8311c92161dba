use serde::{Deserialize, Serialize};

/// Metric kind, selecting the merge semantics applied by the server.
///
/// # Examples
///
/// ```
/// use pulsemon_common::types::MetricKind;
///
/// let kind: MetricKind = "counter".parse().unwrap();
/// assert_eq!(kind, MetricKind::Counter);
/// assert_eq!(kind.to_string(), "counter");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// Stored value is a running total of submitted deltas.
    Counter,
    /// Stored value is the latest submitted reading.
    Gauge,
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricKind::Counter => write!(f, "counter"),
            MetricKind::Gauge => write!(f, "gauge"),
        }
    }
}

impl std::str::FromStr for MetricKind {
    type Err = MetricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "counter" => Ok(MetricKind::Counter),
            "gauge" => Ok(MetricKind::Gauge),
            _ => Err(MetricError::InvalidKind(s.to_string())),
        }
    }
}

/// The (name, kind) pair that uniquely addresses a metric's stored slot.
///
/// Equality is structural; ordering is by name first so that listings come
/// out alphabetical.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetricId {
    #[serde(rename = "id")]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: MetricKind,
}

impl MetricId {
    pub fn new(name: impl Into<String>, kind: MetricKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

impl PartialOrd for MetricId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MetricId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.kind.cmp(&other.kind))
    }
}

impl std::fmt::Display for MetricId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)
    }
}

/// One observed metric value.
///
/// Exactly one of `delta`/`value` is set, selected by `kind`: a counter
/// reading carries the increment to apply, a gauge reading carries the
/// current absolute value. Wire field names (`id`, `type`, `delta`, `value`)
/// are part of the update protocol.
///
/// # Examples
///
/// ```
/// use pulsemon_common::types::Metric;
///
/// let m = Metric::counter("PollCount", 1);
/// assert_eq!(m.value_string(), "1");
///
/// let m = Metric::gauge("Alloc", 100.5);
/// assert_eq!(m.value_string(), "100.5");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    #[serde(rename = "id")]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: MetricKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

impl Metric {
    pub fn counter(name: impl Into<String>, delta: i64) -> Self {
        Self {
            name: name.into(),
            kind: MetricKind::Counter,
            delta: Some(delta),
            value: None,
        }
    }

    pub fn gauge(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            kind: MetricKind::Gauge,
            delta: None,
            value: Some(value),
        }
    }

    pub fn id(&self) -> MetricId {
        MetricId::new(self.name.clone(), self.kind)
    }

    /// Parses a metric from its string-encoded form as used by the
    /// `/update/{kind}/{name}/{value}` path API.
    ///
    /// Counters expect an `i64`, gauges an `f64`; an empty name is rejected.
    pub fn from_string_value(kind: &str, name: &str, raw: &str) -> Result<Self, MetricError> {
        if name.is_empty() {
            return Err(MetricError::InvalidName);
        }
        let kind: MetricKind = kind.parse()?;
        match kind {
            MetricKind::Counter => {
                let delta = raw
                    .parse::<i64>()
                    .map_err(|_| MetricError::InvalidCounterValue(raw.to_string()))?;
                Ok(Metric::counter(name, delta))
            }
            MetricKind::Gauge => {
                let value = raw
                    .parse::<f64>()
                    .map_err(|_| MetricError::InvalidGaugeValue(raw.to_string()))?;
                Ok(Metric::gauge(name, value))
            }
        }
    }

    /// Checks the exactly-one-of-delta/value invariant against `kind`.
    pub fn validate(&self) -> Result<(), MetricError> {
        if self.name.is_empty() {
            return Err(MetricError::InvalidName);
        }
        match self.kind {
            MetricKind::Counter if self.delta.is_none() => {
                Err(MetricError::InvalidCounterValue("missing delta".to_string()))
            }
            MetricKind::Gauge if self.value.is_none() => {
                Err(MetricError::InvalidGaugeValue("missing value".to_string()))
            }
            _ => Ok(()),
        }
    }

    /// Renders the carried value for the plain-text read endpoint.
    pub fn value_string(&self) -> String {
        match self.kind {
            MetricKind::Counter => self.delta.map(|d| d.to_string()).unwrap_or_default(),
            MetricKind::Gauge => self.value.map(|v| v.to_string()).unwrap_or_default(),
        }
    }
}

/// Validation errors for metric identifiers and string-encoded values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetricError {
    #[error("invalid metric id")]
    InvalidName,

    #[error("invalid metric type '{0}'")]
    InvalidKind(String),

    #[error("invalid counter value '{0}'")]
    InvalidCounterValue(String),

    #[error("invalid gauge value '{0}'")]
    InvalidGaugeValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_counter_from_path_parts() {
        let m = Metric::from_string_value("counter", "PollCount", "42").unwrap();
        assert_eq!(m.kind, MetricKind::Counter);
        assert_eq!(m.delta, Some(42));
        assert_eq!(m.value, None);
    }

    #[test]
    fn parse_gauge_from_path_parts() {
        let m = Metric::from_string_value("gauge", "Alloc", "123.456").unwrap();
        assert_eq!(m.kind, MetricKind::Gauge);
        assert_eq!(m.value, Some(123.456));
        assert_eq!(m.delta, None);
    }

    #[test]
    fn reject_empty_name() {
        assert_eq!(
            Metric::from_string_value("counter", "", "1"),
            Err(MetricError::InvalidName)
        );
    }

    #[test]
    fn reject_unknown_kind() {
        let err = Metric::from_string_value("histogram", "x", "1").unwrap_err();
        assert!(matches!(err, MetricError::InvalidKind(_)));
    }

    #[test]
    fn reject_malformed_values() {
        assert!(matches!(
            Metric::from_string_value("counter", "x", "1.5"),
            Err(MetricError::InvalidCounterValue(_))
        ));
        assert!(matches!(
            Metric::from_string_value("gauge", "x", "abc"),
            Err(MetricError::InvalidGaugeValue(_))
        ));
    }

    #[test]
    fn wire_format_uses_original_field_names() {
        let m = Metric::counter("PollCount", 2);
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": "PollCount", "type": "counter", "delta": 2})
        );

        let back: Metric = serde_json::from_value(json).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn ids_order_by_name_then_kind() {
        let mut ids = vec![
            MetricId::new("b", MetricKind::Counter),
            MetricId::new("a", MetricKind::Gauge),
            MetricId::new("a", MetricKind::Counter),
        ];
        ids.sort();
        assert_eq!(ids[0].name, "a");
        assert_eq!(ids[0].kind, MetricKind::Counter);
        assert_eq!(ids[2].name, "b");
    }

    #[test]
    fn validate_requires_matching_payload() {
        let mut m = Metric::counter("x", 1);
        m.delta = None;
        assert!(m.validate().is_err());

        let ok = Metric::gauge("y", 0.5);
        assert!(ok.validate().is_ok());
    }
}
