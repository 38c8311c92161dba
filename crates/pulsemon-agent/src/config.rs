use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Address of the collector server.
    #[serde(default = "default_server_address")]
    pub server_address: String,
    /// API endpoint for metric updates.
    #[serde(default = "default_update_endpoint")]
    pub update_endpoint: String,
    /// Seconds between collector polls.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Seconds between report flushes.
    #[serde(default = "default_report_interval_secs")]
    pub report_interval_secs: u64,
    /// Number of concurrent sender workers.
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    /// Upper bound on the post-cancellation drain (final flush + in-flight
    /// sends) before the pipeline gives up.
    #[serde(default = "default_drain_timeout_secs")]
    pub drain_timeout_secs: u64,
}

fn default_server_address() -> String {
    "localhost:8080".to_string()
}

fn default_update_endpoint() -> String {
    "/update".to_string()
}

fn default_poll_interval_secs() -> u64 {
    2
}

fn default_report_interval_secs() -> u64 {
    10
}

fn default_worker_count() -> usize {
    5
}

fn default_drain_timeout_secs() -> u64 {
    10
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            server_address: default_server_address(),
            update_endpoint: default_update_endpoint(),
            poll_interval_secs: default_poll_interval_secs(),
            report_interval_secs: default_report_interval_secs(),
            worker_count: default_worker_count(),
            drain_timeout_secs: default_drain_timeout_secs(),
        }
    }
}

impl AgentConfig {
    /// Loads the config file if present, falling back to defaults, then
    /// applies environment overrides and validates.
    pub fn load_or_default(path: &str) -> anyhow::Result<Self> {
        let mut config = if std::path::Path::new(path).exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_toml_str(&content)?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Environment variables take precedence over file values. A variable
    /// that fails to parse is ignored and the file value kept.
    fn apply_env_overrides(&mut self) {
        if let Ok(addr) = std::env::var("SERVER_ADDRESS") {
            if !addr.is_empty() {
                self.server_address = addr;
            }
        }
        if let Ok(endpoint) = std::env::var("SERVER_ENDPOINT") {
            if !endpoint.is_empty() {
                self.update_endpoint = endpoint;
            }
        }
        if let Some(poll) = env_u64("POLL_INTERVAL") {
            self.poll_interval_secs = poll;
        }
        if let Some(report) = env_u64("REPORT_INTERVAL") {
            self.report_interval_secs = report;
        }
        if let Some(workers) = env_u64("NUM_WORKERS") {
            self.worker_count = workers as usize;
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.poll_interval_secs == 0 {
            anyhow::bail!("poll_interval_secs must be greater than zero");
        }
        if self.report_interval_secs == 0 {
            anyhow::bail!("report_interval_secs must be greater than zero");
        }
        if self.worker_count == 0 {
            anyhow::bail!("worker_count must be greater than zero");
        }
        if self.drain_timeout_secs == 0 {
            anyhow::bail!("drain_timeout_secs must be greater than zero");
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval_secs)
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_secs)
    }
}

fn env_u64(name: &str) -> Option<u64> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(var = name, value = %raw, "ignoring unparseable environment override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_values() {
        let config = AgentConfig::default();
        assert_eq!(config.server_address, "localhost:8080");
        assert_eq!(config.update_endpoint, "/update");
        assert_eq!(config.poll_interval_secs, 2);
        assert_eq!(config.report_interval_secs, 10);
        assert_eq!(config.worker_count, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn toml_overrides_defaults() {
        let config = AgentConfig::from_toml_str(
            r#"
            server_address = "collector:9000"
            poll_interval_secs = 1
            worker_count = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.server_address, "collector:9000");
        assert_eq!(config.poll_interval_secs, 1);
        assert_eq!(config.worker_count, 2);
        assert_eq!(config.report_interval_secs, 10);
    }

    #[test]
    fn zero_intervals_are_rejected() {
        let mut config = AgentConfig::default();
        config.poll_interval_secs = 0;
        assert!(config.validate().is_err());

        let mut config = AgentConfig::default();
        config.worker_count = 0;
        assert!(config.validate().is_err());
    }
}
