use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address and port the HTTP server listens on.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

impl ServerConfig {
    /// Loads the config file if present, falling back to defaults, then
    /// applies environment overrides (`ADDRESS` takes precedence over the
    /// file value).
    pub fn load_or_default(path: &str) -> anyhow::Result<Self> {
        let mut config = if std::path::Path::new(path).exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };

        if let Ok(addr) = std::env::var("ADDRESS") {
            if !addr.is_empty() {
                config.listen_addr = addr;
            }
        }

        Ok(config)
    }
}
