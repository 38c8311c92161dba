use async_trait::async_trait;
use pulsemon_common::Metric;

/// Errors raised when transmitting one metric reading to the server.
#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    /// Transport-level failure (connect, timeout, malformed response).
    #[error("update request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("server returned status {status}: {body}")]
    Status { status: u16, body: String },
}

/// Capability to transmit exactly one metric reading to the collector
/// server. Any non-success response or transport failure is a reportable
/// error; there is no automatic retry.
#[async_trait]
pub trait Updater: Send + Sync {
    async fn send(&self, metric: &Metric) -> Result<(), UpdateError>;
}

/// Production updater: JSON `POST {server}/update`, one reading per call.
pub struct HttpUpdater {
    client: reqwest::Client,
    url: String,
}

impl HttpUpdater {
    pub fn new(server_address: &str, endpoint: &str) -> Self {
        let base = if server_address.starts_with("http://") || server_address.starts_with("https://")
        {
            server_address.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", server_address.trim_end_matches('/'))
        };
        Self {
            client: reqwest::Client::new(),
            url: format!("{base}/{}", endpoint.trim_start_matches('/')),
        }
    }

    pub fn target_url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Updater for HttpUpdater {
    async fn send(&self, metric: &Metric) -> Result<(), UpdateError> {
        let response = self.client.post(&self.url).json(metric).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpdateError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}
