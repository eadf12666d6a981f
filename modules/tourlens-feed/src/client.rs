use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use tourlens_common::{FeedConfig, TourlensError};

/// Seam between the feed logic and the network, so tests can substitute a
/// canned transport.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String, TourlensError>;
}

pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        HttpTransport {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch_text(&self, url: &str) -> Result<String, TourlensError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TourlensError::Feed(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TourlensError::Feed(format!("HTTP {status} from feed host")));
        }

        resp.text().await.map_err(|e| TourlensError::Feed(e.to_string()))
    }
}

/// Downloads the published ticket sheet CSV export. Each attempt is bounded
/// by the configured timeout and a failed attempt is retried once.
pub struct FeedClient<T: Transport = HttpTransport> {
    transport: T,
    config: FeedConfig,
}

impl FeedClient<HttpTransport> {
    pub fn new(config: FeedConfig) -> Self {
        FeedClient {
            transport: HttpTransport::new(),
            config,
        }
    }
}

impl<T: Transport> FeedClient<T> {
    pub fn with_transport(config: FeedConfig, transport: T) -> Self {
        FeedClient { transport, config }
    }

    pub async fn download(&self) -> Result<String, TourlensError> {
        match self.attempt().await {
            Ok(text) => Ok(text),
            Err(err) => {
                warn!(error = %err, url = self.config.url.as_str(), "feed fetch failed, retrying once");
                self.attempt().await
            }
        }
    }

    async fn attempt(&self) -> Result<String, TourlensError> {
        let deadline = Duration::from_secs(self.config.timeout_secs);
        match tokio::time::timeout(deadline, self.transport.fetch_text(&self.config.url)).await {
            Ok(result) => result,
            Err(_) => Err(TourlensError::Feed(format!(
                "timed out after {}s",
                self.config.timeout_secs
            ))),
        }
    }
}
