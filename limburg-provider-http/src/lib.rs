//! Feed provider reading Limburg.net CSV exports over HTTP or from the local disk.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use tracing::debug;
use url::Url;

use limburg_core::{
    ports::{FeedError, FeedPort},
    source::DEFAULT_FETCH_TIMEOUT,
};

const USER_AGENT: &str = concat!("limburg-pickups/", env!("CARGO_PKG_VERSION"));

/// [`FeedPort`] backed by a reqwest client and tokio file I/O.
pub struct HttpFeedPort {
    client: Client,
    timeout: Duration,
}

impl HttpFeedPort {
    /// Create a port bound to the given HTTP client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    /// Override the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl FeedPort for HttpFeedPort {
    async fn fetch_url(&self, url: &Url) -> Result<String, FeedError> {
        let req = self.client.get(url.as_str()).timeout(self.timeout);
        let body = fetch_text(req, self.timeout).await?;
        debug!(%url, bytes = body.len(), "downloaded pickup feed");
        Ok(body)
    }

    async fn read_file(&self, path: &Path) -> Result<String, FeedError> {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|err| FeedError::from_io(path, err))
    }
}

/// Build the HTTP client used for feed downloads.
///
/// # Errors
///
/// Returns the reqwest error when the TLS backend cannot be initialised.
pub fn client() -> Result<Client, reqwest::Error> {
    Client::builder().user_agent(USER_AGENT).build()
}

/// Build the feed port for the given client and timeout.
#[must_use]
pub fn port(client: Client, timeout: Duration) -> Arc<dyn FeedPort> {
    Arc::new(HttpFeedPort::new(client).with_timeout(timeout))
}

// Small helper to fetch a text body with status handling.
async fn fetch_text(req: RequestBuilder, timeout: Duration) -> Result<String, FeedError> {
    let resp = req
        .send()
        .await
        .map_err(|err| classify(err, timeout))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(FeedError::Status(status.as_u16()));
    }

    resp.text().await.map_err(|err| classify(err, timeout))
}

fn classify(err: reqwest::Error, timeout: Duration) -> FeedError {
    if err.is_timeout() {
        FeedError::Timeout(timeout)
    } else {
        FeedError::Network(err)
    }
}
