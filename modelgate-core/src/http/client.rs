//! HTTP client implementation using reqwest

use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::{Client, ClientBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Maximum response size (10MB)
const MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024;

/// Default user agent
const USER_AGENT: &str = concat!("modelgate/", env!("CARGO_PKG_VERSION"));

/// Failure to obtain any HTTP response from the backend
#[derive(Debug, Error)]
pub enum TransportError {
    /// The per-call deadline elapsed
    #[error("request timed out")]
    Timeout,

    /// Connection refused, DNS failure, TLS handshake failure
    #[error("connection failed: {0}")]
    Connect(String),

    /// Response exceeded the size limit
    #[error("response size {size} exceeds maximum {limit}")]
    TooLarge { size: usize, limit: usize },

    /// Anything else the HTTP stack reported
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        // The URL may carry credentials in its query string
        let err = err.without_url();
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else {
            TransportError::Other(err.to_string())
        }
    }
}

/// Status and body of a completed HTTP exchange
#[derive(Debug, Clone)]
pub struct UpstreamReply {
    pub status: StatusCode,
    pub body: String,
}

impl UpstreamReply {
    /// Parse the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Shared HTTP client with connection pooling
///
/// Cloning is cheap: clones share one connection pool.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,

    /// Maximum response size to prevent OOM
    max_response_size: usize,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_config(Duration::from_secs(10), 10)
    }

    /// Create a new HTTP client with custom configuration
    ///
    /// There is no client-wide request timeout; every call passes its own.
    pub fn with_config(
        connect_timeout: Duration,
        max_idle_per_host: usize,
    ) -> Result<Self, reqwest::Error> {
        let client = ClientBuilder::new()
            .pool_max_idle_per_host(max_idle_per_host)
            .pool_idle_timeout(Duration::from_secs(90))
            .connect_timeout(connect_timeout)
            .user_agent(USER_AGENT)
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            max_response_size: MAX_RESPONSE_SIZE,
        })
    }

    /// POST a JSON body and collect the reply, bounded by `timeout`
    pub async fn post_json<B>(
        &self,
        url: &str,
        headers: HeaderMap,
        body: &B,
        timeout: Duration,
    ) -> Result<UpstreamReply, TransportError>
    where
        B: Serialize + ?Sized,
    {
        let request = self
            .client
            .post(url)
            .timeout(timeout)
            .headers(headers)
            .header(CONTENT_TYPE, "application/json")
            .json(body);

        self.execute(request).await
    }

    /// GET a URL and collect the reply, bounded by `timeout`
    pub async fn get(&self, url: &str, timeout: Duration) -> Result<UpstreamReply, TransportError> {
        let request = self.client.get(url).timeout(timeout);
        self.execute(request).await
    }

    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<UpstreamReply, TransportError> {
        let response = request.send().await.map_err(|e| {
            let err = TransportError::from(e);
            warn!(error = %err, "Outbound request failed");
            err
        })?;

        let status = response.status();
        debug!(%status, "Response received");

        if let Some(content_length) = response.content_length() {
            self.check_size(content_length as usize)?;
        }

        let body = response.text().await.map_err(TransportError::from)?;
        self.check_size(body.len())?;

        Ok(UpstreamReply { status, body })
    }

    /// Check response size to prevent OOM
    fn check_size(&self, size: usize) -> Result<(), TransportError> {
        if size > self.max_response_size {
            return Err(TransportError::TooLarge {
                size,
                limit: self.max_response_size,
            });
        }
        Ok(())
    }
}
