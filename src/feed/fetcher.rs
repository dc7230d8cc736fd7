use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;

/// 10MB
pub const DEFAULT_MAX_FEED_SIZE: usize = 10 * 1024 * 1024;
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur while retrieving an upstream feed body.
///
/// None of these are retried: the relay reports the failure for the
/// current request and the next request starts from scratch.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request plus body read exceeded the configured deadline
    #[error("Request timed out")]
    Timeout,
    /// Response body exceeded the configured size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
}

/// Limits applied to every fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// Deadline covering the request and the full body read. `None` waits
    /// as long as the transport does.
    pub timeout: Option<Duration>,
    /// Maximum accepted body size in bytes.
    pub max_bytes: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Some(DEFAULT_FETCH_TIMEOUT),
            max_bytes: DEFAULT_MAX_FEED_SIZE,
        }
    }
}

/// Single-shot HTTP GET for upstream feeds.
///
/// Cheap to clone: the inner `reqwest::Client` is reference counted and
/// shares one connection pool across all requests.
#[derive(Debug, Clone)]
pub struct FeedFetcher {
    client: reqwest::Client,
    options: FetchOptions,
}

impl FeedFetcher {
    /// Builds a fetcher with its own pooled HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Network`] if the TLS backend cannot be initialized.
    pub fn new(options: FetchOptions) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("feedrelay/", env!("CARGO_PKG_VERSION")))
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(30)) // Close idle connections promptly
            .tcp_keepalive(Duration::from_secs(60))
            .build()?;

        Ok(Self::with_client(client, options))
    }

    /// Wraps an existing client (allows custom configuration in tests).
    pub fn with_client(client: reqwest::Client, options: FetchOptions) -> Self {
        Self { client, options }
    }

    pub fn options(&self) -> FetchOptions {
        self.options
    }

    /// Fetches `url` and returns the complete response body.
    ///
    /// Issues exactly one GET: no retries, no auth headers, the client's
    /// default redirect policy. The response is dropped on every return
    /// path, which releases its connection back to the pool (or closes it
    /// if the body was not fully read).
    ///
    /// # Errors
    ///
    /// - [`FetchError::Timeout`] - deadline elapsed before the body was read
    /// - [`FetchError::Network`] - connection, DNS or TLS errors
    /// - [`FetchError::HttpStatus`] - non-2xx response; the body is not read
    /// - [`FetchError::ResponseTooLarge`] - body exceeded `max_bytes`
    /// - [`FetchError::IncompleteResponse`] - body shorter than Content-Length
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        tracing::debug!(url = %url, "Fetching feed");

        let bytes = match self.options.timeout {
            Some(deadline) => tokio::time::timeout(deadline, self.fetch_inner(url))
                .await
                .map_err(|_| FetchError::Timeout)??,
            None => self.fetch_inner(url).await?,
        };

        tracing::debug!(url = %url, bytes = bytes.len(), "Fetched feed");
        Ok(bytes)
    }

    async fn fetch_inner(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        read_limited_bytes(response, self.options.max_bytes).await
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Capture Content-Length for completeness check
    let expected_length = response.content_length();

    // Fast path: check Content-Length header
    if let Some(len) = expected_length {
        if len > limit as u64 {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    // A dropped connection mid-body can end the stream early
    // without a transport error.
    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FetchError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}
