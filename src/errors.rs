use thiserror::Error;

/// Transient failures. These are retried up to the attempt cap.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("rate limited by provider (HTTP 429)")]
    RateLimited,
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connection(String),
}

/// Failures that retrying will not fix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("API request failed: HTTP {0}")]
    Status(u16),
    #[error("empty response from API")]
    EmptyBody,
    #[error("invalid JSON response from API: {0}")]
    InvalidJson(String),
    #[error("invalid URI {uri}: {reason}")]
    InvalidUri { uri: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("API limit exceeded for {provider} and no stale data available")]
    QuotaExceeded { provider: String },
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl FetchError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

/// Persistence failures. Logged by the cache and usage tracker, never
/// surfaced to their callers.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage quota exceeded: {needed} bytes needed, {capacity} available")]
    QuotaExceeded { needed: usize, capacity: usize },
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt stored value: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("no provider configured for {0}")]
    UnknownProvider(String),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl warp::reject::Reject for GatewayError {}
