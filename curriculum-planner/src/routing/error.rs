//! Routing error types.

/// Errors from the geocoding and routing services.
#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body did not have the expected shape
    #[error("JSON parse error: {message}")]
    Json {
        message: String,
        body: Option<String>,
    },

    /// Service returned an error status code
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// A local data file could not be read
    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },

    /// Rate limited by the service
    #[error("rate limited by {service}")]
    RateLimited { service: &'static str },

    /// Client rejected by the service (missing or blocked user agent)
    #[error("rejected by {service}")]
    Unauthorized { service: &'static str },

    /// The worker pool was shut down
    #[error("worker pool closed")]
    Closed,
}

impl RoutingError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            RoutingError::Http(_) | RoutingError::RateLimited { .. } => true,
            RoutingError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Errors reading or writing a persisted cache.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    /// File could not be read or written
    #[error("cache file {path}: {message}")]
    Io { path: String, message: String },

    /// Snapshot could not be encoded
    #[error("cache encoding failed: {message}")]
    Json { message: String },
}
