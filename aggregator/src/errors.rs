use thiserror::Error;

/// Result type alias for aggregator operations
pub type Result<T, E = AggregatorError> = std::result::Result<T, E>;

/// Errors that can occur while serving an aggregated route
#[derive(Error, Debug)]
pub enum AggregatorError {
    /// A required secret or identifier is not configured
    #[error("missing configuration: {0}")]
    Configuration(&'static str),

    /// The token exchange was rejected by the upstream
    #[error("token exchange rejected with status {0}")]
    UpstreamAuth(u16),

    /// A data call returned a non-success status
    #[error("upstream {upstream} responded with status {status}")]
    UpstreamHttp { upstream: String, status: u16 },

    /// The upstream call could not complete
    #[error("network error calling {upstream}: {reason}")]
    Network { upstream: String, reason: String },

    /// The upstream body could not be decoded or lacked a required field
    #[error("unexpected payload from {upstream}: {reason}")]
    UpstreamPayload { upstream: String, reason: String },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AggregatorError {
    pub(crate) fn network(upstream: &str, error: impl std::fmt::Display) -> Self {
        AggregatorError::Network {
            upstream: upstream.to_string(),
            reason: error.to_string(),
        }
    }

    pub(crate) fn payload(upstream: &str, error: impl std::fmt::Display) -> Self {
        AggregatorError::UpstreamPayload {
            upstream: upstream.to_string(),
            reason: error.to_string(),
        }
    }
}
