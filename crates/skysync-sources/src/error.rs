use thiserror::Error;

/// Failure modes of a weather source call, as a tagged union rather than a
/// zoo of exception types: the engine's classifier pattern-matches on these
/// variants (plus the explicit HTTP status for the transport case) to pick a
/// user-facing error kind.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The network is unreachable (DNS failure, connection refused/reset).
    #[error("network is unreachable: {0}")]
    NetworkUnavailable(String),

    /// The request or connection timed out.
    #[error("request timed out")]
    Timeout,

    /// The upstream answered with a non-2xx status not covered by a more
    /// specific variant. 401/403/409/429 are classified specially downstream.
    #[error("unexpected HTTP status {status}: {message}")]
    Status { status: u16, message: String },

    /// The upstream signalled a rate limit explicitly.
    #[error("rate limited (retry after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    /// The source requires an API key and none is configured.
    #[error("source '{source_id}' requires an API key and none is configured")]
    ApiKeyMissing { source_id: String },

    /// The coordinates or location shape are structurally invalid for this
    /// source.
    #[error("location is invalid for this source: {reason}")]
    InvalidLocation { reason: String },

    /// The response body could not be deserialized into the expected shape.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// No client is registered for the requested source id.
    #[error("weather source '{source_id}' is not registered")]
    NotInstalled { source_id: String },

    /// Anything the variants above do not capture.
    #[error("{0}")]
    Unexpected(String),
}

impl SourceError {
    /// Maps a `reqwest` transport failure onto the tagged union.
    #[must_use]
    pub fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            return SourceError::Timeout;
        }
        if err.is_connect() {
            return SourceError::NetworkUnavailable(err.to_string());
        }
        if let Some(status) = err.status() {
            return SourceError::Status {
                status: status.as_u16(),
                message: err.to_string(),
            };
        }
        SourceError::Unexpected(err.to_string())
    }
}
