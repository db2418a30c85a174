//! Error types for the transport layer.

/// Errors that can occur while building an executor or issuing requests.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The HTTP client could not be constructed (TLS init, socket setup).
    #[cfg(feature = "http")]
    #[error("could not build http client: {0}")]
    Build(#[source] reqwest::Error),

    /// The request was sent but failed in flight or while reading the reply.
    #[cfg(feature = "http")]
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// The configured proxy URL does not parse.
    ///
    /// Carries the reason as text so the variant stays constructible
    /// without the `http` feature.
    #[error("invalid proxy url {url:?}: {reason}")]
    InvalidProxy { url: String, reason: String },

    /// The request exceeded its deadline.
    #[error("request timed out")]
    Timeout,

    /// The peer could not be reached at all (DNS, refused, link down).
    #[error("network unreachable: {0}")]
    Unreachable(String),
}
