//! Error types for the protocol layer.
//!
//! Each Portkeep crate defines its own error enum. A `ProtocolError` always
//! means the bytes were wrong or the document was, never that the network
//! failed or the cipher refused; those live in their own crates.

/// Errors that can occur while encoding or reading portal documents.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a document into wire bytes).
    #[cfg(feature = "xml")]
    #[error("encode failed: {0}")]
    Encode(quick_xml::se::SeError),

    /// Deserialization failed: malformed XML, a missing element, or a
    /// document of the wrong shape entirely.
    #[cfg(feature = "xml")]
    #[error("decode failed: {0}")]
    Decode(quick_xml::de::DeError),

    /// The document parsed but its content violates the protocol, such as
    /// a non-numeric interval or non-UTF-8 bytes.
    ///
    /// Kept separate from [`ProtocolError::Decode`] because the containment
    /// rules differ: a malformed heartbeat reply keeps the previous cadence,
    /// while an undecodable one is indistinguishable from a dead portal.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}
