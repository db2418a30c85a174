//! Codec trait and the bundled XML implementation.
//!
//! A codec converts between Rust document types and raw bytes. The engine
//! never hardcodes XML; it asks whatever implements [`Codec`], which keeps
//! the document types testable against an in-memory format and leaves room
//! for portals that eventually grow a JSON firmware.
//!
//! The sealing layer sits *outside* the codec: encode first, then seal.
//! Keeping those steps separate is what lets the plain suite skip encryption
//! without the codec ever knowing.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Encodes documents to bytes and decodes bytes back.
///
/// `Send + Sync + 'static` because the engine holds its codec across await
/// points inside a spawned task.
///
/// The methods are generic over the document type rather than taking a
/// document enum: the handshake knows statically which document it expects
/// at each step, and a wrong-document parse should fail loudly right there.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a document into its wire bytes.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if the value cannot be represented
    /// in this format.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Parses wire bytes into a document.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] for malformed input, and
    /// [`ProtocolError::MalformedResponse`] when the bytes are not even
    /// valid UTF-8 (the portal protocol is text-only).
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// XmlCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] speaking the portal's XML dialect (via `quick-xml`).
///
/// Output is a bare document with no XML declaration; the portal neither
/// sends nor expects one. Documents are UTF-8 and travel with the
/// `text/xml; charset=utf-8` content type, which the transport sets.
///
/// Behind the `xml` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use portkeep_protocol::{Codec, PortalResponse, XmlCodec};
///
/// let codec = XmlCodec;
/// let bytes = b"<response><result>success</result><interval>60</interval></response>";
/// let resp: PortalResponse = codec.decode(bytes).unwrap();
/// assert!(resp.is_success());
/// ```
#[cfg(feature = "xml")]
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlCodec;

#[cfg(feature = "xml")]
impl Codec for XmlCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        // quick-xml serializes to a String; the wire wants bytes.
        quick_xml::se::to_string(value)
            .map(String::into_bytes)
            .map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        let text = std::str::from_utf8(data)
            .map_err(|e| ProtocolError::MalformedResponse(format!("response is not UTF-8: {e}")))?;
        quick_xml::de::from_str(text).map_err(ProtocolError::Decode)
    }
}

// =========================================================================
// Tests
// =========================================================================
