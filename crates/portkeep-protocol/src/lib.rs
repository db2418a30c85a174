//! Wire documents for the Portkeep captive-portal protocol.
//!
//! Everything a portal and a keeper exchange is a small XML document with a
//! fixed root element and lowercase-dash child elements. This crate defines
//! those documents as plain serde types ([`types`]), the format seam that
//! turns them into bytes ([`codec`]), and the errors either side can produce
//! ([`error`]).
//!
//! Nothing here performs I/O or encryption. Sealing a document for the wire
//! is the cipher layer's job; moving it is the transport's.

pub mod codec;
pub mod error;
pub mod types;

pub use codec::Codec;
#[cfg(feature = "xml")]
pub use codec::XmlCodec;
pub use error::ProtocolError;
pub use types::{
    unix_now, AuthDocument, PortalResponse, ResultCode, StateDocument, TicketGrant, TicketRequest,
};
