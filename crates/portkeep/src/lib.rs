//! # Portkeep
//!
//! Keeps a captive-portal session alive so the machine behind it stays
//! online.
//!
//! Portkeep probes a well-known endpoint to learn whether the network is
//! open; when a portal interposes itself (a redirect instead of `204 No
//! Content`), it runs the portal handshake (ticket exchange, cipher
//! negotiation, sealed credential submission), then sends encrypted
//! heartbeats at whatever cadence the portal dictates, until its lifetime
//! token is cancelled and it logs out.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use portkeep::prelude::*;
//!
//! # async fn run(config: KeeperConfig) -> Result<(), KeeperError> {
//! let mut keeper = KeeperBuilder::new(config).build()?;
//! let cancel = keeper.cancellation_token();
//! tokio::spawn(async move {
//!     tokio::signal::ctrl_c().await.ok();
//!     cancel.cancel();
//! });
//! keeper.run().await;
//! # Ok(())
//! # }
//! ```

pub mod logging;
pub mod policy;

mod error;
mod handshake;
mod keeper;

pub use error::KeeperError;
pub use keeper::{
    KeeperBuilder, SessionKeeper, DEFAULT_HEARTBEAT_INTERVAL, LOGOUT_TIMEOUT, PROBE_URL,
};

// Re-exported so embedders wire a keeper without naming every sub-crate.
pub use portkeep_beat::{BeatInfo, BeatScheduler};
pub use portkeep_cipher::{
    AlgoId, Cipher, CipherError, CipherSuite, PlainCipher, PlainSuite, SessionSecrets,
};
pub use portkeep_protocol::{
    AuthDocument, Codec, PortalResponse, ProtocolError, ResultCode, StateDocument, TicketGrant,
    TicketRequest, XmlCodec,
};
pub use portkeep_session::{
    ClientId, EndpointSet, KeeperConfig, Session, SessionError, SessionPhase,
};
pub use portkeep_transport::{
    HttpTransport, RequestExecutor, TransportError, TransportOptions, WireReply,
};
pub use tokio_util::sync::CancellationToken;

/// Everything needed to configure, run, and extend a keeper.
pub mod prelude {
    pub use crate::error::KeeperError;
    pub use crate::keeper::{KeeperBuilder, SessionKeeper, PROBE_URL};
    pub use portkeep_cipher::{AlgoId, Cipher, CipherError, CipherSuite, SessionSecrets};
    pub use portkeep_protocol::{Codec, XmlCodec};
    pub use portkeep_session::{KeeperConfig, SessionPhase};
    pub use portkeep_transport::{RequestExecutor, TransportError, WireReply};
    pub use tokio_util::sync::CancellationToken;
}
