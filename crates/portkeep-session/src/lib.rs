//! Session state for Portkeep.
//!
//! This crate owns what the keeper *knows*: the per-run identity it
//! generated ([`identity`]), the portal endpoints it discovered
//! ([`endpoints`]), the validated configuration it was started with
//! ([`config`]), and the mutable [`Session`](session::Session) record that
//! the engine advances through its lifecycle.
//!
//! Nothing in here talks to the network. The engine mutates the session;
//! everything else only reads it.

pub mod config;
pub mod endpoints;
pub mod error;
pub mod identity;
pub mod session;

pub use config::KeeperConfig;
pub use endpoints::EndpointSet;
pub use error::SessionError;
pub use identity::{generate_run_tag, ClientId};
pub use session::{Session, SessionPhase};
