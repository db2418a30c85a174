//! Session cipher capability for the Portkeep engine.
//!
//! A captive portal advertises which payload cipher a session must use during
//! the ticket exchange, so the cipher is *negotiated*, never assumed. This
//! crate defines the two seams involved:
//!
//! - [`Cipher`]: seals outbound payloads and opens inbound ones.
//! - [`CipherSuite`]: builds the [`Cipher`] matching a portal-advertised
//!   algorithm identifier and the session secrets it keys from.
//!
//! The crate ships a single suite, [`PlainSuite`], which accepts only the
//! all-zero sentinel identifier (the portal's way of saying "no encryption")
//! and produces a passthrough cipher. Deployments with a real portal cipher
//! plug in their own suite; the engine never special-cases either one.

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

// ---------------------------------------------------------------------------
// Algorithm identifiers
// ---------------------------------------------------------------------------

/// Portal-advertised cipher algorithm identifier.
///
/// The portal hands this out as an opaque UUID-shaped string inside the
/// ticket grant. The newtype keeps it from being confused with the other
/// stringly-typed identifiers flowing through the handshake.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Zeroize)]
#[serde(transparent)]
pub struct AlgoId(String);

impl AlgoId {
    /// The all-zero identifier portals send when payloads stay in the clear.
    pub const SENTINEL: &'static str = "00000000-0000-0000-0000-000000000000";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The "no encryption" identifier.
    pub fn sentinel() -> Self {
        Self(Self::SENTINEL.to_owned())
    }

    pub fn is_sentinel(&self) -> bool {
        self.0 == Self::SENTINEL
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AlgoId {
    fn default() -> Self {
        Self::sentinel()
    }
}

impl fmt::Display for AlgoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Session secrets
// ---------------------------------------------------------------------------

/// Key material a suite derives its cipher from.
///
/// Wiped on drop. No `Debug` impl: the ticket must not reach logs.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SessionSecrets {
    pub client_id: String,
    pub ticket: String,
    #[zeroize(skip)]
    pub algo_id: AlgoId,
}

impl SessionSecrets {
    pub fn new(client_id: impl Into<String>, ticket: impl Into<String>, algo_id: AlgoId) -> Self {
        Self {
            client_id: client_id.into(),
            ticket: ticket.into(),
            algo_id,
        }
    }
}

// ---------------------------------------------------------------------------
// Capability traits
// ---------------------------------------------------------------------------

/// Payload cipher negotiated for one authenticated session.
///
/// Implementations must be symmetric in the protocol sense: whatever `seal`
/// produces, the portal can read, and whatever the portal sends, `open`
/// recovers. Boxed and stored on the session, so the trait stays object safe.
pub trait Cipher: Send + Sync {
    /// Encrypts a plaintext payload into its transmittable form.
    fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError>;

    /// Decrypts a received payload back into plaintext.
    fn open(&self, wire: &[u8]) -> Result<Vec<u8>, CipherError>;
}

/// Factory selecting a [`Cipher`] for a portal-advertised algorithm.
///
/// Called once per successful ticket exchange. A suite that does not
/// recognise the advertised identifier must refuse with
/// [`CipherError::UnsupportedAlgorithm`] rather than guess; an unreadable
/// heartbeat is worse than a failed authentication.
pub trait CipherSuite: Send + Sync + 'static {
    fn build(&self, secrets: &SessionSecrets) -> Result<Box<dyn Cipher>, CipherError>;
}

// ---------------------------------------------------------------------------
// Plain (no-op) suite
// ---------------------------------------------------------------------------

/// Suite for portals that advertise the all-zero sentinel.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainSuite;

impl CipherSuite for PlainSuite {
    fn build(&self, secrets: &SessionSecrets) -> Result<Box<dyn Cipher>, CipherError> {
        if !secrets.algo_id.is_sentinel() {
            return Err(CipherError::UnsupportedAlgorithm(secrets.algo_id.clone()));
        }
        Ok(Box::new(PlainCipher))
    }
}

/// Passthrough cipher: payloads travel in the clear.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainCipher;

impl Cipher for PlainCipher {
    fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        Ok(plaintext.to_vec())
    }

    fn open(&self, wire: &[u8]) -> Result<Vec<u8>, CipherError> {
        Ok(wire.to_vec())
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors surfaced by cipher negotiation and use.
#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    /// The portal advertised an algorithm no installed suite recognises.
    #[error("unsupported cipher algorithm {0}")]
    UnsupportedAlgorithm(AlgoId),

    /// Sealing a payload failed.
    #[error("seal failed: {0}")]
    Seal(String),

    /// Opening a payload failed (truncated, tampered, or wrongly keyed).
    #[error("open failed: {0}")]
    Open(String),
}

// ===========================================================================
// Tests
// ===========================================================================
