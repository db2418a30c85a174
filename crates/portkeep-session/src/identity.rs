//! Self-generated identifiers.
//!
//! A keeper mints two identifiers at startup and never changes them:
//!
//! - the [`ClientId`] it presents to the portal, surviving across
//!   re-authentications so the portal sees one device, not a parade;
//! - a short run tag that stamps every log line of one engine run, so
//!   interleaved logs from restarted keepers stay tellable apart.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ClientId
// ---------------------------------------------------------------------------

/// The keeper's self-generated client identifier.
///
/// 32 lowercase hex characters (128 bits of randomness). A newtype rather
/// than a bare `String` so it can't be swapped with the ticket or the run
/// tag in a call; all three are strings on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    /// Mints a fresh random identifier.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let bytes: [u8; 16] = rng.random();
        Self(bytes.iter().map(|b| format!("{b:02x}")).collect())
    }

    /// Wraps an existing identifier (tests, replayed sessions).
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Run tags
// ---------------------------------------------------------------------------

/// Characters used in run tags. Lowercase only; tags land in log fields
/// where case distinctions don't survive eyeballs.
const TAG_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Mints the 5-character tag identifying one engine run in the logs.
pub fn generate_run_tag() -> String {
    let mut rng = rand::rng();
    (0..5)
        .map(|_| {
            let i = rng.random_range(0..TAG_ALPHABET.len());
            TAG_ALPHABET[i] as char
        })
        .collect()
}

// =========================================================================
// Tests
// =========================================================================
