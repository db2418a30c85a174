//! The session entity: everything the keeper believes about its standing
//! with the portal.
//!
//! One engine run owns exactly one `Session` and is its only writer. The
//! record starts out knowing nothing but self-generated identity; each
//! successful authentication fills in what the portal granted (ticket,
//! cipher, endpoints), and a failed re-authentication leaves the previous
//! grants in place, since stale credentials still matter at logout time.

use std::fmt;

use portkeep_cipher::{AlgoId, Cipher};
use portkeep_protocol::types::{unix_now, StateDocument};

use crate::config::KeeperConfig;
use crate::endpoints::EndpointSet;
use crate::error::SessionError;
use crate::identity::ClientId;

// ---------------------------------------------------------------------------
// SessionPhase
// ---------------------------------------------------------------------------

/// Where the session is in its lifecycle.
///
/// ```text
///   Unauthenticated ──(redirect seen)──→ Authenticating ──(portal ok)──→ Authenticated
///          ↑                                   │                              │
///          └────────────(portal refused)───────┘          (redirect seen) ────┘
///
///   any non-terminal ──(engine stops)──→ LoggedOut
/// ```
///
/// `LoggedOut` is terminal: a keeper runs once and is then done, so nothing
/// transitions out of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No valid grant; probes may discover a portal at any time.
    Unauthenticated,
    /// A handshake is in flight.
    Authenticating,
    /// The portal accepted credentials; heartbeats keep the grant alive.
    Authenticated,
    /// The engine has stopped and logout ran. Terminal.
    LoggedOut,
}

impl SessionPhase {
    /// Whether heartbeat traffic makes sense in this phase.
    pub fn is_live(self) -> bool {
        matches!(self, SessionPhase::Authenticated)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SessionPhase::LoggedOut)
    }

    /// Whether `target` is a legal next phase.
    pub fn can_transition_to(self, target: SessionPhase) -> bool {
        use SessionPhase::*;
        matches!(
            (self, target),
            (Unauthenticated, Authenticating)
                | (Authenticating, Authenticated)
                | (Authenticating, Unauthenticated)
                | (Authenticated, Authenticating)
                | (Unauthenticated, LoggedOut)
                | (Authenticating, LoggedOut)
                | (Authenticated, LoggedOut)
        )
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionPhase::Unauthenticated => "unauthenticated",
            SessionPhase::Authenticating => "authenticating",
            SessionPhase::Authenticated => "authenticated",
            SessionPhase::LoggedOut => "logged-out",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The keeper's record of one portal session.
pub struct Session {
    /// Self-generated identity, stable across re-authentications.
    pub client_id: ClientId,
    pub host_name: String,
    pub mac_address: String,

    /// Portal identity triple from the config.
    pub domain: String,
    pub area: String,
    pub school_id: String,

    /// Client IP as the portal's redirect advertised it; empty until seen.
    pub user_ip: String,
    /// Access controller IP from the redirect; empty until seen.
    pub ac_ip: String,

    /// The granted ticket. `None` exactly when never authenticated.
    pub ticket: Option<String>,
    /// Cipher algorithm the last grant named.
    pub algo_id: AlgoId,
    /// Endpoints discovered by the last successful authentication.
    pub endpoints: Option<EndpointSet>,
    /// Cipher built for the last grant. Present iff `ticket` is.
    pub cipher: Option<Box<dyn Cipher>>,

    pub phase: SessionPhase,
}

impl Session {
    /// A fresh session for one engine run.
    pub fn new(config: &KeeperConfig) -> Self {
        Self {
            client_id: ClientId::generate(),
            host_name: config.host_name.clone(),
            mac_address: config.mac_address.clone(),
            domain: config.domain.clone(),
            area: config.area.clone(),
            school_id: config.school_id.clone(),
            user_ip: String::new(),
            ac_ip: String::new(),
            ticket: None,
            algo_id: AlgoId::sentinel(),
            endpoints: None,
            cipher: None,
            phase: SessionPhase::Unauthenticated,
        }
    }

    /// Moves to `next`, logging the change.
    ///
    /// An illegal transition is logged loudly but still taken; the engine's
    /// control flow is the real guard, this is the flight recorder.
    pub fn set_phase(&mut self, next: SessionPhase) {
        if self.phase == next {
            return;
        }
        if !self.phase.can_transition_to(next) {
            tracing::warn!(from = %self.phase, to = %next, "unexpected session phase transition");
        } else {
            tracing::debug!(from = %self.phase, to = %next, "session phase change");
        }
        self.phase = next;
    }

    /// Builds the document heartbeats and logout POST to the portal.
    ///
    /// # Errors
    ///
    /// [`SessionError::NotAuthenticated`] when no ticket has ever been
    /// granted; there is no session state worth reporting.
    pub fn state_document(&self) -> Result<StateDocument, SessionError> {
        let ticket = self.ticket.clone().ok_or(SessionError::NotAuthenticated)?;
        Ok(StateDocument {
            client_id: self.client_id.to_string(),
            ticket,
            domain: self.domain.clone(),
            area: self.area.clone(),
            school_id: self.school_id.clone(),
            user_ip: self.user_ip.clone(),
            ac_ip: self.ac_ip.clone(),
            issued_at: unix_now(),
        })
    }

    /// The negotiated cipher, or [`SessionError::NotAuthenticated`].
    pub fn cipher(&self) -> Result<&dyn Cipher, SessionError> {
        self.cipher
            .as_deref()
            .ok_or(SessionError::NotAuthenticated)
    }

    /// The discovered endpoints, or [`SessionError::NotAuthenticated`].
    pub fn endpoints(&self) -> Result<&EndpointSet, SessionError> {
        self.endpoints
            .as_ref()
            .ok_or(SessionError::NotAuthenticated)
    }
}

/// Manual `Debug`: `Box<dyn Cipher>` has no `Debug`, and the ticket is
/// deliberately reduced to its presence.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("client_id", &self.client_id)
            .field("phase", &self.phase)
            .field("user_ip", &self.user_ip)
            .field("ac_ip", &self.ac_ip)
            .field("has_ticket", &self.ticket.is_some())
            .field("algo_id", &self.algo_id)
            .field("has_cipher", &self.cipher.is_some())
            .finish()
    }
}

// =========================================================================
// Tests
// =========================================================================
