//! Portal endpoint derivation.
//!
//! A captive portal never publishes a service document; the only thing it
//! volunteers is its own origin, buried in the probe redirect. Every
//! endpoint the keeper will ever talk to is derived from that origin by
//! fixed paths, re-derived on every authentication because the portal
//! behind a roaming client can change between redirects.

/// The portal URLs one authentication discovered.
///
/// Plain strings, not parsed URLs: they are produced from an
/// already-validated origin and only ever handed straight back to the
/// transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSet {
    /// Landing page; fetched once per handshake to prime the portal.
    pub index: String,
    /// Ticket exchange endpoint (plaintext).
    pub ticket: String,
    /// Credential submission endpoint (sealed).
    pub auth: String,
    /// Heartbeat endpoint (sealed).
    pub keepalive: String,
    /// Session termination endpoint (sealed).
    pub terminate: String,
    /// Where the portal should send the client after login.
    pub redirect: String,
}

impl EndpointSet {
    /// Derives the full set from a portal origin such as
    /// `http://10.254.0.1:8080`.
    pub fn for_portal(origin: &str, redirect: &str) -> Self {
        let origin = origin.trim_end_matches('/');
        Self {
            index: format!("{origin}/portal"),
            ticket: format!("{origin}/portal/ticket"),
            auth: format!("{origin}/portal/auth"),
            keepalive: format!("{origin}/portal/keepalive"),
            terminate: format!("{origin}/portal/terminate"),
            redirect: redirect.to_owned(),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
