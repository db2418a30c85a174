//! The portal handshake: redirect target to authenticated session.
//!
//! Runs once each time a probe discovers a portal. The flow is:
//!   1. Parse the redirect `Location` → portal origin + advertised IPs
//!   2. GET the index page to prime the portal
//!   3. POST a plaintext ticket request → ticket + algorithm id
//!   4. Build the cipher for the granted algorithm
//!   5. POST the sealed credential document → portal verdict
//!
//! Nothing here mutates the session. Every step returns its result into an
//! [`AuthOutcome`], and the keeper commits the whole outcome only after the
//! final step succeeded; a handshake that dies halfway leaves the session
//! exactly as it found it.

use std::time::Duration;

use portkeep_cipher::{AlgoId, Cipher, CipherSuite, SessionSecrets};
use portkeep_protocol::{
    unix_now, AuthDocument, Codec, PortalResponse, TicketGrant, TicketRequest,
};
use portkeep_session::{EndpointSet, KeeperConfig, Session};
use portkeep_transport::RequestExecutor;
use tracing::debug;

use crate::keeper::PROBE_URL;
use crate::KeeperError;

// ---------------------------------------------------------------------------
// Redirect parsing
// ---------------------------------------------------------------------------

/// What a portal redirect tells us: where the portal lives, and which
/// addresses it already knows us by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RedirectTarget {
    /// Scheme + authority of the portal, e.g. `http://10.254.0.1:8080`.
    pub(crate) origin: String,
    /// `wlanuserip` query parameter, when the redirect carried one.
    pub(crate) user_ip: Option<String>,
    /// `wlanacip` query parameter, when the redirect carried one.
    pub(crate) ac_ip: Option<String>,
}

/// Extracts the portal origin and the advertised IPs from a redirect
/// `Location` value.
///
/// # Errors
///
/// [`KeeperError::MalformedRedirect`] unless the location is an absolute
/// `http` or `https` URL. Relative locations are rejected: the probe
/// endpoint is not the portal, so there is nothing safe to resolve them
/// against.
pub(crate) fn parse_redirect(location: &str) -> Result<RedirectTarget, KeeperError> {
    let url = url::Url::parse(location)
        .map_err(|err| KeeperError::MalformedRedirect(format!("{location:?}: {err}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(KeeperError::MalformedRedirect(format!(
            "unsupported scheme in {location:?}"
        )));
    }

    let mut user_ip = None;
    let mut ac_ip = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "wlanuserip" => user_ip = Some(value.into_owned()),
            "wlanacip" => ac_ip = Some(value.into_owned()),
            _ => {}
        }
    }

    Ok(RedirectTarget {
        origin: url.origin().ascii_serialization(),
        user_ip,
        ac_ip,
    })
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

/// Everything a successful handshake produced, staged for the keeper to
/// commit in one move.
pub(crate) struct AuthOutcome {
    pub(crate) user_ip: Option<String>,
    pub(crate) ac_ip: Option<String>,
    pub(crate) endpoints: EndpointSet,
    pub(crate) ticket: String,
    pub(crate) algo_id: AlgoId,
    pub(crate) cipher: Box<dyn Cipher>,
    /// Heartbeat cadence the auth reply advertised, when it did.
    pub(crate) heartbeat_interval: Option<Duration>,
}

/// Runs the handshake against the portal at `target`.
pub(crate) async fn authenticate<E, C, S>(
    executor: &E,
    codec: &C,
    suite: &S,
    config: &KeeperConfig,
    session: &Session,
    target: RedirectTarget,
) -> Result<AuthOutcome, KeeperError>
where
    E: RequestExecutor,
    C: Codec,
    S: CipherSuite,
{
    let endpoints = EndpointSet::for_portal(&target.origin, PROBE_URL);

    // A redirect on re-authentication may omit the IP parameters; the last
    // known values still identify this client to the portal.
    let user_ip = target
        .user_ip
        .clone()
        .unwrap_or_else(|| session.user_ip.clone());
    let ac_ip = target
        .ac_ip
        .clone()
        .unwrap_or_else(|| session.ac_ip.clone());

    let index = executor.get(&endpoints.index).await?;
    if !index.is_success() {
        return Err(KeeperError::UnexpectedStatus(index.status));
    }

    let request = TicketRequest {
        client_id: session.client_id.to_string(),
        host_name: session.host_name.clone(),
        mac_address: session.mac_address.clone(),
        user_ip: user_ip.clone(),
    };
    let reply = executor
        .post(&endpoints.ticket, &codec.encode(&request)?)
        .await?;
    if !reply.is_success() {
        return Err(KeeperError::UnexpectedStatus(reply.status));
    }
    let grant: TicketGrant = codec.decode(&reply.body)?;
    debug!(algo_id = %grant.algo_id, "ticket granted");

    let secrets = SessionSecrets::new(
        session.client_id.as_str(),
        grant.ticket.as_str(),
        grant.algo_id.clone(),
    );
    let cipher = suite.build(&secrets)?;

    let auth = AuthDocument {
        username: config.username.clone(),
        password: config.password.clone(),
        client_id: session.client_id.to_string(),
        ticket: grant.ticket.clone(),
        domain: session.domain.clone(),
        area: session.area.clone(),
        school_id: session.school_id.clone(),
        user_ip,
        ac_ip,
        mac_address: session.mac_address.clone(),
        redirect_url: endpoints.redirect.clone(),
        issued_at: unix_now(),
    };
    let sealed = cipher.seal(&codec.encode(&auth)?)?;
    let reply = executor.post(&endpoints.auth, &sealed).await?;
    if !reply.is_success() {
        return Err(KeeperError::UnexpectedStatus(reply.status));
    }

    let opened = cipher.open(&reply.body)?;
    let response: PortalResponse = codec.decode(&opened)?;
    if !response.is_success() {
        return Err(KeeperError::PortalRejected(
            response.message_or_default().to_owned(),
        ));
    }

    // The auth reply may or may not advertise a cadence. Missing or junk is
    // not an error here; the keeper falls back to its default.
    let heartbeat_interval = response.interval_secs().ok().map(Duration::from_secs);

    Ok(AuthOutcome {
        user_ip: target.user_ip,
        ac_ip: target.ac_ip,
        endpoints,
        ticket: grant.ticket,
        algo_id: grant.algo_id,
        cipher,
        heartbeat_interval,
    })
}
