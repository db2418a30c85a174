//! Wire documents for the captive-portal exchange.
//!
//! Every document the portal and the keeper trade is a small XML fragment
//! with a fixed root element and lowercase-dash child elements:
//!
//! ```text
//! <ticket-request>
//!   <client-id>9f6e…</client-id>
//!   <host-name>lab-7</host-name>
//!   …
//! </ticket-request>
//! ```
//!
//! The structs below ARE that wire format. The `#[serde(rename)]` attribute
//! pins the root element name, and `rename_all = "kebab-case"` turns each
//! `snake_case` field into the matching `lowercase-dash` element. A mismatch
//! between these attributes and what the portal emits is an authentication
//! outage, which is why the tests assert exact serialized shapes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use portkeep_cipher::AlgoId;

use crate::error::ProtocolError;

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

/// Seconds since the Unix epoch, for freshness markers.
///
/// Returns 0 if the system clock reads before 1970; the portal treats a
/// stale marker as a replay, which is the safe failure mode.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Ticket exchange
// ---------------------------------------------------------------------------

/// Keeper → portal: opening move of the handshake.
///
/// Travels in the clear; at this point no cipher has been negotiated yet,
/// so the request carries only identity, never credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "ticket-request", rename_all = "kebab-case")]
pub struct TicketRequest {
    /// The keeper's self-generated client identifier.
    pub client_id: String,
    /// Hostname reported to the portal for its device inventory.
    pub host_name: String,
    /// MAC address reported to the portal.
    pub mac_address: String,
    /// The client IP the portal's redirect advertised, if it did.
    pub user_ip: String,
}

/// Portal → keeper: the ticket grant answering a [`TicketRequest`].
///
/// The grant names the cipher every later payload must use. The keeper
/// builds that cipher or aborts the handshake; it never guesses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "ticket-grant", rename_all = "kebab-case")]
pub struct TicketGrant {
    /// Opaque session ticket, echoed back in every sealed document.
    pub ticket: String,
    /// Portal-advertised cipher algorithm identifier.
    pub algo_id: AlgoId,
}

// ---------------------------------------------------------------------------
// Credential submission
// ---------------------------------------------------------------------------

/// Keeper → portal: the credential document.
///
/// Carries the password, so it is *always* sealed by the negotiated cipher
/// before it reaches the transport. Serializing it here in the clear is fine;
/// putting it on the wire unsealed is not. The handshake enforces that
/// ordering, not this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "auth", rename_all = "kebab-case")]
pub struct AuthDocument {
    pub username: String,
    pub password: String,
    pub client_id: String,
    /// The ticket from the grant, proving this auth answers that grant.
    pub ticket: String,
    pub domain: String,
    pub area: String,
    pub school_id: String,
    pub user_ip: String,
    pub ac_ip: String,
    pub mac_address: String,
    /// Where the portal should send the client after a successful login.
    pub redirect_url: String,
    /// Freshness marker, seconds since the Unix epoch.
    pub issued_at: u64,
}

// ---------------------------------------------------------------------------
// Session state (heartbeats and logout)
// ---------------------------------------------------------------------------

/// Keeper → portal: "this session is still alive" (or "terminate it").
///
/// The same document shape serves both the keepalive and the terminate
/// endpoints; which endpoint it is POSTed to conveys the intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "state", rename_all = "kebab-case")]
pub struct StateDocument {
    pub client_id: String,
    pub ticket: String,
    pub domain: String,
    pub area: String,
    pub school_id: String,
    pub user_ip: String,
    pub ac_ip: String,
    /// Freshness marker, seconds since the Unix epoch.
    pub issued_at: u64,
}

// ---------------------------------------------------------------------------
// Portal verdicts
// ---------------------------------------------------------------------------

/// The portal's verdict element: `<result>success</result>` or
/// `<result>failure</result>`.
///
/// `rename_all = "lowercase"` makes the wire text exactly `success` /
/// `failure`; anything else the portal sends fails to parse, which is the
/// behavior we want: an unreadable verdict must never count as approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultCode {
    Success,
    Failure,
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultCode::Success => f.write_str("success"),
            ResultCode::Failure => f.write_str("failure"),
        }
    }
}

/// Portal → keeper: reply to an auth, keepalive, or terminate document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "response", rename_all = "kebab-case")]
pub struct PortalResponse {
    pub result: ResultCode,

    /// Heartbeat cadence in seconds, string-encoded by the portal.
    ///
    /// Kept as the raw string on purpose: the portal firmware is known to
    /// emit junk here, and the parse must stay a *visible, fallible* step at
    /// the call site rather than a silent deserialization failure that takes
    /// the whole response with it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,

    /// Optional human-readable detail, mostly present on failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl PortalResponse {
    pub fn is_success(&self) -> bool {
        self.result == ResultCode::Success
    }

    /// Parses the advertised heartbeat cadence.
    ///
    /// A missing or non-numeric interval is a
    /// [`ProtocolError::MalformedResponse`]; callers decide whether that is
    /// fatal (it is not for heartbeats, where the previous cadence stands).
    pub fn interval_secs(&self) -> Result<u64, ProtocolError> {
        let raw = self
            .interval
            .as_deref()
            .ok_or_else(|| ProtocolError::MalformedResponse("response carries no interval".into()))?;
        raw.trim()
            .parse::<u64>()
            .map_err(|_| ProtocolError::MalformedResponse(format!("interval is not a number: {raw:?}")))
    }

    /// The failure detail, or a fixed placeholder when the portal sent none.
    pub fn message_or_default(&self) -> &str {
        self.message.as_deref().unwrap_or("no detail given")
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(all(test, feature = "xml"))]
mod tests {
    //! Wire-shape tests.
    //!
    //! The portal firmware parses these documents with exact element names,
    //! so the tests pin the serialized text itself, not just round-trip
    //! equality. A renamed field that still round-trips locally would break
    //! against the real portal.

    use super::*;

    fn ticket_request() -> TicketRequest {
        TicketRequest {
            client_id: "9f6e0a1b".into(),
            host_name: "lab-7".into(),
            mac_address: "aa:bb:cc:dd:ee:ff".into(),
            user_ip: "10.1.2.3".into(),
        }
    }

    // =====================================================================
    // Ticket exchange
    // =====================================================================

    #[test]
    fn test_ticket_request_serializes_with_kebab_elements() {
        let xml = quick_xml::se::to_string(&ticket_request()).unwrap();
        assert_eq!(
            xml,
            "<ticket-request>\
             <client-id>9f6e0a1b</client-id>\
             <host-name>lab-7</host-name>\
             <mac-address>aa:bb:cc:dd:ee:ff</mac-address>\
             <user-ip>10.1.2.3</user-ip>\
             </ticket-request>"
        );
    }

    #[test]
    fn test_ticket_grant_parses_portal_output() {
        let xml = "<ticket-grant>\
                   <ticket>T-777</ticket>\
                   <algo-id>00000000-0000-0000-0000-000000000000</algo-id>\
                   </ticket-grant>";
        let grant: TicketGrant = quick_xml::de::from_str(xml).unwrap();
        assert_eq!(grant.ticket, "T-777");
        assert!(grant.algo_id.is_sentinel());
    }

    #[test]
    fn test_ticket_grant_with_real_algorithm_is_not_sentinel() {
        let xml = "<ticket-grant>\
                   <ticket>T-1</ticket>\
                   <algo-id>3ec47f6a-0f15-4f14-9c0a-5d6b2a81f001</algo-id>\
                   </ticket-grant>";
        let grant: TicketGrant = quick_xml::de::from_str(xml).unwrap();
        assert!(!grant.algo_id.is_sentinel());
    }

    // =====================================================================
    // Auth document
    // =====================================================================

    #[test]
    fn test_auth_document_root_and_credential_elements() {
        let doc = AuthDocument {
            username: "s1024001".into(),
            password: "hunter2".into(),
            client_id: "9f6e0a1b".into(),
            ticket: "T-777".into(),
            domain: "campus".into(),
            area: "north".into(),
            school_id: "1024".into(),
            user_ip: "10.1.2.3".into(),
            ac_ip: "10.254.0.1".into(),
            mac_address: "aa:bb:cc:dd:ee:ff".into(),
            redirect_url: "http://connect.rom.miui.com/generate_204".into(),
            issued_at: 1_700_000_000,
        };
        let xml = quick_xml::se::to_string(&doc).unwrap();
        assert!(xml.starts_with("<auth>"));
        assert!(xml.ends_with("</auth>"));
        assert!(xml.contains("<username>s1024001</username>"));
        assert!(xml.contains("<school-id>1024</school-id>"));
        assert!(xml.contains("<redirect-url>http://connect.rom.miui.com/generate_204</redirect-url>"));
        assert!(xml.contains("<issued-at>1700000000</issued-at>"));
    }

    // =====================================================================
    // State document
    // =====================================================================

    #[test]
    fn test_state_document_round_trip() {
        let doc = StateDocument {
            client_id: "9f6e0a1b".into(),
            ticket: "T-777".into(),
            domain: "campus".into(),
            area: "north".into(),
            school_id: "1024".into(),
            user_ip: "10.1.2.3".into(),
            ac_ip: "10.254.0.1".into(),
            issued_at: 1_700_000_123,
        };
        let xml = quick_xml::se::to_string(&doc).unwrap();
        assert!(xml.starts_with("<state>"));
        let back: StateDocument = quick_xml::de::from_str(&xml).unwrap();
        assert_eq!(back, doc);
    }

    // =====================================================================
    // Portal responses
    // =====================================================================

    #[test]
    fn test_response_success_with_interval() {
        let xml = "<response><result>success</result><interval>60</interval></response>";
        let resp: PortalResponse = quick_xml::de::from_str(xml).unwrap();
        assert!(resp.is_success());
        assert_eq!(resp.interval_secs().unwrap(), 60);
    }

    #[test]
    fn test_response_failure_with_message() {
        let xml = "<response>\
                   <result>failure</result>\
                   <message>account suspended</message>\
                   </response>";
        let resp: PortalResponse = quick_xml::de::from_str(xml).unwrap();
        assert!(!resp.is_success());
        assert_eq!(resp.message_or_default(), "account suspended");
    }

    #[test]
    fn test_response_without_message_uses_placeholder() {
        let xml = "<response><result>failure</result></response>";
        let resp: PortalResponse = quick_xml::de::from_str(xml).unwrap();
        assert_eq!(resp.message_or_default(), "no detail given");
    }

    #[test]
    fn test_response_missing_interval_is_malformed() {
        let xml = "<response><result>success</result></response>";
        let resp: PortalResponse = quick_xml::de::from_str(xml).unwrap();
        assert!(matches!(
            resp.interval_secs(),
            Err(ProtocolError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_response_non_numeric_interval_is_malformed() {
        // Observed in the field: the portal answering "soon".
        let xml = "<response><result>success</result><interval>soon</interval></response>";
        let resp: PortalResponse = quick_xml::de::from_str(xml).unwrap();
        assert!(matches!(
            resp.interval_secs(),
            Err(ProtocolError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_response_unknown_result_text_fails_to_parse() {
        // "maybe" is not a verdict. Parsing must fail rather than default
        // to either outcome.
        let xml = "<response><result>maybe</result></response>";
        let parsed: Result<PortalResponse, _> = quick_xml::de::from_str(xml);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_response_serializes_without_optional_elements() {
        let resp = PortalResponse {
            result: ResultCode::Success,
            interval: None,
            message: None,
        };
        let xml = quick_xml::se::to_string(&resp).unwrap();
        assert_eq!(xml, "<response><result>success</result></response>");
    }

    #[test]
    fn test_result_code_display() {
        assert_eq!(ResultCode::Success.to_string(), "success");
        assert_eq!(ResultCode::Failure.to_string(), "failure");
    }

    // =====================================================================
    // Malformed input
    // =====================================================================

    #[test]
    fn test_decode_garbage_returns_error() {
        let garbage = "this is not xml";
        let parsed: Result<PortalResponse, _> = quick_xml::de::from_str(garbage);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_decode_wrong_document_returns_error() {
        // A well-formed document of the wrong shape must not parse.
        let xml = "<response><verdict>yes</verdict></response>";
        let parsed: Result<PortalResponse, _> = quick_xml::de::from_str(xml);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_unix_now_is_past_2020() {
        assert!(unix_now() > 1_577_836_800);
    }
}
