//! Transport layer for Portkeep.
//!
//! Provides the [`RequestExecutor`] trait the engine issues portal requests
//! through, and the plain-HTTP reply shape ([`WireReply`]) those requests
//! come back as.
//!
//! The one non-negotiable property of any executor: **redirects are data,
//! not plumbing**. A captive portal announces itself by answering a probe
//! with `302` + `Location`, so an executor that transparently follows
//! redirects destroys the very signal the engine exists to observe.
//!
//! # Feature Flags
//!
//! - `http` (default): real HTTP executor via `reqwest`

mod error;
#[cfg(feature = "http")]
mod http;

pub use error::TransportError;
#[cfg(feature = "http")]
pub use http::HttpTransport;

use std::future::Future;
use std::time::Duration;

/// Content type for every document POSTed to a portal.
pub const XML_CONTENT_TYPE: &str = "text/xml; charset=utf-8";

// ---------------------------------------------------------------------------
// Replies
// ---------------------------------------------------------------------------

/// What came back from the portal, reduced to the parts the engine reads.
///
/// Deliberately not a full HTTP response: the engine's decisions hinge on
/// the status class, the `Location` header, and the body bytes. Everything
/// else stays inside the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireReply {
    /// HTTP status code.
    pub status: u16,
    /// The `Location` header verbatim, when the reply carried one.
    pub location: Option<String>,
    /// Response body bytes.
    pub body: Vec<u8>,
}

impl WireReply {
    /// `204 No Content`, the open-network answer to a probe.
    pub fn is_no_content(&self) -> bool {
        self.status == 204
    }

    /// Any `3xx`, a captive portal interposing itself.
    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }

    /// Any `2xx`.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// ---------------------------------------------------------------------------
// Executor options
// ---------------------------------------------------------------------------

/// Construction options for a real executor.
#[derive(Debug, Clone, Default)]
pub struct TransportOptions {
    /// Network interface to bind outgoing sockets to (`SO_BINDTODEVICE`).
    ///
    /// Only honored on Linux-family targets; elsewhere a set value is
    /// logged and ignored so a shared config file stays portable.
    pub bind_interface: Option<String>,

    /// Proxy URL (`http://`, `https://`, or `socks5://`).
    pub proxy_url: Option<String>,

    /// Overall per-request deadline applied to every request.
    ///
    /// `None` leaves requests unbounded, matching a portal LAN where the
    /// link either answers fast or resets.
    pub timeout: Option<Duration>,
}

// ---------------------------------------------------------------------------
// Executor trait
// ---------------------------------------------------------------------------

/// Issues portal requests without following redirects.
///
/// Implementations must return the `3xx` reply itself, `Location` intact,
/// instead of chasing it. Errors use the concrete [`TransportError`] so the
/// engine stays generic over executors without growing an error parameter.
///
/// Methods are declared to return `Send` futures so a keeper generic over
/// its executor can be spawned onto a multi-threaded runtime; implementors
/// can still write plain `async fn`.
pub trait RequestExecutor: Send + Sync + 'static {
    /// Issues a GET and returns whatever single reply the server gave.
    fn get(&self, url: &str) -> impl Future<Output = Result<WireReply, TransportError>> + Send;

    /// POSTs a document with the [`XML_CONTENT_TYPE`] content type.
    fn post(
        &self,
        url: &str,
        body: &[u8],
    ) -> impl Future<Output = Result<WireReply, TransportError>> + Send;

    /// Like [`RequestExecutor::post`], but bounded by `timeout`.
    ///
    /// Used for teardown traffic that must never stall shutdown.
    fn post_with_timeout(
        &self,
        url: &str,
        body: &[u8],
        timeout: Duration,
    ) -> impl Future<Output = Result<WireReply, TransportError>> + Send;
}
