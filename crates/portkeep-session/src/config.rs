//! Keeper configuration.
//!
//! Deserialized from the operator's config file, then passed through
//! [`KeeperConfig::validated`] exactly once before anything else sees it.
//! Validation rejects what cannot work (missing credentials) and repairs
//! what is merely unreasonable (zero or negative intervals), warning about
//! each repair so a typo in the config file is visible instead of silent.

use std::fmt;
use std::time::Duration;

use serde::Deserialize;

use crate::error::SessionError;

fn default_interval_ms() -> i64 {
    KeeperConfig::DEFAULT_INTERVAL_MS
}

fn default_host_name() -> String {
    "unknown".to_owned()
}

fn default_mac_address() -> String {
    "00:00:00:00:00:00".to_owned()
}

/// Everything an operator can set.
///
/// `username` and `password` are the only required fields; the portal
/// identity triple (`domain`, `area`, `school_id`) defaults to empty, which
/// campus portals accept as "the only one you have".
#[derive(Clone, Deserialize)]
pub struct KeeperConfig {
    pub username: String,
    pub password: String,

    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub area: String,
    #[serde(default)]
    pub school_id: String,

    /// Hostname reported to the portal's device inventory.
    #[serde(default = "default_host_name")]
    pub host_name: String,
    /// MAC address reported to the portal.
    #[serde(default = "default_mac_address")]
    pub mac_address: String,

    /// Network interface for outgoing sockets; `None` means system default.
    #[serde(default)]
    pub bind_interface: Option<String>,
    /// Proxy for all portal traffic (`http://`, `https://`, `socks5://`).
    #[serde(default)]
    pub proxy_url: Option<String>,

    /// Milliseconds between routine probes.
    #[serde(default = "default_interval_ms")]
    pub check_interval_ms: i64,
    /// Milliseconds until the next probe after a failed one.
    ///
    /// Negative means "never retry": after a probe failure the keeper goes
    /// quiet until cancelled.
    #[serde(default = "default_interval_ms")]
    pub retry_interval_ms: i64,
}

impl KeeperConfig {
    /// Fallback for repaired intervals: 10 seconds.
    pub const DEFAULT_INTERVAL_MS: i64 = 10_000;

    /// Checks and repairs the configuration.
    ///
    /// # Errors
    ///
    /// [`SessionError::MissingCredentials`] when either credential is empty.
    /// Interval problems never error; they are repaired with a warning.
    pub fn validated(mut self) -> Result<Self, SessionError> {
        if self.username.is_empty() || self.password.is_empty() {
            return Err(SessionError::MissingCredentials);
        }

        if self.check_interval_ms <= 0 {
            tracing::warn!(
                configured = self.check_interval_ms,
                fallback = Self::DEFAULT_INTERVAL_MS,
                "check interval must be positive, using fallback"
            );
            self.check_interval_ms = Self::DEFAULT_INTERVAL_MS;
        }

        if self.retry_interval_ms == 0 {
            tracing::warn!(
                fallback = Self::DEFAULT_INTERVAL_MS,
                "retry interval of 0 requested, using fallback"
            );
            self.retry_interval_ms = Self::DEFAULT_INTERVAL_MS;
        }

        Ok(self)
    }

    /// Pacer period between routine probes.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms.max(0) as u64)
    }

    /// Pacer period after a failed probe.
    ///
    /// `Duration::MAX` encodes "never retry"; the scheduler treats a period
    /// it cannot place on the timeline as disarmed.
    pub fn retry_interval(&self) -> Duration {
        if self.retry_interval_ms < 0 {
            Duration::MAX
        } else {
            Duration::from_millis(self.retry_interval_ms as u64)
        }
    }

    /// The interface name for log fields, with the conventional
    /// `sys_default` stand-in when none is bound.
    pub fn bind_display(&self) -> &str {
        self.bind_interface.as_deref().unwrap_or("sys_default")
    }
}

/// Manual `Debug` so a dumped config never prints the password.
impl fmt::Debug for KeeperConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeeperConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("domain", &self.domain)
            .field("area", &self.area)
            .field("school_id", &self.school_id)
            .field("host_name", &self.host_name)
            .field("mac_address", &self.mac_address)
            .field("bind_interface", &self.bind_interface)
            .field("proxy_url", &self.proxy_url)
            .field("check_interval_ms", &self.check_interval_ms)
            .field("retry_interval_ms", &self.retry_interval_ms)
            .finish()
    }
}

// =========================================================================
// Tests
// =========================================================================
