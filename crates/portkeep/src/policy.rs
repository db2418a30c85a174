//! Containment policy: how far each engine failure is allowed to reach.
//!
//! The keeper's central contract is that the long-running loop never dies
//! from a single bad network event. Instead of scattering log-and-ignore
//! code through the loop, every fallible operation maps to a containment
//! level here, and the loop consults the table at each failure site. What a
//! failure may and may not take down is written in one place.

use std::fmt;

use tracing::{error, warn};

use crate::KeeperError;

/// Engine operations that can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// Building the keeper: config validation, transport construction.
    Construct,
    /// One GET against the probe endpoint.
    Probe,
    /// The portal handshake, from redirect parsing to credential submission.
    Authenticate,
    /// One sealed keepalive POST and its reply.
    Heartbeat,
    /// The teardown POST to the terminate endpoint.
    Logout,
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Op::Construct => "construct",
            Op::Probe => "probe",
            Op::Authenticate => "authenticate",
            Op::Heartbeat => "heartbeat",
            Op::Logout => "logout",
        };
        f.write_str(name)
    }
}

/// What happens after an operation fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Containment {
    /// Surfaced to the caller; there is nothing to keep running.
    Fatal,
    /// Logged; the loop moves on with session state unchanged.
    LogAndContinue,
    /// Logged; the responsible scheduler fires again and the operation is
    /// retried then.
    LogAndRetryNextBeat,
}

/// The policy table.
///
/// Only construction failures are allowed out of the engine. A failed
/// authentication is contained because the next probe retries it; a failed
/// heartbeat keeps its previous cadence; a failed logout is advisory.
pub fn containment(op: Op) -> Containment {
    match op {
        Op::Construct => Containment::Fatal,
        Op::Probe => Containment::LogAndRetryNextBeat,
        Op::Authenticate => Containment::LogAndContinue,
        Op::Heartbeat => Containment::LogAndRetryNextBeat,
        Op::Logout => Containment::LogAndContinue,
    }
}

/// Logs `err` at the severity its containment calls for, and returns the
/// containment so the call site can act on it.
pub(crate) fn apply(op: Op, err: &KeeperError) -> Containment {
    let containment = containment(op);
    match containment {
        Containment::Fatal => {
            error!(op = %op, error = %err, "fatal failure");
        }
        Containment::LogAndContinue => {
            warn!(op = %op, error = %err, "operation failed, continuing");
        }
        Containment::LogAndRetryNextBeat => {
            warn!(op = %op, error = %err, "operation failed, retrying at next beat");
        }
    }
    containment
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_construction_is_fatal() {
        assert_eq!(containment(Op::Construct), Containment::Fatal);
        for op in [Op::Probe, Op::Authenticate, Op::Heartbeat, Op::Logout] {
            assert_ne!(containment(op), Containment::Fatal, "{op} must be contained");
        }
    }

    #[test]
    fn test_scheduled_operations_retry_at_next_beat() {
        assert_eq!(containment(Op::Probe), Containment::LogAndRetryNextBeat);
        assert_eq!(containment(Op::Heartbeat), Containment::LogAndRetryNextBeat);
    }

    #[test]
    fn test_one_shot_operations_continue() {
        assert_eq!(containment(Op::Authenticate), Containment::LogAndContinue);
        assert_eq!(containment(Op::Logout), Containment::LogAndContinue);
    }

    #[test]
    fn test_apply_returns_the_table_row() {
        let err = KeeperError::UnexpectedStatus(500);
        assert_eq!(apply(Op::Probe, &err), containment(Op::Probe));
        assert_eq!(apply(Op::Logout, &err), containment(Op::Logout));
    }
}
