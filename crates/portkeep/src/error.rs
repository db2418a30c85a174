//! Unified error type for the keeper.

use portkeep_cipher::CipherError;
use portkeep_protocol::ProtocolError;
use portkeep_session::SessionError;
use portkeep_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `portkeep` meta-crate, you deal with this single error
/// type instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant auto-generates `From` impls, so the `?`
/// operator converts sub-crate errors automatically. The remaining variants
/// are failures only the engine itself can detect: a portal answering in
/// ways no layer below can classify.
#[derive(Debug, thiserror::Error)]
pub enum KeeperError {
    /// A session-level error (config validation, missing grant).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A transport-level error (client build, request, timeout).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, malformed response).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A cipher-level error (unsupported algorithm, seal/open failure).
    #[error(transparent)]
    Cipher(#[from] CipherError),

    /// The portal answered with a status the protocol has no meaning for.
    #[error("unexpected status {0} from portal")]
    UnexpectedStatus(u16),

    /// A redirect reply arrived without a `Location` header to follow.
    #[error("redirect reply carried no location header")]
    MissingLocation,

    /// The redirect `Location` is not an absolute http(s) URL.
    #[error("malformed redirect location: {0}")]
    MalformedRedirect(String),

    /// The portal understood the request and said no.
    #[error("portal rejected the request: {0}")]
    PortalRejected(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_session_error() {
        let err = SessionError::MissingCredentials;
        let keeper_err: KeeperError = err.into();
        assert!(matches!(keeper_err, KeeperError::Session(_)));
        assert!(keeper_err.to_string().contains("username or password"));
    }

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::Timeout;
        let keeper_err: KeeperError = err.into();
        assert!(matches!(keeper_err, KeeperError::Transport(_)));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::MalformedResponse("no interval".into());
        let keeper_err: KeeperError = err.into();
        assert!(matches!(keeper_err, KeeperError::Protocol(_)));
        assert!(keeper_err.to_string().contains("no interval"));
    }

    #[test]
    fn test_from_cipher_error() {
        let err = CipherError::Open("short payload".into());
        let keeper_err: KeeperError = err.into();
        assert!(matches!(keeper_err, KeeperError::Cipher(_)));
    }

    #[test]
    fn test_engine_variants_render_their_detail() {
        assert!(KeeperError::UnexpectedStatus(500).to_string().contains("500"));
        assert!(
            KeeperError::PortalRejected("bad credentials".into())
                .to_string()
                .contains("bad credentials")
        );
    }
}
