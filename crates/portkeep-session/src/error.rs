//! Error types for the session layer.

/// Errors that can occur while validating config or reading session state.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The config's username or password is empty.
    ///
    /// Construction-time fatal: a keeper without credentials can probe but
    /// never answer a portal, which is worse than not starting because it
    /// looks alive.
    #[error("username or password is empty")]
    MissingCredentials,

    /// The operation needs a granted ticket and there has never been one.
    #[error("session was never authenticated")]
    NotAuthenticated,
}
