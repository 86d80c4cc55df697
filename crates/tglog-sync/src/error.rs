use thiserror::Error;

use tglog_shared::{PeerId, RemoteError};

#[derive(Error, Debug)]
pub enum SyncError {
    /// A page did not look like a page of the listing being walked.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The stored authorization key is no longer accepted.
    #[error("Authorization expired: {0}")]
    AuthExpired(RemoteError),

    #[error("Cannot address {peer}: {reason}")]
    PeerUnresolved { peer: PeerId, reason: String },

    #[error("Fetch failed: {0}")]
    Fetch(RemoteError),

    #[error("Connection error: {0}")]
    Connection(RemoteError),

    #[error("Log sink error: {0}")]
    Sink(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl SyncError {
    /// Whether the error must abort the whole run rather than skip one peer.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::AuthExpired(_) | Self::Connection(_) | Self::Sink(_)
        )
    }
}

impl From<RemoteError> for SyncError {
    fn from(err: RemoteError) -> Self {
        if err.is_auth_expired() {
            return Self::AuthExpired(err);
        }
        match err {
            RemoteError::Malformed(detail) => Self::Protocol(detail),
            other => Self::Fetch(other),
        }
    }
}
