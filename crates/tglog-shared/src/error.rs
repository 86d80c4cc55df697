use thiserror::Error;

use crate::constants::AUTH_EXPIRED_CODE;

/// An error produced while talking to the remote service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The service answered with an explicit `error_code` / `error_message` pair.
    #[error("{message} (code {code})")]
    Rpc { code: i32, message: String },

    /// The request never produced a response (DNS, TLS, socket, timeout).
    #[error("Transport error: {0}")]
    Transport(String),

    /// A response arrived but could not be decoded into the expected record.
    #[error("Unexpected response: {0}")]
    Malformed(String),
}

impl RemoteError {
    pub fn rpc(code: i32, message: impl Into<String>) -> Self {
        Self::Rpc {
            code,
            message: message.into(),
        }
    }

    /// The numeric error code, when the service reported one.
    pub fn code(&self) -> Option<i32> {
        match self {
            Self::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// The service's error message (e.g. `PHONE_MIGRATE_4`), when there is one.
    pub fn rpc_message(&self) -> Option<&str> {
        match self {
            Self::Rpc { message, .. } => Some(message),
            _ => None,
        }
    }

    pub fn is_auth_expired(&self) -> bool {
        self.code() == Some(AUTH_EXPIRED_CODE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_expired_detection() {
        assert!(RemoteError::rpc(401, "AUTH_KEY_UNREGISTERED").is_auth_expired());
        assert!(!RemoteError::rpc(400, "PHONE_CODE_INVALID").is_auth_expired());
        assert!(!RemoteError::Transport("reset".into()).is_auth_expired());
    }

    #[test]
    fn test_display_includes_code() {
        let err = RemoteError::rpc(420, "FLOOD_WAIT_3");
        assert_eq!(err.to_string(), "FLOOD_WAIT_3 (code 420)");
        assert_eq!(err.rpc_message(), Some("FLOOD_WAIT_3"));
    }
}
