use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Generic I/O error (reading the credential file, writing a log).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The credential file exists but is not valid JSON for our schema.
    #[error("Invalid credential file: {0}")]
    Json(#[from] serde_json::Error),

    /// The stored authorization key is not hex.
    #[error("Hex decode error: {0}")]
    Hex(#[from] hex::FromHexError),

    /// No authorization key has been stored yet.
    #[error("You are not logged in")]
    NotLoggedIn,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
