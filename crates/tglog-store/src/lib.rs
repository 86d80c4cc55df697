//! # tglog-store
//!
//! Local persistence: the credential file holding the app registration and
//! authorization key, and the per-peer, per-day text logs.

pub mod credentials;
pub mod log_writer;
pub mod paths;

mod error;

pub use credentials::{AppCredentials, CredentialStore, Credentials, JsonCredentialStore};
pub use error::{Result, StoreError};
pub use log_writer::{render_line, LogWriter};
