//! Capabilities the sync engine needs from the remote service.
//!
//! The wire protocol lives behind these traits; the engine only sees typed
//! pages and [`RemoteError`]s.

use std::collections::BTreeMap;

use tglog_shared::{AuthKey, DialogsPage, HistoryPage, InputPeer, RemoteError, SentCode};

/// A connected session able to serve paginated listings.
#[allow(async_fn_in_trait)]
pub trait RemoteSession {
    /// Suspend until the session is ready to serve requests.
    async fn connect(&mut self) -> Result<(), RemoteError>;

    async fn fetch_dialogs_page(&self, offset: u32, limit: u32)
        -> Result<DialogsPage, RemoteError>;

    async fn fetch_history_page(
        &self,
        peer: &InputPeer,
        offset: u32,
        limit: u32,
    ) -> Result<HistoryPage, RemoteError>;
}

/// Sign-in flow, used once to obtain an authorization key.
#[allow(async_fn_in_trait)]
pub trait LoginSession: RemoteSession {
    async fn send_code(&self, phone_number: &str) -> Result<SentCode, RemoteError>;

    async fn sign_in(
        &self,
        phone_number: &str,
        phone_code_hash: &str,
        phone_code: &str,
    ) -> Result<AuthKey, RemoteError>;

    /// Data center number to `host:port`.
    async fn data_centers(&self) -> Result<BTreeMap<u32, String>, RemoteError>;
}
