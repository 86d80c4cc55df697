//! # tglog-shared
//!
//! Domain and wire types shared by every tglog crate: users, chats, dialogs,
//! messages, the addressing descriptors used to open a history listing, and
//! the error reported by the remote service.

pub mod constants;
pub mod error;
pub mod protocol;
pub mod types;

pub use error::RemoteError;
pub use protocol::{AuthKey, DialogsPage, HistoryPage, Paged, SentCode};
pub use types::*;
