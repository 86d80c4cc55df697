use serde::{Deserialize, Serialize};

use crate::types::{ChatRecord, Dialog, Message, UserRecord};

/// One slice of a paginated listing.
pub trait Paged {
    /// Total number of items in the listing. The service omits it when the
    /// whole listing fit in the first page.
    fn total_count(&self) -> Option<u32>;

    /// Number of items carried by this page.
    fn item_count(&self) -> usize;
}

/// A page of the dialogs listing, with the users and chats it references.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DialogsPage {
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub dialogs: Vec<Dialog>,
    #[serde(default)]
    pub users: Vec<UserRecord>,
    #[serde(default)]
    pub chats: Vec<ChatRecord>,
}

impl Paged for DialogsPage {
    fn total_count(&self) -> Option<u32> {
        self.count
    }

    fn item_count(&self) -> usize {
        self.dialogs.len()
    }
}

/// A page of one peer's message history, newest messages first.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryPage {
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Senders of these messages, for group chats whose members never
    /// showed up in the dialogs listing.
    #[serde(default)]
    pub users: Vec<UserRecord>,
}

impl Paged for HistoryPage {
    fn total_count(&self) -> Option<u32> {
        self.count
    }

    fn item_count(&self) -> usize {
        self.messages.len()
    }
}

/// Answer to a login code request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SentCode {
    pub phone_registered: bool,
    pub phone_code_hash: String,
}

/// Authorization key bound to a signed-in account, hex encoded.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthKey {
    pub id: String,
    pub value: String,
}

impl AuthKey {
    pub fn is_empty(&self) -> bool {
        self.id.is_empty() || self.value.is_empty()
    }
}
