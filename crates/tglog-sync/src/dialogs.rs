//! Peer discovery from the dialogs listing.
//!
//! Conversations with non-contacts only show up here, not in the contact
//! list.

use std::collections::HashMap;

use tracing::{debug, info};

use tglog_shared::{
    ChatId, ChatRecord, DialogsPage, PeerAddress, PeerId, UserId, UserRecord,
};

use crate::error::SyncError;
use crate::session::RemoteSession;
use crate::traverse::PageTraverser;

/// A conversation partner, resolved for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    pub id: PeerId,
    pub display_name: String,
    /// Folder under the logs root holding this peer's day files.
    pub directory_name: String,
    pub address: PeerAddress,
}

/// Peers with a dialog, plus every user and chat the listing referenced.
#[derive(Debug, Clone, Default)]
pub struct DialogIndex {
    peers: Vec<PeerId>,
    users: HashMap<UserId, UserRecord>,
    chats: HashMap<ChatId, ChatRecord>,
}

impl DialogIndex {
    /// Walk the whole dialogs listing and index it.
    pub async fn build<S: RemoteSession>(
        session: &S,
        traverser: &PageTraverser,
    ) -> Result<Self, SyncError> {
        let pages = traverser
            .traverse(
                move |offset, limit| session.fetch_dialogs_page(offset, limit),
                0,
            )
            .await?;

        let index = Self::from_pages(pages);
        info!(
            peers = index.peers.len(),
            users = index.users.len(),
            chats = index.chats.len(),
            "Discovered dialogs"
        );
        Ok(index)
    }

    /// Fold dialogs pages in request order.
    ///
    /// A user or chat seen twice keeps its last record. Dialogs without a
    /// peer are dropped. Peers keep arrival order, then are stably sorted by
    /// ascending numeric id.
    pub fn from_pages(pages: impl IntoIterator<Item = DialogsPage>) -> Self {
        let mut index = Self::default();

        for page in pages {
            for user in page.users {
                index.users.insert(user.id, user);
            }
            for chat in page.chats {
                index.chats.insert(chat.id, chat);
            }
            for dialog in page.dialogs {
                match dialog.peer {
                    Some(peer) => index.peers.push(peer),
                    None => debug!(?dialog, "Skipping dialog without a peer"),
                }
            }
        }

        index.peers.sort_by_key(PeerId::raw);
        index
    }

    /// Peers in ascending id order.
    pub fn peers(&self) -> &[PeerId] {
        &self.peers
    }

    pub fn users(&self) -> &HashMap<UserId, UserRecord> {
        &self.users
    }

    pub fn user(&self, id: UserId) -> Option<&UserRecord> {
        self.users.get(&id)
    }

    pub fn chat(&self, id: ChatId) -> Option<&ChatRecord> {
        self.chats.get(&id)
    }

    /// Names and addressing for a peer. A peer whose record never showed up
    /// in the listing gets fallback names and cannot be addressed.
    pub fn peer(&self, id: PeerId) -> Peer {
        match id {
            PeerId::User { user_id } => match self.user(user_id) {
                Some(user) => Peer {
                    id,
                    display_name: user.display_name(),
                    directory_name: user.directory_name(),
                    address: user.address(),
                },
                None => unknown_peer(id, format!("User {user_id}")),
            },
            PeerId::Chat { chat_id } => match self.chat(chat_id) {
                Some(chat) => Peer {
                    id,
                    display_name: chat.display_name(),
                    directory_name: chat.directory_name(),
                    address: chat.address(),
                },
                None => unknown_peer(id, format!("Chat {chat_id}")),
            },
        }
    }
}

fn unknown_peer(id: PeerId, name: String) -> Peer {
    Peer {
        id,
        display_name: name.clone(),
        directory_name: name,
        address: PeerAddress::Unresolvable {
            reason: "no record in dialogs listing".to_string(),
        },
    }
}
