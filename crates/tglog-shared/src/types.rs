use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_DATACENTER_PORT;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ChatId(pub i64);

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The conversation a dialog entry points at.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PeerId {
    User { user_id: UserId },
    Chat { chat_id: ChatId },
}

impl PeerId {
    /// Numeric id used to order peers.
    pub fn raw(&self) -> i64 {
        match self {
            Self::User { user_id } => user_id.0,
            Self::Chat { chat_id } => chat_id.0,
        }
    }
}

impl std::fmt::Display for PeerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User { user_id } => write!(f, "user {user_id}"),
            Self::Chat { chat_id } => write!(f, "chat {chat_id}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Addressing
// ---------------------------------------------------------------------------

/// Addressing descriptor sent with a history request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputPeer {
    #[serde(rename = "self")]
    SelfPeer,
    Contact { user_id: UserId },
    Foreign { user_id: UserId, access_hash: i64 },
    Chat { chat_id: ChatId },
}

/// Outcome of resolving a peer into something a history request can address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerAddress {
    Resolved(InputPeer),
    /// The peer's kind has no known addressing form; it must be skipped.
    Unresolvable { reason: String },
}

// ---------------------------------------------------------------------------
// Users and chats
// ---------------------------------------------------------------------------

/// Relationship of a user record to the logged-in account.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserKind {
    #[serde(rename = "self")]
    SelfUser,
    Contact,
    Request,
    Foreign,
    Deleted,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    #[serde(default)]
    pub kind: UserKind,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub access_hash: Option<i64>,
}

impl UserRecord {
    /// First and last name joined, trimmed. Empty when neither is set.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Name, else handle, else phone, else `User {id}`.
    pub fn display_name(&self) -> String {
        let full = self.full_name();
        if !full.is_empty() {
            return full;
        }
        non_empty(&self.username)
            .or_else(|| non_empty(&self.phone))
            .map(str::to_string)
            .unwrap_or_else(|| format!("User {}", self.id))
    }

    /// Handle, else phone, else name, else `User {id}`.
    ///
    /// Handle and phone come first because they are unique and do not change
    /// with the contact's chosen name, so the folder stays put across runs.
    pub fn directory_name(&self) -> String {
        if let Some(name) = non_empty(&self.username).or_else(|| non_empty(&self.phone)) {
            return name.to_string();
        }
        let full = self.full_name();
        if !full.is_empty() {
            return full;
        }
        format!("User {}", self.id)
    }

    /// Derive the addressing form for this user's history.
    ///
    /// Deleted accounts are addressed like contacts. The service has never
    /// promised this works.
    pub fn address(&self) -> PeerAddress {
        match self.kind {
            UserKind::SelfUser => PeerAddress::Resolved(InputPeer::SelfPeer),
            UserKind::Contact | UserKind::Deleted => {
                PeerAddress::Resolved(InputPeer::Contact { user_id: self.id })
            }
            UserKind::Foreign | UserKind::Request => match self.access_hash {
                Some(access_hash) => PeerAddress::Resolved(InputPeer::Foreign {
                    user_id: self.id,
                    access_hash,
                }),
                None => PeerAddress::Unresolvable {
                    reason: format!("{:?} user without access hash", self.kind),
                },
            },
            UserKind::Unknown => PeerAddress::Unresolvable {
                reason: "unknown user kind".to_string(),
            },
        }
    }
}

/// A group conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatRecord {
    pub id: ChatId,
    #[serde(default)]
    pub title: String,
}

impl ChatRecord {
    pub fn display_name(&self) -> String {
        let title = self.title.trim();
        if title.is_empty() {
            format!("Chat {}", self.id)
        } else {
            title.to_string()
        }
    }

    /// Keyed by id only: stable across renames and distinct from any user
    /// handle.
    pub fn directory_name(&self) -> String {
        format!("Chat {}", self.id)
    }

    pub fn address(&self) -> PeerAddress {
        PeerAddress::Resolved(InputPeer::Chat { chat_id: self.id })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

// ---------------------------------------------------------------------------
// Dialogs and messages
// ---------------------------------------------------------------------------

/// A conversation entry from the dialogs listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Dialog {
    /// `None` for entries the service could not attribute to a peer.
    #[serde(default)]
    pub peer: Option<PeerId>,
    #[serde(default)]
    pub top_message: Option<i64>,
    #[serde(default)]
    pub unread_count: u32,
}

/// Attachment carried by a message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MediaKind {
    #[default]
    Empty,
    Photo,
    Video,
    Geo,
    Contact,
    Document,
    Audio,
    #[serde(other)]
    Unknown,
}

impl MediaKind {
    pub fn label(&self) -> Option<&'static str> {
        match self {
            Self::Empty => None,
            Self::Photo => Some("Photo"),
            Self::Video => Some("Video"),
            Self::Geo => Some("Geo"),
            Self::Contact => Some("Contact"),
            Self::Document => Some("Document"),
            Self::Audio => Some("Audio"),
            Self::Unknown => Some("unknown media"),
        }
    }

    /// Text shown for a message carrying this media: the message text itself
    /// when there is no attachment, a `<< Label >>` placeholder otherwise.
    pub fn render(&self, text: &str) -> String {
        match self.label() {
            None => text.to_string(),
            Some(label) => format!("<< {label} >>"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// Increases monotonically within a peer's history. The only sort key.
    pub id: i64,
    #[serde(alias = "from_id")]
    pub sender_id: UserId,
    /// Unix timestamp in seconds.
    pub date: i64,
    #[serde(default)]
    pub media: MediaKind,
    /// Text or caption.
    #[serde(default, alias = "message")]
    pub text: String,
}

impl Message {
    pub fn contents(&self) -> String {
        self.media.render(&self.text)
    }
}

// ---------------------------------------------------------------------------
// Data centers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataCenter {
    pub host: String,
    pub port: u16,
}

impl std::str::FromStr for DataCenter {
    type Err = String;

    /// Parse `host` or `host:port`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("empty data center address".to_string());
        }
        match s.rsplit_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|e| format!("invalid data center port '{port}': {e}"))?;
                Ok(Self {
                    host: host.to_string(),
                    port,
                })
            }
            None => Ok(Self {
                host: s.to_string(),
                port: DEFAULT_DATACENTER_PORT,
            }),
        }
    }
}

impl std::fmt::Display for DataCenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
