use super::{Attachment, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

/// Identifier of a message, unique within its activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId(pub u32);

impl From<u32> for MessageId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "message_{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Text,
    /// Posted by the platform on activity transitions.
    System,
    /// Facilitator broadcast, pinned on creation.
    Announcement,
    Private,
}

/// Emoji accepted as reactions.
pub const ALLOWED_REACTIONS: [&str; 10] = ["👍", "👎", "❤️", "😂", "😮", "😢", "😡", "👏", "🎉", "🤔"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub author_id: UserId,
    pub parent_id: Option<MessageId>,
    pub kind: MessageKind,
    /// Only for private messages.
    pub recipient_id: Option<UserId>,
    pub content: String,
    pub attachments: Vec<Attachment>,
    pub is_pinned: bool,
    pub is_read: bool,
    /// emoji -> users; an emoji without users is removed.
    pub reactions: BTreeMap<String, BTreeSet<UserId>>,
    pub created_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
}

impl Message {
    /// A top-level message without attachments. The owning activity assigns the id.
    pub fn new(author_id: UserId, kind: MessageKind, content: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: MessageId(0),
            author_id,
            parent_id: None,
            kind,
            recipient_id: None,
            content: content.into(),
            attachments: Vec::new(),
            is_pinned: false,
            is_read: false,
            reactions: BTreeMap::new(),
            created_at: now,
            edited_at: None,
        }
    }

    pub fn is_private(&self) -> bool {
        self.kind == MessageKind::Private
    }

    /// Whether `user` may see this message at all. Public messages are visible to every
    /// member of the activity.
    pub fn is_visible_to(&self, user: UserId) -> bool {
        !self.is_private() || self.author_id == user || self.recipient_id == Some(user)
    }

    /// The other side of a private message, seen from `user`.
    pub fn correspondent_of(&self, user: UserId) -> Option<UserId> {
        if !self.is_private() {
            return None;
        }
        if self.author_id == user {
            self.recipient_id
        } else if self.recipient_id == Some(user) {
            Some(self.author_id)
        } else {
            None
        }
    }
}

/// A public top-level message with its replies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageThread {
    pub message: Message,
    pub replies: Vec<Message>,
}

/// Summary of a private conversation, seen from one participant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conversation {
    pub correspondent: UserId,
    pub message_count: usize,
    pub unread_count: usize,
    pub last_message_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct MessageFilter {
    pub pinned_only: bool,
    pub kind: Option<MessageKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    Pin,
    Unpin,
    Toggle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionMode {
    Add,
    Remove,
    Toggle,
}
