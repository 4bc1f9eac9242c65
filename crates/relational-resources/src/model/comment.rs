use super::{ResourceId, User, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::Display;

/// Type-safe identifier for Comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CommentId(pub u32);

impl From<u32> for CommentId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl Display for CommentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "comment_{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Hidden,
}

impl CommentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CommentStatus::Pending => "pending",
            CommentStatus::Approved => "approved",
            CommentStatus::Rejected => "rejected",
            CommentStatus::Hidden => "hidden",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub resource_id: ResourceId,
    /// Set on replies. Replies are never replied to.
    pub parent_id: Option<CommentId>,
    pub author_id: UserId,
    pub content: String,
    pub status: CommentStatus,
    pub moderated_by: Option<UserId>,
    pub moderated_at: Option<DateTime<Utc>>,
    pub moderation_reason: Option<String>,
    pub is_pinned: bool,
    pub likers: BTreeSet<UserId>,
    pub created_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
}

impl Comment {
    pub fn like_count(&self) -> usize {
        self.likers.len()
    }

    pub fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct CommentCreate {
    pub actor: User,
    pub resource_id: ResourceId,
    pub parent_id: Option<CommentId>,
    pub content: String,
}

/// Edit by the author.
#[derive(Debug, Clone)]
pub struct CommentUpdate {
    pub actor: User,
    pub content: String,
}

#[derive(Debug, Clone)]
pub enum CommentDelete {
    /// Deletion requested by a user, checked against the delete rule.
    ByActor(User),
    /// Removal of a reply whose parent, or of a comment whose resource, was deleted.
    Cascade,
}

#[derive(Debug, Clone, Default)]
pub struct CommentFilter {
    pub resource_id: Option<ResourceId>,
    pub author_id: Option<UserId>,
    pub status: Option<CommentStatus>,
    pub parent_id: Option<CommentId>,
    pub top_level_only: bool,
}

/// An approved top-level comment with its approved replies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentThread {
    pub comment: Comment,
    pub replies: Vec<Comment>,
    pub reply_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportReason {
    Spam,
    Inappropriate,
    Offensive,
    Harassment,
    Other,
}
