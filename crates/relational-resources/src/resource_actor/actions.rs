//! Custom actions for the Resource actor.
//!
//! Moderation steps go through the transition table in [`lifecycle`](super::lifecycle);
//! favorites and progressions are child rows of the resource, so their counters are updated
//! by the same action.

use crate::model::{Attachment, ProgressionStatus, Progression, Resource, TermId, User, Visibility};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// A step of the moderation workflow.
#[derive(Debug, Clone, PartialEq)]
pub enum ModerationStep {
    /// draft -> pending, by someone who can edit the resource.
    Submit,
    /// pending -> published
    Approve,
    /// pending -> rejected
    Reject { reason: String },
    /// published -> suspended
    Suspend { reason: String },
    /// suspended -> published
    Reactivate,
    /// draft | pending -> published, administrators only.
    Publish,
}

impl ModerationStep {
    pub fn name(&self) -> &'static str {
        match self {
            ModerationStep::Submit => "submit",
            ModerationStep::Approve => "approve",
            ModerationStep::Reject { .. } => "reject",
            ModerationStep::Suspend { .. } => "suspend",
            ModerationStep::Reactivate => "reactivate",
            ModerationStep::Publish => "publish",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteStep {
    Toggle,
    /// Fails with `Conflict` when already a favorite.
    Add,
    /// Fails with `NotFound` when not a favorite.
    Remove,
    Check,
}

#[derive(Debug, Clone)]
pub enum ProgressStep {
    /// Create or overwrite the given fields.
    Upsert {
        status: Option<ProgressionStatus>,
        percentage: Option<u8>,
        notes: Option<String>,
        data: Option<Value>,
    },
    Start,
    Bookmark,
    Pause,
    Complete {
        rating: Option<u8>,
        review: Option<String>,
        data: Option<Value>,
    },
    UpdateProgress {
        percentage: u8,
        data: Option<Value>,
    },
    AddTime {
        minutes: u32,
    },
    Rate {
        rating: u8,
        review: Option<String>,
    },
}

/// Custom actions for Resource entities.
#[derive(Debug, Clone)]
pub enum ResourceAction {
    Moderate { actor: User, step: ModerationStep },
    RecordView { actor: Option<User> },
    RecordDownload { actor: Option<User> },
    ChangeCategory { actor: User, category_id: TermId },
    ChangeVisibility { actor: User, visibility: Visibility },
    Favorite { actor: User, step: FavoriteStep },
    Progress { actor: User, step: ProgressStep },
}

/// A user's favorite state after a favorite action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FavoriteState {
    pub is_favorite: bool,
    pub favorite_count: u32,
    pub favorited_at: Option<DateTime<Utc>>,
}

/// Results from ResourceActions - variants match 1:1 with ResourceAction
#[derive(Debug, Clone)]
pub enum ResourceActionResult {
    Moderate(Resource),
    RecordView(Resource),
    RecordDownload(Attachment),
    ChangeCategory(Resource),
    ChangeVisibility(Resource),
    Favorite(FavoriteState),
    Progress(Progression),
}
