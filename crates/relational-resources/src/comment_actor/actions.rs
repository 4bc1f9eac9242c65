//! Custom actions for the Comment actor.

use crate::model::{Comment, CommentStatus, ReportReason, User};
use serde::Serialize;

/// A step of the comment moderation workflow.
///
/// | step    | from     | to       |
/// |---------|----------|----------|
/// | approve | pending  | approved |
/// | reject  | pending  | rejected |
/// | hide    | approved | hidden   |
/// | restore | hidden   | approved |
#[derive(Debug, Clone, PartialEq)]
pub enum CommentModeration {
    Approve,
    Reject { reason: String },
    Hide { reason: String },
    Restore,
}

impl CommentModeration {
    pub fn name(&self) -> &'static str {
        match self {
            CommentModeration::Approve => "approve",
            CommentModeration::Reject { .. } => "reject",
            CommentModeration::Hide { .. } => "hide",
            CommentModeration::Restore => "restore",
        }
    }

    pub fn target_status(&self, from: CommentStatus) -> Option<CommentStatus> {
        use CommentStatus::*;

        match (self, from) {
            (CommentModeration::Approve, Pending) => Some(Approved),
            (CommentModeration::Reject { .. }, Pending) => Some(Rejected),
            (CommentModeration::Hide { .. }, Approved) => Some(Hidden),
            (CommentModeration::Restore, Hidden) => Some(Approved),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum CommentAction {
    ToggleLike {
        actor: User,
    },
    SetPinned {
        actor: User,
        pinned: bool,
    },
    Moderate {
        actor: User,
        step: CommentModeration,
    },
    Report {
        actor: User,
        reason: ReportReason,
        details: Option<String>,
    },
}

/// The actor's like state after a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LikeState {
    pub liked: bool,
    pub like_count: usize,
}

/// Results from CommentActions - variants match 1:1 with CommentAction
#[derive(Debug, Clone)]
pub enum CommentActionResult {
    ToggleLike(LikeState),
    SetPinned(Comment),
    Moderate(Comment),
    Report(()),
}
