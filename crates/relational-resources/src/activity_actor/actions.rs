//! Custom actions for the Activity actor.

use crate::model::{
    Activity, Attachment, InviteSummary, Message, MessageId, MessageKind, Participant,
    ParticipantRole, ParticipantStatus, PinMode, ReactionMode, User, UserId,
};
use serde_json::Value;

/// A step of the activity lifecycle, see [`lifecycle`](super::lifecycle).
#[derive(Debug, Clone, PartialEq)]
pub enum ActivityStep {
    Publish,
    Start,
    Complete { results: Option<Value> },
    Cancel,
}

impl ActivityStep {
    pub fn name(&self) -> &'static str {
        match self {
            ActivityStep::Publish => "publish",
            ActivityStep::Start => "start",
            ActivityStep::Complete { .. } => "complete",
            ActivityStep::Cancel => "cancel",
        }
    }
}

#[derive(Debug, Clone)]
pub enum ParticipantStep {
    /// A matching access code admits the actor to a private activity.
    Join { access_code: Option<String> },
    /// Invites `users` in `role`, `Participant` when absent.
    Invite {
        users: Vec<UserId>,
        role: Option<ParticipantRole>,
    },
    Accept,
    Decline,
    Participate,
    Leave,
    /// Marks `user` as completed, by a manager or by the participant themself.
    Complete {
        user: UserId,
        score: Option<f64>,
        data: Option<Value>,
    },
    Update {
        user: UserId,
        role: Option<ParticipantRole>,
        status: Option<ParticipantStatus>,
        score: Option<f64>,
    },
    Remove { user: UserId },
    Promote { user: UserId },
    Demote { user: UserId },
    AddSessionTime { minutes: u32 },
    Rate { rating: u8, feedback: Option<String> },
}

#[derive(Debug, Clone)]
pub enum MessageStep {
    /// A public text message or announcement, optionally replying to `parent_id`.
    Post {
        kind: MessageKind,
        content: String,
        parent_id: Option<MessageId>,
        attachments: Vec<Attachment>,
    },
    SendPrivate {
        recipient: UserId,
        content: String,
        attachments: Vec<Attachment>,
    },
    Edit { message_id: MessageId, content: String },
    Delete { message_id: MessageId },
    Pin { message_id: MessageId, mode: PinMode },
    React {
        message_id: MessageId,
        emoji: String,
        mode: ReactionMode,
    },
    MarkRead { message_id: MessageId },
    /// The actor's private messages, optionally with one correspondent. Received messages
    /// are marked read when `mark_as_read` is set.
    ReadPrivate {
        correspondent: Option<UserId>,
        mark_as_read: bool,
    },
}

/// Custom actions for Activity entities.
#[derive(Debug, Clone)]
pub enum ActivityAction {
    Transition { actor: User, step: ActivityStep },
    RegenerateCode { actor: User },
    Participant { actor: User, step: ParticipantStep },
    Message { actor: User, step: MessageStep },
}

#[derive(Debug, Clone)]
pub enum ParticipantOutcome {
    Row(Participant),
    Invited(InviteSummary),
    Removed(UserId),
}

#[derive(Debug, Clone)]
pub enum MessageOutcome {
    Message(Message),
    /// Number of messages removed, replies included.
    Deleted(usize),
    Private(Vec<Message>),
}

/// Results from ActivityActions - variants match 1:1 with ActivityAction
#[derive(Debug, Clone)]
pub enum ActivityActionResult {
    Transition(Activity),
    RegenerateCode(String),
    Participant(ParticipantOutcome),
    Message(MessageOutcome),
}
