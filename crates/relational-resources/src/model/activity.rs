use super::{
    Conversation, Message, MessageFilter, MessageId, MessageThread, Participant,
    ParticipantStatus, ResourceId, User, UserId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Display;

/// Type-safe identifier for Activities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActivityId(pub u32);

impl From<u32> for ActivityId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl Display for ActivityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "activity_{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    #[default]
    Draft,
    Open,
    InProgress,
    Completed,
    Cancelled,
}

impl ActivityStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityStatus::Draft => "draft",
            ActivityStatus::Open => "open",
            ActivityStatus::InProgress => "in_progress",
            ActivityStatus::Completed => "completed",
            ActivityStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ActivityStatus::Completed | ActivityStatus::Cancelled)
    }
}

impl Display for ActivityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scheduled, capacity-limited session around a resource.
///
/// # Actor Framework
/// Managed by the activity actor. Participants and messages are child rows of this
/// aggregate: every capacity check runs in the same message as the write it guards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    pub resource_id: ResourceId,
    pub owner_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub status: ActivityStatus,
    pub max_participants: u32,
    /// Accepted or participating members, not counting the owner.
    pub participant_count: u32,
    pub is_private: bool,
    pub access_code: String,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub results: Option<Value>,
    pub participants: BTreeMap<UserId, Participant>,
    pub messages: BTreeMap<MessageId, Message>,
    pub next_message_id: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Activity {
    pub fn participant(&self, user: UserId) -> Option<&Participant> {
        self.participants.get(&user)
    }

    pub fn is_full(&self) -> bool {
        self.participant_count >= self.max_participants
    }

    /// Recomputes `participant_count` from the rows.
    pub(crate) fn recount(&mut self) {
        let owner = self.owner_id;
        self.participant_count = self
            .participants
            .values()
            .filter(|p| p.user_id != owner && p.status.is_active())
            .count() as u32;
    }

    /// Holds an accepted, participating or completed row, or owns the activity.
    pub fn is_member(&self, user: UserId) -> bool {
        user == self.owner_id
            || self.participant(user).is_some_and(|p| {
                matches!(
                    p.status,
                    ParticipantStatus::Accepted
                        | ParticipantStatus::Participating
                        | ParticipantStatus::Completed
                )
            })
    }

    /// Public top-level messages with their replies, newest first.
    pub fn public_threads(&self, filter: &MessageFilter) -> Vec<MessageThread> {
        let mut threads: Vec<MessageThread> = self
            .messages
            .values()
            .filter(|m| !m.is_private() && m.parent_id.is_none())
            .filter(|m| !filter.pinned_only || m.is_pinned)
            .filter(|m| filter.kind.map_or(true, |kind| m.kind == kind))
            .map(|m| MessageThread {
                message: m.clone(),
                replies: self
                    .messages
                    .values()
                    .filter(|r| r.parent_id == Some(m.id) && !r.is_private())
                    .cloned()
                    .collect(),
            })
            .collect();
        threads.sort_by(|a, b| {
            b.message
                .created_at
                .cmp(&a.message.created_at)
                .then(b.message.id.cmp(&a.message.id))
        });
        threads
    }

    /// Private messages involving `user`, oldest first, optionally with one correspondent.
    pub fn private_messages(&self, user: UserId, with: Option<UserId>) -> Vec<&Message> {
        self.messages
            .values()
            .filter(|m| match m.correspondent_of(user) {
                Some(other) => with.map_or(true, |w| w == other),
                None => false,
            })
            .collect()
    }

    /// One entry per correspondent of `user`, most recent conversation first.
    pub fn conversations(&self, user: UserId) -> Vec<Conversation> {
        let mut by_correspondent: BTreeMap<UserId, Conversation> = BTreeMap::new();
        for message in self.messages.values() {
            let Some(other) = message.correspondent_of(user) else {
                continue;
            };
            let entry = by_correspondent.entry(other).or_insert(Conversation {
                correspondent: other,
                message_count: 0,
                unread_count: 0,
                last_message_at: message.created_at,
            });
            entry.message_count += 1;
            if message.recipient_id == Some(user) && !message.is_read {
                entry.unread_count += 1;
            }
            if message.created_at > entry.last_message_at {
                entry.last_message_at = message.created_at;
            }
        }
        let mut conversations: Vec<Conversation> = by_correspondent.into_values().collect();
        conversations.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));
        conversations
    }
}

#[cfg(test)]
impl Activity {
    /// An activity owned by `owner` with only the host row.
    pub(crate) fn fixture(owner: UserId, status: ActivityStatus, max_participants: u32) -> Self {
        let now = Utc::now();
        let mut participants = BTreeMap::new();
        participants.insert(owner, Participant::host(owner, now));
        Self {
            id: ActivityId(1),
            resource_id: ResourceId(1),
            owner_id: owner,
            title: "Study group".into(),
            description: None,
            status,
            max_participants,
            participant_count: 0,
            is_private: false,
            access_code: "ABC123".into(),
            scheduled_at: Some(now),
            started_at: None,
            completed_at: None,
            results: None,
            participants,
            messages: BTreeMap::new(),
            next_message_id: 1,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ActivityCreate {
    pub actor: User,
    pub resource_id: ResourceId,
    pub title: String,
    pub description: Option<String>,
    /// Falls back to the configured default.
    pub max_participants: Option<u32>,
    pub is_private: bool,
    pub scheduled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct ActivityUpdate {
    pub actor: User,
    pub title: Option<String>,
    pub description: Option<String>,
    pub max_participants: Option<u32>,
    pub is_private: Option<bool>,
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl ActivityUpdate {
    pub fn by(actor: User) -> Self {
        Self {
            actor,
            title: None,
            description: None,
            max_participants: None,
            is_private: None,
            scheduled_at: None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ActivityDelete {
    ByActor(User),
    /// The activity's resource was deleted.
    ResourceRemoved,
}

#[derive(Debug, Clone, Default)]
pub struct ActivityFilter {
    pub resource_id: Option<ResourceId>,
    pub owner_id: Option<UserId>,
    pub status: Option<ActivityStatus>,
    /// Activities where this user holds a participant row.
    pub participant: Option<UserId>,
}

/// Outcome of an invitation batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InviteSummary {
    pub invited: Vec<UserId>,
    pub already_participating: Vec<UserId>,
    pub errors: Vec<String>,
}
