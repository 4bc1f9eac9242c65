use super::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    Invited,
    Accepted,
    Declined,
    Participating,
    Completed,
    Left,
}

impl ParticipantStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ParticipantStatus::Invited => "invited",
            ParticipantStatus::Accepted => "accepted",
            ParticipantStatus::Declined => "declined",
            ParticipantStatus::Participating => "participating",
            ParticipantStatus::Completed => "completed",
            ParticipantStatus::Left => "left",
        }
    }

    /// Occupies a seat of the activity.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            ParticipantStatus::Accepted | ParticipantStatus::Participating
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantRole {
    #[default]
    Participant,
    Facilitator,
    Observer,
}

/// One user's membership in one activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub user_id: UserId,
    pub status: ParticipantStatus,
    pub role: ParticipantRole,
    pub invited_by: Option<UserId>,
    pub invited_at: Option<DateTime<Utc>>,
    pub responded_at: Option<DateTime<Utc>>,
    pub joined_at: Option<DateTime<Utc>>,
    pub left_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub time_spent_minutes: u32,
    pub score: Option<f64>,
    pub participation_data: Option<Value>,
    /// The participant's rating of the activity, 1..=5.
    pub rating: Option<u8>,
    pub feedback: Option<String>,
}

impl Participant {
    /// A row created by an invitation.
    pub fn invited(user_id: UserId, invited_by: UserId, now: DateTime<Utc>) -> Self {
        Self {
            invited_by: Some(invited_by),
            invited_at: Some(now),
            ..Self::blank(user_id, ParticipantStatus::Invited)
        }
    }

    /// A row created by joining directly.
    pub fn accepted(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            responded_at: Some(now),
            ..Self::blank(user_id, ParticipantStatus::Accepted)
        }
    }

    /// The owner's row: a facilitator that holds no seat.
    pub fn host(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            role: ParticipantRole::Facilitator,
            ..Self::accepted(user_id, now)
        }
    }

    fn blank(user_id: UserId, status: ParticipantStatus) -> Self {
        Self {
            user_id,
            status,
            role: ParticipantRole::Participant,
            invited_by: None,
            invited_at: None,
            responded_at: None,
            joined_at: None,
            left_at: None,
            completed_at: None,
            time_spent_minutes: 0,
            score: None,
            participation_data: None,
            rating: None,
            feedback: None,
        }
    }

    pub fn is_facilitator(&self) -> bool {
        self.role == ParticipantRole::Facilitator
    }
}
