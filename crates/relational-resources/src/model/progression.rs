//! A user's progress through one resource.
//!
//! Progressions live inside the [`Resource`](super::Resource) aggregate, keyed by user, so
//! that a rating change and the resource's rating summary are updated in the same message.

use super::UserId;
use crate::error::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressionStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
    Paused,
    Bookmarked,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progression {
    pub user_id: UserId,
    pub status: ProgressionStatus,
    /// 0..=100
    pub percentage: u8,
    pub time_spent_minutes: u32,
    pub notes: Option<String>,
    pub data: Option<Value>,
    /// 1..=5
    pub rating: Option<u8>,
    pub review: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub last_accessed_at: DateTime<Utc>,
}

impl Progression {
    pub fn new(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            status: ProgressionStatus::NotStarted,
            percentage: 0,
            time_spent_minutes: 0,
            notes: None,
            data: None,
            rating: None,
            review: None,
            started_at: None,
            completed_at: None,
            last_accessed_at: now,
        }
    }

    /// Moves to a status and stamps what that status implies.
    ///
    /// `Completed` forces 100% and stamps `completed_at`; `InProgress` stamps `started_at`
    /// unless the user started before.
    pub fn set_status(&mut self, status: ProgressionStatus, now: DateTime<Utc>) {
        self.status = status;
        match status {
            ProgressionStatus::Completed => {
                self.percentage = 100;
                self.completed_at = Some(now);
                self.started_at.get_or_insert(now);
            }
            ProgressionStatus::InProgress => {
                self.started_at.get_or_insert(now);
            }
            _ => {}
        }
        self.last_accessed_at = now;
    }

    pub fn start(&mut self, now: DateTime<Utc>) {
        self.set_status(ProgressionStatus::InProgress, now);
    }

    pub fn bookmark(&mut self, now: DateTime<Utc>) {
        self.set_status(ProgressionStatus::Bookmarked, now);
    }

    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.status == ProgressionStatus::Completed {
            return Err(DomainError::InvalidTransition {
                entity: "progression",
                from: "completed".to_string(),
                action: "pause",
            });
        }
        self.set_status(ProgressionStatus::Paused, now);
        Ok(())
    }

    pub fn complete(&mut self, now: DateTime<Utc>) {
        self.set_status(ProgressionStatus::Completed, now);
    }

    /// Records a new percentage, clamped to 100.
    ///
    /// Reaching 100 completes the progression; any progress on a not-started one moves it to
    /// in progress.
    pub fn update_progress(&mut self, percentage: u8, now: DateTime<Utc>) {
        self.percentage = percentage.min(100);
        if self.percentage == 100 {
            self.complete(now);
        } else if self.percentage > 0 && self.status == ProgressionStatus::NotStarted {
            self.start(now);
        } else {
            self.last_accessed_at = now;
        }
    }

    pub fn add_time(&mut self, minutes: u32, now: DateTime<Utc>) {
        self.time_spent_minutes = self.time_spent_minutes.saturating_add(minutes);
        self.last_accessed_at = now;
    }

    pub fn rate(&mut self, rating: u8, review: Option<String>) -> Result<(), DomainError> {
        validate_rating(rating)?;
        self.rating = Some(rating);
        if review.is_some() {
            self.review = review;
        }
        Ok(())
    }
}

pub(crate) fn validate_rating(rating: u8) -> Result<(), DomainError> {
    if (1..=5).contains(&rating) {
        Ok(())
    } else {
        Err(DomainError::invalid("rating", "must be between 1 and 5"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn fresh() -> (Progression, DateTime<Utc>) {
        let now = Utc::now();
        (Progression::new(UserId(1), now), now)
    }

    #[test]
    fn test_start_keeps_first_started_at() {
        let (mut p, now) = fresh();
        p.start(now);
        p.pause(now).unwrap();
        p.start(now + Duration::minutes(5));
        assert_eq!(p.started_at, Some(now));
        assert_eq!(p.status, ProgressionStatus::InProgress);
    }

    #[test]
    fn test_update_progress_transitions() {
        let (mut p, now) = fresh();
        p.update_progress(40, now);
        assert_eq!(p.status, ProgressionStatus::InProgress);
        assert!(p.started_at.is_some());

        p.update_progress(250, now);
        assert_eq!(p.percentage, 100);
        assert_eq!(p.status, ProgressionStatus::Completed);
        assert!(p.completed_at.is_some());
    }

    #[test]
    fn test_completed_cannot_pause() {
        let (mut p, now) = fresh();
        p.complete(now);
        assert!(matches!(
            p.pause(now),
            Err(DomainError::InvalidTransition { action: "pause", .. })
        ));
    }

    #[test]
    fn test_rate_bounds() {
        let (mut p, _) = fresh();
        assert!(p.rate(0, None).is_err());
        assert!(p.rate(6, None).is_err());
        p.rate(4, Some("clear".into())).unwrap();
        p.rate(5, None).unwrap();
        assert_eq!(p.rating, Some(5));
        assert_eq!(p.review.as_deref(), Some("clear"));
    }
}
