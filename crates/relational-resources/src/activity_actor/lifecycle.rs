//! Transition tables for activities and their participants.
//!
//! | activity step | from                      | to          |
//! |---------------|---------------------------|-------------|
//! | publish       | draft                     | open        |
//! | start         | open                      | in_progress |
//! | complete      | in_progress               | completed   |
//! | cancel        | draft, open, in_progress  | cancelled   |
//!
//! | participant step | from                     | to            |
//! |------------------|--------------------------|---------------|
//! | accept           | invited                  | accepted      |
//! | decline          | invited                  | declined      |
//! | participate      | accepted                 | participating |
//! | complete         | accepted, participating  | completed     |
//! | leave            | accepted, participating  | left          |

use super::actions::ActivityStep;
use crate::access;
use crate::error::{DomainError, Validator};
use crate::model::{Activity, ActivityStatus, Message, MessageKind, ParticipantStatus, User};
use chrono::{DateTime, Utc};
use tracing::info;

pub fn target_status(step: &ActivityStep, from: ActivityStatus) -> Option<ActivityStatus> {
    use ActivityStatus::*;

    match (step, from) {
        (ActivityStep::Publish, Draft) => Some(Open),
        (ActivityStep::Start, Open) => Some(InProgress),
        (ActivityStep::Complete { .. }, InProgress) => Some(Completed),
        (ActivityStep::Cancel, Draft | Open | InProgress) => Some(Cancelled),
        _ => None,
    }
}

/// Participant status changes that follow the table above.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberStep {
    Accept,
    Decline,
    Participate,
    Complete,
    Leave,
}

impl MemberStep {
    pub fn name(self) -> &'static str {
        match self {
            MemberStep::Accept => "accept",
            MemberStep::Decline => "decline",
            MemberStep::Participate => "participate",
            MemberStep::Complete => "complete",
            MemberStep::Leave => "leave",
        }
    }

    pub fn target_status(self, from: ParticipantStatus) -> Option<ParticipantStatus> {
        use ParticipantStatus::*;

        match (self, from) {
            (MemberStep::Accept, Invited) => Some(Accepted),
            (MemberStep::Decline, Invited) => Some(Declined),
            (MemberStep::Participate, Accepted) => Some(Participating),
            (MemberStep::Complete, Accepted | Participating) => Some(Completed),
            (MemberStep::Leave, Accepted | Participating) => Some(Left),
            _ => None,
        }
    }
}

pub(crate) fn invalid_transition(activity: &Activity, action: &'static str) -> DomainError {
    DomainError::InvalidTransition {
        entity: "activity",
        from: activity.status.to_string(),
        action,
    }
}

/// Applies one activity step with its cascade onto the participant rows.
pub fn transition(
    activity: &mut Activity,
    actor: &User,
    step: ActivityStep,
    now: DateTime<Utc>,
) -> Result<(), DomainError> {
    if !access::can_manage_activity(actor, activity) {
        return Err(DomainError::forbidden(format!(
            "Only the activity manager can {} it",
            step.name()
        )));
    }
    let Some(next) = target_status(&step, activity.status) else {
        return Err(invalid_transition(activity, step.name()));
    };
    let from = activity.status;

    let notice = match step {
        ActivityStep::Publish => {
            let mut v = Validator::new();
            v.length("title", &activity.title, 1, usize::MAX);
            v.check(
                activity.scheduled_at.is_some(),
                "scheduled_at",
                "is required to publish",
            );
            v.finish()?;
            None
        }
        ActivityStep::Start => {
            for participant in activity.participants.values_mut() {
                if participant.status == ParticipantStatus::Accepted {
                    participant.status = ParticipantStatus::Participating;
                    participant.joined_at = Some(now);
                }
            }
            activity.started_at = Some(now);
            Some("The activity has started")
        }
        ActivityStep::Complete { results } => {
            for participant in activity.participants.values_mut() {
                if participant.status == ParticipantStatus::Participating {
                    participant.status = ParticipantStatus::Completed;
                    participant.completed_at = Some(now);
                    participant.left_at = Some(now);
                }
            }
            activity.completed_at = Some(now);
            activity.results = results;
            Some("The activity is complete")
        }
        ActivityStep::Cancel => Some("The activity was cancelled"),
    };

    activity.status = next;
    activity.updated_at = now;
    activity.recount();
    if let Some(notice) = notice {
        let owner = activity.owner_id;
        activity.push_message(Message::new(owner, MessageKind::System, notice, now));
    }
    info!(activity = %activity.id, %from, to = %next, by = %actor.id, "Activity transition");
    Ok(())
}
