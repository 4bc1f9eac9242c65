//! Membership operations of an activity.
//!
//! Every operation ends with [`Activity::recount`], so `participant_count` always reflects
//! the rows. The owner's host row never holds a seat.

use super::actions::{ParticipantOutcome, ParticipantStep};
use super::lifecycle::{invalid_transition, MemberStep};
use crate::access;
use crate::config::PlatformConfig;
use crate::error::{DomainError, Validator};
use crate::model::progression::validate_rating;
use crate::model::{
    Activity, ActivityStatus, InviteSummary, Participant, ParticipantRole, ParticipantStatus,
    User, UserId,
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::{debug, info};

pub const MAX_FEEDBACK_CHARS: usize = 1000;

fn manager_only(actor: &User, activity: &Activity) -> Result<(), DomainError> {
    if access::can_manage_activity(actor, activity) {
        Ok(())
    } else {
        Err(DomainError::forbidden("Only the activity manager can manage participants"))
    }
}

/// Object keys from `incoming` overwrite those already stored; anything else replaces the value.
fn merge_participation_data(stored: &mut Option<Value>, incoming: Value) {
    match (stored.as_mut(), incoming) {
        (Some(Value::Object(current)), Value::Object(incoming)) => current.extend(incoming),
        (_, incoming) => *stored = Some(incoming),
    }
}

impl Activity {
    fn row_mut(&mut self, user: UserId) -> Result<&mut Participant, DomainError> {
        self.participants
            .get_mut(&user)
            .ok_or_else(|| DomainError::not_found(format!("participant {}", user)))
    }

    fn ensure_seat(&self) -> Result<(), DomainError> {
        if self.is_full() {
            Err(DomainError::ActivityFull {
                max: self.max_participants,
            })
        } else {
            Ok(())
        }
    }

    /// Moves `user`'s row along the participant table.
    fn step_member(
        &mut self,
        user: UserId,
        step: MemberStep,
        now: DateTime<Utc>,
    ) -> Result<Participant, DomainError> {
        let from = self.row_mut(user)?.status;
        let Some(next) = step.target_status(from) else {
            return Err(DomainError::InvalidTransition {
                entity: "participant",
                from: from.as_str().to_string(),
                action: step.name(),
            });
        };
        if step == MemberStep::Accept {
            self.ensure_seat()?;
        }

        let row = self.row_mut(user)?;
        row.status = next;
        match step {
            MemberStep::Accept | MemberStep::Decline => row.responded_at = Some(now),
            MemberStep::Participate => row.joined_at = Some(now),
            MemberStep::Complete => row.completed_at = Some(now),
            MemberStep::Leave => row.left_at = Some(now),
        }
        Ok(row.clone())
    }

    fn join(
        &mut self,
        actor: &User,
        access_code: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Participant, DomainError> {
        if self.status != ActivityStatus::Open {
            return Err(invalid_transition(self, "join"));
        }
        match self.participant(actor.id).map(|p| p.status) {
            Some(ParticipantStatus::Accepted | ParticipantStatus::Participating) => {
                return Err(DomainError::conflict("Already participating in this activity"));
            }
            Some(ParticipantStatus::Completed) => {
                return Err(DomainError::conflict("Already completed this activity"));
            }
            Some(from @ (ParticipantStatus::Declined | ParticipantStatus::Left)) => {
                return Err(DomainError::InvalidTransition {
                    entity: "participant",
                    from: from.as_str().to_string(),
                    action: "join",
                });
            }
            Some(ParticipantStatus::Invited) | None => {}
        }
        self.ensure_seat()?;

        let code_matches = access_code.is_some_and(|code| code.trim().eq_ignore_ascii_case(&self.access_code));
        if !code_matches && !access::can_join_activity(actor, self) {
            return Err(DomainError::forbidden("This activity is private"));
        }

        // an invited row is accepted in place and keeps its inviter
        let row = self
            .participants
            .entry(actor.id)
            .and_modify(|row| {
                row.status = ParticipantStatus::Accepted;
                row.responded_at = Some(now);
            })
            .or_insert_with(|| Participant::accepted(actor.id, now));
        Ok(row.clone())
    }

    fn invite(
        &mut self,
        actor: &User,
        users: Vec<UserId>,
        role: ParticipantRole,
        config: &PlatformConfig,
        now: DateTime<Utc>,
    ) -> Result<InviteSummary, DomainError> {
        if !access::can_facilitate(actor, self) {
            return Err(DomainError::forbidden("Only facilitators can invite participants"));
        }
        if role == ParticipantRole::Facilitator && !access::can_manage_activity(actor, self) {
            return Err(DomainError::forbidden(
                "Only the activity manager can invite facilitators",
            ));
        }
        let mut v = Validator::new();
        v.check(
            (1..=config.invite_batch_limit).contains(&users.len()),
            "user_ids",
            format!("between 1 and {} users per invitation", config.invite_batch_limit),
        );
        v.finish()?;
        if !matches!(self.status, ActivityStatus::Draft | ActivityStatus::Open) {
            return Err(invalid_transition(self, "invite"));
        }
        self.ensure_seat()?;

        let mut summary = InviteSummary::default();
        let mut seen = BTreeSet::new();
        for user in users {
            if !seen.insert(user) {
                continue;
            }
            if user == actor.id {
                summary.errors.push(format!("{}: cannot invite yourself", user));
                continue;
            }
            if self.participant(user).is_some() {
                summary.already_participating.push(user);
                continue;
            }
            let mut row = Participant::invited(user, actor.id, now);
            row.role = role;
            self.participants.insert(user, row);
            summary.invited.push(user);
        }
        Ok(summary)
    }

    fn update_member(
        &mut self,
        actor: &User,
        user: UserId,
        role: Option<ParticipantRole>,
        status: Option<ParticipantStatus>,
        score: Option<f64>,
    ) -> Result<Participant, DomainError> {
        manager_only(actor, self)?;
        let current = self.row_mut(user)?.status;
        if user == self.owner_id {
            let mut v = Validator::new();
            v.check(
                role.map_or(true, |r| r == ParticipantRole::Facilitator),
                "role",
                "The owner must remain a facilitator",
            );
            v.check(
                status.map_or(true, |s| {
                    matches!(
                        s,
                        ParticipantStatus::Accepted
                            | ParticipantStatus::Participating
                            | ParticipantStatus::Completed
                    )
                }),
                "status",
                "The owner cannot leave the activity",
            );
            v.finish()?;
        }
        if let Some(next) = status {
            if next.is_active() && !current.is_active() && user != self.owner_id {
                self.ensure_seat()?;
            }
        }

        let row = self.row_mut(user)?;
        if let Some(role) = role {
            row.role = role;
        }
        if let Some(status) = status {
            row.status = status;
        }
        if score.is_some() {
            row.score = score;
        }
        Ok(row.clone())
    }

    fn set_role(
        &mut self,
        actor: &User,
        user: UserId,
        role: ParticipantRole,
    ) -> Result<Participant, DomainError> {
        manager_only(actor, self)?;
        if user == self.owner_id {
            return Err(DomainError::forbidden("The owner's role cannot be changed"));
        }
        let row = self.row_mut(user)?;
        if role == ParticipantRole::Facilitator && !row.status.is_active() {
            return Err(DomainError::invalid(
                "user_id",
                "Only active participants can be promoted",
            ));
        }
        row.role = role;
        Ok(row.clone())
    }

    /// Applies one membership operation for `actor`.
    pub(crate) fn apply_participant(
        &mut self,
        actor: &User,
        step: ParticipantStep,
        config: &PlatformConfig,
        now: DateTime<Utc>,
    ) -> Result<ParticipantOutcome, DomainError> {
        let outcome = match step {
            ParticipantStep::Join { access_code } => {
                ParticipantOutcome::Row(self.join(actor, access_code.as_deref(), now)?)
            }
            ParticipantStep::Invite { users, role } => {
                let role = role.unwrap_or_default();
                let summary = self.invite(actor, users, role, config, now)?;
                info!(
                    activity = %self.id,
                    invited = summary.invited.len(),
                    role = ?role,
                    already = summary.already_participating.len(),
                    by = %actor.id,
                    "Invitations sent"
                );
                ParticipantOutcome::Invited(summary)
            }
            ParticipantStep::Accept => {
                if self.status.is_terminal() {
                    return Err(invalid_transition(self, "accept"));
                }
                ParticipantOutcome::Row(self.step_member(actor.id, MemberStep::Accept, now)?)
            }
            ParticipantStep::Decline => {
                ParticipantOutcome::Row(self.step_member(actor.id, MemberStep::Decline, now)?)
            }
            ParticipantStep::Participate => {
                if self.status != ActivityStatus::InProgress {
                    return Err(invalid_transition(self, "participate"));
                }
                ParticipantOutcome::Row(self.step_member(actor.id, MemberStep::Participate, now)?)
            }
            ParticipantStep::Leave => {
                if actor.id == self.owner_id {
                    return Err(DomainError::forbidden("The owner cannot leave the activity"));
                }
                ParticipantOutcome::Row(self.step_member(actor.id, MemberStep::Leave, now)?)
            }
            ParticipantStep::Complete { user, score, data } => {
                if user != actor.id && !access::can_manage_activity(actor, self) {
                    return Err(DomainError::forbidden(
                        "Only the participant or a manager can complete participation",
                    ));
                }
                self.step_member(user, MemberStep::Complete, now)?;
                let stored = self.row_mut(user)?;
                stored.left_at = Some(now);
                if score.is_some() {
                    stored.score = score;
                }
                if let Some(data) = data {
                    merge_participation_data(&mut stored.participation_data, data);
                }
                ParticipantOutcome::Row(stored.clone())
            }
            ParticipantStep::Update {
                user,
                role,
                status,
                score,
            } => ParticipantOutcome::Row(self.update_member(actor, user, role, status, score)?),
            ParticipantStep::Remove { user } => {
                manager_only(actor, self)?;
                if user == self.owner_id {
                    return Err(DomainError::forbidden("Cannot remove the activity owner"));
                }
                if self.participants.remove(&user).is_none() {
                    return Err(DomainError::not_found(format!("participant {}", user)));
                }
                ParticipantOutcome::Removed(user)
            }
            ParticipantStep::Promote { user } => {
                ParticipantOutcome::Row(self.set_role(actor, user, ParticipantRole::Facilitator)?)
            }
            ParticipantStep::Demote { user } => {
                ParticipantOutcome::Row(self.set_role(actor, user, ParticipantRole::Participant)?)
            }
            ParticipantStep::AddSessionTime { minutes } => {
                if !(1..=config.max_session_minutes).contains(&minutes) {
                    return Err(DomainError::invalid(
                        "minutes",
                        format!("must be between 1 and {}", config.max_session_minutes),
                    ));
                }
                let row = self.row_mut(actor.id)?;
                row.time_spent_minutes = row.time_spent_minutes.saturating_add(minutes);
                ParticipantOutcome::Row(row.clone())
            }
            ParticipantStep::Rate { rating, feedback } => {
                validate_rating(rating)?;
                if let Some(feedback) = &feedback {
                    let mut v = Validator::new();
                    v.length("feedback", feedback, 0, MAX_FEEDBACK_CHARS);
                    v.finish()?;
                }
                let row = self.row_mut(actor.id)?;
                row.rating = Some(rating);
                row.feedback = feedback;
                ParticipantOutcome::Row(row.clone())
            }
        };

        self.recount();
        self.updated_at = now;
        debug!(activity = %self.id, participants = self.participant_count, "Participants recounted");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Role;
    use serde_json::json;

    fn user(id: u32) -> User {
        User::new(UserId(id), format!("u{}", id), Role::Citizen)
    }

    fn run(a: &mut Activity, actor: &User, step: ParticipantStep) -> Result<ParticipantOutcome, DomainError> {
        a.apply_participant(actor, step, &PlatformConfig::default(), Utc::now())
    }

    fn invite(a: &mut Activity, users: &[u32]) -> InviteSummary {
        let step = ParticipantStep::Invite {
            users: users.iter().copied().map(UserId).collect(),
            role: None,
        };
        match run(a, &user(1), step).unwrap() {
            ParticipantOutcome::Invited(summary) => summary,
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_capacity_scenario() {
        let mut a = Activity::fixture(UserId(1), ActivityStatus::Open, 2);

        invite(&mut a, &[2]);
        run(&mut a, &user(2), ParticipantStep::Accept).unwrap();
        assert_eq!(a.participant_count, 1);

        invite(&mut a, &[3]);
        run(&mut a, &user(3), ParticipantStep::Accept).unwrap();
        assert_eq!(a.participant_count, 2);

        let err = run(
            &mut a,
            &user(1),
            ParticipantStep::Invite {
                users: vec![UserId(4)],
                role: None,
            },
        )
        .unwrap_err();
        assert_eq!(err, DomainError::ActivityFull { max: 2 });
        assert_eq!(err.to_string(), "activity is full (max 2 participants)");
        assert!(a.participant(UserId(4)).is_none());
    }

    #[test]
    fn test_accept_refused_when_seats_are_taken() {
        let mut a = Activity::fixture(UserId(1), ActivityStatus::Open, 2);
        invite(&mut a, &[2, 3, 4]);
        run(&mut a, &user(2), ParticipantStep::Accept).unwrap();
        run(&mut a, &user(3), ParticipantStep::Accept).unwrap();

        let err = run(&mut a, &user(4), ParticipantStep::Accept).unwrap_err();
        assert!(matches!(err, DomainError::ActivityFull { max: 2 }));
        assert_eq!(a.participant(UserId(4)).unwrap().status, ParticipantStatus::Invited);
        assert_eq!(a.participant_count, 2);
    }

    #[test]
    fn test_invite_reports_existing_rows() {
        let mut a = Activity::fixture(UserId(1), ActivityStatus::Open, 5);
        invite(&mut a, &[2]);
        let summary = invite(&mut a, &[2, 3, 3, 1]);
        assert_eq!(summary.invited, vec![UserId(3)]);
        assert_eq!(summary.already_participating, vec![UserId(2)]);
        assert_eq!(summary.errors.len(), 1);
    }

    #[test]
    fn test_declined_and_left_rows_cannot_come_back() {
        let mut a = Activity::fixture(UserId(1), ActivityStatus::Open, 5);
        invite(&mut a, &[2, 3]);
        run(&mut a, &user(2), ParticipantStep::Decline).unwrap();
        run(&mut a, &user(3), ParticipantStep::Accept).unwrap();
        run(&mut a, &user(3), ParticipantStep::Leave).unwrap();

        for (id, from) in [(2, "declined"), (3, "left")] {
            let err = run(&mut a, &user(id), ParticipantStep::Join { access_code: None }).unwrap_err();
            assert_eq!(
                err,
                DomainError::InvalidTransition {
                    entity: "participant",
                    from: from.to_string(),
                    action: "join",
                }
            );
        }

        let summary = invite(&mut a, &[2, 3]);
        assert!(summary.invited.is_empty());
        assert_eq!(summary.already_participating, vec![UserId(2), UserId(3)]);
        assert_eq!(a.participant(UserId(2)).unwrap().status, ParticipantStatus::Declined);
        assert_eq!(a.participant(UserId(3)).unwrap().status, ParticipantStatus::Left);
        assert_eq!(a.participant_count, 0);
    }

    #[test]
    fn test_invite_assigns_the_requested_role() {
        let mut a = Activity::fixture(UserId(1), ActivityStatus::Open, 5);
        let step = ParticipantStep::Invite {
            users: vec![UserId(2)],
            role: Some(ParticipantRole::Observer),
        };
        run(&mut a, &user(1), step).unwrap();
        invite(&mut a, &[3]);
        let row = a.participant(UserId(2)).unwrap();
        assert_eq!(row.role, ParticipantRole::Observer);
        assert_eq!(row.invited_by, Some(UserId(1)));
        assert_eq!(a.participant(UserId(3)).unwrap().role, ParticipantRole::Participant);

        // a promoted facilitator may invite, but not more facilitators
        run(&mut a, &user(3), ParticipantStep::Accept).unwrap();
        run(&mut a, &user(1), ParticipantStep::Promote { user: UserId(3) }).unwrap();
        let step = ParticipantStep::Invite {
            users: vec![UserId(4)],
            role: Some(ParticipantRole::Facilitator),
        };
        let err = run(&mut a, &user(3), step).unwrap_err();
        assert_eq!(err.status_code(), 403);
        assert!(a.participant(UserId(4)).is_none());

        let step = ParticipantStep::Invite {
            users: vec![UserId(4)],
            role: Some(ParticipantRole::Facilitator),
        };
        run(&mut a, &user(1), step).unwrap();
        assert!(a.participant(UserId(4)).unwrap().is_facilitator());
    }

    #[test]
    fn test_completion_merges_data_and_closes_the_row() {
        let mut a = Activity::fixture(UserId(1), ActivityStatus::InProgress, 5);
        a.participants
            .insert(UserId(2), Participant::accepted(UserId(2), Utc::now()));
        run(&mut a, &user(2), ParticipantStep::Participate).unwrap();
        a.participants.get_mut(&UserId(2)).unwrap().participation_data =
            Some(json!({"notes": "draft", "pages": 3}));

        let step = ParticipantStep::Complete {
            user: UserId(2),
            score: Some(8.5),
            data: Some(json!({"notes": "final", "quiz": true})),
        };
        let row = match run(&mut a, &user(2), step).unwrap() {
            ParticipantOutcome::Row(row) => row,
            other => panic!("unexpected: {:?}", other),
        };
        assert_eq!(row.status, ParticipantStatus::Completed);
        assert!(row.completed_at.is_some());
        assert!(row.left_at.is_some());
        assert_eq!(row.score, Some(8.5));
        assert_eq!(
            row.participation_data,
            Some(json!({"notes": "final", "pages": 3, "quiz": true}))
        );
        assert_eq!(a.participant(UserId(2)).unwrap(), &row);
    }

    #[test]
    fn test_non_object_data_replaces_the_stored_value() {
        let mut stored = Some(json!({"pages": 3}));
        merge_participation_data(&mut stored, json!([1, 2]));
        assert_eq!(stored, Some(json!([1, 2])));

        let mut empty = None;
        merge_participation_data(&mut empty, json!({"pages": 1}));
        assert_eq!(empty, Some(json!({"pages": 1})));
    }

    #[test]
    fn test_count_follows_rows_through_a_sequence() {
        let mut a = Activity::fixture(UserId(1), ActivityStatus::Open, 5);
        invite(&mut a, &[2, 3, 4]);
        run(&mut a, &user(2), ParticipantStep::Accept).unwrap();
        run(&mut a, &user(3), ParticipantStep::Decline).unwrap();
        run(&mut a, &user(4), ParticipantStep::Accept).unwrap();
        run(&mut a, &user(4), ParticipantStep::Leave).unwrap();
        run(&mut a, &user(5), ParticipantStep::Join { access_code: None }).unwrap();

        let active = a
            .participants
            .values()
            .filter(|p| p.user_id != a.owner_id && p.status.is_active())
            .count() as u32;
        assert_eq!(a.participant_count, active);
        assert_eq!(a.participant_count, 2);
    }

    #[test]
    fn test_join_rules() {
        let mut a = Activity::fixture(UserId(1), ActivityStatus::Open, 5);
        a.is_private = true;

        let err = run(&mut a, &user(2), ParticipantStep::Join { access_code: None }).unwrap_err();
        assert_eq!(err.status_code(), 403);

        let code = Some("abc123".to_string());
        run(&mut a, &user(2), ParticipantStep::Join { access_code: code }).unwrap();
        assert_eq!(a.participant_count, 1);

        let err = run(&mut a, &user(2), ParticipantStep::Join { access_code: None }).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        invite(&mut a, &[3]);
        run(&mut a, &user(3), ParticipantStep::Join { access_code: None }).unwrap();
        assert_eq!(a.participant(UserId(3)).unwrap().status, ParticipantStatus::Accepted);

        a.status = ActivityStatus::InProgress;
        let err = run(&mut a, &user(4), ParticipantStep::Join { access_code: None }).unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { action: "join", .. }));
    }

    #[test]
    fn test_owner_is_protected() {
        let mut a = Activity::fixture(UserId(1), ActivityStatus::Open, 5);
        let owner = user(1);

        assert!(run(&mut a, &owner, ParticipantStep::Leave).is_err());
        assert!(run(&mut a, &owner, ParticipantStep::Remove { user: UserId(1) }).is_err());
        assert!(run(&mut a, &owner, ParticipantStep::Demote { user: UserId(1) }).is_err());
        let err = run(
            &mut a,
            &owner,
            ParticipantStep::Update {
                user: UserId(1),
                role: Some(ParticipantRole::Observer),
                status: None,
                score: None,
            },
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::ValidationFailed(_)));
        assert!(a.participant(UserId(1)).unwrap().is_facilitator());
    }

    #[test]
    fn test_promote_only_active_members() {
        let mut a = Activity::fixture(UserId(1), ActivityStatus::Open, 5);
        invite(&mut a, &[2]);
        let owner = user(1);

        let err = run(&mut a, &owner, ParticipantStep::Promote { user: UserId(2) }).unwrap_err();
        assert!(matches!(err, DomainError::ValidationFailed(_)));

        run(&mut a, &user(2), ParticipantStep::Accept).unwrap();
        run(&mut a, &owner, ParticipantStep::Promote { user: UserId(2) }).unwrap();
        assert!(access::is_facilitator(&user(2), &a));

        // facilitators may invite
        let step = ParticipantStep::Invite {
            users: vec![UserId(3)],
            role: None,
        };
        assert!(run(&mut a, &user(2), step).is_ok());
    }

    #[test]
    fn test_session_time_and_rating_need_a_row() {
        let mut a = Activity::fixture(UserId(1), ActivityStatus::Open, 5);
        let err = run(&mut a, &user(2), ParticipantStep::AddSessionTime { minutes: 30 }).unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));

        run(&mut a, &user(2), ParticipantStep::Join { access_code: None }).unwrap();
        let err = run(&mut a, &user(2), ParticipantStep::AddSessionTime { minutes: 481 }).unwrap_err();
        assert!(matches!(err, DomainError::ValidationFailed(_)));
        run(&mut a, &user(2), ParticipantStep::AddSessionTime { minutes: 45 }).unwrap();
        run(
            &mut a,
            &user(2),
            ParticipantStep::Rate {
                rating: 4,
                feedback: Some("Well run".into()),
            },
        )
        .unwrap();

        let row = a.participant(UserId(2)).unwrap();
        assert_eq!(row.time_spent_minutes, 45);
        assert_eq!(row.rating, Some(4));
    }
}
