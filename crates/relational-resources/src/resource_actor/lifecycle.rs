//! Moderation transition table for resources.
//!
//! | step       | from           | to        |
//! |------------|----------------|-----------|
//! | submit     | draft          | pending   |
//! | approve    | pending        | published |
//! | reject     | pending        | rejected  |
//! | suspend    | published      | suspended |
//! | reactivate | suspended      | published |
//! | publish    | draft, pending | published |
//!
//! Every other pair is an `InvalidTransition`.

use super::actions::ModerationStep;
use crate::access;
use crate::error::{DomainError, Validator};
use crate::model::{Resource, ResourceStatus, User};
use chrono::{DateTime, Utc};

pub const MAX_REASON_CHARS: usize = 500;

/// The status `step` leads to from `from`, if the pair is in the table.
pub fn target_status(step: &ModerationStep, from: ResourceStatus) -> Option<ResourceStatus> {
    use ModerationStep::*;
    use ResourceStatus::*;

    match (step, from) {
        (Submit, Draft) => Some(Pending),
        (Approve, Pending) => Some(Published),
        (Reject { .. }, Pending) => Some(Rejected),
        (Suspend { .. }, Published) => Some(Suspended),
        (Reactivate, Suspended) => Some(Published),
        (Publish, Draft | Pending) => Some(Published),
        _ => None,
    }
}

fn authorize(step: &ModerationStep, actor: &User, resource: &Resource) -> Result<(), DomainError> {
    let allowed = match step {
        ModerationStep::Submit => access::can_edit(actor, resource),
        ModerationStep::Publish => actor.is_admin(),
        _ => access::can_moderate(actor),
    };
    if allowed {
        Ok(())
    } else {
        Err(DomainError::forbidden(format!(
            "Not allowed to {} this resource",
            step.name()
        )))
    }
}

fn require_reason(reason: &str) -> Result<String, DomainError> {
    let mut v = Validator::new();
    v.length("reason", reason, 1, MAX_REASON_CHARS);
    v.finish()?;
    Ok(reason.trim().to_string())
}

/// Applies one moderation step: permission, then the table, then the step's own
/// requirements and stamps.
pub fn moderate(
    resource: &mut Resource,
    actor: &User,
    step: ModerationStep,
    now: DateTime<Utc>,
) -> Result<(), DomainError> {
    authorize(&step, actor, resource)?;
    let Some(next) = target_status(&step, resource.status) else {
        return Err(DomainError::InvalidTransition {
            entity: "resource",
            from: resource.status.to_string(),
            action: step.name(),
        });
    };

    match step {
        ModerationStep::Submit => {
            let mut v = Validator::new();
            v.length("title", &resource.title, 1, usize::MAX);
            v.length("description", &resource.description, 1, usize::MAX);
            v.length("content", resource.content.as_deref().unwrap_or(""), 1, usize::MAX);
            v.finish()?;
        }
        ModerationStep::Reject { reason } | ModerationStep::Suspend { reason } => {
            resource.moderation_reason = Some(require_reason(&reason)?);
            resource.validated_by = Some(actor.id);
            resource.validated_at = Some(now);
        }
        ModerationStep::Approve | ModerationStep::Reactivate | ModerationStep::Publish => {
            resource.moderation_reason = None;
            resource.validated_by = Some(actor.id);
            resource.validated_at = Some(now);
        }
    }

    if next == ResourceStatus::Published {
        resource.published_at.get_or_insert(now);
    }
    resource.status = next;
    resource.updated_at = now;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RatingSummary, ResourceId, Role, TermId, UserId, Visibility};
    use std::collections::BTreeMap;

    const STATUSES: [ResourceStatus; 5] = [
        ResourceStatus::Draft,
        ResourceStatus::Pending,
        ResourceStatus::Published,
        ResourceStatus::Rejected,
        ResourceStatus::Suspended,
    ];

    fn steps() -> Vec<ModerationStep> {
        vec![
            ModerationStep::Submit,
            ModerationStep::Approve,
            ModerationStep::Reject {
                reason: "off topic".into(),
            },
            ModerationStep::Suspend {
                reason: "reported".into(),
            },
            ModerationStep::Reactivate,
            ModerationStep::Publish,
        ]
    }

    fn resource(status: ResourceStatus) -> Resource {
        let now = Utc::now();
        Resource {
            id: ResourceId(1),
            title: "Repairing trust".into(),
            slug: "repairing-trust-aaaaaa".into(),
            description: "After a conflict".into(),
            content: Some("Steps...".into()),
            category_id: TermId(1),
            resource_type_id: TermId(2),
            relation_type_ids: vec![TermId(3)],
            owner_id: UserId(1),
            visibility: Visibility::Public,
            status,
            difficulty: Default::default(),
            duration_minutes: Some(20),
            tags: Vec::new(),
            external_url: None,
            attachment: None,
            validated_by: None,
            validated_at: None,
            moderation_reason: None,
            published_at: None,
            last_viewed_at: None,
            view_count: 0,
            download_count: 0,
            favorite_count: 0,
            rating: RatingSummary::default(),
            favorites: BTreeMap::new(),
            progressions: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_only_table_pairs_succeed() {
        let admin = User::new(UserId(9), "root", Role::SuperAdministrator);
        for step in steps() {
            for from in STATUSES {
                let mut r = resource(from);
                let result = moderate(&mut r, &admin, step.clone(), Utc::now());
                match target_status(&step, from) {
                    Some(to) => {
                        assert!(result.is_ok(), "{} from {}", step.name(), from);
                        assert_eq!(r.status, to);
                    }
                    None => {
                        assert!(
                            matches!(result, Err(DomainError::InvalidTransition { .. })),
                            "{} from {}",
                            step.name(),
                            from
                        );
                        assert_eq!(r.status, from);
                    }
                }
            }
        }
    }

    #[test]
    fn test_published_at_only_stamped_on_first_publication() {
        let moderator = User::new(UserId(2), "mod", Role::Moderator);
        let mut r = resource(ResourceStatus::Pending);
        let t0 = Utc::now();
        moderate(&mut r, &moderator, ModerationStep::Approve, t0).unwrap();
        assert_eq!(r.published_at, Some(t0));
        assert_eq!(r.validated_by, Some(moderator.id));

        let t1 = t0 + chrono::Duration::hours(1);
        moderate(
            &mut r,
            &moderator,
            ModerationStep::Suspend {
                reason: "spam".into(),
            },
            t1,
        )
        .unwrap();
        assert_eq!(r.published_at, Some(t0));
        assert_eq!(r.moderation_reason.as_deref(), Some("spam"));

        let t2 = t1 + chrono::Duration::hours(1);
        moderate(&mut r, &moderator, ModerationStep::Reactivate, t2).unwrap();
        assert_eq!(r.status, ResourceStatus::Published);
        assert_eq!(r.published_at, Some(t0));
        assert_eq!(r.validated_at, Some(t2));
    }

    #[test]
    fn test_permissions_per_step() {
        let owner = User::new(UserId(1), "owner", Role::Citizen);
        let moderator = User::new(UserId(2), "mod", Role::Moderator);

        let mut r = resource(ResourceStatus::Draft);
        moderate(&mut r, &owner, ModerationStep::Submit, Utc::now()).unwrap();
        let err = moderate(&mut r, &owner, ModerationStep::Approve, Utc::now()).unwrap_err();
        assert_eq!(err.status_code(), 403);

        let mut draft = resource(ResourceStatus::Draft);
        let err = moderate(&mut draft, &moderator, ModerationStep::Publish, Utc::now()).unwrap_err();
        assert_eq!(err.status_code(), 403);
    }

    #[test]
    fn test_submit_requires_content_and_reject_requires_reason() {
        let owner = User::new(UserId(1), "owner", Role::Citizen);
        let moderator = User::new(UserId(2), "mod", Role::Moderator);

        let mut r = resource(ResourceStatus::Draft);
        r.content = None;
        let err = moderate(&mut r, &owner, ModerationStep::Submit, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::ValidationFailed(ref f) if f[0].field == "content"));
        assert_eq!(r.status, ResourceStatus::Draft);

        let mut pending = resource(ResourceStatus::Pending);
        let err = moderate(
            &mut pending,
            &moderator,
            ModerationStep::Reject { reason: " ".into() },
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::ValidationFailed(_)));
    }
}
