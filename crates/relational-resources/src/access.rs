//! # Access Control
//!
//! Pure permission checks. Every function takes the acting user explicitly (`None` for an
//! anonymous caller) and answers with a plain `bool`; callers turn `false` into
//! `DomainError::Forbidden`, or into `DomainError::NotFound` where the target's existence must
//! not leak.

use crate::model::{
    Activity, Comment, Message, MessageKind, ParticipantStatus, Resource, ResourceStatus, Role,
    User, Visibility,
};
use chrono::{DateTime, Duration, Utc};

/// Public and published resources are visible to everyone. Moderators and the owner see
/// everything; signed-in users also see shared resources once published.
pub fn can_view(actor: Option<&User>, resource: &Resource) -> bool {
    if resource.is_publicly_visible() {
        return true;
    }
    let Some(user) = actor else {
        return false;
    };
    can_moderate(user)
        || resource.owner_id == user.id
        || (resource.visibility == Visibility::Shared
            && resource.status == ResourceStatus::Published)
}

/// Admins always; owners unless the resource is published or suspended, which then takes
/// a moderating owner.
pub fn can_edit(actor: &User, resource: &Resource) -> bool {
    if actor.is_admin() {
        return true;
    }
    if resource.owner_id != actor.id {
        return false;
    }
    match resource.status {
        ResourceStatus::Published | ResourceStatus::Suspended => can_moderate(actor),
        _ => true,
    }
}

/// Admins always; owners only while the resource is a draft.
pub fn can_delete(actor: &User, resource: &Resource) -> bool {
    actor.is_admin()
        || (resource.owner_id == actor.id && resource.status == ResourceStatus::Draft)
}

pub fn can_moderate(actor: &User) -> bool {
    actor.role.can_moderate()
}

pub fn can_manage_activity(actor: &User, activity: &Activity) -> bool {
    activity.owner_id == actor.id || actor.is_admin()
}

/// Open, not full, and for private activities an existing invitation or acceptance.
pub fn can_join_activity(actor: &User, activity: &Activity) -> bool {
    use crate::model::ActivityStatus;

    if activity.status != ActivityStatus::Open || activity.is_full() {
        return false;
    }
    !activity.is_private
        || activity.participant(actor.id).is_some_and(|p| {
            matches!(
                p.status,
                ParticipantStatus::Invited | ParticipantStatus::Accepted
            )
        })
}

/// Public activities are visible to anyone; private ones to managers and users holding a
/// participant row.
pub fn can_view_activity(actor: Option<&User>, activity: &Activity) -> bool {
    if !activity.is_private {
        return true;
    }
    actor.is_some_and(|user| {
        can_manage_activity(user, activity) || activity.participant(user.id).is_some()
    })
}

pub fn is_facilitator(actor: &User, activity: &Activity) -> bool {
    activity
        .participant(actor.id)
        .is_some_and(|p| p.is_facilitator() && !matches!(p.status, ParticipantStatus::Left))
}

/// Managers and facilitators run the activity's day-to-day operations.
pub fn can_facilitate(actor: &User, activity: &Activity) -> bool {
    can_manage_activity(actor, activity) || is_facilitator(actor, activity)
}

fn within_window(created_at: DateTime<Utc>, now: DateTime<Utc>, window_minutes: i64) -> bool {
    now - created_at <= Duration::minutes(window_minutes)
}

/// Authors, within the edit window.
pub fn can_edit_comment(
    actor: &User,
    comment: &Comment,
    now: DateTime<Utc>,
    window_minutes: i64,
) -> bool {
    comment.author_id == actor.id && within_window(comment.created_at, now, window_minutes)
}

pub fn can_delete_comment(actor: &User, comment: &Comment) -> bool {
    comment.author_id == actor.id || can_moderate(actor)
}

/// Authors, within the edit window, never for system messages.
pub fn can_edit_message(
    actor: &User,
    message: &Message,
    now: DateTime<Utc>,
    window_minutes: i64,
) -> bool {
    message.kind != MessageKind::System
        && message.author_id == actor.id
        && within_window(message.created_at, now, window_minutes)
}

pub fn can_delete_message(actor: &User, message: &Message, activity: &Activity) -> bool {
    message.author_id == actor.id || can_facilitate(actor, activity)
}

/// Whether `actor` may give `target` the role `role`.
pub fn can_assign_role(actor: &User, target: &User, role: Role) -> bool {
    crate::user_actor::check_role_change(actor, target, role).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        ActivityId, ActivityStatus, CommentId, CommentStatus, MessageId, Participant,
        RatingSummary, ResourceId, TermId, UserId,
    };
    use std::collections::{BTreeMap, BTreeSet};

    const STATUSES: [ResourceStatus; 5] = [
        ResourceStatus::Draft,
        ResourceStatus::Pending,
        ResourceStatus::Published,
        ResourceStatus::Rejected,
        ResourceStatus::Suspended,
    ];
    const VISIBILITIES: [Visibility; 3] = [Visibility::Private, Visibility::Shared, Visibility::Public];
    const ROLES: [Role; 5] = [
        Role::CitizenUnauthenticated,
        Role::Citizen,
        Role::Moderator,
        Role::Administrator,
        Role::SuperAdministrator,
    ];

    fn user(id: u32, role: Role) -> User {
        User::new(UserId(id), format!("user{}", id), role)
    }

    fn resource(owner: u32, visibility: Visibility, status: ResourceStatus) -> Resource {
        let now = Utc::now();
        Resource {
            id: ResourceId(1),
            title: "Listening well".into(),
            slug: "listening-well-abc123".into(),
            description: "d".into(),
            content: None,
            category_id: TermId(1),
            resource_type_id: TermId(2),
            relation_type_ids: vec![TermId(3)],
            owner_id: UserId(owner),
            visibility,
            status,
            difficulty: Default::default(),
            duration_minutes: None,
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

    fn activity(owner: u32, status: ActivityStatus, max: u32, private: bool) -> Activity {
        let now = Utc::now();
        let mut participants = BTreeMap::new();
        participants.insert(UserId(owner), Participant::host(UserId(owner), now));
        Activity {
            id: ActivityId(1),
            resource_id: ResourceId(1),
            owner_id: UserId(owner),
            title: "Circle".into(),
            description: None,
            status,
            max_participants: max,
            participant_count: 0,
            is_private: private,
            access_code: "QWERTY".into(),
            scheduled_at: None,
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

    #[test]
    fn test_anonymous_sees_only_public_published() {
        for visibility in VISIBILITIES {
            for status in STATUSES {
                let r = resource(1, visibility, status);
                let expected =
                    visibility == Visibility::Public && status == ResourceStatus::Published;
                assert_eq!(can_view(None, &r), expected, "{:?}/{:?}", visibility, status);
            }
        }
    }

    #[test]
    fn test_view_rules_for_signed_in_users() {
        let stranger = user(2, Role::Citizen);
        let moderator = user(3, Role::Moderator);
        let owner = user(1, Role::Citizen);

        for visibility in VISIBILITIES {
            for status in STATUSES {
                let r = resource(1, visibility, status);
                assert!(can_view(Some(&moderator), &r));
                assert!(can_view(Some(&owner), &r));
                let expected = status == ResourceStatus::Published
                    && visibility != Visibility::Private;
                assert_eq!(can_view(Some(&stranger), &r), expected);
            }
        }
    }

    #[test]
    fn test_owner_loses_delete_once_published() {
        let owner = user(1, Role::Citizen);
        for status in STATUSES {
            let r = resource(1, Visibility::Public, status);
            assert_eq!(can_delete(&owner, &r), status == ResourceStatus::Draft);
            assert!(can_delete(&user(9, Role::Administrator), &r));
            assert!(!can_delete(&user(9, Role::Moderator), &r));
        }
    }

    #[test]
    fn test_edit_rules() {
        let owner = user(1, Role::Citizen);
        let moderating_owner = user(1, Role::Moderator);
        for status in STATUSES {
            let r = resource(1, Visibility::Private, status);
            let locked = matches!(status, ResourceStatus::Published | ResourceStatus::Suspended);
            assert_eq!(can_edit(&owner, &r), !locked);
            assert!(can_edit(&moderating_owner, &r));
            assert!(can_edit(&user(5, Role::SuperAdministrator), &r));
            assert!(!can_edit(&user(5, Role::Moderator), &r));
        }
    }

    #[test]
    fn test_moderation_roles() {
        let moderating: Vec<Role> = ROLES
            .into_iter()
            .filter(|r| can_moderate(&user(1, *r)))
            .collect();
        assert_eq!(
            moderating,
            vec![Role::Moderator, Role::Administrator, Role::SuperAdministrator]
        );
    }

    #[test]
    fn test_join_requires_open_capacity_and_invitation_when_private() {
        let guest = user(2, Role::Citizen);

        let open = activity(1, ActivityStatus::Open, 2, false);
        assert!(can_join_activity(&guest, &open));
        assert!(!can_join_activity(&guest, &activity(1, ActivityStatus::Draft, 2, false)));

        let mut full = open.clone();
        full.participant_count = 2;
        assert!(!can_join_activity(&guest, &full));

        let mut private = activity(1, ActivityStatus::Open, 2, true);
        assert!(!can_join_activity(&guest, &private));
        assert!(!can_view_activity(Some(&guest), &private));
        private
            .participants
            .insert(guest.id, Participant::invited(guest.id, UserId(1), Utc::now()));
        assert!(can_join_activity(&guest, &private));
        assert!(can_view_activity(Some(&guest), &private));
        assert!(!can_view_activity(None, &private));
    }

    #[test]
    fn test_manage_and_facilitate() {
        let a = activity(1, ActivityStatus::Open, 5, false);
        assert!(can_manage_activity(&user(1, Role::Citizen), &a));
        assert!(can_manage_activity(&user(7, Role::Administrator), &a));
        assert!(!can_manage_activity(&user(7, Role::Moderator), &a));
        assert!(is_facilitator(&user(1, Role::Citizen), &a));
        assert!(!can_facilitate(&user(2, Role::Citizen), &a));
    }

    #[test]
    fn test_comment_edit_window_and_delete() {
        let author = user(2, Role::Citizen);
        let now = Utc::now();
        let comment = Comment {
            id: CommentId(1),
            resource_id: ResourceId(1),
            parent_id: None,
            author_id: author.id,
            content: "Nice read".into(),
            status: CommentStatus::Approved,
            moderated_by: None,
            moderated_at: None,
            moderation_reason: None,
            is_pinned: false,
            likers: BTreeSet::new(),
            created_at: now - Duration::minutes(20),
            edited_at: None,
        };
        assert!(!can_edit_comment(&author, &comment, now, 15));
        assert!(can_edit_comment(&author, &comment, now, 30));
        assert!(can_delete_comment(&author, &comment));
        assert!(can_delete_comment(&user(3, Role::Moderator), &comment));
        assert!(!can_delete_comment(&user(3, Role::Citizen), &comment));
    }

    #[test]
    fn test_system_messages_are_never_editable() {
        let owner = user(1, Role::Citizen);
        let a = activity(1, ActivityStatus::InProgress, 5, false);
        let now = Utc::now();
        let mut message = Message {
            id: MessageId(1),
            author_id: owner.id,
            parent_id: None,
            kind: MessageKind::System,
            recipient_id: None,
            content: "Activity started".into(),
            attachments: Vec::new(),
            is_pinned: false,
            is_read: false,
            reactions: BTreeMap::new(),
            created_at: now,
            edited_at: None,
        };
        assert!(!can_edit_message(&owner, &message, now, 15));
        message.kind = MessageKind::Text;
        assert!(can_edit_message(&owner, &message, now, 15));
        assert!(can_delete_message(&owner, &message, &a));
        assert!(!can_delete_message(&user(4, Role::Citizen), &message, &a));
    }
}
