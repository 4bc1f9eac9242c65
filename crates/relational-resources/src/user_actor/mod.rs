//! # User Actor
//!
//! Accounts and roles.
//!
//! ## Structure
//!
//! - [`entity`] - [`ActorEntity`](actor_framework::ActorEntity) implementation for [`User`]
//! - [`actions`] - [`UserAction`] and [`UserActionResult`] (email verification, role changes)
//! - [`new()`] - Factory function that creates the actor and client
//!
//! ## Context
//!
//! Deleting an account is refused while the user still owns resources or activities. The
//! actor answers that question through the catalog and activity clients it receives as
//! context, inside the delete message itself.

pub mod actions;
pub mod entity;

pub use actions::*;

use crate::clients::UserClient;
use crate::error::DomainError;
use crate::model::{Role, User};
use actor_framework::ResourceActor;

/// Creates a new User actor and its client.
pub fn new(buffer_size: usize) -> (ResourceActor<User>, UserClient) {
    let (actor, generic_client) = ResourceActor::new(buffer_size);
    (actor, UserClient::new(generic_client))
}

/// Rules for an administrator changing `target`'s role to `role`.
pub fn check_role_change(actor: &User, target: &User, role: Role) -> Result<(), DomainError> {
    if !actor.is_admin() {
        return Err(DomainError::forbidden("Administrator role required"));
    }
    let acting_super = actor.role == Role::SuperAdministrator;
    if target.role == Role::SuperAdministrator && !acting_super {
        return Err(DomainError::forbidden(
            "Cannot modify super administrator role",
        ));
    }
    if role == Role::SuperAdministrator && !acting_super {
        return Err(DomainError::forbidden(
            "Cannot assign super administrator role",
        ));
    }
    if matches!(role, Role::Administrator | Role::Moderator) && !acting_super {
        return Err(DomainError::forbidden("Cannot assign administrative roles"));
    }
    if actor.id == target.id && role == Role::Citizen {
        return Err(DomainError::invalid(
            "role",
            "Cannot demote your own admin privileges",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UserId;

    fn user(id: u32, role: Role) -> User {
        User::new(UserId(id), format!("u{}", id), role)
    }

    #[test]
    fn test_only_admins_change_roles() {
        let target = user(2, Role::Citizen);
        let err = check_role_change(&user(1, Role::Moderator), &target, Role::Citizen).unwrap_err();
        assert_eq!(err.status_code(), 403);
    }

    #[test]
    fn test_admin_limits() {
        let admin = user(1, Role::Administrator);
        let citizen = user(2, Role::Citizen);
        let boss = user(3, Role::SuperAdministrator);

        assert!(check_role_change(&admin, &citizen, Role::CitizenUnauthenticated).is_ok());
        assert_eq!(
            check_role_change(&admin, &citizen, Role::Moderator),
            Err(DomainError::forbidden("Cannot assign administrative roles"))
        );
        assert_eq!(
            check_role_change(&admin, &citizen, Role::SuperAdministrator),
            Err(DomainError::forbidden("Cannot assign super administrator role"))
        );
        assert_eq!(
            check_role_change(&admin, &boss, Role::Citizen),
            Err(DomainError::forbidden("Cannot modify super administrator role"))
        );
    }

    #[test]
    fn test_super_admin_assigns_anything_but_self_demotion() {
        let boss = user(1, Role::SuperAdministrator);
        assert!(check_role_change(&boss, &user(2, Role::Citizen), Role::Administrator).is_ok());
        assert!(check_role_change(&boss, &user(3, Role::Moderator), Role::SuperAdministrator).is_ok());

        let err = check_role_change(&boss, &boss, Role::Citizen).unwrap_err();
        assert_eq!(err.status_code(), 422);
    }
}
