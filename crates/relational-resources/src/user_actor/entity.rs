//! Entity trait implementation for the User domain type.

use super::actions::{UserAction, UserActionResult};
use crate::clients::{ActivityClient, CatalogClient};
use crate::error::{DomainError, Validator};
use crate::model::{
    ActivityFilter, ResourceFilter, Role, User, UserCreate, UserDelete, UserFilter, UserId,
    UserUpdate,
};
use actor_framework::{ActorClient, ActorEntity};
use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, warn};

fn validate_profile(name: Option<&str>, email: Option<&str>) -> Result<(), DomainError> {
    let mut v = Validator::new();
    if let Some(name) = name {
        v.length("name", name, 1, 255);
    }
    if let Some(email) = email {
        v.length("email", email, 3, 255);
        v.check(email.contains('@'), "email", "must be a valid email address");
    }
    v.finish()
}

#[async_trait]
impl ActorEntity for User {
    type Id = UserId;
    type Create = UserCreate;
    type Update = UserUpdate;
    type Delete = UserDelete;
    type Filter = UserFilter;
    type Action = UserAction;
    type ActionResult = UserActionResult;
    type Context = (CatalogClient, ActivityClient);
    type Error = DomainError;

    fn from_create_params(id: UserId, params: UserCreate) -> Result<Self, Self::Error> {
        validate_profile(Some(&params.name), Some(&params.email))?;
        Ok(Self {
            id,
            name: params.name.trim().to_string(),
            email: params.email.trim().to_lowercase(),
            role: params.role,
            email_verified: false,
            created_at: Utc::now(),
        })
    }

    fn matches(&self, filter: &UserFilter) -> bool {
        filter
            .email
            .as_ref()
            .map_or(true, |email| self.email.eq_ignore_ascii_case(email.trim()))
            && filter.role.map_or(true, |role| self.role == role)
            && filter
                .email_verified
                .map_or(true, |verified| self.email_verified == verified)
    }

    /// Profile changes by the user themself or an administrator. A new email address must be
    /// verified again.
    async fn on_update(&mut self, update: UserUpdate, _ctx: &Self::Context) -> Result<(), Self::Error> {
        if update.actor.id != self.id && !update.actor.is_admin() {
            return Err(DomainError::forbidden("Cannot edit another user's profile"));
        }
        validate_profile(update.name.as_deref(), update.email.as_deref())?;

        if let Some(name) = update.name {
            self.name = name.trim().to_string();
        }
        if let Some(email) = update.email {
            let email = email.trim().to_lowercase();
            if email != self.email {
                self.email = email;
                self.email_verified = false;
            }
        }
        Ok(())
    }

    async fn on_delete(&self, params: UserDelete, ctx: &Self::Context) -> Result<(), Self::Error> {
        let actor = params.actor;
        if !actor.is_admin() {
            return Err(DomainError::forbidden("Administrator role required"));
        }
        if actor.id == self.id {
            return Err(DomainError::invalid("user", "Cannot delete your own account"));
        }
        if self.role == Role::SuperAdministrator && actor.role != Role::SuperAdministrator {
            return Err(DomainError::forbidden("Cannot delete super administrator"));
        }

        let (catalog, activities) = ctx;
        let resources = catalog
            .list(ResourceFilter {
                owner_id: Some(self.id),
                ..Default::default()
            })
            .await?;
        let owned_activities = activities
            .list(ActivityFilter {
                owner_id: Some(self.id),
                ..Default::default()
            })
            .await?;
        if !resources.is_empty() || !owned_activities.is_empty() {
            warn!(
                user = %self.id,
                resources = resources.len(),
                activities = owned_activities.len(),
                "Refusing to delete user with content"
            );
            return Err(DomainError::invalid(
                "user",
                "Cannot delete user with associated content",
            ));
        }
        Ok(())
    }

    async fn handle_action(
        &mut self,
        action: UserAction,
        _ctx: &Self::Context,
    ) -> Result<UserActionResult, Self::Error> {
        match action {
            UserAction::VerifyEmail => {
                self.email_verified = true;
                Ok(UserActionResult::VerifyEmail(self.clone()))
            }
            UserAction::ChangeRole { actor, role } => {
                super::check_role_change(&actor, self, role)?;
                info!(user = %self.id, from = %self.role, to = %role, by = %actor.id, "Role changed");
                self.role = role;
                Ok(UserActionResult::ChangeRole(self.clone()))
            }
        }
    }
}
