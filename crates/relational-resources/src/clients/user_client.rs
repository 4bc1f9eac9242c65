//! # User Client
//!
//! Registration, profiles and administrative role management.

use super::mismatched;
use crate::error::DomainError;
use crate::model::{Role, User, UserCreate, UserDelete, UserFilter, UserId, UserUpdate};
use crate::user_actor::{UserAction, UserActionResult};
use actor_framework::{ActorClient, FrameworkError, ResourceClient};
use async_trait::async_trait;
use tracing::{debug, info, instrument};

/// Client for interacting with the User actor.
#[derive(Clone)]
pub struct UserClient {
    inner: ResourceClient<User>,
}

impl UserClient {
    pub fn new(inner: ResourceClient<User>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ActorClient<User> for UserClient {
    type Error = DomainError;

    fn inner(&self) -> &ResourceClient<User> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        DomainError::from(e)
    }
}

impl UserClient {
    async fn ensure_email_free(&self, email: &str, except: Option<UserId>) -> Result<(), DomainError> {
        let holders = self
            .inner
            .list(UserFilter {
                email: Some(email.to_string()),
                ..Default::default()
            })
            .await?;
        if holders.iter().any(|u| Some(u.id) != except) {
            return Err(DomainError::conflict("Email address already registered"));
        }
        Ok(())
    }

    /// Registers a new citizen. Email addresses are unique, compared case-insensitively.
    #[instrument(skip(self))]
    pub async fn register(&self, params: UserCreate) -> Result<UserId, DomainError> {
        debug!("Sending request");
        self.ensure_email_free(&params.email, None).await?;
        let params = UserCreate {
            role: Role::Citizen,
            ..params
        };
        Ok(self.inner.create(params).await?)
    }

    /// Creates an account with the role given in `params`, already verified. For seeding the
    /// first administrators; never reachable from registration.
    #[instrument(skip(self), fields(role = %params.role))]
    pub async fn seed(&self, params: UserCreate) -> Result<User, DomainError> {
        debug!("Sending request");
        self.ensure_email_free(&params.email, None).await?;
        let id = self.inner.create(params).await?;
        let user = self.verify_email(id).await?;
        info!(user = %user.id, "Seeded account");
        Ok(user)
    }

    #[instrument(skip(self))]
    pub async fn profile(&self, id: UserId) -> Result<User, DomainError> {
        debug!("Sending request");
        self.inner
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(id.to_string()))
    }

    #[instrument(skip(self, update), fields(actor = %update.actor.id))]
    pub async fn update_profile(&self, id: UserId, update: UserUpdate) -> Result<User, DomainError> {
        debug!("Sending request");
        if let Some(email) = &update.email {
            self.ensure_email_free(email, Some(id)).await?;
        }
        Ok(self.inner.update(id, update).await?)
    }

    #[instrument(skip(self))]
    pub async fn verify_email(&self, id: UserId) -> Result<User, DomainError> {
        debug!("Sending request");
        match self.inner.perform_action(id, UserAction::VerifyEmail).await {
            Ok(UserActionResult::VerifyEmail(user)) => Ok(user),
            Ok(_) => Err(mismatched("VerifyEmail")),
            Err(e) => Err(e.into()),
        }
    }

    /// Gives `id` a new role on behalf of `actor`.
    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn change_role(&self, id: UserId, actor: &User, role: Role) -> Result<User, DomainError> {
        debug!("Sending request");
        let action = UserAction::ChangeRole {
            actor: actor.clone(),
            role,
        };
        match self.inner.perform_action(id, action).await {
            Ok(UserActionResult::ChangeRole(user)) => Ok(user),
            Ok(_) => Err(mismatched("ChangeRole")),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn delete_user(&self, id: UserId, actor: &User) -> Result<(), DomainError> {
        debug!("Sending request");
        let params = UserDelete {
            actor: actor.clone(),
        };
        Ok(self.inner.delete(id, params).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actor_framework::mock::{create_mock_client, expect_action, MockClient};

    #[tokio::test]
    async fn test_change_role_sends_actor_and_role() {
        let (client, mut receiver) = create_mock_client::<User>(10);
        let user_client = UserClient::new(client);
        let admin = User::new(UserId(1), "ada", Role::Administrator);

        let task = tokio::spawn(async move {
            user_client
                .change_role(UserId(2), &admin, Role::CitizenUnauthenticated)
                .await
        });

        let (id, action, responder) = expect_action(&mut receiver)
            .await
            .expect("Expected Action request");

        assert_eq!(id, UserId(2));
        match action {
            UserAction::ChangeRole { actor, role } => {
                assert_eq!(actor.id, UserId(1));
                assert_eq!(role, Role::CitizenUnauthenticated);
            }
            _ => panic!("Expected ChangeRole action"),
        }

        let mut changed = User::new(UserId(2), "bo", Role::CitizenUnauthenticated);
        changed.email_verified = false;
        responder
            .send(Ok(UserActionResult::ChangeRole(changed)))
            .unwrap();

        let result = task.await.unwrap().unwrap();
        assert_eq!(result.role, Role::CitizenUnauthenticated);
    }

    #[tokio::test]
    async fn test_change_role_surfaces_domain_error() {
        let (client, mut receiver) = create_mock_client::<User>(10);
        let user_client = UserClient::new(client);
        let moderator = User::new(UserId(1), "mo", Role::Moderator);

        let task =
            tokio::spawn(async move { user_client.change_role(UserId(2), &moderator, Role::Citizen).await });

        let (_, _, responder) = expect_action(&mut receiver)
            .await
            .expect("Expected Action request");
        responder
            .send(Err(FrameworkError::EntityError(Box::new(
                DomainError::forbidden("Administrator role required"),
            ))))
            .unwrap();

        let err = task.await.unwrap().unwrap_err();
        assert_eq!(err, DomainError::forbidden("Administrator role required"));
        assert_eq!(err.status_code(), 403);
    }

    #[tokio::test]
    async fn test_register_rejects_taken_email() {
        let mut mock = MockClient::<User>::new();
        mock.expect_list()
            .return_ok(vec![User::new(UserId(4), "ada", Role::Citizen)]);
        let user_client = UserClient::new(mock.client());

        let err = user_client
            .register(UserCreate::new("Another Ada", "ADA@example.org"))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Conflict(_)));
        mock.verify();
    }

    #[tokio::test]
    async fn test_profile_of_missing_user_is_not_found() {
        let mut mock = MockClient::<User>::new();
        mock.expect_get(UserId(8)).return_ok(None);
        let user_client = UserClient::new(mock.client());

        let err = user_client.profile(UserId(8)).await.unwrap_err();
        assert_eq!(err, DomainError::not_found("user_8"));
    }
}
