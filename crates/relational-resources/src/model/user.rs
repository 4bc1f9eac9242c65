use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Type-safe identifier for Users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub u32);

impl From<u32> for UserId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "user_{}", self.0)
    }
}

/// Platform roles, lowest privilege first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// An account that has not completed registration. Holds no privileges.
    CitizenUnauthenticated,
    #[default]
    Citizen,
    Moderator,
    Administrator,
    SuperAdministrator,
}

impl Role {
    pub fn is_admin(self) -> bool {
        matches!(self, Role::Administrator | Role::SuperAdministrator)
    }

    pub fn can_moderate(self) -> bool {
        matches!(
            self,
            Role::Moderator | Role::Administrator | Role::SuperAdministrator
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::CitizenUnauthenticated => "citizen-unauthenticated",
            Role::Citizen => "citizen",
            Role::Moderator => "moderator",
            Role::Administrator => "administrator",
            Role::SuperAdministrator => "super-administrator",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered account.
///
/// Every access-control decision takes a `&User` snapshot explicitly; operations that act on
/// behalf of someone carry that snapshot in their payload as `actor`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Builds a user snapshot outside the actor, mostly for tests and fixtures.
    pub fn new(id: UserId, name: impl Into<String>, role: Role) -> Self {
        let name = name.into();
        Self {
            id,
            email: format!("{}@example.org", name.to_lowercase()),
            name,
            role,
            email_verified: true,
            created_at: Utc::now(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn can_moderate(&self) -> bool {
        self.role.can_moderate()
    }
}

/// Payload for creating a user.
///
/// [`UserClient::register`](crate::clients::UserClient::register) always creates a `Citizen`;
/// `role` is honored only when seeding accounts at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreate {
    pub name: String,
    pub email: String,
    #[serde(skip)]
    pub role: Role,
}

impl UserCreate {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            role: Role::Citizen,
        }
    }
}

/// Profile changes, allowed to the user themself or an administrator.
#[derive(Debug, Clone)]
pub struct UserUpdate {
    pub actor: User,
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UserDelete {
    pub actor: User,
}

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub email: Option<String>,
    pub role: Option<Role>,
    pub email_verified: Option<bool>,
}
