//! Custom actions for the User actor.

use crate::model::{Role, User};

#[derive(Debug, Clone)]
pub enum UserAction {
    VerifyEmail,
    /// Administrative role change, see [`check_role_change`](super::check_role_change).
    ChangeRole { actor: User, role: Role },
}

/// Results from UserActions - variants match 1:1 with UserAction
#[derive(Debug, Clone)]
pub enum UserActionResult {
    VerifyEmail(User),
    ChangeRole(User),
}
