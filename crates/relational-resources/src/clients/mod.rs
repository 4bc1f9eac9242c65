//! Type-safe wrappers around [`ResourceClient`](actor_framework::ResourceClient).
//!
//! Each client hides the request/response plumbing of one actor and returns
//! [`DomainError`](crate::error::DomainError) directly. Operations that read more than one
//! aggregate (reply checks, comment threads, message listings) are composed here from
//! single-actor requests.

pub mod activity_client;
pub mod catalog_client;
pub mod comment_client;
pub mod taxonomy_client;
pub mod user_client;

pub use activity_client::*;
pub use catalog_client::*;
pub use comment_client::*;
pub use taxonomy_client::*;
pub use user_client::*;

use crate::error::DomainError;

/// The actor answered an action with the result variant of another action.
pub(crate) fn mismatched(action: &str) -> DomainError {
    DomainError::ActorCommunication(format!("{} action returned a mismatched result", action))
}
