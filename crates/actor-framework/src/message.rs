//! # Generic Messages
//!
//! Message types exchanged between `ResourceClient` and `ResourceActor`.

use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use tokio::sync::oneshot;

/// Type alias for the one-shot response channel used by actors.
pub type Response<T> = oneshot::Sender<Result<T, FrameworkError>>;

/// Request sent to an actor.
///
/// Every aggregate type gets the same lifecycle vocabulary:
///
/// - **Create**: builds a new entity from [`ActorEntity::Create`] and returns its id.
/// - **Get**: returns a snapshot of one entity, `None` when absent.
/// - **List**: returns snapshots of every entity accepted by [`ActorEntity::matches`].
/// - **Update**: applies [`ActorEntity::Update`] and returns the new state.
/// - **Delete**: authorizes with [`ActorEntity::Delete`] and removes the entity.
/// - **Action**: runs an aggregate-specific [`ActorEntity::Action`].
///
/// The associated types keep payloads bound to their aggregate: a comment payload cannot be
/// sent to the activity actor.
#[derive(Debug)]
pub enum ResourceRequest<T: ActorEntity> {
    Create {
        params: T::Create,
        respond_to: Response<T::Id>,
    },
    Get {
        id: T::Id,
        respond_to: Response<Option<T>>,
    },
    List {
        filter: T::Filter,
        respond_to: Response<Vec<T>>,
    },
    Update {
        id: T::Id,
        update: T::Update,
        respond_to: Response<T>,
    },
    Delete {
        id: T::Id,
        params: T::Delete,
        respond_to: Response<()>,
    },
    Action {
        id: T::Id,
        action: T::Action,
        respond_to: Response<T::ActionResult>,
    },
}
