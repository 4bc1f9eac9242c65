//! # Activity Actor
//!
//! Scheduled sessions around a resource. Participants and messages are child rows of the
//! activity, so seat accounting and message rules run inside the same actor message as the
//! write they guard.
//!
//! ## Structure
//!
//! - [`entity`] - [`ActorEntity`](actor_framework::ActorEntity) implementation for [`Activity`]
//! - [`actions`] - [`ActivityAction`] and [`ActivityActionResult`]
//! - [`lifecycle`] - activity and participant transition tables
//! - [`participants`] - membership operations
//! - [`messages`] - the activity's message board and private messages

pub mod actions;
pub mod entity;
pub mod lifecycle;
pub mod messages;
pub mod participants;

pub use actions::*;

use crate::clients::{ActivityClient, CatalogClient};
use crate::model::Activity;
use actor_framework::ResourceActor;

/// Creates a new Activity actor and its client. The client checks resource visibility through
/// `catalog` before creating activities.
pub fn new(buffer_size: usize, catalog: CatalogClient) -> (ResourceActor<Activity>, ActivityClient) {
    let (actor, generic_client) = ResourceActor::new(buffer_size);
    (actor, ActivityClient::new(generic_client, catalog))
}
