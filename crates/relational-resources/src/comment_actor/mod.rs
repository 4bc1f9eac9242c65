//! # Comment Actor
//!
//! Comments on public, published resources, with one level of replies, likes, pinning and a
//! moderation workflow.
//!
//! - [`entity`] - [`ActorEntity`](actor_framework::ActorEntity) implementation for [`Comment`]
//! - [`actions`] - [`CommentAction`] and [`CommentActionResult`]
//!
//! Rules that need other comments (reply targets, cascading deletes, threads) are applied by
//! [`CommentClient`], since an entity hook only ever sees its own row.

pub mod actions;
pub mod entity;

pub use actions::*;

use crate::clients::{CatalogClient, CommentClient};
use crate::model::Comment;
use actor_framework::ResourceActor;

/// Creates a new Comment actor and its client. The client reads resources through `catalog`.
pub fn new(buffer_size: usize, catalog: CatalogClient) -> (ResourceActor<Comment>, CommentClient) {
    let (actor, generic_client) = ResourceActor::new(buffer_size);
    (actor, CommentClient::new(generic_client, catalog))
}
