//! # Resource Actor
//!
//! Educational resources with their moderation workflow, favorites and progressions.
//!
//! ## Structure
//!
//! - [`entity`] - [`ActorEntity`](actor_framework::ActorEntity) implementation for [`Resource`]
//! - [`actions`] - [`ResourceAction`] and [`ResourceActionResult`]
//! - [`lifecycle`] - the moderation transition table
//! - [`new()`] - Factory function that creates the actor and client
//!
//! ## Usage
//!
//! ```rust,ignore
//! let (actor, catalog) = resource_actor::new(32);
//! tokio::spawn(actor.run((taxonomy_client, Arc::new(PlatformConfig::default()))));
//!
//! let id = catalog.create_resource(draft).await?;
//! catalog.submit(id, &owner).await?;
//! catalog.approve(id, &moderator).await?;
//! ```

pub mod actions;
pub mod entity;
pub mod lifecycle;

pub use actions::*;

use crate::clients::CatalogClient;
use crate::model::Resource;
use actor_framework::ResourceActor;

/// Creates a new Resource actor and its client.
pub fn new(buffer_size: usize) -> (ResourceActor<Resource>, CatalogClient) {
    let (actor, generic_client) = ResourceActor::new(buffer_size);
    (actor, CatalogClient::new(generic_client))
}
