//! # Platform Lifecycle
//!
//! Starting, wiring and stopping the actors of the platform.
//!
//! Actors are created first, without dependencies, and receive the clients they call at
//! `run(context)` time:
//!
//! ```rust,ignore
//! let (resource_actor, catalog) = resource_actor::new(buffer);
//! let (comment_actor, comments) = comment_actor::new(buffer, catalog.clone());
//!
//! tokio::spawn(resource_actor.run((taxonomy.clone(), config.clone())));
//! tokio::spawn(comment_actor.run((catalog.clone(), config.clone())));
//! ```
//!
//! Shutdown drops every client; each actor leaves its loop once its channel closes. Clients
//! held inside other actors' contexts close when those actors stop, which works because the
//! dependency graph has no cycles.
//!
//! Cross-aggregate cascades that no single actor can perform (deleting a resource together
//! with its comments and activities) live on [`Platform`].

pub mod platform;

pub use platform::*;
