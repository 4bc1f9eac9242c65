//! # Actor Framework
//!
//! Building blocks for type-safe, concurrent actor systems on Tokio. Every aggregate type
//! (users, resources, activities, ...) is owned by one [`ResourceActor`] task and reached only
//! through its [`ResourceClient`], so state is never shared and never locked.
//!
//! ## Architecture Overview
//!
//! The framework separates concerns into three layers:
//!
//! 1. **Entity Layer** ([`ActorEntity`]) - domain state, guards and transitions
//! 2. **Runtime Layer** ([`ResourceActor`]) - message processing and the store
//! 3. **Interface Layer** ([`ResourceClient`], [`ActorClient`]) - type-safe communication
//!
//! Business rules are written once, in the entity hooks. The actor guarantees that hooks for
//! one aggregate type never interleave, and that a failing `Update` or `Action` leaves the
//! stored entity untouched.
//!
//! ## Defining an Entity
//!
//! ```rust
//! use actor_framework::{ActorEntity, ResourceActor};
//! use async_trait::async_trait;
//!
//! #[derive(Clone, Debug)]
//! struct Ticket {
//!     id: u32,
//!     title: String,
//!     closed: bool,
//! }
//!
//! #[derive(Debug)] struct TicketCreate { title: String }
//! #[derive(Debug)] struct TicketUpdate { title: Option<String> }
//! #[derive(Debug)] enum TicketAction { Close }
//!
//! #[derive(Debug, thiserror::Error)]
//! enum TicketError {
//!     #[error("ticket already closed")]
//!     AlreadyClosed,
//! }
//!
//! #[async_trait]
//! impl ActorEntity for Ticket {
//!     type Id = u32;
//!     type Create = TicketCreate;
//!     type Update = TicketUpdate;
//!     type Delete = ();
//!     type Filter = bool; // list by `closed`
//!     type Action = TicketAction;
//!     type ActionResult = ();
//!     type Context = ();
//!     type Error = TicketError;
//!
//!     fn from_create_params(id: u32, params: TicketCreate) -> Result<Self, Self::Error> {
//!         Ok(Self { id, title: params.title, closed: false })
//!     }
//!
//!     fn matches(&self, closed: &bool) -> bool {
//!         self.closed == *closed
//!     }
//!
//!     async fn on_update(&mut self, update: TicketUpdate, _: &()) -> Result<(), Self::Error> {
//!         if let Some(title) = update.title { self.title = title; }
//!         Ok(())
//!     }
//!
//!     async fn handle_action(&mut self, action: TicketAction, _: &()) -> Result<(), Self::Error> {
//!         match action {
//!             TicketAction::Close if self.closed => Err(TicketError::AlreadyClosed),
//!             TicketAction::Close => {
//!                 self.closed = true;
//!                 Ok(())
//!             }
//!         }
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let (actor, client) = ResourceActor::<Ticket>::new(10);
//!     tokio::spawn(actor.run(()));
//!
//!     let id = client.create(TicketCreate { title: "Broken link".into() }).await.unwrap();
//!     client.perform_action(id, TicketAction::Close).await.unwrap();
//!
//!     let err = client.perform_action(id, TicketAction::Close).await.unwrap_err();
//!     assert!(matches!(err.into_entity_error::<TicketError>(), Ok(TicketError::AlreadyClosed)));
//!     assert_eq!(client.list(true).await.unwrap().len(), 1);
//! }
//! ```
//!
//! ## Context Injection
//!
//! Dependencies are injected when the actor starts (`actor.run(context)`), not when it is
//! constructed. All actors can therefore be created first and wired afterwards: an aggregate
//! whose creation must consult another aggregate declares `type Context = ResourceClient<Other>`
//! (or a tuple of clients and configuration) and receives it in every hook.
//!
//! ## Concurrency Model
//!
//! - Each actor runs in its own Tokio task
//! - Messages are processed **sequentially** within an actor
//! - Different actors run in parallel
//!
//! A hook may await a *different* actor through its context. Dependencies between actors must
//! stay acyclic, otherwise two actors can end up waiting on each other.
//!
//! ## Testing
//!
//! [`mock::MockClient`] serves scripted replies through a real `ResourceClient<T>`, and
//! [`mock::create_mock_client`] exposes the raw request stream for payload assertions.
//! [`tracing::setup_tracing`] installs the `RUST_LOG`-driven subscriber used by binaries.

pub mod actor;
pub mod client;
pub mod client_trait;
pub mod entity;
pub mod error;
pub mod message;
pub mod mock;
pub mod tracing;

// Re-export core types for convenience
pub use actor::ResourceActor;
pub use client::ResourceClient;
pub use client_trait::ActorClient;
pub use entity::ActorEntity;
pub use error::FrameworkError;
pub use message::{ResourceRequest, Response};
