//! # ActorEntity Trait
//!
//! The `ActorEntity` trait is the contract every aggregate root (a resource, an activity,
//! a comment, ...) implements to be managed by the generic `ResourceActor`. It names the
//! associated DTO types for each message kind and provides the lifecycle hooks
//! (`on_create`, `on_update`, `on_delete`, `handle_action`) plus the `matches` predicate
//! used by `List` requests.
//!
//! # Provided Methods (Hooks)
//! - [`ActorEntity::on_create`]
//! - [`ActorEntity::on_delete`]
//!
//! The default implementations accept the operation (`Ok(())`). Override them when creation
//! needs validation against other actors, or when deletion must be authorized.

use async_trait::async_trait;
use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Trait that any aggregate root must implement to be managed by `ResourceActor`.
///
/// # Async & Context
/// Hooks are `#[async_trait]` so they can await other actors. The `Context` type is injected
/// into every hook at `run()` time ("late binding"), which is how an aggregate reaches the
/// clients and configuration it depends on.
///
/// # Ordering
/// Ids must be `Ord`: the actor keeps its store ordered by id, so `List` results come back in
/// creation order.
#[async_trait]
pub trait ActorEntity: Clone + Send + Sync + 'static {
    /// The unique identifier for this entity.
    /// Must be convertible from u32 for automatic ID generation.
    type Id: Eq + Ord + Hash + Clone + Send + Sync + Display + Debug + From<u32>;

    /// The data required to create a new instance.
    type Create: Send + Sync + Debug;

    /// The data required to update an existing instance.
    type Update: Send + Sync + Debug;

    /// The data that accompanies a deletion (typically the acting user).
    /// Use `()` when deletion needs no authorization.
    type Delete: Send + Sync + Debug;

    /// Selection criteria for `List` requests.
    type Filter: Send + Sync + Debug;

    /// Enum representing aggregate-specific operations.
    type Action: Send + Sync + Debug;

    /// The result type returned by custom actions.
    type ActionResult: Send + Sync + Debug;

    /// The runtime context (dependencies) injected into the actor.
    /// Use `()` if no dependencies are needed.
    type Context: Send + Sync;

    /// The error type for this entity.
    ///
    /// It travels through the framework boxed inside
    /// [`FrameworkError::EntityError`](crate::FrameworkError::EntityError); clients recover it
    /// with [`FrameworkError::into_entity_error`](crate::FrameworkError::into_entity_error).
    type Error: std::error::Error + Send + Sync + 'static;

    /// Construct the full entity from the ID and payload.
    /// This is called synchronously before `on_create`.
    fn from_create_params(id: Self::Id, params: Self::Create) -> Result<Self, Self::Error>;

    /// Returns true when this entity should be included in a `List` response.
    fn matches(&self, filter: &Self::Filter) -> bool;

    // --- Lifecycle Hooks (Async) ---

    /// Called after construction and before the entity is stored.
    /// Returning an error discards the entity; the consumed id is not reused.
    async fn on_create(&mut self, _ctx: &Self::Context) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called when an update request is received.
    async fn on_update(
        &mut self,
        update: Self::Update,
        _ctx: &Self::Context,
    ) -> Result<(), Self::Error>;

    /// Called immediately before the entity is removed. An error keeps the entity in place.
    async fn on_delete(
        &self,
        _params: Self::Delete,
        _ctx: &Self::Context,
    ) -> Result<(), Self::Error> {
        Ok(())
    }

    // --- Action Handler (Async) ---

    /// Handle an aggregate-specific action.
    ///
    /// The actor runs the action against a working copy and commits it only on `Ok`, so a
    /// handler may mutate freely before discovering that it has to fail.
    async fn handle_action(
        &mut self,
        action: Self::Action,
        _ctx: &Self::Context,
    ) -> Result<Self::ActionResult, Self::Error>;
}
