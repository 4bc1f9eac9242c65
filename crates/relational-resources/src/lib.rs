//! # Relational Resources
//!
//! Rules engine of a community platform: users publish educational resources, moderators
//! review them, and members run capacity-limited activities around them.
//!
//! - **[access]**: pure permission checks, each taking the acting user explicitly.
//! - **[model]**: data types and the DTOs each actor accepts.
//! - **Actors** ([`user_actor`], [`taxonomy_actor`], [`resource_actor`], [`comment_actor`],
//!   [`activity_actor`]): one aggregate type each, with its transition tables.
//! - **[clients]**: typed request wrappers returning [`DomainError`](error::DomainError).
//! - **[bulk]**: batch administration and batch favorites.
//! - **[lifecycle]**: the [`Platform`](lifecycle::Platform) that wires and stops the actors.
//!
//! See [`actor_framework::mock`] for testing clients without spawning actors.

pub mod access;
pub mod activity_actor;
pub mod bulk;
pub mod clients;
pub mod codes;
pub mod comment_actor;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod resource_actor;
pub mod taxonomy_actor;
pub mod user_actor;
