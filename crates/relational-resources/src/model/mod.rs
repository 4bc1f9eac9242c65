//! Domain data structures.
//!
//! Plain data plus the DTOs each actor accepts. Aggregate roots (`User`, `Term`, `Resource`,
//! `Comment`, `Activity`) implement [`ActorEntity`](actor_framework::ActorEntity) in their
//! actor module; child rows (favorites, progressions, participants, messages) live inside
//! their root.

pub mod activity;
pub mod comment;
pub mod message;
pub mod participant;
pub mod progression;
pub mod resource;
pub mod taxonomy;
pub mod user;

pub use activity::*;
pub use comment::*;
pub use message::*;
pub use participant::*;
pub use progression::*;
pub use resource::*;
pub use taxonomy::*;
pub use user::*;
