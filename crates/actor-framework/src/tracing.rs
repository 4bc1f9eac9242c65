//! # Observability
//!
//! Structured logging for actor systems built on this crate.
//!
//! Every `ResourceActor` logs its lifecycle and each request it handles with structured
//! fields (`entity_type`, `id`, `size`), and the `ActorClient` defaults open a span per call.
//! Verbosity is controlled with `RUST_LOG`:
//!
//! ```bash
//! RUST_LOG=info cargo run                              # lifecycle + successful writes
//! RUST_LOG=debug cargo run                             # full request payloads
//! RUST_LOG=warn,relational_resources=debug cargo run   # quiet framework, chatty domain
//! ```
//!
//! A rejected operation (failed guard, forbidden actor) is logged at `warn` by the actor with
//! the entity id and the error's display text.

/// Installs the global `tracing` subscriber.
///
/// Compact single-line output, no module targets, filter taken from `RUST_LOG`. Call once at
/// process start; a second call panics because the global subscriber is already set.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
