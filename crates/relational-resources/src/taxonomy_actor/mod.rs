//! # Taxonomy Actor
//!
//! Categories, resource types and relation types. Terms are maintained by administrators;
//! resources may only reference active terms of the right kind.

pub mod entity;

use crate::clients::TaxonomyClient;
use crate::model::Term;
use actor_framework::ResourceActor;

/// Custom actions for taxonomy terms.
#[derive(Debug, Clone)]
pub enum TermAction {
    SetActive {
        actor: crate::model::User,
        active: bool,
    },
}

/// Creates a new Taxonomy actor and its client.
pub fn new(buffer_size: usize) -> (ResourceActor<Term>, TaxonomyClient) {
    let (actor, generic_client) = ResourceActor::new(buffer_size);
    (actor, TaxonomyClient::new(generic_client))
}
