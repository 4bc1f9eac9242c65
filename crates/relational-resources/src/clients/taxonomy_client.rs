//! # Taxonomy Client
//!
//! Term maintenance plus the reference checks resources run against the taxonomies.

use crate::error::{DomainError, FieldError};
use crate::model::{Term, TermCreate, TermDelete, TermFilter, TermId, TermKind, TermUpdate, User};
use crate::taxonomy_actor::TermAction;
use actor_framework::{ActorClient, FrameworkError, ResourceClient};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Client for interacting with the Taxonomy actor.
#[derive(Clone)]
pub struct TaxonomyClient {
    inner: ResourceClient<Term>,
}

impl TaxonomyClient {
    pub fn new(inner: ResourceClient<Term>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ActorClient<Term> for TaxonomyClient {
    type Error = DomainError;

    fn inner(&self) -> &ResourceClient<Term> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        DomainError::from(e)
    }
}

fn field_of(kind: TermKind) -> &'static str {
    match kind {
        TermKind::Category => "category_id",
        TermKind::ResourceType => "resource_type_id",
        TermKind::RelationType => "relation_type_ids",
    }
}

impl TaxonomyClient {
    #[instrument(skip(self, params), fields(actor = %params.actor.id, kind = params.kind.as_str()))]
    pub async fn create_term(&self, params: TermCreate) -> Result<TermId, DomainError> {
        debug!("Sending request");
        Ok(self.inner.create(params).await?)
    }

    #[instrument(skip(self, update), fields(actor = %update.actor.id))]
    pub async fn update_term(&self, id: TermId, update: TermUpdate) -> Result<Term, DomainError> {
        debug!("Sending request");
        Ok(self.inner.update(id, update).await?)
    }

    /// Activates or deactivates a term. Inactive terms stay on the resources that already
    /// reference them but cannot be chosen again.
    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn set_active(&self, id: TermId, actor: &User, active: bool) -> Result<Term, DomainError> {
        debug!("Sending request");
        let action = TermAction::SetActive {
            actor: actor.clone(),
            active,
        };
        Ok(self.inner.perform_action(id, action).await?)
    }

    /// Deletes a term once the caller has counted the resources it still classifies.
    /// Public deletion goes through [`Platform::delete_term`](crate::lifecycle::Platform::delete_term).
    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub(crate) async fn delete_term(&self, id: TermId, actor: &User, resources: usize) -> Result<(), DomainError> {
        debug!("Sending request");
        Ok(self.inner.delete(id, TermDelete::new(actor.clone(), resources)).await?)
    }

    /// Terms of one kind, by sort order then name.
    #[instrument(skip(self))]
    pub async fn terms(&self, kind: TermKind, active_only: bool) -> Result<Vec<Term>, DomainError> {
        debug!("Sending request");
        let mut terms = self
            .inner
            .list(TermFilter {
                kind: Some(kind),
                active_only,
            })
            .await?;
        terms.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.name.cmp(&b.name)));
        Ok(terms)
    }

    /// The term `id`, provided it exists, is of `kind` and is active.
    #[instrument(skip(self))]
    pub async fn require_active(&self, id: TermId, kind: TermKind) -> Result<Term, DomainError> {
        debug!("Sending request");
        let field = field_of(kind);
        let term = self
            .inner
            .get(id)
            .await?
            .ok_or_else(|| DomainError::invalid(field, format!("{} does not exist", id)))?;
        if term.kind != kind {
            return Err(DomainError::invalid(
                field,
                format!("{} is not a {}", id, kind.as_str()),
            ));
        }
        if !term.is_active {
            return Err(DomainError::invalid(field, format!("{} is inactive", id)));
        }
        Ok(term)
    }

    /// Checks every taxonomy reference of a resource and reports all bad ones together.
    #[instrument(skip(self))]
    pub async fn validate_classification(
        &self,
        category_id: TermId,
        resource_type_id: TermId,
        relation_type_ids: &[TermId],
    ) -> Result<(), DomainError> {
        let mut refs = vec![
            (category_id, TermKind::Category),
            (resource_type_id, TermKind::ResourceType),
        ];
        refs.extend(relation_type_ids.iter().map(|id| (*id, TermKind::RelationType)));

        let mut fields: Vec<FieldError> = Vec::new();
        for (id, kind) in refs {
            match self.require_active(id, kind).await {
                Ok(_) => {}
                Err(DomainError::ValidationFailed(errors)) => fields.extend(errors),
                Err(e) => return Err(e),
            }
        }
        if fields.is_empty() {
            Ok(())
        } else {
            Err(DomainError::ValidationFailed(fields))
        }
    }
}
