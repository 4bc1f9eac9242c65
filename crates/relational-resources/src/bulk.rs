//! # Bulk Operations
//!
//! Administrative batches over resources, and batch favorites for any user. Every id goes
//! through the same single-item operation as a normal request; a failing id never aborts the
//! batch.

use crate::clients::CatalogClient;
use crate::error::DomainError;
use crate::model::{ResourceId, TermId, User, Visibility};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum BulkResourceAction {
    Publish,
    Suspend { reason: String },
    Delete,
    ChangeCategory { category_id: TermId },
    ChangeVisibility { visibility: Visibility },
}

impl BulkResourceAction {
    pub fn name(&self) -> &'static str {
        match self {
            BulkResourceAction::Publish => "publish",
            BulkResourceAction::Suspend { .. } => "suspend",
            BulkResourceAction::Delete => "delete",
            BulkResourceAction::ChangeCategory { .. } => "change_category",
            BulkResourceAction::ChangeVisibility { .. } => "change_visibility",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkItemError {
    pub id: ResourceId,
    pub error: String,
}

/// Per-id outcome of a bulk resource action.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BulkOutcome {
    pub success: Vec<ResourceId>,
    /// Ids whose status does not allow the action.
    pub skipped: Vec<ResourceId>,
    pub errors: Vec<BulkItemError>,
}

impl BulkOutcome {
    pub fn summary(&self) -> String {
        format!(
            "{} succeeded, {} skipped, {} failed",
            self.success.len(),
            self.skipped.len(),
            self.errors.len()
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FavoriteBulkOutcome {
    pub added: Vec<ResourceId>,
    /// Already in the user's favorites.
    pub skipped: Vec<ResourceId>,
    /// Missing, or not visible to the user.
    pub forbidden: Vec<ResourceId>,
}

/// Drops repeated ids, keeping the first occurrence, and checks the batch size.
fn batch(ids: &[ResourceId], limit: usize) -> Result<Vec<ResourceId>, DomainError> {
    let mut seen = BTreeSet::new();
    let unique: Vec<ResourceId> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();
    if unique.is_empty() || unique.len() > limit {
        return Err(DomainError::invalid(
            "resource_ids",
            format!("must contain between 1 and {} ids", limit),
        ));
    }
    Ok(unique)
}

impl CatalogClient {
    async fn apply_bulk(&self, id: ResourceId, actor: &User, action: &BulkResourceAction) -> Result<(), DomainError> {
        match action {
            BulkResourceAction::Publish => self.publish(id, actor).await.map(drop),
            BulkResourceAction::Suspend { reason } => {
                self.suspend(id, actor, reason.clone()).await.map(drop)
            }
            BulkResourceAction::Delete => self.delete_resource(id, actor).await,
            BulkResourceAction::ChangeCategory { category_id } => {
                self.change_category(id, actor, *category_id).await.map(drop)
            }
            BulkResourceAction::ChangeVisibility { visibility } => {
                self.change_visibility(id, actor, *visibility).await.map(drop)
            }
        }
    }

    /// Applies `action` to every id. Administrators only.
    ///
    /// A transition the id's status does not allow lands in `skipped`; any other failure,
    /// including a missing id, lands in `errors`. Deletes do not cascade here; see
    /// [`Platform::bulk_action`](crate::lifecycle::Platform::bulk_action).
    #[instrument(skip(self, actor, ids), fields(actor = %actor.id, action = action.name(), count = ids.len()))]
    pub(crate) async fn bulk_action(
        &self,
        actor: &User,
        ids: &[ResourceId],
        action: BulkResourceAction,
        limit: usize,
    ) -> Result<BulkOutcome, DomainError> {
        if !actor.is_admin() {
            return Err(DomainError::forbidden("Bulk operations require an administrator"));
        }
        let ids = batch(ids, limit)?;

        let mut outcome = BulkOutcome::default();
        for id in ids {
            match self.apply_bulk(id, actor, &action).await {
                Ok(()) => outcome.success.push(id),
                Err(DomainError::InvalidTransition { .. }) => outcome.skipped.push(id),
                Err(e) => {
                    warn!(resource = %id, error = %e, "Bulk item failed");
                    outcome.errors.push(BulkItemError {
                        id,
                        error: e.to_string(),
                    });
                }
            }
        }
        info!(summary = %outcome.summary(), "Bulk action done");
        Ok(outcome)
    }

    #[instrument(skip(self, actor, ids), fields(actor = %actor.id, count = ids.len()))]
    pub async fn add_favorites(
        &self,
        actor: &User,
        ids: &[ResourceId],
        limit: usize,
    ) -> Result<FavoriteBulkOutcome, DomainError> {
        let ids = batch(ids, limit)?;
        let mut outcome = FavoriteBulkOutcome::default();
        for id in ids {
            match self.add_favorite(id, actor).await {
                Ok(_) => outcome.added.push(id),
                Err(DomainError::Conflict(_)) => outcome.skipped.push(id),
                Err(DomainError::NotFound(_) | DomainError::Forbidden(_)) => {
                    outcome.forbidden.push(id)
                }
                Err(e) => return Err(e),
            }
        }
        Ok(outcome)
    }

    /// Removes favorites, returning how many existed.
    #[instrument(skip(self, actor, ids), fields(actor = %actor.id, count = ids.len()))]
    pub async fn remove_favorites(&self, actor: &User, ids: &[ResourceId], limit: usize) -> Result<usize, DomainError> {
        let ids = batch(ids, limit)?;
        let mut removed = 0;
        for id in ids {
            match self.remove_favorite(id, actor).await {
                Ok(_) => removed += 1,
                Err(DomainError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(removed)
    }
}
