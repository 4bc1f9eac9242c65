//! # Catalog Client
//!
//! Provides a high-level API for interacting with the `Resource` actor: authoring,
//! moderation, engagement counters, favorites and progressions. Bulk administration lives in
//! [`bulk`](crate::bulk).

use super::mismatched;
use crate::access;
use crate::error::DomainError;
use crate::model::{
    Attachment, Audience, Progression, Resource, ResourceCreate, ResourceDelete, ResourceFilter,
    ResourceId, ResourceUpdate, TermId, User, Visibility,
};
use crate::resource_actor::{
    FavoriteState, FavoriteStep, ModerationStep, ProgressStep, ResourceAction,
    ResourceActionResult,
};
use actor_framework::{ActorClient, FrameworkError, ResourceClient};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Client for interacting with the Resource actor.
#[derive(Clone)]
pub struct CatalogClient {
    inner: ResourceClient<Resource>,
}

impl CatalogClient {
    pub fn new(inner: ResourceClient<Resource>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ActorClient<Resource> for CatalogClient {
    type Error = DomainError;

    fn inner(&self) -> &ResourceClient<Resource> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        DomainError::from(e)
    }
}

fn viewer_id(viewer: Option<&User>) -> String {
    viewer.map_or_else(|| "anonymous".to_string(), |u| u.id.to_string())
}

impl CatalogClient {
    #[instrument(skip(self, params), fields(actor = %params.actor.id, title = %params.title))]
    pub async fn create_resource(&self, params: ResourceCreate) -> Result<ResourceId, DomainError> {
        debug!("Sending request");
        Ok(self.inner.create(params).await?)
    }

    #[instrument(skip(self, update), fields(actor = %update.actor.id))]
    pub async fn update_resource(
        &self,
        id: ResourceId,
        update: ResourceUpdate,
    ) -> Result<Resource, DomainError> {
        debug!("Sending request");
        Ok(self.inner.update(id, update).await?)
    }

    /// Deletes the resource itself, without its comments and activities. Callers outside the
    /// crate delete through [`Platform::delete_resource`](crate::lifecycle::Platform::delete_resource).
    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub(crate) async fn delete_resource(&self, id: ResourceId, actor: &User) -> Result<(), DomainError> {
        debug!("Sending request");
        let params = ResourceDelete {
            actor: actor.clone(),
        };
        Ok(self.inner.delete(id, params).await?)
    }

    /// The resource, or `NotFound` when it does not exist or `viewer` may not see it.
    #[instrument(skip(self, viewer), fields(viewer = %viewer_id(viewer)))]
    pub async fn view(&self, id: ResourceId, viewer: Option<&User>) -> Result<Resource, DomainError> {
        debug!("Sending request");
        match self.inner.get(id).await? {
            Some(resource) if access::can_view(viewer, &resource) => Ok(resource),
            _ => Err(DomainError::not_found(id.to_string())),
        }
    }

    /// Resources visible to `viewer` that match `filter`.
    #[instrument(skip(self, viewer), fields(viewer = %viewer_id(viewer)))]
    pub async fn browse(
        &self,
        viewer: Option<&User>,
        mut filter: ResourceFilter,
    ) -> Result<Vec<Resource>, DomainError> {
        debug!("Sending request");
        filter.audience = Some(match viewer {
            Some(user) => Audience::Member(user.clone()),
            None => Audience::Anonymous,
        });
        Ok(self.inner.list(filter).await?)
    }

    async fn act(&self, id: ResourceId, action: ResourceAction) -> Result<ResourceActionResult, DomainError> {
        Ok(self.inner.perform_action(id, action).await?)
    }

    #[instrument(skip(self, viewer), fields(viewer = %viewer_id(viewer.as_ref())))]
    pub async fn record_view(&self, id: ResourceId, viewer: Option<User>) -> Result<Resource, DomainError> {
        debug!("Sending request");
        match self.act(id, ResourceAction::RecordView { actor: viewer }).await? {
            ResourceActionResult::RecordView(resource) => Ok(resource),
            _ => Err(mismatched("RecordView")),
        }
    }

    /// Counts a download and hands back the attachment to serve.
    #[instrument(skip(self, viewer), fields(viewer = %viewer_id(viewer.as_ref())))]
    pub async fn record_download(
        &self,
        id: ResourceId,
        viewer: Option<User>,
    ) -> Result<Attachment, DomainError> {
        debug!("Sending request");
        match self.act(id, ResourceAction::RecordDownload { actor: viewer }).await? {
            ResourceActionResult::RecordDownload(attachment) => Ok(attachment),
            _ => Err(mismatched("RecordDownload")),
        }
    }

    // ---------------------------------------------------------------------
    // Moderation
    // ---------------------------------------------------------------------

    #[instrument(skip(self, actor), fields(actor = %actor.id, step = step.name()))]
    pub async fn moderate(
        &self,
        id: ResourceId,
        actor: &User,
        step: ModerationStep,
    ) -> Result<Resource, DomainError> {
        debug!("Sending request");
        let action = ResourceAction::Moderate {
            actor: actor.clone(),
            step,
        };
        match self.act(id, action).await? {
            ResourceActionResult::Moderate(resource) => Ok(resource),
            _ => Err(mismatched("Moderate")),
        }
    }

    pub async fn submit(&self, id: ResourceId, actor: &User) -> Result<Resource, DomainError> {
        self.moderate(id, actor, ModerationStep::Submit).await
    }

    pub async fn approve(&self, id: ResourceId, actor: &User) -> Result<Resource, DomainError> {
        self.moderate(id, actor, ModerationStep::Approve).await
    }

    pub async fn reject(
        &self,
        id: ResourceId,
        actor: &User,
        reason: impl Into<String>,
    ) -> Result<Resource, DomainError> {
        let step = ModerationStep::Reject {
            reason: reason.into(),
        };
        self.moderate(id, actor, step).await
    }

    pub async fn suspend(
        &self,
        id: ResourceId,
        actor: &User,
        reason: impl Into<String>,
    ) -> Result<Resource, DomainError> {
        let step = ModerationStep::Suspend {
            reason: reason.into(),
        };
        self.moderate(id, actor, step).await
    }

    pub async fn reactivate(&self, id: ResourceId, actor: &User) -> Result<Resource, DomainError> {
        self.moderate(id, actor, ModerationStep::Reactivate).await
    }

    pub async fn publish(&self, id: ResourceId, actor: &User) -> Result<Resource, DomainError> {
        self.moderate(id, actor, ModerationStep::Publish).await
    }

    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn change_category(
        &self,
        id: ResourceId,
        actor: &User,
        category_id: TermId,
    ) -> Result<Resource, DomainError> {
        debug!("Sending request");
        let action = ResourceAction::ChangeCategory {
            actor: actor.clone(),
            category_id,
        };
        match self.act(id, action).await? {
            ResourceActionResult::ChangeCategory(resource) => Ok(resource),
            _ => Err(mismatched("ChangeCategory")),
        }
    }

    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn change_visibility(
        &self,
        id: ResourceId,
        actor: &User,
        visibility: Visibility,
    ) -> Result<Resource, DomainError> {
        debug!("Sending request");
        let action = ResourceAction::ChangeVisibility {
            actor: actor.clone(),
            visibility,
        };
        match self.act(id, action).await? {
            ResourceActionResult::ChangeVisibility(resource) => Ok(resource),
            _ => Err(mismatched("ChangeVisibility")),
        }
    }

    // ---------------------------------------------------------------------
    // Favorites
    // ---------------------------------------------------------------------

    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn favorite(
        &self,
        id: ResourceId,
        actor: &User,
        step: FavoriteStep,
    ) -> Result<FavoriteState, DomainError> {
        debug!("Sending request");
        let action = ResourceAction::Favorite {
            actor: actor.clone(),
            step,
        };
        match self.act(id, action).await? {
            ResourceActionResult::Favorite(state) => Ok(state),
            _ => Err(mismatched("Favorite")),
        }
    }

    pub async fn toggle_favorite(&self, id: ResourceId, actor: &User) -> Result<FavoriteState, DomainError> {
        self.favorite(id, actor, FavoriteStep::Toggle).await
    }

    pub async fn add_favorite(&self, id: ResourceId, actor: &User) -> Result<FavoriteState, DomainError> {
        self.favorite(id, actor, FavoriteStep::Add).await
    }

    pub async fn remove_favorite(&self, id: ResourceId, actor: &User) -> Result<FavoriteState, DomainError> {
        self.favorite(id, actor, FavoriteStep::Remove).await
    }

    pub async fn favorite_status(&self, id: ResourceId, actor: &User) -> Result<FavoriteState, DomainError> {
        self.favorite(id, actor, FavoriteStep::Check).await
    }

    /// Resources `user` marked as favorite and can still see, most recently favorited first.
    #[instrument(skip(self, user), fields(user = %user.id))]
    pub async fn favorites_of(&self, user: &User) -> Result<Vec<Resource>, DomainError> {
        debug!("Sending request");
        let mut resources = self
            .inner
            .list(ResourceFilter {
                favorited_by: Some(user.id),
                audience: Some(Audience::Member(user.clone())),
                ..Default::default()
            })
            .await?;
        resources.sort_by(|a, b| b.favorites.get(&user.id).cmp(&a.favorites.get(&user.id)));
        Ok(resources)
    }

    // ---------------------------------------------------------------------
    // Progressions
    // ---------------------------------------------------------------------

    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn progress(
        &self,
        id: ResourceId,
        actor: &User,
        step: ProgressStep,
    ) -> Result<Progression, DomainError> {
        debug!("Sending request");
        let action = ResourceAction::Progress {
            actor: actor.clone(),
            step,
        };
        match self.act(id, action).await? {
            ResourceActionResult::Progress(progression) => Ok(progression),
            _ => Err(mismatched("Progress")),
        }
    }

    /// `user`'s progression on a resource they can see, if they started one.
    #[instrument(skip(self, user), fields(user = %user.id))]
    pub async fn progression_of(
        &self,
        id: ResourceId,
        user: &User,
    ) -> Result<Option<Progression>, DomainError> {
        let resource = self.view(id, Some(user)).await?;
        Ok(resource.progressions.get(&user.id).cloned())
    }
}
