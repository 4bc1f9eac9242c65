use crate::bulk::{BulkOutcome, BulkResourceAction, FavoriteBulkOutcome};
use crate::clients::{ActivityClient, CatalogClient, CommentClient, TaxonomyClient, UserClient};
use crate::config::PlatformConfig;
use crate::error::DomainError;
use crate::model::{ResourceFilter, ResourceId, TermId, User};
use actor_framework::ActorClient;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Runtime orchestrator for the relational resources platform.
///
/// Spawns one actor per aggregate type and wires their dependencies:
///
/// - **Taxonomy**: no dependencies
/// - **Catalog** (resources): taxonomy client, to validate classifications
/// - **Comments** and **Activities**: catalog client, to check the resource they hang off
/// - **Users**: catalog and activity clients, to refuse deleting users that still own content
///
/// The graph is acyclic, so dropping the clients in [`shutdown`](Self::shutdown) stops every
/// actor.
///
/// # Example
///
/// ```ignore
/// let platform = Platform::new(PlatformConfig::from_env());
/// let alice = platform.users.register(params).await?;
/// // ...
/// platform.shutdown().await?;
/// ```
pub struct Platform {
    pub config: Arc<PlatformConfig>,
    pub users: UserClient,
    pub taxonomy: TaxonomyClient,
    pub catalog: CatalogClient,
    pub comments: CommentClient,
    pub activities: ActivityClient,

    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl Platform {
    /// Starts every actor. Must be called inside a Tokio runtime.
    pub fn new(config: PlatformConfig) -> Self {
        let config = Arc::new(config);
        let buffer = config.actor_buffer;

        // 1. Create actors
        let (taxonomy_actor, taxonomy) = crate::taxonomy_actor::new(buffer);
        let (resource_actor, catalog) = crate::resource_actor::new(buffer);
        let (comment_actor, comments) = crate::comment_actor::new(buffer, catalog.clone());
        let (activity_actor, activities) = crate::activity_actor::new(buffer, catalog.clone());
        let (user_actor, users) = crate::user_actor::new(buffer);

        // 2. Start actors with injected context
        let handles = vec![
            tokio::spawn(taxonomy_actor.run(())),
            tokio::spawn(resource_actor.run((taxonomy.clone(), config.clone()))),
            tokio::spawn(comment_actor.run((catalog.clone(), config.clone()))),
            tokio::spawn(activity_actor.run((catalog.clone(), config.clone()))),
            tokio::spawn(user_actor.run((catalog.clone(), activities.clone()))),
        ];
        info!(buffer, "Platform started");

        Self {
            config,
            users,
            taxonomy,
            catalog,
            comments,
            activities,
            handles,
        }
    }

    /// Deletes a resource, then the comments and activities attached to it.
    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn delete_resource(&self, id: ResourceId, actor: &User) -> Result<(), DomainError> {
        self.catalog.delete_resource(id, actor).await?;
        self.remove_dependents(id).await
    }

    async fn remove_dependents(&self, id: ResourceId) -> Result<(), DomainError> {
        let comments = self.comments.delete_for_resource(id).await?;
        let activities = self.activities.delete_for_resource(id).await?;
        info!(resource = %id, comments, activities, "Resource removed with dependents");
        Ok(())
    }

    /// Deletes a taxonomy term, refused while any resource is still classified by it.
    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn delete_term(&self, id: TermId, actor: &User) -> Result<(), DomainError> {
        let in_use = self
            .catalog
            .list(ResourceFilter {
                classified_by: Some(id),
                ..Default::default()
            })
            .await?
            .len();
        self.taxonomy.delete_term(id, actor, in_use).await?;
        info!(term = %id, "Term deleted");
        Ok(())
    }

    /// Bulk resource action bounded by the configured limit. Deleted ids lose their comments
    /// and activities as well.
    pub async fn bulk_action(
        &self,
        actor: &User,
        ids: &[ResourceId],
        action: BulkResourceAction,
    ) -> Result<BulkOutcome, DomainError> {
        let deleting = action == BulkResourceAction::Delete;
        let outcome = self
            .catalog
            .bulk_action(actor, ids, action, self.config.bulk_limit)
            .await?;
        if deleting {
            for id in &outcome.success {
                self.remove_dependents(*id).await?;
            }
        }
        Ok(outcome)
    }

    pub async fn add_favorites(&self, actor: &User, ids: &[ResourceId]) -> Result<FavoriteBulkOutcome, DomainError> {
        self.catalog
            .add_favorites(actor, ids, self.config.favorite_bulk_limit)
            .await
    }

    pub async fn remove_favorites(&self, actor: &User, ids: &[ResourceId]) -> Result<usize, DomainError> {
        self.catalog
            .remove_favorites(actor, ids, self.config.favorite_bulk_limit)
            .await
    }

    /// Drops every client and waits for the actors to drain.
    ///
    /// Returns an error if any actor task panicked.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down platform...");

        drop(self.users);
        drop(self.comments);
        drop(self.activities);
        drop(self.catalog);
        drop(self.taxonomy);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(format!("Actor task failed: {:?}", e));
            }
        }

        info!("Platform shutdown complete.");
        Ok(())
    }
}
