//! Entity trait implementation for the Comment domain type.

use super::actions::{CommentAction, CommentActionResult, CommentModeration, LikeState};
use crate::access;
use crate::clients::CatalogClient;
use crate::config::PlatformConfig;
use crate::error::{DomainError, Validator};
use crate::model::{
    Comment, CommentCreate, CommentDelete, CommentFilter, CommentId, CommentStatus, CommentUpdate,
    User,
};
use actor_framework::{ActorClient, ActorEntity};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};

pub const MIN_CONTENT_CHARS: usize = 3;
pub const MAX_CONTENT_CHARS: usize = 1000;
pub const MAX_REPORT_DETAILS_CHARS: usize = 500;

fn validate_content(content: &str) -> Result<(), DomainError> {
    let mut v = Validator::new();
    v.length("content", content, MIN_CONTENT_CHARS, MAX_CONTENT_CHARS);
    v.finish()
}

fn require_moderator(actor: &User) -> Result<(), DomainError> {
    if access::can_moderate(actor) {
        Ok(())
    } else {
        Err(DomainError::forbidden("Moderator role required"))
    }
}

impl Comment {
    fn moderate(
        &mut self,
        actor: &User,
        step: CommentModeration,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        require_moderator(actor)?;
        let Some(next) = step.target_status(self.status) else {
            return Err(DomainError::InvalidTransition {
                entity: "comment",
                from: self.status.as_str().to_string(),
                action: step.name(),
            });
        };
        match step {
            CommentModeration::Reject { reason } | CommentModeration::Hide { reason } => {
                let mut v = Validator::new();
                v.length("reason", &reason, 1, MAX_REPORT_DETAILS_CHARS);
                v.finish()?;
                self.moderation_reason = Some(reason.trim().to_string());
            }
            CommentModeration::Approve | CommentModeration::Restore => {
                self.moderation_reason = None;
            }
        }
        self.status = next;
        self.moderated_by = Some(actor.id);
        self.moderated_at = Some(now);
        Ok(())
    }
}

#[async_trait]
impl ActorEntity for Comment {
    type Id = CommentId;
    type Create = CommentCreate;
    type Update = CommentUpdate;
    type Delete = CommentDelete;
    type Filter = CommentFilter;
    type Action = CommentAction;
    type ActionResult = CommentActionResult;
    type Context = (CatalogClient, Arc<PlatformConfig>);
    type Error = DomainError;

    /// Comments by moderators are published right away; everyone else's wait for approval.
    fn from_create_params(id: CommentId, params: CommentCreate) -> Result<Self, Self::Error> {
        validate_content(&params.content)?;
        let now = Utc::now();
        let actor = params.actor;
        let approved = access::can_moderate(&actor);
        Ok(Self {
            id,
            resource_id: params.resource_id,
            parent_id: params.parent_id,
            author_id: actor.id,
            content: params.content.trim().to_string(),
            status: if approved {
                CommentStatus::Approved
            } else {
                CommentStatus::Pending
            },
            moderated_by: approved.then_some(actor.id),
            moderated_at: approved.then_some(now),
            moderation_reason: None,
            is_pinned: false,
            likers: BTreeSet::new(),
            created_at: now,
            edited_at: None,
        })
    }

    fn matches(&self, filter: &CommentFilter) -> bool {
        filter
            .resource_id
            .map_or(true, |resource| self.resource_id == resource)
            && filter.author_id.map_or(true, |author| self.author_id == author)
            && filter.status.map_or(true, |status| self.status == status)
            && filter.parent_id.map_or(true, |parent| self.parent_id == Some(parent))
            && (!filter.top_level_only || self.parent_id.is_none())
    }

    /// Only public, published resources take comments.
    async fn on_create(&mut self, ctx: &Self::Context) -> Result<(), Self::Error> {
        let (catalog, _) = ctx;
        let resource = catalog
            .get(self.resource_id)
            .await?
            .ok_or_else(|| DomainError::not_found(self.resource_id.to_string()))?;
        if !resource.is_publicly_visible() {
            return Err(DomainError::forbidden("Comments not allowed on this resource"));
        }
        Ok(())
    }

    async fn on_update(&mut self, update: CommentUpdate, ctx: &Self::Context) -> Result<(), Self::Error> {
        let (_, config) = ctx;
        let now = Utc::now();
        if !access::can_edit_comment(&update.actor, self, now, config.edit_window_minutes) {
            return Err(DomainError::forbidden(format!(
                "Comments can only be edited by their author within {} minutes",
                config.edit_window_minutes
            )));
        }
        validate_content(&update.content)?;
        self.content = update.content.trim().to_string();
        self.edited_at = Some(now);
        Ok(())
    }

    async fn on_delete(&self, params: CommentDelete, _ctx: &Self::Context) -> Result<(), Self::Error> {
        match params {
            CommentDelete::ByActor(actor) if !access::can_delete_comment(&actor, self) => {
                Err(DomainError::forbidden("Cannot delete this comment"))
            }
            _ => Ok(()),
        }
    }

    async fn handle_action(
        &mut self,
        action: CommentAction,
        ctx: &Self::Context,
    ) -> Result<CommentActionResult, Self::Error> {
        let (catalog, _) = ctx;
        let now = Utc::now();

        match action {
            CommentAction::ToggleLike { actor } => {
                if self.status != CommentStatus::Approved {
                    return Err(DomainError::InvalidTransition {
                        entity: "comment",
                        from: self.status.as_str().to_string(),
                        action: "like",
                    });
                }
                catalog.view(self.resource_id, Some(&actor)).await?;
                let liked = if self.likers.remove(&actor.id) {
                    false
                } else {
                    self.likers.insert(actor.id);
                    true
                };
                Ok(CommentActionResult::ToggleLike(LikeState {
                    liked,
                    like_count: self.like_count(),
                }))
            }
            CommentAction::SetPinned { actor, pinned } => {
                require_moderator(&actor)?;
                self.is_pinned = pinned;
                Ok(CommentActionResult::SetPinned(self.clone()))
            }
            CommentAction::Moderate { actor, step } => {
                let name = step.name();
                let from = self.status;
                self.moderate(&actor, step, now)?;
                info!(
                    comment = %self.id,
                    step = name,
                    from = from.as_str(),
                    to = self.status.as_str(),
                    by = %actor.id,
                    "Comment moderated"
                );
                Ok(CommentActionResult::Moderate(self.clone()))
            }
            CommentAction::Report {
                actor,
                reason,
                details,
            } => {
                if let Some(details) = &details {
                    let mut v = Validator::new();
                    v.length("details", details, 0, MAX_REPORT_DETAILS_CHARS);
                    v.finish()?;
                }
                warn!(
                    comment = %self.id,
                    resource = %self.resource_id,
                    reported_by = %actor.id,
                    ?reason,
                    details = details.as_deref().unwrap_or(""),
                    "Comment reported"
                );
                Ok(CommentActionResult::Report(()))
            }
        }
    }
}
