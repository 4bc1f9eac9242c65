//! # Comment Client
//!
//! Wraps the Comment actor and composes the rules that span several comments: reply
//! targets, cascading deletes and thread listings.

use super::{mismatched, CatalogClient};
use crate::access;
use crate::comment_actor::{CommentAction, CommentActionResult, CommentModeration, LikeState};
use crate::error::DomainError;
use crate::model::{
    Comment, CommentCreate, CommentDelete, CommentFilter, CommentId, CommentStatus,
    CommentThread, CommentUpdate, ReportReason, ResourceId, User, UserId,
};
use actor_framework::{ActorClient, FrameworkError, ResourceClient};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

/// Client for interacting with the Comment actor.
#[derive(Clone)]
pub struct CommentClient {
    inner: ResourceClient<Comment>,
    catalog: CatalogClient,
}

impl CommentClient {
    pub fn new(inner: ResourceClient<Comment>, catalog: CatalogClient) -> Self {
        Self { inner, catalog }
    }
}

#[async_trait]
impl ActorClient<Comment> for CommentClient {
    type Error = DomainError;

    fn inner(&self) -> &ResourceClient<Comment> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        DomainError::from(e)
    }
}

/// Pinned first, then newest.
fn thread_order(a: &Comment, b: &Comment) -> std::cmp::Ordering {
    b.is_pinned
        .cmp(&a.is_pinned)
        .then(b.created_at.cmp(&a.created_at))
        .then(b.id.cmp(&a.id))
}

impl CommentClient {
    async fn fetch(&self, id: CommentId) -> Result<Comment, DomainError> {
        self.inner
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(id.to_string()))
    }

    /// Posts a comment, or a reply when `parent_id` is set.
    ///
    /// The author must be able to see the resource. A reply targets an approved top-level
    /// comment of the same resource.
    #[instrument(skip(self, params), fields(actor = %params.actor.id, resource = %params.resource_id))]
    pub async fn post(&self, params: CommentCreate) -> Result<CommentId, DomainError> {
        debug!("Sending request");
        self.catalog
            .view(params.resource_id, Some(&params.actor))
            .await?;

        if let Some(parent_id) = params.parent_id {
            let parent = self.fetch(parent_id).await?;
            if parent.resource_id != params.resource_id {
                return Err(DomainError::invalid(
                    "parent_id",
                    "Parent comment belongs to another resource",
                ));
            }
            if parent.is_reply() {
                return Err(DomainError::invalid("parent_id", "Cannot reply to a reply"));
            }
            if parent.status != CommentStatus::Approved {
                return Err(DomainError::invalid(
                    "parent_id",
                    "Cannot reply to unapproved comment",
                ));
            }
        }
        Ok(self.inner.create(params).await?)
    }

    #[instrument(skip(self, actor, content), fields(actor = %actor.id))]
    pub async fn edit(
        &self,
        id: CommentId,
        actor: &User,
        content: impl Into<String>,
    ) -> Result<Comment, DomainError> {
        debug!("Sending request");
        let update = CommentUpdate {
            actor: actor.clone(),
            content: content.into(),
        };
        Ok(self.inner.update(id, update).await?)
    }

    /// Deletes a comment and its replies. Returns how many comments were removed.
    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn delete_comment(&self, id: CommentId, actor: &User) -> Result<usize, DomainError> {
        debug!("Sending request");
        self.inner
            .delete(id, CommentDelete::ByActor(actor.clone()))
            .await?;
        let replies = self
            .inner
            .list(CommentFilter {
                parent_id: Some(id),
                ..Default::default()
            })
            .await?;
        for reply in &replies {
            self.inner.delete(reply.id, CommentDelete::Cascade).await?;
        }
        Ok(1 + replies.len())
    }

    /// Removes every comment of a deleted resource.
    #[instrument(skip(self))]
    pub async fn delete_for_resource(&self, resource_id: ResourceId) -> Result<usize, DomainError> {
        debug!("Sending request");
        let comments = self
            .inner
            .list(CommentFilter {
                resource_id: Some(resource_id),
                ..Default::default()
            })
            .await?;
        for comment in &comments {
            self.inner.delete(comment.id, CommentDelete::Cascade).await?;
        }
        if !comments.is_empty() {
            info!(resource = %resource_id, removed = comments.len(), "Removed comments of deleted resource");
        }
        Ok(comments.len())
    }

    async fn act(&self, id: CommentId, action: CommentAction) -> Result<CommentActionResult, DomainError> {
        Ok(self.inner.perform_action(id, action).await?)
    }

    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn toggle_like(&self, id: CommentId, actor: &User) -> Result<LikeState, DomainError> {
        debug!("Sending request");
        let action = CommentAction::ToggleLike {
            actor: actor.clone(),
        };
        match self.act(id, action).await? {
            CommentActionResult::ToggleLike(state) => Ok(state),
            _ => Err(mismatched("ToggleLike")),
        }
    }

    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn set_pinned(&self, id: CommentId, actor: &User, pinned: bool) -> Result<Comment, DomainError> {
        debug!("Sending request");
        let action = CommentAction::SetPinned {
            actor: actor.clone(),
            pinned,
        };
        match self.act(id, action).await? {
            CommentActionResult::SetPinned(comment) => Ok(comment),
            _ => Err(mismatched("SetPinned")),
        }
    }

    pub async fn pin(&self, id: CommentId, actor: &User) -> Result<Comment, DomainError> {
        self.set_pinned(id, actor, true).await
    }

    pub async fn unpin(&self, id: CommentId, actor: &User) -> Result<Comment, DomainError> {
        self.set_pinned(id, actor, false).await
    }

    #[instrument(skip(self, actor), fields(actor = %actor.id, step = step.name()))]
    pub async fn moderate(
        &self,
        id: CommentId,
        actor: &User,
        step: CommentModeration,
    ) -> Result<Comment, DomainError> {
        debug!("Sending request");
        let action = CommentAction::Moderate {
            actor: actor.clone(),
            step,
        };
        match self.act(id, action).await? {
            CommentActionResult::Moderate(comment) => Ok(comment),
            _ => Err(mismatched("Moderate")),
        }
    }

    pub async fn approve(&self, id: CommentId, actor: &User) -> Result<Comment, DomainError> {
        self.moderate(id, actor, CommentModeration::Approve).await
    }

    pub async fn reject(
        &self,
        id: CommentId,
        actor: &User,
        reason: impl Into<String>,
    ) -> Result<Comment, DomainError> {
        let step = CommentModeration::Reject {
            reason: reason.into(),
        };
        self.moderate(id, actor, step).await
    }

    pub async fn hide(
        &self,
        id: CommentId,
        actor: &User,
        reason: impl Into<String>,
    ) -> Result<Comment, DomainError> {
        let step = CommentModeration::Hide {
            reason: reason.into(),
        };
        self.moderate(id, actor, step).await
    }

    pub async fn restore(&self, id: CommentId, actor: &User) -> Result<Comment, DomainError> {
        self.moderate(id, actor, CommentModeration::Restore).await
    }

    /// Flags a comment for the moderators.
    #[instrument(skip(self, actor, details), fields(actor = %actor.id))]
    pub async fn report(
        &self,
        id: CommentId,
        actor: &User,
        reason: ReportReason,
        details: Option<String>,
    ) -> Result<(), DomainError> {
        debug!("Sending request");
        let action = CommentAction::Report {
            actor: actor.clone(),
            reason,
            details,
        };
        match self.act(id, action).await? {
            CommentActionResult::Report(()) => Ok(()),
            _ => Err(mismatched("Report")),
        }
    }

    /// Approved top-level comments of a resource with their approved replies.
    ///
    /// Threads are ordered pinned first, then newest; replies oldest first.
    #[instrument(skip(self, viewer), fields(viewer = ?viewer.map(|u| u.id)))]
    pub async fn thread(
        &self,
        resource_id: ResourceId,
        viewer: Option<&User>,
    ) -> Result<Vec<CommentThread>, DomainError> {
        debug!("Sending request");
        self.catalog.view(resource_id, viewer).await?;
        let approved = self
            .inner
            .list(CommentFilter {
                resource_id: Some(resource_id),
                status: Some(CommentStatus::Approved),
                ..Default::default()
            })
            .await?;

        let (mut tops, replies): (Vec<Comment>, Vec<Comment>) =
            approved.into_iter().partition(|c| !c.is_reply());
        let mut by_parent: BTreeMap<CommentId, Vec<Comment>> = BTreeMap::new();
        for reply in replies {
            if let Some(parent) = reply.parent_id {
                by_parent.entry(parent).or_default().push(reply);
            }
        }
        tops.sort_by(thread_order);

        Ok(tops
            .into_iter()
            .map(|comment| {
                let mut replies = by_parent.remove(&comment.id).unwrap_or_default();
                replies.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
                CommentThread {
                    reply_count: replies.len(),
                    comment,
                    replies,
                }
            })
            .collect())
    }

    /// An author's comments still waiting for approval.
    #[instrument(skip(self))]
    pub async fn pending_of(&self, author: UserId) -> Result<Vec<Comment>, DomainError> {
        debug!("Sending request");
        Ok(self
            .inner
            .list(CommentFilter {
                author_id: Some(author),
                status: Some(CommentStatus::Pending),
                ..Default::default()
            })
            .await?)
    }

    /// Every pending comment, oldest first.
    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn moderation_queue(&self, actor: &User) -> Result<Vec<Comment>, DomainError> {
        debug!("Sending request");
        if !access::can_moderate(actor) {
            return Err(DomainError::forbidden("Moderator role required"));
        }
        let mut pending = self
            .inner
            .list(CommentFilter {
                status: Some(CommentStatus::Pending),
                ..Default::default()
            })
            .await?;
        pending.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Resource, Role};
    use actor_framework::mock::{create_mock_client, expect_action, MockClient};
    use chrono::{Duration, Utc};
    use std::collections::BTreeSet;

    fn comment(id: u32, parent: Option<u32>, status: CommentStatus) -> Comment {
        Comment {
            id: CommentId(id),
            resource_id: ResourceId(1),
            parent_id: parent.map(CommentId),
            author_id: UserId(3),
            content: format!("comment {}", id),
            status,
            moderated_by: None,
            moderated_at: None,
            moderation_reason: None,
            is_pinned: false,
            likers: BTreeSet::new(),
            created_at: Utc::now() + Duration::seconds(id as i64),
            edited_at: None,
        }
    }

    fn offline_catalog() -> CatalogClient {
        let (client, _receiver) = create_mock_client::<Resource>(1);
        CatalogClient::new(client)
    }

    #[tokio::test]
    async fn test_delete_comment_cascades_to_replies() {
        let mut mock = MockClient::<Comment>::new();
        mock.expect_delete(CommentId(1)).return_ok(());
        mock.expect_list().return_ok(vec![
            comment(2, Some(1), CommentStatus::Approved),
            comment(3, Some(1), CommentStatus::Pending),
        ]);
        mock.expect_delete(CommentId(2)).return_ok(());
        mock.expect_delete(CommentId(3)).return_ok(());
        let comments = CommentClient::new(mock.client(), offline_catalog());
        let author = User::new(UserId(3), "au", Role::Citizen);

        let removed = comments.delete_comment(CommentId(1), &author).await.unwrap();
        assert_eq!(removed, 3);
        mock.verify();
    }

    #[tokio::test]
    async fn test_refused_delete_leaves_replies_alone() {
        let mut mock = MockClient::<Comment>::new();
        mock.expect_delete(CommentId(1))
            .return_err(FrameworkError::EntityError(Box::new(DomainError::forbidden(
                "Cannot delete this comment",
            ))));
        let comments = CommentClient::new(mock.client(), offline_catalog());
        let stranger = User::new(UserId(9), "st", Role::Citizen);

        let err = comments.delete_comment(CommentId(1), &stranger).await.unwrap_err();
        assert_eq!(err.status_code(), 403);
        mock.verify();
    }

    #[tokio::test]
    async fn test_moderation_queue_requires_moderator() {
        let mock = MockClient::<Comment>::new();
        let comments = CommentClient::new(mock.client(), offline_catalog());
        let citizen = User::new(UserId(1), "cy", Role::Citizen);

        let err = comments.moderation_queue(&citizen).await.unwrap_err();
        assert_eq!(err, DomainError::forbidden("Moderator role required"));
    }

    #[tokio::test]
    async fn test_hide_sends_reason() {
        let (client, mut receiver) = create_mock_client::<Comment>(10);
        let comments = CommentClient::new(client, offline_catalog());
        let moderator = User::new(UserId(2), "mo", Role::Moderator);

        let task = tokio::spawn(async move { comments.hide(CommentId(4), &moderator, "spoilers").await });

        let (id, action, responder) = expect_action(&mut receiver)
            .await
            .expect("Expected Action request");
        assert_eq!(id, CommentId(4));
        match action {
            CommentAction::Moderate { step, .. } => assert_eq!(
                step,
                CommentModeration::Hide {
                    reason: "spoilers".into()
                }
            ),
            _ => panic!("Expected Moderate action"),
        }

        responder
            .send(Ok(CommentActionResult::Moderate(comment(4, None, CommentStatus::Hidden))))
            .unwrap();
        assert_eq!(task.await.unwrap().unwrap().status, CommentStatus::Hidden);
    }
}
