//! # Activity Client
//!
//! Activities, their participants and their message board.

use super::{mismatched, CatalogClient};
use crate::access;
use crate::activity_actor::{
    ActivityAction, ActivityActionResult, ActivityStep, MessageOutcome, MessageStep,
    ParticipantOutcome, ParticipantStep,
};
use crate::error::DomainError;
use crate::model::{
    Activity, ActivityCreate, ActivityDelete, ActivityFilter, ActivityId, ActivityUpdate,
    Attachment, Conversation, InviteSummary, Message, MessageFilter, MessageId, MessageKind,
    MessageThread, Participant, ParticipantRole, ParticipantStatus, PinMode, ReactionMode,
    ResourceId, User, UserId,
};
use actor_framework::{ActorClient, FrameworkError, ResourceClient};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, instrument};

/// Client for interacting with the Activity actor.
#[derive(Clone)]
pub struct ActivityClient {
    inner: ResourceClient<Activity>,
    catalog: CatalogClient,
}

impl ActivityClient {
    pub fn new(inner: ResourceClient<Activity>, catalog: CatalogClient) -> Self {
        Self { inner, catalog }
    }
}

#[async_trait]
impl ActorClient<Activity> for ActivityClient {
    type Error = DomainError;

    fn inner(&self) -> &ResourceClient<Activity> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        DomainError::from(e)
    }
}

/// The participant row most participant steps answer with.
fn expect_row(outcome: ParticipantOutcome) -> Result<Participant, DomainError> {
    match outcome {
        ParticipantOutcome::Row(row) => Ok(row),
        _ => Err(mismatched("Participant")),
    }
}

fn expect_message(outcome: MessageOutcome) -> Result<Message, DomainError> {
    match outcome {
        MessageOutcome::Message(message) => Ok(message),
        _ => Err(mismatched("Message")),
    }
}

impl ActivityClient {
    /// Creates a draft activity around a resource the actor can see.
    #[instrument(skip(self, params), fields(actor = %params.actor.id, resource = %params.resource_id))]
    pub async fn create_activity(&self, params: ActivityCreate) -> Result<ActivityId, DomainError> {
        debug!("Sending request");
        self.catalog
            .view(params.resource_id, Some(&params.actor))
            .await?;
        Ok(self.inner.create(params).await?)
    }

    #[instrument(skip(self, update), fields(actor = %update.actor.id))]
    pub async fn update_activity(&self, id: ActivityId, update: ActivityUpdate) -> Result<Activity, DomainError> {
        debug!("Sending request");
        Ok(self.inner.update(id, update).await?)
    }

    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn delete_activity(&self, id: ActivityId, actor: &User) -> Result<(), DomainError> {
        debug!("Sending request");
        Ok(self
            .inner
            .delete(id, ActivityDelete::ByActor(actor.clone()))
            .await?)
    }

    /// Removes every activity of a deleted resource.
    #[instrument(skip(self))]
    pub async fn delete_for_resource(&self, resource_id: ResourceId) -> Result<usize, DomainError> {
        debug!("Sending request");
        let activities = self
            .inner
            .list(ActivityFilter {
                resource_id: Some(resource_id),
                ..Default::default()
            })
            .await?;
        for activity in &activities {
            self.inner
                .delete(activity.id, ActivityDelete::ResourceRemoved)
                .await?;
        }
        if !activities.is_empty() {
            info!(resource = %resource_id, removed = activities.len(), "Removed activities of deleted resource");
        }
        Ok(activities.len())
    }

    /// The activity, or `NotFound` when it does not exist or is private to `viewer`.
    #[instrument(skip(self, viewer), fields(viewer = ?viewer.map(|u| u.id)))]
    pub async fn view(&self, id: ActivityId, viewer: Option<&User>) -> Result<Activity, DomainError> {
        debug!("Sending request");
        match self.inner.get(id).await? {
            Some(activity) if access::can_view_activity(viewer, &activity) => Ok(activity),
            _ => Err(DomainError::not_found(id.to_string())),
        }
    }

    #[instrument(skip(self, viewer), fields(viewer = ?viewer.map(|u| u.id)))]
    pub async fn browse(
        &self,
        viewer: Option<&User>,
        filter: ActivityFilter,
    ) -> Result<Vec<Activity>, DomainError> {
        debug!("Sending request");
        let activities = self.inner.list(filter).await?;
        Ok(activities
            .into_iter()
            .filter(|a| access::can_view_activity(viewer, a))
            .collect())
    }

    async fn act(&self, id: ActivityId, action: ActivityAction) -> Result<ActivityActionResult, DomainError> {
        Ok(self.inner.perform_action(id, action).await?)
    }

    // ---------------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------------

    #[instrument(skip(self, actor), fields(actor = %actor.id, step = step.name()))]
    pub async fn transition(
        &self,
        id: ActivityId,
        actor: &User,
        step: ActivityStep,
    ) -> Result<Activity, DomainError> {
        debug!("Sending request");
        let action = ActivityAction::Transition {
            actor: actor.clone(),
            step,
        };
        match self.act(id, action).await? {
            ActivityActionResult::Transition(activity) => Ok(activity),
            _ => Err(mismatched("Transition")),
        }
    }

    pub async fn publish(&self, id: ActivityId, actor: &User) -> Result<Activity, DomainError> {
        self.transition(id, actor, ActivityStep::Publish).await
    }

    pub async fn start(&self, id: ActivityId, actor: &User) -> Result<Activity, DomainError> {
        self.transition(id, actor, ActivityStep::Start).await
    }

    pub async fn complete(
        &self,
        id: ActivityId,
        actor: &User,
        results: Option<Value>,
    ) -> Result<Activity, DomainError> {
        self.transition(id, actor, ActivityStep::Complete { results })
            .await
    }

    pub async fn cancel(&self, id: ActivityId, actor: &User) -> Result<Activity, DomainError> {
        self.transition(id, actor, ActivityStep::Cancel).await
    }

    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn regenerate_access_code(&self, id: ActivityId, actor: &User) -> Result<String, DomainError> {
        debug!("Sending request");
        let action = ActivityAction::RegenerateCode {
            actor: actor.clone(),
        };
        match self.act(id, action).await? {
            ActivityActionResult::RegenerateCode(code) => Ok(code),
            _ => Err(mismatched("RegenerateCode")),
        }
    }

    // ---------------------------------------------------------------------
    // Participants
    // ---------------------------------------------------------------------

    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn participant_step(
        &self,
        id: ActivityId,
        actor: &User,
        step: ParticipantStep,
    ) -> Result<ParticipantOutcome, DomainError> {
        debug!("Sending request");
        let action = ActivityAction::Participant {
            actor: actor.clone(),
            step,
        };
        match self.act(id, action).await? {
            ActivityActionResult::Participant(outcome) => Ok(outcome),
            _ => Err(mismatched("Participant")),
        }
    }

    pub async fn join(
        &self,
        id: ActivityId,
        actor: &User,
        access_code: Option<String>,
    ) -> Result<Participant, DomainError> {
        expect_row(
            self.participant_step(id, actor, ParticipantStep::Join { access_code })
                .await?,
        )
    }

    /// Invites a batch of users. Users that already hold a row are reported, not re-invited.
    pub async fn invite(
        &self,
        id: ActivityId,
        actor: &User,
        users: Vec<UserId>,
    ) -> Result<InviteSummary, DomainError> {
        self.invite_as(id, actor, users, ParticipantRole::Participant).await
    }

    /// Like [`invite`](Self::invite), with the role the invited rows get.
    /// Only the activity manager may invite facilitators.
    pub async fn invite_as(
        &self,
        id: ActivityId,
        actor: &User,
        users: Vec<UserId>,
        role: ParticipantRole,
    ) -> Result<InviteSummary, DomainError> {
        let step = ParticipantStep::Invite {
            users,
            role: Some(role),
        };
        match self.participant_step(id, actor, step).await? {
            ParticipantOutcome::Invited(summary) => Ok(summary),
            _ => Err(mismatched("Invite")),
        }
    }

    pub async fn accept(&self, id: ActivityId, actor: &User) -> Result<Participant, DomainError> {
        expect_row(self.participant_step(id, actor, ParticipantStep::Accept).await?)
    }

    pub async fn decline(&self, id: ActivityId, actor: &User) -> Result<Participant, DomainError> {
        expect_row(self.participant_step(id, actor, ParticipantStep::Decline).await?)
    }

    pub async fn participate(&self, id: ActivityId, actor: &User) -> Result<Participant, DomainError> {
        expect_row(
            self.participant_step(id, actor, ParticipantStep::Participate)
                .await?,
        )
    }

    pub async fn leave(&self, id: ActivityId, actor: &User) -> Result<Participant, DomainError> {
        expect_row(self.participant_step(id, actor, ParticipantStep::Leave).await?)
    }

    pub async fn complete_participation(
        &self,
        id: ActivityId,
        actor: &User,
        user: UserId,
        score: Option<f64>,
        data: Option<Value>,
    ) -> Result<Participant, DomainError> {
        let step = ParticipantStep::Complete { user, score, data };
        expect_row(self.participant_step(id, actor, step).await?)
    }

    pub async fn update_participant(
        &self,
        id: ActivityId,
        actor: &User,
        user: UserId,
        role: Option<ParticipantRole>,
        status: Option<ParticipantStatus>,
    ) -> Result<Participant, DomainError> {
        let step = ParticipantStep::Update {
            user,
            role,
            status,
            score: None,
        };
        expect_row(self.participant_step(id, actor, step).await?)
    }

    pub async fn remove_participant(&self, id: ActivityId, actor: &User, user: UserId) -> Result<(), DomainError> {
        match self
            .participant_step(id, actor, ParticipantStep::Remove { user })
            .await?
        {
            ParticipantOutcome::Removed(_) => Ok(()),
            _ => Err(mismatched("Remove")),
        }
    }

    pub async fn promote(&self, id: ActivityId, actor: &User, user: UserId) -> Result<Participant, DomainError> {
        expect_row(
            self.participant_step(id, actor, ParticipantStep::Promote { user })
                .await?,
        )
    }

    pub async fn demote(&self, id: ActivityId, actor: &User, user: UserId) -> Result<Participant, DomainError> {
        expect_row(
            self.participant_step(id, actor, ParticipantStep::Demote { user })
                .await?,
        )
    }

    pub async fn add_session_time(
        &self,
        id: ActivityId,
        actor: &User,
        minutes: u32,
    ) -> Result<Participant, DomainError> {
        let step = ParticipantStep::AddSessionTime { minutes };
        expect_row(self.participant_step(id, actor, step).await?)
    }

    pub async fn rate(
        &self,
        id: ActivityId,
        actor: &User,
        rating: u8,
        feedback: Option<String>,
    ) -> Result<Participant, DomainError> {
        let step = ParticipantStep::Rate { rating, feedback };
        expect_row(self.participant_step(id, actor, step).await?)
    }

    /// Participant rows of an activity `viewer` can see, by user id.
    pub async fn participants(&self, id: ActivityId, viewer: Option<&User>) -> Result<Vec<Participant>, DomainError> {
        let activity = self.view(id, viewer).await?;
        Ok(activity.participants.into_values().collect())
    }

    // ---------------------------------------------------------------------
    // Messages
    // ---------------------------------------------------------------------

    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn message_step(
        &self,
        id: ActivityId,
        actor: &User,
        step: MessageStep,
    ) -> Result<MessageOutcome, DomainError> {
        debug!("Sending request");
        let action = ActivityAction::Message {
            actor: actor.clone(),
            step,
        };
        match self.act(id, action).await? {
            ActivityActionResult::Message(outcome) => Ok(outcome),
            _ => Err(mismatched("Message")),
        }
    }

    /// Posts a public text message or announcement.
    pub async fn post_message(
        &self,
        id: ActivityId,
        actor: &User,
        kind: MessageKind,
        content: impl Into<String>,
        parent_id: Option<MessageId>,
        attachments: Vec<Attachment>,
    ) -> Result<Message, DomainError> {
        let step = MessageStep::Post {
            kind,
            content: content.into(),
            parent_id,
            attachments,
        };
        expect_message(self.message_step(id, actor, step).await?)
    }

    pub async fn send_private(
        &self,
        id: ActivityId,
        actor: &User,
        recipient: UserId,
        content: impl Into<String>,
    ) -> Result<Message, DomainError> {
        let step = MessageStep::SendPrivate {
            recipient,
            content: content.into(),
            attachments: Vec::new(),
        };
        expect_message(self.message_step(id, actor, step).await?)
    }

    pub async fn edit_message(
        &self,
        id: ActivityId,
        actor: &User,
        message_id: MessageId,
        content: impl Into<String>,
    ) -> Result<Message, DomainError> {
        let step = MessageStep::Edit {
            message_id,
            content: content.into(),
        };
        expect_message(self.message_step(id, actor, step).await?)
    }

    /// Deletes a message and its replies, returning how many were removed.
    pub async fn delete_message(&self, id: ActivityId, actor: &User, message_id: MessageId) -> Result<usize, DomainError> {
        match self
            .message_step(id, actor, MessageStep::Delete { message_id })
            .await?
        {
            MessageOutcome::Deleted(count) => Ok(count),
            _ => Err(mismatched("Delete")),
        }
    }

    pub async fn pin_message(
        &self,
        id: ActivityId,
        actor: &User,
        message_id: MessageId,
        mode: PinMode,
    ) -> Result<Message, DomainError> {
        let step = MessageStep::Pin { message_id, mode };
        expect_message(self.message_step(id, actor, step).await?)
    }

    pub async fn react(
        &self,
        id: ActivityId,
        actor: &User,
        message_id: MessageId,
        emoji: impl Into<String>,
        mode: ReactionMode,
    ) -> Result<Message, DomainError> {
        let step = MessageStep::React {
            message_id,
            emoji: emoji.into(),
            mode,
        };
        expect_message(self.message_step(id, actor, step).await?)
    }

    pub async fn mark_read(&self, id: ActivityId, actor: &User, message_id: MessageId) -> Result<Message, DomainError> {
        expect_message(
            self.message_step(id, actor, MessageStep::MarkRead { message_id })
                .await?,
        )
    }

    /// The actor's private messages, oldest first.
    pub async fn private_messages(
        &self,
        id: ActivityId,
        actor: &User,
        correspondent: Option<UserId>,
        mark_as_read: bool,
    ) -> Result<Vec<Message>, DomainError> {
        let step = MessageStep::ReadPrivate {
            correspondent,
            mark_as_read,
        };
        match self.message_step(id, actor, step).await? {
            MessageOutcome::Private(messages) => Ok(messages),
            _ => Err(mismatched("ReadPrivate")),
        }
    }

    async fn readable(&self, id: ActivityId, actor: &User) -> Result<Activity, DomainError> {
        let activity = self.view(id, Some(actor)).await?;
        if !activity.can_message(actor) {
            return Err(DomainError::forbidden(
                "Only participants can use the activity messages",
            ));
        }
        Ok(activity)
    }

    /// Public threads, newest first.
    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn public_messages(
        &self,
        id: ActivityId,
        actor: &User,
        filter: MessageFilter,
    ) -> Result<Vec<MessageThread>, DomainError> {
        debug!("Sending request");
        Ok(self.readable(id, actor).await?.public_threads(&filter))
    }

    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn conversations(&self, id: ActivityId, actor: &User) -> Result<Vec<Conversation>, DomainError> {
        debug!("Sending request");
        Ok(self.readable(id, actor).await?.conversations(actor.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ActivityStatus, Resource, Role};
    use actor_framework::mock::{create_mock_client, expect_action, MockClient};

    fn offline_catalog() -> CatalogClient {
        let (client, _receiver) = create_mock_client::<Resource>(1);
        CatalogClient::new(client)
    }

    #[tokio::test]
    async fn test_invite_sends_user_batch() {
        let (client, mut receiver) = create_mock_client::<Activity>(10);
        let activities = ActivityClient::new(client, offline_catalog());
        let owner = User::new(UserId(1), "host", Role::Citizen);

        let task = tokio::spawn(async move {
            activities
                .invite(ActivityId(3), &owner, vec![UserId(2), UserId(3)])
                .await
        });

        let (id, action, responder) = expect_action(&mut receiver)
            .await
            .expect("Expected Action request");
        assert_eq!(id, ActivityId(3));
        match action {
            ActivityAction::Participant {
                step: ParticipantStep::Invite { users, role },
                ..
            } => {
                assert_eq!(users, vec![UserId(2), UserId(3)]);
                assert_eq!(role, Some(ParticipantRole::Participant));
            }
            _ => panic!("Expected Invite step"),
        }

        let summary = InviteSummary {
            invited: vec![UserId(2)],
            already_participating: vec![UserId(3)],
            errors: Vec::new(),
        };
        responder
            .send(Ok(ActivityActionResult::Participant(ParticipantOutcome::Invited(
                summary.clone(),
            ))))
            .unwrap();

        assert_eq!(task.await.unwrap().unwrap(), summary);
    }

    #[tokio::test]
    async fn test_activity_full_reaches_the_caller() {
        let mut mock = MockClient::<Activity>::new();
        mock.expect_action(ActivityId(1))
            .return_err(FrameworkError::EntityError(Box::new(DomainError::ActivityFull {
                max: 2,
            })));
        let activities = ActivityClient::new(mock.client(), offline_catalog());
        let guest = User::new(UserId(4), "guest", Role::Citizen);

        let err = activities.join(ActivityId(1), &guest, None).await.unwrap_err();
        assert_eq!(err.to_string(), "activity is full (max 2 participants)");
    }

    #[tokio::test]
    async fn test_private_activity_is_hidden_from_strangers() {
        let mut private = Activity::fixture(UserId(1), ActivityStatus::Open, 4);
        private.is_private = true;
        let mut mock = MockClient::<Activity>::new();
        mock.expect_get(ActivityId(1)).return_ok(Some(private.clone()));
        mock.expect_get(ActivityId(1)).return_ok(Some(private));
        let activities = ActivityClient::new(mock.client(), offline_catalog());

        let stranger = User::new(UserId(9), "st", Role::Citizen);
        let err = activities.view(ActivityId(1), Some(&stranger)).await.unwrap_err();
        assert_eq!(err, DomainError::not_found("activity_1"));

        let owner = User::new(UserId(1), "host", Role::Citizen);
        assert!(activities.view(ActivityId(1), Some(&owner)).await.is_ok());
        mock.verify();
    }
}
