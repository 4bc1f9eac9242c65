//! Entity trait implementation for the Activity domain type.

use super::actions::{ActivityAction, ActivityActionResult};
use super::lifecycle::{self, invalid_transition};
use crate::access;
use crate::clients::CatalogClient;
use crate::codes;
use crate::config::PlatformConfig;
use crate::error::{DomainError, Validator};
use crate::model::{
    Activity, ActivityCreate, ActivityDelete, ActivityFilter, ActivityId, ActivityStatus,
    ActivityUpdate, Participant,
};
use actor_framework::{ActorClient, ActorEntity};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

pub const MAX_TITLE_CHARS: usize = 255;
pub const MAX_DESCRIPTION_CHARS: usize = 2000;

fn validate_text(title: Option<&str>, description: Option<&str>) -> Result<(), DomainError> {
    let mut v = Validator::new();
    if let Some(title) = title {
        v.length("title", title, 1, MAX_TITLE_CHARS);
    }
    if let Some(description) = description {
        v.length("description", description, 0, MAX_DESCRIPTION_CHARS);
    }
    v.finish()
}

fn validate_capacity(max: u32, participant_count: u32, config: &PlatformConfig) -> Result<(), DomainError> {
    let mut v = Validator::new();
    v.check(
        (config.min_participants..=config.max_participants).contains(&max),
        "max_participants",
        format!(
            "must be between {} and {}",
            config.min_participants, config.max_participants
        ),
    );
    v.check(
        max >= participant_count,
        "max_participants",
        format!("cannot be lower than the {} current participants", participant_count),
    );
    v.finish()
}

#[async_trait]
impl ActorEntity for Activity {
    type Id = ActivityId;
    type Create = ActivityCreate;
    type Update = ActivityUpdate;
    type Delete = ActivityDelete;
    type Filter = ActivityFilter;
    type Action = ActivityAction;
    type ActionResult = ActivityActionResult;
    type Context = (CatalogClient, Arc<PlatformConfig>);
    type Error = DomainError;

    /// A draft owned by the actor, with the owner's host row. Capacity defaults and the access
    /// code come from the configuration in [`on_create`](Self::on_create).
    fn from_create_params(id: ActivityId, params: ActivityCreate) -> Result<Self, Self::Error> {
        validate_text(Some(&params.title), params.description.as_deref())?;
        let now = Utc::now();
        let owner = params.actor.id;
        let mut participants = BTreeMap::new();
        participants.insert(owner, Participant::host(owner, now));
        Ok(Self {
            id,
            resource_id: params.resource_id,
            owner_id: owner,
            title: params.title.trim().to_string(),
            description: params.description,
            status: ActivityStatus::Draft,
            // 0 until on_create applies the configured default
            max_participants: params.max_participants.unwrap_or(0),
            participant_count: 0,
            is_private: params.is_private,
            access_code: String::new(),
            scheduled_at: params.scheduled_at,
            started_at: None,
            completed_at: None,
            results: None,
            participants,
            messages: BTreeMap::new(),
            next_message_id: 1,
            created_at: now,
            updated_at: now,
        })
    }

    fn matches(&self, filter: &ActivityFilter) -> bool {
        filter
            .resource_id
            .map_or(true, |resource| self.resource_id == resource)
            && filter.owner_id.map_or(true, |owner| self.owner_id == owner)
            && filter.status.map_or(true, |status| self.status == status)
            && filter
                .participant
                .map_or(true, |user| self.participants.contains_key(&user))
    }

    async fn on_create(&mut self, ctx: &Self::Context) -> Result<(), Self::Error> {
        let (catalog, config) = ctx;
        if self.max_participants == 0 {
            self.max_participants = config.default_max_participants;
        }
        validate_capacity(self.max_participants, 0, config)?;
        if catalog.get(self.resource_id).await?.is_none() {
            return Err(DomainError::not_found(self.resource_id.to_string()));
        }
        self.access_code = codes::access_code(config.access_code_length);
        Ok(())
    }

    async fn on_update(&mut self, update: ActivityUpdate, ctx: &Self::Context) -> Result<(), Self::Error> {
        let (_, config) = ctx;
        if !access::can_manage_activity(&update.actor, self) {
            return Err(DomainError::forbidden("Only the activity manager can edit it"));
        }
        if matches!(
            self.status,
            ActivityStatus::InProgress | ActivityStatus::Completed | ActivityStatus::Cancelled
        ) {
            return Err(invalid_transition(self, "update"));
        }
        validate_text(update.title.as_deref(), update.description.as_deref())?;
        if let Some(max) = update.max_participants {
            validate_capacity(max, self.participant_count, config)?;
            self.max_participants = max;
        }
        if let Some(title) = update.title {
            self.title = title.trim().to_string();
        }
        if update.description.is_some() {
            self.description = update.description;
        }
        if let Some(is_private) = update.is_private {
            self.is_private = is_private;
        }
        if update.scheduled_at.is_some() {
            self.scheduled_at = update.scheduled_at;
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    async fn on_delete(&self, params: ActivityDelete, _ctx: &Self::Context) -> Result<(), Self::Error> {
        match params {
            ActivityDelete::ByActor(actor) => {
                if !access::can_manage_activity(&actor, self) {
                    return Err(DomainError::forbidden("Only the activity manager can delete it"));
                }
                if matches!(
                    self.status,
                    ActivityStatus::InProgress | ActivityStatus::Completed
                ) {
                    return Err(invalid_transition(self, "delete"));
                }
                Ok(())
            }
            ActivityDelete::ResourceRemoved => Ok(()),
        }
    }

    async fn handle_action(
        &mut self,
        action: ActivityAction,
        ctx: &Self::Context,
    ) -> Result<ActivityActionResult, Self::Error> {
        let (_, config) = ctx;
        let now = Utc::now();

        match action {
            ActivityAction::Transition { actor, step } => {
                lifecycle::transition(self, &actor, step, now)?;
                Ok(ActivityActionResult::Transition(self.clone()))
            }
            ActivityAction::RegenerateCode { actor } => {
                if !access::can_manage_activity(&actor, self) {
                    return Err(DomainError::forbidden(
                        "Only the activity manager can regenerate the access code",
                    ));
                }
                self.access_code = codes::access_code(config.access_code_length);
                self.updated_at = now;
                info!(activity = %self.id, by = %actor.id, "Access code regenerated");
                Ok(ActivityActionResult::RegenerateCode(self.access_code.clone()))
            }
            ActivityAction::Participant { actor, step } => self
                .apply_participant(&actor, step, config, now)
                .map(ActivityActionResult::Participant),
            ActivityAction::Message { actor, step } => self
                .apply_message(&actor, step, config, now)
                .map(ActivityActionResult::Message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ResourceId, Role, User, UserId};

    fn create(max: Option<u32>) -> ActivityCreate {
        ActivityCreate {
            actor: User::new(UserId(1), "host", Role::Citizen),
            resource_id: ResourceId(1),
            title: "Evening circle".into(),
            description: None,
            max_participants: max,
            is_private: false,
            scheduled_at: None,
        }
    }

    #[test]
    fn test_new_activity_is_a_draft_with_host_row() {
        let a = Activity::from_create_params(ActivityId(1), create(Some(4))).unwrap();
        assert_eq!(a.status, ActivityStatus::Draft);
        assert_eq!(a.participant_count, 0);
        let host = a.participant(UserId(1)).unwrap();
        assert!(host.is_facilitator());
        assert_eq!(host.status, crate::model::ParticipantStatus::Accepted);
    }

    #[test]
    fn test_capacity_bounds() {
        let config = PlatformConfig::default();
        assert!(validate_capacity(2, 0, &config).is_ok());
        assert!(validate_capacity(1, 0, &config).is_err());
        assert!(validate_capacity(51, 0, &config).is_err());
        assert!(validate_capacity(3, 4, &config).is_err());
    }
}
