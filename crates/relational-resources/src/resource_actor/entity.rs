//! Entity trait implementation for the Resource domain type.
//!
//! Creation and updates validate their fields locally and their taxonomy references through
//! the [`TaxonomyClient`] in the actor context.

use super::actions::{
    FavoriteState, FavoriteStep, ProgressStep, ResourceAction, ResourceActionResult,
};
use super::lifecycle;
use crate::access;
use crate::clients::TaxonomyClient;
use crate::codes;
use crate::config::PlatformConfig;
use crate::error::{DomainError, Validator};
use crate::model::{
    Progression, ProgressionStatus, RatingSummary, Resource, ResourceCreate, ResourceDelete,
    ResourceFilter, ResourceId, ResourceStatus, ResourceUpdate, TermKind, User,
};
use actor_framework::ActorEntity;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

pub const MAX_TITLE_CHARS: usize = 255;
pub const MAX_DESCRIPTION_CHARS: usize = 1000;
pub const MAX_TAG_CHARS: usize = 50;
pub const MAX_DURATION_MINUTES: u32 = 600;

/// Field rules shared by create and update. `None` means "not being set".
struct Fields<'a> {
    title: Option<&'a str>,
    description: Option<&'a str>,
    duration_minutes: Option<u32>,
    tags: Option<&'a [String]>,
    relation_type_count: Option<usize>,
    external_url: Option<&'a str>,
}

impl Fields<'_> {
    fn validate(&self) -> Result<(), DomainError> {
        let mut v = Validator::new();
        if let Some(title) = self.title {
            v.length("title", title, 1, MAX_TITLE_CHARS);
        }
        if let Some(description) = self.description {
            v.length("description", description, 1, MAX_DESCRIPTION_CHARS);
        }
        if let Some(minutes) = self.duration_minutes {
            v.check(
                (1..=MAX_DURATION_MINUTES).contains(&minutes),
                "duration",
                format!("must be between 1 and {} minutes", MAX_DURATION_MINUTES),
            );
        }
        if let Some(tags) = self.tags {
            v.check(
                tags.iter().all(|t| t.chars().count() <= MAX_TAG_CHARS),
                "tags",
                format!("each tag must be at most {} characters", MAX_TAG_CHARS),
            );
        }
        if let Some(count) = self.relation_type_count {
            v.check(count >= 1, "relation_type_ids", "at least one relation type is required");
        }
        if let Some(url) = self.external_url {
            v.check(
                url.starts_with("http://") || url.starts_with("https://"),
                "external_url",
                "must be an http(s) URL",
            );
        }
        v.finish()
    }
}

fn not_visible(resource: &Resource) -> DomainError {
    DomainError::not_found(resource.id.to_string())
}

impl Resource {
    fn ensure_visible_to(&self, actor: Option<&User>) -> Result<(), DomainError> {
        if access::can_view(actor, self) {
            Ok(())
        } else {
            Err(not_visible(self))
        }
    }

    fn favorite_state(&self, user: &User) -> FavoriteState {
        FavoriteState {
            is_favorite: self.is_favorite_of(user.id),
            favorite_count: self.favorite_count,
            favorited_at: self.favorites.get(&user.id).copied(),
        }
    }

    fn apply_favorite(
        &mut self,
        actor: &User,
        step: FavoriteStep,
        now: DateTime<Utc>,
    ) -> Result<FavoriteState, DomainError> {
        if step != FavoriteStep::Remove {
            self.ensure_visible_to(Some(actor))?;
        }
        match step {
            FavoriteStep::Check => {}
            FavoriteStep::Toggle => {
                if self.favorites.remove(&actor.id).is_none() {
                    self.favorites.insert(actor.id, now);
                }
            }
            FavoriteStep::Add => {
                if self.favorites.contains_key(&actor.id) {
                    return Err(DomainError::conflict("Resource already in favorites"));
                }
                self.favorites.insert(actor.id, now);
            }
            FavoriteStep::Remove => {
                if self.favorites.remove(&actor.id).is_none() {
                    return Err(DomainError::not_found("favorite"));
                }
            }
        }
        self.recount_favorites();
        Ok(self.favorite_state(actor))
    }

    fn apply_progress(
        &mut self,
        actor: &User,
        step: ProgressStep,
        config: &PlatformConfig,
        now: DateTime<Utc>,
    ) -> Result<Progression, DomainError> {
        self.ensure_visible_to(Some(actor))?;

        let needs_existing = matches!(
            step,
            ProgressStep::Pause | ProgressStep::UpdateProgress { .. } | ProgressStep::Rate { .. }
        );
        if needs_existing && !self.progressions.contains_key(&actor.id) {
            return Err(DomainError::not_found("progression"));
        }
        let progression = self
            .progressions
            .entry(actor.id)
            .or_insert_with(|| Progression::new(actor.id, now));

        match step {
            ProgressStep::Upsert {
                status,
                percentage,
                notes,
                data,
            } => {
                if let Some(pct) = percentage {
                    progression.update_progress(pct, now);
                }
                if let Some(status) = status {
                    progression.set_status(status, now);
                }
                if notes.is_some() {
                    progression.notes = notes;
                }
                if data.is_some() {
                    progression.data = data;
                }
            }
            ProgressStep::Start => progression.start(now),
            ProgressStep::Bookmark => progression.bookmark(now),
            ProgressStep::Pause => progression.pause(now)?,
            ProgressStep::Complete {
                rating,
                review,
                data,
            } => {
                if let Some(rating) = rating {
                    progression.rate(rating, review)?;
                }
                if data.is_some() {
                    progression.data = data;
                }
                progression.complete(now);
            }
            ProgressStep::UpdateProgress { percentage, data } => {
                progression.update_progress(percentage, now);
                if data.is_some() {
                    progression.data = data;
                }
            }
            ProgressStep::AddTime { minutes } => {
                if !(1..=config.max_progress_minutes).contains(&minutes) {
                    return Err(DomainError::invalid(
                        "minutes",
                        format!("must be between 1 and {}", config.max_progress_minutes),
                    ));
                }
                if progression.status == ProgressionStatus::NotStarted {
                    progression.start(now);
                }
                progression.add_time(minutes, now);
            }
            ProgressStep::Rate { rating, review } => progression.rate(rating, review)?,
        }

        let snapshot = progression.clone();
        self.recompute_rating();
        Ok(snapshot)
    }
}

#[async_trait]
impl ActorEntity for Resource {
    type Id = ResourceId;
    type Create = ResourceCreate;
    type Update = ResourceUpdate;
    type Delete = ResourceDelete;
    type Filter = ResourceFilter;
    type Action = ResourceAction;
    type ActionResult = ResourceActionResult;
    type Context = (TaxonomyClient, Arc<PlatformConfig>);
    type Error = DomainError;

    fn from_create_params(id: ResourceId, params: ResourceCreate) -> Result<Self, Self::Error> {
        Fields {
            title: Some(&params.title),
            description: Some(&params.description),
            duration_minutes: params.duration_minutes,
            tags: Some(params.tags.as_slice()),
            relation_type_count: Some(params.relation_type_ids.len()),
            external_url: params.external_url.as_deref(),
        }
        .validate()?;

        let actor = &params.actor;
        let status = match params.status {
            Some(status) if actor.is_admin() => status,
            _ => ResourceStatus::Draft,
        };
        if matches!(status, ResourceStatus::Rejected | ResourceStatus::Suspended) {
            return Err(DomainError::invalid(
                "status",
                "a resource cannot be created rejected or suspended",
            ));
        }

        let now = Utc::now();
        let published = status == ResourceStatus::Published;
        Ok(Self {
            id,
            title: params.title.trim().to_string(),
            slug: codes::slugify(&params.title),
            description: params.description.trim().to_string(),
            content: params.content,
            category_id: params.category_id,
            resource_type_id: params.resource_type_id,
            relation_type_ids: params.relation_type_ids,
            owner_id: actor.id,
            visibility: params.visibility,
            status,
            difficulty: params.difficulty,
            duration_minutes: params.duration_minutes,
            tags: params.tags,
            external_url: params.external_url,
            attachment: params.attachment,
            validated_by: published.then_some(actor.id),
            validated_at: published.then_some(now),
            moderation_reason: None,
            published_at: published.then_some(now),
            last_viewed_at: None,
            view_count: 0,
            download_count: 0,
            favorite_count: 0,
            rating: RatingSummary::default(),
            favorites: BTreeMap::new(),
            progressions: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        })
    }

    fn matches(&self, filter: &ResourceFilter) -> bool {
        filter.owner_id.map_or(true, |owner| self.owner_id == owner)
            && filter.status.map_or(true, |status| self.status == status)
            && filter
                .category_id
                .map_or(true, |category| self.category_id == category)
            && filter
                .classified_by
                .map_or(true, |term| self.is_classified_by(term))
            && filter
                .favorited_by
                .map_or(true, |user| self.is_favorite_of(user))
            && filter
                .tag
                .as_ref()
                .map_or(true, |tag| self.tags.iter().any(|t| t == tag))
            && filter
                .audience
                .as_ref()
                .map_or(true, |audience| access::can_view(audience.actor(), self))
    }

    /// Checks the taxonomy references and gives the resource its unique slug.
    async fn on_create(&mut self, ctx: &Self::Context) -> Result<(), Self::Error> {
        let (taxonomy, config) = ctx;
        taxonomy
            .validate_classification(
                self.category_id,
                self.resource_type_id,
                &self.relation_type_ids,
            )
            .await?;
        self.slug = codes::unique_slug(&self.title, config.slug_suffix_length);
        Ok(())
    }

    async fn on_update(
        &mut self,
        update: ResourceUpdate,
        ctx: &Self::Context,
    ) -> Result<(), Self::Error> {
        let (taxonomy, config) = ctx;
        if !access::can_edit(&update.actor, self) {
            return Err(DomainError::forbidden("Cannot edit this resource"));
        }
        Fields {
            title: update.title.as_deref(),
            description: update.description.as_deref(),
            duration_minutes: update.duration_minutes,
            tags: update.tags.as_deref(),
            relation_type_count: update.relation_type_ids.as_ref().map(Vec::len),
            external_url: update.external_url.as_deref(),
        }
        .validate()?;

        let reclassified = update.category_id.is_some()
            || update.resource_type_id.is_some()
            || update.relation_type_ids.is_some();
        if let Some(category_id) = update.category_id {
            self.category_id = category_id;
        }
        if let Some(resource_type_id) = update.resource_type_id {
            self.resource_type_id = resource_type_id;
        }
        if let Some(relation_type_ids) = update.relation_type_ids {
            self.relation_type_ids = relation_type_ids;
        }
        if reclassified {
            taxonomy
                .validate_classification(
                    self.category_id,
                    self.resource_type_id,
                    &self.relation_type_ids,
                )
                .await?;
        }

        if let Some(title) = update.title {
            let title = title.trim().to_string();
            if title != self.title {
                self.slug = codes::unique_slug(&title, config.slug_suffix_length);
                self.title = title;
            }
        }
        if let Some(description) = update.description {
            self.description = description.trim().to_string();
        }
        if update.content.is_some() {
            self.content = update.content;
        }
        if let Some(visibility) = update.visibility {
            self.visibility = visibility;
        }
        if let Some(difficulty) = update.difficulty {
            self.difficulty = difficulty;
        }
        if update.duration_minutes.is_some() {
            self.duration_minutes = update.duration_minutes;
        }
        if let Some(tags) = update.tags {
            self.tags = tags;
        }
        if update.external_url.is_some() {
            self.external_url = update.external_url;
        }
        if update.attachment.is_some() {
            self.attachment = update.attachment;
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    async fn on_delete(&self, params: ResourceDelete, _ctx: &Self::Context) -> Result<(), Self::Error> {
        if access::can_delete(&params.actor, self) {
            Ok(())
        } else {
            Err(DomainError::forbidden("Cannot delete this resource"))
        }
    }

    async fn handle_action(
        &mut self,
        action: ResourceAction,
        ctx: &Self::Context,
    ) -> Result<ResourceActionResult, Self::Error> {
        let (taxonomy, config) = ctx;
        let now = Utc::now();

        match action {
            ResourceAction::Moderate { actor, step } => {
                let from = self.status;
                let name = step.name();
                if let Err(e) = lifecycle::moderate(self, &actor, step, now) {
                    warn!(resource = %self.id, step = name, by = %actor.id, error = %e, "Moderation refused");
                    return Err(e);
                }
                info!(resource = %self.id, step = name, %from, to = %self.status, by = %actor.id, "Moderated");
                Ok(ResourceActionResult::Moderate(self.clone()))
            }
            ResourceAction::RecordView { actor } => {
                self.ensure_visible_to(actor.as_ref())?;
                self.view_count += 1;
                self.last_viewed_at = Some(now);
                Ok(ResourceActionResult::RecordView(self.clone()))
            }
            ResourceAction::RecordDownload { actor } => {
                self.ensure_visible_to(actor.as_ref())?;
                let attachment = self
                    .attachment
                    .clone()
                    .ok_or_else(|| DomainError::not_found("attachment"))?;
                self.download_count += 1;
                Ok(ResourceActionResult::RecordDownload(attachment))
            }
            ResourceAction::ChangeCategory { actor, category_id } => {
                if !actor.is_admin() {
                    return Err(DomainError::forbidden("Administrator role required"));
                }
                taxonomy.require_active(category_id, TermKind::Category).await?;
                self.category_id = category_id;
                self.updated_at = now;
                Ok(ResourceActionResult::ChangeCategory(self.clone()))
            }
            ResourceAction::ChangeVisibility { actor, visibility } => {
                if !actor.is_admin() {
                    return Err(DomainError::forbidden("Administrator role required"));
                }
                self.visibility = visibility;
                self.updated_at = now;
                Ok(ResourceActionResult::ChangeVisibility(self.clone()))
            }
            ResourceAction::Favorite { actor, step } => self
                .apply_favorite(&actor, step, now)
                .map(ResourceActionResult::Favorite),
            ResourceAction::Progress { actor, step } => self
                .apply_progress(&actor, step, config, now)
                .map(ResourceActionResult::Progress),
        }
    }
}
