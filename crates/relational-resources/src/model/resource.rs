use super::{Progression, TermId, User, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;

/// Type-safe identifier for Resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceId(pub u32);

impl From<u32> for ResourceId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "resource_{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Private,
    /// Visible to any signed-in user once published.
    Shared,
    Public,
}

/// Moderation status of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    #[default]
    Draft,
    Pending,
    Published,
    Rejected,
    Suspended,
}

impl ResourceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceStatus::Draft => "draft",
            ResourceStatus::Pending => "pending",
            ResourceStatus::Published => "published",
            ResourceStatus::Rejected => "rejected",
            ResourceStatus::Suspended => "suspended",
        }
    }
}

impl Display for ResourceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

/// Metadata of an uploaded file. The bytes themselves live elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RatingSummary {
    /// Rounded to 2 decimals.
    pub average: f64,
    pub count: u32,
}

impl RatingSummary {
    pub fn from_ratings(ratings: impl IntoIterator<Item = u8>) -> Self {
        let (sum, count) = ratings
            .into_iter()
            .fold((0u32, 0u32), |(sum, count), r| (sum + u32::from(r), count + 1));
        if count == 0 {
            return Self::default();
        }
        let average = (f64::from(sum) / f64::from(count) * 100.0).round() / 100.0;
        Self { average, count }
    }
}

/// A piece of educational content and everything attached to it per user.
///
/// # Actor Framework
/// Managed by the resource actor. Favorites and progressions are child rows of this
/// aggregate, so `favorite_count` and `rating` change in the same message as the rows they
/// are derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub content: Option<String>,
    pub category_id: TermId,
    pub resource_type_id: TermId,
    pub relation_type_ids: Vec<TermId>,
    pub owner_id: UserId,
    pub visibility: Visibility,
    pub status: ResourceStatus,
    pub difficulty: Difficulty,
    pub duration_minutes: Option<u32>,
    pub tags: Vec<String>,
    pub external_url: Option<String>,
    pub attachment: Option<Attachment>,

    pub validated_by: Option<UserId>,
    pub validated_at: Option<DateTime<Utc>>,
    pub moderation_reason: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub last_viewed_at: Option<DateTime<Utc>>,

    pub view_count: u64,
    pub download_count: u64,
    pub favorite_count: u32,
    pub rating: RatingSummary,

    pub favorites: BTreeMap<UserId, DateTime<Utc>>,
    pub progressions: BTreeMap<UserId, Progression>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource {
    pub fn is_publicly_visible(&self) -> bool {
        self.visibility == Visibility::Public && self.status == ResourceStatus::Published
    }

    pub fn is_classified_by(&self, term: TermId) -> bool {
        self.category_id == term
            || self.resource_type_id == term
            || self.relation_type_ids.contains(&term)
    }

    pub fn is_favorite_of(&self, user: UserId) -> bool {
        self.favorites.contains_key(&user)
    }

    pub(crate) fn recount_favorites(&mut self) {
        self.favorite_count = self.favorites.len() as u32;
    }

    pub(crate) fn recompute_rating(&mut self) {
        self.rating = RatingSummary::from_ratings(self.progressions.values().filter_map(|p| p.rating));
    }
}

/// Payload for creating a resource.
///
/// Non-administrators always create drafts; `status` is honored only for administrators.
#[derive(Debug, Clone)]
pub struct ResourceCreate {
    pub actor: User,
    pub title: String,
    pub description: String,
    pub content: Option<String>,
    pub category_id: TermId,
    pub resource_type_id: TermId,
    pub relation_type_ids: Vec<TermId>,
    pub visibility: Visibility,
    pub difficulty: Difficulty,
    pub duration_minutes: Option<u32>,
    pub tags: Vec<String>,
    pub external_url: Option<String>,
    pub attachment: Option<Attachment>,
    pub status: Option<ResourceStatus>,
}

impl ResourceCreate {
    /// A minimal private payload; adjust the public fields as needed.
    pub fn draft(
        actor: User,
        title: impl Into<String>,
        category_id: TermId,
        resource_type_id: TermId,
        relation_type_ids: Vec<TermId>,
    ) -> Self {
        let title = title.into();
        Self {
            actor,
            description: format!("About {}", title),
            title,
            content: None,
            category_id,
            resource_type_id,
            relation_type_ids,
            visibility: Visibility::default(),
            difficulty: Difficulty::Beginner,
            duration_minutes: None,
            tags: Vec::new(),
            external_url: None,
            attachment: None,
            status: None,
        }
    }
}

/// Field changes; `None` leaves a field untouched.
#[derive(Debug, Clone)]
pub struct ResourceUpdate {
    pub actor: User,
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub category_id: Option<TermId>,
    pub resource_type_id: Option<TermId>,
    pub relation_type_ids: Option<Vec<TermId>>,
    pub visibility: Option<Visibility>,
    pub difficulty: Option<Difficulty>,
    pub duration_minutes: Option<u32>,
    pub tags: Option<Vec<String>>,
    pub external_url: Option<String>,
    pub attachment: Option<Attachment>,
}

impl ResourceUpdate {
    pub fn by(actor: User) -> Self {
        Self {
            actor,
            title: None,
            description: None,
            content: None,
            category_id: None,
            resource_type_id: None,
            relation_type_ids: None,
            visibility: None,
            difficulty: None,
            duration_minutes: None,
            tags: None,
            external_url: None,
            attachment: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResourceDelete {
    pub actor: User,
}

/// Who is looking, for listings that must respect visibility.
#[derive(Debug, Clone)]
pub enum Audience {
    Anonymous,
    Member(User),
}

impl Audience {
    pub fn actor(&self) -> Option<&User> {
        match self {
            Audience::Anonymous => None,
            Audience::Member(user) => Some(user),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResourceFilter {
    pub owner_id: Option<UserId>,
    pub status: Option<ResourceStatus>,
    pub category_id: Option<TermId>,
    /// Category, resource type or relation type.
    pub classified_by: Option<TermId>,
    pub favorited_by: Option<UserId>,
    pub tag: Option<String>,
    /// Only what this audience may view.
    pub audience: Option<Audience>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Role;
    use actor_framework::ActorEntity;

    #[test]
    fn test_classified_by_any_slot() {
        let owner = User::new(UserId(1), "una", Role::Citizen);
        let params = ResourceCreate::draft(owner, "Small talk", TermId(1), TermId(2), vec![TermId(3), TermId(4)]);
        let resource = Resource::from_create_params(ResourceId(1), params).unwrap();

        for term in 1..=4 {
            assert!(resource.is_classified_by(TermId(term)));
        }
        assert!(!resource.is_classified_by(TermId(5)));
    }

    #[test]
    fn test_rating_summary_rounds_to_two_decimals() {
        let summary = RatingSummary::from_ratings([5, 4, 4]);
        assert_eq!(summary.count, 3);
        assert_eq!(summary.average, 4.33);
        assert_eq!(RatingSummary::from_ratings([]), RatingSummary::default());
    }
}
