use super::User;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Type-safe identifier for taxonomy terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TermId(pub u32);

impl From<u32> for TermId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl Display for TermId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "term_{}", self.0)
    }
}

/// The three taxonomies a resource is classified by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermKind {
    /// One per resource.
    Category,
    /// One per resource (article, video, ...).
    ResourceType,
    /// At least one per resource (family, work, friendship, ...).
    RelationType,
}

impl TermKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TermKind::Category => "category",
            TermKind::ResourceType => "resource type",
            TermKind::RelationType => "relation type",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    pub id: TermId,
    pub kind: TermKind,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub sort_order: i32,
}

#[derive(Debug, Clone)]
pub struct TermCreate {
    pub actor: User,
    pub kind: TermKind,
    pub name: String,
    pub description: Option<String>,
    pub sort_order: i32,
}

#[derive(Debug, Clone)]
pub struct TermUpdate {
    pub actor: User,
    pub name: Option<String>,
    pub description: Option<String>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct TermDelete {
    pub actor: User,
    /// Resources still classified by the term, counted by the caller.
    pub(crate) resources: usize,
}

impl TermDelete {
    pub(crate) fn new(actor: User, resources: usize) -> Self {
        Self { actor, resources }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TermFilter {
    pub kind: Option<TermKind>,
    pub active_only: bool,
}
