#![allow(dead_code)]

use chrono::{Duration, Utc};
use relational_resources::config::PlatformConfig;
use relational_resources::lifecycle::Platform;
use relational_resources::model::{
    ActivityCreate, ActivityId, ResourceCreate, ResourceId, Role, TermCreate, TermId, TermKind,
    User, UserCreate, Visibility,
};

/// A running platform with a seeded administrator, moderator and one term of each kind.
pub struct World {
    pub platform: Platform,
    pub admin: User,
    pub moderator: User,
    pub category: TermId,
    pub resource_type: TermId,
    pub relation: TermId,
}

impl World {
    pub async fn new() -> Self {
        let platform = Platform::new(PlatformConfig::default());

        let mut root = UserCreate::new("Root", "root@example.org");
        root.role = Role::SuperAdministrator;
        let admin = platform.users.seed(root).await.unwrap();
        let mut mo = UserCreate::new("Mo", "mo@example.org");
        mo.role = Role::Moderator;
        let moderator = platform.users.seed(mo).await.unwrap();

        let mut terms = Vec::new();
        for (kind, name) in [
            (TermKind::Category, "Communication"),
            (TermKind::ResourceType, "Article"),
            (TermKind::RelationType, "Family"),
        ] {
            let id = platform
                .taxonomy
                .create_term(TermCreate {
                    actor: admin.clone(),
                    kind,
                    name: name.to_string(),
                    description: None,
                    sort_order: 0,
                })
                .await
                .unwrap();
            terms.push(id);
        }

        Self {
            platform,
            admin,
            moderator,
            category: terms[0],
            resource_type: terms[1],
            relation: terms[2],
        }
    }

    pub async fn citizen(&self, name: &str) -> User {
        let id = self
            .platform
            .users
            .register(UserCreate::new(name, format!("{}@example.org", name.to_lowercase())))
            .await
            .unwrap();
        self.platform.users.verify_email(id).await.unwrap()
    }

    pub fn draft(&self, owner: &User, title: &str) -> ResourceCreate {
        let mut params = ResourceCreate::draft(
            owner.clone(),
            title,
            self.category,
            self.resource_type,
            vec![self.relation],
        );
        params.visibility = Visibility::Public;
        params.content = Some(format!("Notes on {}", title.to_lowercase()));
        params
    }

    /// A public resource of `owner`, approved by the moderator.
    pub async fn published(&self, owner: &User, title: &str) -> ResourceId {
        let catalog = &self.platform.catalog;
        let id = catalog.create_resource(self.draft(owner, title)).await.unwrap();
        catalog.submit(id, owner).await.unwrap();
        catalog.approve(id, &self.moderator).await.unwrap();
        id
    }

    /// An open public activity of `owner` around `resource_id`.
    pub async fn open_activity(&self, owner: &User, resource_id: ResourceId, max: u32) -> ActivityId {
        let activities = &self.platform.activities;
        let id = activities
            .create_activity(ActivityCreate {
                actor: owner.clone(),
                resource_id,
                title: "Evening circle".to_string(),
                description: None,
                max_participants: Some(max),
                is_private: false,
                scheduled_at: Some(Utc::now() + Duration::days(1)),
            })
            .await
            .unwrap();
        activities.publish(id, owner).await.unwrap();
        id
    }

    pub async fn shutdown(self) {
        self.platform.shutdown().await.unwrap();
    }
}
