//! # Relational Resources Demo
//!
//! Runs the main platform scenarios against real actors:
//! 1. Seeding an administrator and the taxonomies.
//! 2. Publishing a resource through moderation.
//! 3. Filling an activity up to its capacity.
//! 4. Commenting with and without moderation.
//!
//! Limits come from `RR_*` environment variables, optionally loaded from a `.env` file.

use actor_framework::tracing::setup_tracing;
use chrono::{Duration, Utc};
use relational_resources::clients::CommentClient;
use relational_resources::config::PlatformConfig;
use relational_resources::lifecycle::Platform;
use relational_resources::model::{
    ActivityCreate, CommentCreate, ResourceCreate, Role, TermCreate, TermId, TermKind, User,
    UserCreate, Visibility,
};
use tracing::{error, info, warn, Instrument};

async fn term(platform: &Platform, admin: &User, kind: TermKind, name: &str) -> Result<TermId, String> {
    platform
        .taxonomy
        .create_term(TermCreate {
            actor: admin.clone(),
            kind,
            name: name.to_string(),
            description: None,
            sort_order: 0,
        })
        .await
        .map_err(|e| e.to_string())
}

async fn citizen(platform: &Platform, name: &str) -> Result<User, String> {
    let id = platform
        .users
        .register(UserCreate::new(name, format!("{}@example.org", name.to_lowercase())))
        .await
        .map_err(|e| e.to_string())?;
    platform.users.verify_email(id).await.map_err(|e| e.to_string())
}

async fn comment(comments: &CommentClient, author: &User, params: CommentCreate) {
    match comments.post(params).await {
        Ok(id) => info!(comment = %id, author = %author.id, "Comment posted"),
        Err(e) => warn!(error = %e, "Comment refused"),
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    dotenvy::dotenv().ok();
    setup_tracing();

    let config = PlatformConfig::from_env();
    info!(?config, "Starting relational resources platform");
    let platform = Platform::new(config);

    let span = tracing::info_span!("seeding");
    let (admin, moderator, category, resource_type, relation) = async {
        let mut root = UserCreate::new("Root", "root@example.org");
        root.role = Role::SuperAdministrator;
        let admin = platform.users.seed(root).await.map_err(|e| e.to_string())?;

        let mut mo = UserCreate::new("Mo", "mo@example.org");
        mo.role = Role::Moderator;
        let moderator = platform.users.seed(mo).await.map_err(|e| e.to_string())?;

        let category = term(&platform, &admin, TermKind::Category, "Communication").await?;
        let resource_type = term(&platform, &admin, TermKind::ResourceType, "Article").await?;
        let relation = term(&platform, &admin, TermKind::RelationType, "Family").await?;
        Ok::<_, String>((admin, moderator, category, resource_type, relation))
    }
    .instrument(span)
    .await?;

    let alice = citizen(&platform, "Alice").await?;
    let bob = citizen(&platform, "Bob").await?;
    let carol = citizen(&platform, "Carol").await?;
    let dave = citizen(&platform, "Dave").await?;

    // Resource moderation
    let span = tracing::info_span!("moderation");
    let resource_id = async {
        let mut params = ResourceCreate::draft(
            alice.clone(),
            "Listening without judging",
            category,
            resource_type,
            vec![relation],
        );
        params.visibility = Visibility::Public;
        params.content = Some("Repeat what you heard before answering.".to_string());
        let id = platform
            .catalog
            .create_resource(params)
            .await
            .map_err(|e| e.to_string())?;

        platform.catalog.submit(id, &alice).await.map_err(|e| e.to_string())?;
        let published = platform
            .catalog
            .approve(id, &moderator)
            .await
            .map_err(|e| e.to_string())?;
        info!(resource = %id, status = %published.status, "Resource approved");

        if let Err(e) = platform.delete_resource(id, &alice).await {
            info!(error = %e, "Owner can no longer delete a published resource");
        }
        Ok::<_, String>(id)
    }
    .instrument(span)
    .await?;

    // Activity capacity
    let span = tracing::info_span!("activity");
    async {
        let activity_id = platform
            .activities
            .create_activity(ActivityCreate {
                actor: alice.clone(),
                resource_id,
                title: "Evening listening circle".to_string(),
                description: None,
                max_participants: Some(2),
                is_private: false,
                scheduled_at: Some(Utc::now() + Duration::days(1)),
            })
            .await
            .map_err(|e| e.to_string())?;
        platform
            .activities
            .publish(activity_id, &alice)
            .await
            .map_err(|e| e.to_string())?;

        for guest in [&bob, &carol] {
            platform
                .activities
                .invite(activity_id, &alice, vec![guest.id])
                .await
                .map_err(|e| e.to_string())?;
            platform
                .activities
                .accept(activity_id, guest)
                .await
                .map_err(|e| e.to_string())?;
        }

        match platform.activities.invite(activity_id, &alice, vec![dave.id]).await {
            Ok(summary) => error!(?summary, "Full activity accepted an invitation"),
            Err(e) => info!(error = %e, "Invitation refused"),
        }

        let activity = platform
            .activities
            .view(activity_id, Some(&alice))
            .await
            .map_err(|e| e.to_string())?;
        info!(
            activity = %activity.id,
            participants = activity.participant_count,
            max = activity.max_participants,
            "Activity filled"
        );
        Ok::<_, String>(())
    }
    .instrument(span)
    .await?;

    // Comments
    let span = tracing::info_span!("comments");
    async {
        for author in [&bob, &moderator] {
            let params = CommentCreate {
                actor: author.clone(),
                resource_id,
                parent_id: None,
                content: format!("Thoughts from {}", author.name),
            };
            comment(&platform.comments, author, params).await;
        }

        let queue = platform
            .comments
            .moderation_queue(&moderator)
            .await
            .map_err(|e| e.to_string())?;
        for pending in queue {
            platform
                .comments
                .approve(pending.id, &moderator)
                .await
                .map_err(|e| e.to_string())?;
        }

        let threads = platform
            .comments
            .thread(resource_id, None)
            .await
            .map_err(|e| e.to_string())?;
        info!(threads = threads.len(), "Public comment threads");
        Ok::<_, String>(())
    }
    .instrument(span)
    .await?;

    info!(admin = %admin.id, "Demo scenarios finished");
    platform.shutdown().await?;

    info!("Application completed successfully");
    Ok(())
}
