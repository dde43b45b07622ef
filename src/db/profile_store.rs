use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::UserProfile;

/// Persistent store for per-user profile documents
///
/// The recommendation core only ever mutates an in-memory [`UserProfile`];
/// route handlers load a copy here, run the pipeline, and write it back.
/// Write serialization per user is the caller's concern.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Loads a user's profile, or `None` if the user has never been seen
    async fn load(&self, user_id: Uuid) -> AppResult<Option<UserProfile>>;

    /// Upserts a user's profile document
    async fn save(&self, profile: &UserProfile) -> AppResult<()>;

    /// Loads a profile or creates a fresh default for a first-time user
    async fn load_or_default(&self, user_id: Uuid) -> AppResult<UserProfile> {
        Ok(self
            .load(user_id)
            .await?
            .unwrap_or_else(|| UserProfile::new(user_id)))
    }
}

/// Postgres-backed profile store
///
/// Profiles live in a single JSONB document per user, mirroring the
/// one-document-per-user ownership of the data model:
///
/// ```sql
/// CREATE TABLE user_profiles (
///     user_id    UUID PRIMARY KEY,
///     profile    JSONB NOT NULL,
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
/// );
/// ```
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn load(&self, user_id: Uuid) -> AppResult<Option<UserProfile>> {
        let row: Option<serde_json::Value> =
            sqlx::query_scalar("SELECT profile FROM user_profiles WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some(document) => {
                let profile = serde_json::from_value(document).map_err(|e| {
                    AppError::Internal(format!("Profile document deserialization error: {}", e))
                })?;
                Ok(Some(profile))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, profile: &UserProfile) -> AppResult<()> {
        let document = serde_json::to_value(profile).map_err(|e| {
            AppError::Internal(format!("Profile document serialization error: {}", e))
        })?;

        sqlx::query(
            r#"
            INSERT INTO user_profiles (user_id, profile, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (user_id)
            DO UPDATE SET profile = EXCLUDED.profile, updated_at = now()
            "#,
        )
        .bind(profile.user_id)
        .bind(document)
        .execute(&self.pool)
        .await?;

        tracing::debug!(user_id = %profile.user_id, "Profile persisted");

        Ok(())
    }
}

/// In-memory profile store for tests and Postgres-free local runs
#[derive(Default)]
pub struct InMemoryProfileStore {
    profiles: tokio::sync::RwLock<std::collections::HashMap<Uuid, UserProfile>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn load(&self, user_id: Uuid) -> AppResult<Option<UserProfile>> {
        Ok(self.profiles.read().await.get(&user_id).cloned())
    }

    async fn save(&self, profile: &UserProfile) -> AppResult<()> {
        self.profiles
            .write()
            .await
            .insert(profile.user_id, profile.clone());
        Ok(())
    }
}
