use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::Channel;

/// Create a new channel
pub async fn create_channel(
    pool: &PgPool,
    name: &str,
    topics: &[String],
    creator_id: Uuid,
) -> Result<Channel> {
    let channel = sqlx::query_as::<_, Channel>(
        r#"
        INSERT INTO channels (id, name, topics, creator_id)
        VALUES ($1, $2, $3, $4)
        RETURNING id, name, topics, creator_id, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(topics)
    .bind(creator_id)
    .fetch_one(pool)
    .await?;

    Ok(channel)
}

/// List all channels, newest first
pub async fn list_channels(pool: &PgPool) -> Result<Vec<Channel>> {
    let channels = sqlx::query_as::<_, Channel>(
        r#"
        SELECT id, name, topics, creator_id, created_at
        FROM channels
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(channels)
}

/// Get a single channel by ID
pub async fn get_channel(pool: &PgPool, channel_id: Uuid) -> Result<Option<Channel>> {
    let channel = sqlx::query_as::<_, Channel>(
        r#"
        SELECT id, name, topics, creator_id, created_at
        FROM channels
        WHERE id = $1
        "#,
    )
    .bind(channel_id)
    .fetch_optional(pool)
    .await?;

    Ok(channel)
}

/// Channel-existence collaborator used by the message operations.
#[async_trait]
pub trait ChannelDirectory: Send + Sync {
    async fn channel_exists(&self, channel_id: Uuid) -> Result<bool>;
}

/// PostgreSQL-backed channel directory.
pub struct PgChannelDirectory {
    pool: PgPool,
}

impl PgChannelDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChannelDirectory for PgChannelDirectory {
    async fn channel_exists(&self, channel_id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM channels WHERE id = $1)")
            .bind(channel_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}
