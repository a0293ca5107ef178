/// Channel service - channel creation and lookup
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::channel_repo;
use crate::error::{AppError, Result};
use crate::models::Channel;

/// Longest accepted channel name.
const MAX_NAME_LENGTH: usize = 120;
/// Most topic tags a channel may carry.
const MAX_TOPICS: usize = 8;

pub struct ChannelService {
    pool: PgPool,
}

impl ChannelService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a channel with a trimmed name and normalized topic tags.
    pub async fn create_channel(
        &self,
        name: &str,
        topics: &[String],
        creator_id: Uuid,
    ) -> Result<Channel> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("channel name must not be empty".into()));
        }
        if name.len() > MAX_NAME_LENGTH {
            return Err(AppError::Validation(format!(
                "channel name exceeds {} characters",
                MAX_NAME_LENGTH
            )));
        }

        let topics: Vec<String> = topics
            .iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        if topics.len() > MAX_TOPICS {
            return Err(AppError::Validation(format!(
                "a channel may carry at most {} topics",
                MAX_TOPICS
            )));
        }

        channel_repo::create_channel(&self.pool, name, &topics, creator_id).await
    }

    pub async fn list_channels(&self) -> Result<Vec<Channel>> {
        channel_repo::list_channels(&self.pool).await
    }

    pub async fn get_channel(&self, channel_id: Uuid) -> Result<Channel> {
        channel_repo::get_channel(&self.pool, channel_id)
            .await?
            .ok_or_else(|| AppError::NotFound("channel not found".into()))
    }
}
