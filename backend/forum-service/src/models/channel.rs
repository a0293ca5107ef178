use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A discussion channel, tagged by topic.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Channel {
    pub id: Uuid,
    pub name: String,
    /// Topic tags attached at creation time.
    pub topics: Vec<String>,
    pub creator_id: Uuid,
    pub created_at: DateTime<Utc>,
}
