use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A single forum message.
///
/// Messages are flat rows; the two-level thread shape is reconstructed on
/// demand by `services::threading`. `parent_id` is intentionally not a
/// foreign key: deleting a message removes its row outright and leaves the
/// children's `parent_id` dangling, which is what marks them as orphaned
/// replies for the reconstructor.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Message {
    pub id: Uuid,
    pub channel_id: Uuid,
    /// `None` marks a root message that starts a thread.
    pub parent_id: Option<Uuid>,
    pub author_id: Uuid,
    /// Display name snapshot taken when the message was created.
    pub author_display_name: String,
    /// Sanitized rich-text HTML. Never empty for a persisted message.
    pub content: String,
    /// Drafts are visible only to their author.
    pub is_draft: bool,
    /// Set once the parent message has been deleted. Permanent.
    pub is_orphaned: bool,
    /// Count of edits made after publication. `version > 0` renders as
    /// an "edited" marker; draft edits and the publish transition itself
    /// never touch it.
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Message {
    /// Whether `user_id` is allowed to see this message.
    pub fn visible_to(&self, user_id: Option<Uuid>) -> bool {
        !self.is_draft || user_id == Some(self.author_id)
    }
}
