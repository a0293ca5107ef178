//! Message store contract and PostgreSQL implementation.
//!
//! The service layer talks to the store through [`MessageStore`] so the
//! draft/publish state machine can be exercised against a test double; the
//! production implementation is [`PgMessageStore`]. Conditional updates
//! (`update_by_id` with a guard) are single `UPDATE ... WHERE` statements,
//! so racing mutations resolve at the database: the loser sees no row and
//! surfaces a conflict instead of repeating a state change.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::Message;

/// The parent scope of a message: the channel root, or one specific parent
/// message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentScope {
    Root,
    Message(Uuid),
}

impl ParentScope {
    pub fn from_parent_id(parent_id: Option<Uuid>) -> Self {
        match parent_id {
            None => ParentScope::Root,
            Some(id) => ParentScope::Message(id),
        }
    }

    pub fn parent_id(&self) -> Option<Uuid> {
        match self {
            ParentScope::Root => None,
            ParentScope::Message(id) => Some(*id),
        }
    }
}

/// Conjunctive filter over message rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageFilter {
    pub channel_id: Option<Uuid>,
    pub author_id: Option<Uuid>,
    pub is_draft: Option<bool>,
    pub parent: Option<ParentScope>,
}

/// Partial update over a message row. Unset fields are left untouched;
/// `bump_version` maps to an atomic `version = version + 1`.
#[derive(Debug, Clone, Default)]
pub struct MessagePatch {
    pub content: Option<String>,
    pub is_draft: Option<bool>,
    pub is_orphaned: Option<bool>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub bump_version: bool,
}

impl MessagePatch {
    pub fn is_empty(&self) -> bool {
        self.content.is_none()
            && self.is_draft.is_none()
            && self.is_orphaned.is_none()
            && self.created_at.is_none()
            && self.updated_at.is_none()
            && !self.bump_version
    }
}

/// A message row to insert. `version` always starts at 0 and `is_orphaned`
/// at false, so neither is part of the input.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub id: Uuid,
    pub channel_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub author_id: Uuid,
    pub author_display_name: String,
    pub content: String,
    pub is_draft: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Persistent message collection.
///
/// `find_many` always returns rows ordered by `created_at` ascending with
/// ties broken by id, which is the order the thread reconstructor expects.
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn insert(&self, message: NewMessage) -> Result<Message>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Message>>;

    async fn find_many(&self, filter: MessageFilter) -> Result<Vec<Message>>;

    /// Apply `patch` to the row with `id`, but only if `guard` still holds.
    /// Returns the updated row, or `None` when the row is gone or the guard
    /// failed — the caller decides which of the two it raced against.
    async fn update_by_id(
        &self,
        id: Uuid,
        patch: MessagePatch,
        guard: MessageFilter,
    ) -> Result<Option<Message>>;

    /// Remove the row outright. Returns false when no such row existed.
    async fn delete_by_id(&self, id: Uuid) -> Result<bool>;

    /// Apply `patch` to every row matching `filter`; returns the number of
    /// rows touched.
    async fn update_many(&self, filter: MessageFilter, patch: MessagePatch) -> Result<u64>;
}

const MESSAGE_COLUMNS: &str = "id, channel_id, parent_id, author_id, author_display_name, \
     content, is_draft, is_orphaned, version, created_at, updated_at";

/// PostgreSQL-backed message store.
pub struct PgMessageStore {
    pool: PgPool,
}

impl PgMessageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &MessageFilter) {
    if let Some(channel_id) = filter.channel_id {
        qb.push(" AND channel_id = ").push_bind(channel_id);
    }
    if let Some(author_id) = filter.author_id {
        qb.push(" AND author_id = ").push_bind(author_id);
    }
    if let Some(is_draft) = filter.is_draft {
        qb.push(" AND is_draft = ").push_bind(is_draft);
    }
    match filter.parent {
        Some(ParentScope::Root) => {
            qb.push(" AND parent_id IS NULL");
        }
        Some(ParentScope::Message(parent_id)) => {
            qb.push(" AND parent_id = ").push_bind(parent_id);
        }
        None => {}
    }
}

fn push_patch(qb: &mut QueryBuilder<'_, Postgres>, patch: &MessagePatch) {
    let mut sets = qb.separated(", ");
    if let Some(content) = &patch.content {
        sets.push("content = ");
        sets.push_bind_unseparated(content.clone());
    }
    if let Some(is_draft) = patch.is_draft {
        sets.push("is_draft = ");
        sets.push_bind_unseparated(is_draft);
    }
    if let Some(is_orphaned) = patch.is_orphaned {
        sets.push("is_orphaned = ");
        sets.push_bind_unseparated(is_orphaned);
    }
    if let Some(created_at) = patch.created_at {
        sets.push("created_at = ");
        sets.push_bind_unseparated(created_at);
    }
    if let Some(updated_at) = patch.updated_at {
        sets.push("updated_at = ");
        sets.push_bind_unseparated(updated_at);
    }
    if patch.bump_version {
        sets.push("version = version + 1");
    }
}

fn map_insert_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Conflict(
            "a draft already exists for this author and parent scope".into(),
        ),
        _ => AppError::from(err),
    }
}

#[async_trait]
impl MessageStore for PgMessageStore {
    async fn insert(&self, message: NewMessage) -> Result<Message> {
        let inserted = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages
                (id, channel_id, parent_id, author_id, author_display_name,
                 content, is_draft, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, channel_id, parent_id, author_id, author_display_name,
                      content, is_draft, is_orphaned, version, created_at, updated_at
            "#,
        )
        .bind(message.id)
        .bind(message.channel_id)
        .bind(message.parent_id)
        .bind(message.author_id)
        .bind(&message.author_display_name)
        .bind(&message.content)
        .bind(message.is_draft)
        .bind(message.created_at)
        .bind(message.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_insert_error)?;

        Ok(inserted)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Message>> {
        let message = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, channel_id, parent_id, author_id, author_display_name,
                   content, is_draft, is_orphaned, version, created_at, updated_at
            FROM messages
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(message)
    }

    async fn find_many(&self, filter: MessageFilter) -> Result<Vec<Message>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        qb.push(MESSAGE_COLUMNS);
        qb.push(" FROM messages WHERE TRUE");
        push_filter(&mut qb, &filter);
        qb.push(" ORDER BY created_at ASC, id ASC");

        let messages = qb.build_query_as::<Message>().fetch_all(&self.pool).await?;
        Ok(messages)
    }

    async fn update_by_id(
        &self,
        id: Uuid,
        patch: MessagePatch,
        guard: MessageFilter,
    ) -> Result<Option<Message>> {
        if patch.is_empty() {
            return Err(AppError::Internal("empty message patch".into()));
        }

        let mut qb = QueryBuilder::<Postgres>::new("UPDATE messages SET ");
        push_patch(&mut qb, &patch);
        qb.push(" WHERE id = ").push_bind(id);
        push_filter(&mut qb, &guard);
        qb.push(" RETURNING ");
        qb.push(MESSAGE_COLUMNS);

        let updated = qb
            .build_query_as::<Message>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(updated)
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM messages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_many(&self, filter: MessageFilter, patch: MessagePatch) -> Result<u64> {
        if patch.is_empty() {
            return Err(AppError::Internal("empty message patch".into()));
        }

        let mut qb = QueryBuilder::<Postgres>::new("UPDATE messages SET ");
        push_patch(&mut qb, &patch);
        qb.push(" WHERE TRUE");
        push_filter(&mut qb, &filter);

        let result = qb.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}
