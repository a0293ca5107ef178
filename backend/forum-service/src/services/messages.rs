//! Message operations: the draft/publish lifecycle and the deletion policy.
//!
//! Every mutation is one guarded store update, so two callers racing on the
//! same message resolve at the store: the loser gets a conflict instead of
//! repeating a state change. Draft uniqueness per (author, scope) is kept by
//! reusing the existing draft id on save, backstopped by the store's partial
//! unique index.

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::channel_repo::ChannelDirectory;
use crate::db::store::{MessageFilter, MessagePatch, MessageStore, NewMessage, ParentScope};
use crate::error::{AppError, Result};
use crate::models::Message;
use crate::sanitize;
use crate::services::threading::{reconstruct, ChannelThreads};

/// Upper bound on raw content size, checked before sanitizing.
const MAX_CONTENT_BYTES: usize = 100 * 1024;

pub struct MessageService {
    store: Arc<dyn MessageStore>,
    channels: Arc<dyn ChannelDirectory>,
}

impl MessageService {
    pub fn new(store: Arc<dyn MessageStore>, channels: Arc<dyn ChannelDirectory>) -> Self {
        Self { store, channels }
    }

    /// Sanitize raw content and reject it if nothing visible remains.
    fn clean_content(raw: &str) -> Result<String> {
        if raw.len() > MAX_CONTENT_BYTES {
            return Err(AppError::Validation(format!(
                "content exceeds maximum size of {} bytes",
                MAX_CONTENT_BYTES
            )));
        }
        let clean = sanitize::sanitize(raw);
        if sanitize::is_empty(&clean) {
            return Err(AppError::Validation("content must not be empty".into()));
        }
        Ok(clean)
    }

    /// Load a message for a mutation by its author.
    ///
    /// Someone else's draft reads as absent, not as forbidden: drafts are
    /// invisible to everyone but their author.
    async fn load_owned(&self, message_id: Uuid, caller_id: Uuid) -> Result<Message> {
        let message = self
            .store
            .find_by_id(message_id)
            .await?
            .ok_or_else(|| AppError::NotFound("message not found".into()))?;
        if message.author_id != caller_id {
            if message.is_draft {
                return Err(AppError::NotFound("message not found".into()));
            }
            return Err(AppError::Forbidden(
                "only the author may modify a message".into(),
            ));
        }
        Ok(message)
    }

    /// Validate that `parent_id` can accept a reply in `channel_id`.
    async fn require_reply_target(&self, channel_id: Uuid, parent_id: Uuid) -> Result<Message> {
        let parent = self
            .store
            .find_by_id(parent_id)
            .await?
            // An unpublished parent is just as absent as a deleted one:
            // drafts are visible to nobody else, so replies cannot target
            // them.
            .filter(|p| !p.is_draft)
            .ok_or_else(|| AppError::NotFound("parent message not found".into()))?;
        if parent.channel_id != channel_id {
            return Err(AppError::Validation(
                "parent message belongs to a different channel".into(),
            ));
        }
        if parent.is_orphaned {
            return Err(AppError::Conflict(
                "parent message no longer accepts replies".into(),
            ));
        }
        Ok(parent)
    }

    /// Create a message in a channel, as a draft or published directly.
    ///
    /// With `is_draft` set this is the save-draft operation: when a draft
    /// already exists for this (author, parent scope) its content is updated
    /// in place and the same id is returned, so repeated saves can never
    /// accumulate drafts.
    pub async fn create_message(
        &self,
        channel_id: Uuid,
        author_id: Uuid,
        author_display_name: &str,
        content: &str,
        parent_id: Option<Uuid>,
        is_draft: bool,
    ) -> Result<Message> {
        if !self.channels.channel_exists(channel_id).await? {
            return Err(AppError::NotFound("channel not found".into()));
        }
        let content = Self::clean_content(content)?;
        if let Some(parent_id) = parent_id {
            self.require_reply_target(channel_id, parent_id).await?;
        }

        let now = Utc::now();

        if is_draft {
            let scope = ParentScope::from_parent_id(parent_id);
            let existing = self
                .store
                .find_many(MessageFilter {
                    channel_id: Some(channel_id),
                    author_id: Some(author_id),
                    is_draft: Some(true),
                    parent: Some(scope),
                })
                .await?;
            if let Some(draft) = existing.into_iter().next() {
                return self
                    .store
                    .update_by_id(
                        draft.id,
                        MessagePatch {
                            content: Some(content),
                            updated_at: Some(now),
                            ..Default::default()
                        },
                        MessageFilter {
                            is_draft: Some(true),
                            ..Default::default()
                        },
                    )
                    .await?
                    .ok_or_else(|| {
                        AppError::Conflict("draft was published or deleted concurrently".into())
                    });
            }
        }

        self.store
            .insert(NewMessage {
                id: Uuid::new_v4(),
                channel_id,
                parent_id,
                author_id,
                author_display_name: author_display_name.to_string(),
                content,
                is_draft,
                created_at: now,
                updated_at: now,
            })
            .await
    }

    /// Update an existing draft's content in place. Never touches `version`.
    pub async fn save_draft(
        &self,
        message_id: Uuid,
        caller_id: Uuid,
        content: &str,
    ) -> Result<Message> {
        let content = Self::clean_content(content)?;
        let existing = self.load_owned(message_id, caller_id).await?;
        if !existing.is_draft {
            return Err(AppError::Conflict("message is already published".into()));
        }

        self.store
            .update_by_id(
                message_id,
                MessagePatch {
                    content: Some(content),
                    updated_at: Some(Utc::now()),
                    ..Default::default()
                },
                MessageFilter {
                    is_draft: Some(true),
                    ..Default::default()
                },
            )
            .await?
            .ok_or_else(|| AppError::Conflict("draft was published or deleted concurrently".into()))
    }

    /// Publish a draft. One-way: `is_draft` drops, `created_at` is reset to
    /// the publish instant so ordering reflects when the message entered the
    /// conversation, and `version` stays untouched.
    pub async fn publish(
        &self,
        message_id: Uuid,
        caller_id: Uuid,
        content_override: Option<&str>,
    ) -> Result<Message> {
        let existing = self.load_owned(message_id, caller_id).await?;
        if !existing.is_draft {
            return Err(AppError::Conflict("message is already published".into()));
        }

        let content = content_override.map(Self::clean_content).transpose()?;

        // The parent may have been deleted or orphaned while this draft sat
        // unpublished; that surfaces as a conflict and the draft stays a
        // draft for the author to re-target or discard.
        if let Some(parent_id) = existing.parent_id {
            match self.store.find_by_id(parent_id).await? {
                None => return Err(AppError::Conflict("parent message was deleted".into())),
                Some(parent) if parent.is_orphaned => {
                    return Err(AppError::Conflict(
                        "parent message no longer accepts replies".into(),
                    ))
                }
                Some(parent) if parent.is_draft => {
                    return Err(AppError::Conflict("parent message is not published".into()))
                }
                Some(_) => {}
            }
        }

        let now = Utc::now();
        self.store
            .update_by_id(
                message_id,
                MessagePatch {
                    content,
                    is_draft: Some(false),
                    created_at: Some(now),
                    updated_at: Some(now),
                    ..Default::default()
                },
                MessageFilter {
                    is_draft: Some(true),
                    ..Default::default()
                },
            )
            .await?
            .ok_or_else(|| AppError::Conflict("message was already published".into()))
    }

    /// Edit a published message. Bumps `version` by exactly one; `created_at`
    /// keeps the publication instant.
    pub async fn edit_published(
        &self,
        message_id: Uuid,
        caller_id: Uuid,
        content: &str,
    ) -> Result<Message> {
        let content = Self::clean_content(content)?;
        let existing = self.load_owned(message_id, caller_id).await?;
        if existing.is_draft {
            return Err(AppError::Validation(
                "message is still a draft; save the draft instead".into(),
            ));
        }

        self.store
            .update_by_id(
                message_id,
                MessagePatch {
                    content: Some(content),
                    updated_at: Some(Utc::now()),
                    bump_version: true,
                    ..Default::default()
                },
                MessageFilter {
                    is_draft: Some(false),
                    ..Default::default()
                },
            )
            .await?
            .ok_or_else(|| AppError::NotFound("message not found".into()))
    }

    /// Delete a message and orphan its direct replies.
    ///
    /// The replies stay untouched except for the orphan flag; grandchildren
    /// are not visited. There is deliberately no cascade and no tombstone.
    pub async fn delete_message(&self, message_id: Uuid, caller_id: Uuid) -> Result<()> {
        self.load_owned(message_id, caller_id).await?;

        let removed = self.store.delete_by_id(message_id).await?;
        if !removed {
            return Err(AppError::NotFound("message not found".into()));
        }

        let orphaned = self
            .store
            .update_many(
                MessageFilter {
                    parent: Some(ParentScope::Message(message_id)),
                    ..Default::default()
                },
                MessagePatch {
                    is_orphaned: Some(true),
                    ..Default::default()
                },
            )
            .await?;
        if orphaned > 0 {
            tracing::info!(%message_id, orphaned, "orphaned replies of deleted message");
        }
        Ok(())
    }

    /// Fetch one message; drafts read as absent to everyone but their author.
    pub async fn get_message(&self, message_id: Uuid, viewer: Option<Uuid>) -> Result<Message> {
        let message = self
            .store
            .find_by_id(message_id)
            .await?
            .ok_or_else(|| AppError::NotFound("message not found".into()))?;
        if !message.visible_to(viewer) {
            return Err(AppError::NotFound("message not found".into()));
        }
        Ok(message)
    }

    /// The reconstructed thread view of a channel for one viewer: all
    /// published messages, plus the viewer's own drafts when requested.
    pub async fn list_channel_threads(
        &self,
        channel_id: Uuid,
        viewer: Option<Uuid>,
        include_drafts: bool,
    ) -> Result<ChannelThreads> {
        let viewer_for_drafts = match (include_drafts, viewer) {
            (false, _) => None,
            (true, Some(viewer)) => Some(viewer),
            (true, None) => {
                return Err(AppError::Unauthorized(
                    "listing drafts requires authentication".into(),
                ))
            }
        };
        if !self.channels.channel_exists(channel_id).await? {
            return Err(AppError::NotFound("channel not found".into()));
        }

        let mut visible = self
            .store
            .find_many(MessageFilter {
                channel_id: Some(channel_id),
                is_draft: Some(false),
                ..Default::default()
            })
            .await?;
        if let Some(viewer) = viewer_for_drafts {
            let drafts = self
                .store
                .find_many(MessageFilter {
                    channel_id: Some(channel_id),
                    author_id: Some(viewer),
                    is_draft: Some(true),
                    ..Default::default()
                })
                .await?;
            visible.extend(drafts);
        }

        Ok(reconstruct(visible))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// In-memory stand-in for the PostgreSQL store, with the same guarded
    /// update semantics and the same active-draft uniqueness backstop.
    struct InMemoryStore {
        rows: Mutex<Vec<Message>>,
    }

    impl InMemoryStore {
        fn new() -> Self {
            Self {
                rows: Mutex::new(Vec::new()),
            }
        }
    }

    fn matches(message: &Message, filter: &MessageFilter) -> bool {
        if let Some(channel_id) = filter.channel_id {
            if message.channel_id != channel_id {
                return false;
            }
        }
        if let Some(author_id) = filter.author_id {
            if message.author_id != author_id {
                return false;
            }
        }
        if let Some(is_draft) = filter.is_draft {
            if message.is_draft != is_draft {
                return false;
            }
        }
        match filter.parent {
            Some(ParentScope::Root) if message.parent_id.is_some() => return false,
            Some(ParentScope::Message(parent_id)) if message.parent_id != Some(parent_id) => {
                return false
            }
            _ => {}
        }
        true
    }

    fn apply(message: &mut Message, patch: &MessagePatch) {
        if let Some(content) = &patch.content {
            message.content = content.clone();
        }
        if let Some(is_draft) = patch.is_draft {
            message.is_draft = is_draft;
        }
        if let Some(is_orphaned) = patch.is_orphaned {
            message.is_orphaned = is_orphaned;
        }
        if let Some(created_at) = patch.created_at {
            message.created_at = created_at;
        }
        if let Some(updated_at) = patch.updated_at {
            message.updated_at = updated_at;
        }
        if patch.bump_version {
            message.version += 1;
        }
    }

    #[async_trait]
    impl MessageStore for InMemoryStore {
        async fn insert(&self, new: NewMessage) -> Result<Message> {
            let mut rows = self.rows.lock().unwrap();
            if new.is_draft
                && rows.iter().any(|m| {
                    m.is_draft
                        && m.author_id == new.author_id
                        && m.channel_id == new.channel_id
                        && m.parent_id == new.parent_id
                })
            {
                return Err(AppError::Conflict(
                    "a draft already exists for this author and parent scope".into(),
                ));
            }
            let message = Message {
                id: new.id,
                channel_id: new.channel_id,
                parent_id: new.parent_id,
                author_id: new.author_id,
                author_display_name: new.author_display_name,
                content: new.content,
                is_draft: new.is_draft,
                is_orphaned: false,
                version: 0,
                created_at: new.created_at,
                updated_at: new.updated_at,
            };
            rows.push(message.clone());
            Ok(message)
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<Message>> {
            let rows = self.rows.lock().unwrap();
            Ok(rows.iter().find(|m| m.id == id).cloned())
        }

        async fn find_many(&self, filter: MessageFilter) -> Result<Vec<Message>> {
            let rows = self.rows.lock().unwrap();
            let mut out: Vec<Message> = rows.iter().filter(|m| matches(m, &filter)).cloned().collect();
            out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
            Ok(out)
        }

        async fn update_by_id(
            &self,
            id: Uuid,
            patch: MessagePatch,
            guard: MessageFilter,
        ) -> Result<Option<Message>> {
            let mut rows = self.rows.lock().unwrap();
            let Some(row) = rows.iter_mut().find(|m| m.id == id && matches(m, &guard)) else {
                return Ok(None);
            };
            apply(row, &patch);
            Ok(Some(row.clone()))
        }

        async fn delete_by_id(&self, id: Uuid) -> Result<bool> {
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|m| m.id != id);
            Ok(rows.len() < before)
        }

        async fn update_many(&self, filter: MessageFilter, patch: MessagePatch) -> Result<u64> {
            let mut rows = self.rows.lock().unwrap();
            let mut touched = 0;
            for row in rows.iter_mut().filter(|m| matches(m, &filter)) {
                apply(row, &patch);
                touched += 1;
            }
            Ok(touched)
        }
    }

    struct StaticChannels {
        known: Vec<Uuid>,
    }

    #[async_trait]
    impl ChannelDirectory for StaticChannels {
        async fn channel_exists(&self, channel_id: Uuid) -> Result<bool> {
            Ok(self.known.contains(&channel_id))
        }
    }

    struct Fixture {
        service: MessageService,
        channel: Uuid,
        other_channel: Uuid,
        alice: Uuid,
        bob: Uuid,
    }

    fn fixture() -> Fixture {
        let channel = Uuid::new_v4();
        let other_channel = Uuid::new_v4();
        let service = MessageService::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(StaticChannels {
                known: vec![channel, other_channel],
            }),
        );
        Fixture {
            service,
            channel,
            other_channel,
            alice: Uuid::new_v4(),
            bob: Uuid::new_v4(),
        }
    }

    impl Fixture {
        async fn published(&self, author: Uuid, content: &str) -> Message {
            self.service
                .create_message(self.channel, author, "author", content, None, false)
                .await
                .unwrap()
        }
    }

    #[tokio::test]
    async fn repeated_save_draft_reuses_the_same_id() {
        let f = fixture();
        let first = f
            .service
            .create_message(f.channel, f.alice, "alice", "<p>hello</p>", None, true)
            .await
            .unwrap();
        assert!(first.is_draft);

        let second = f
            .service
            .create_message(f.channel, f.alice, "alice", "<p>hello world</p>", None, true)
            .await
            .unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.content, "<p>hello world</p>");
        assert_eq!(second.version, 0);
    }

    #[tokio::test]
    async fn drafts_in_different_scopes_do_not_collide() {
        let f = fixture();
        let root = f.published(f.bob, "<p>root</p>").await;

        let root_draft = f
            .service
            .create_message(f.channel, f.alice, "alice", "<p>a</p>", None, true)
            .await
            .unwrap();
        let reply_draft = f
            .service
            .create_message(f.channel, f.alice, "alice", "<p>b</p>", Some(root.id), true)
            .await
            .unwrap();
        assert_ne!(root_draft.id, reply_draft.id);
    }

    #[tokio::test]
    async fn unknown_channel_is_not_found() {
        let f = fixture();
        let err = f
            .service
            .create_message(Uuid::new_v4(), f.alice, "alice", "<p>x</p>", None, false)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn empty_content_is_rejected_before_touching_the_store() {
        let f = fixture();
        for raw in ["", "   ", "<p></p>", "<p>&nbsp;</p>", "<div><br></div>"] {
            let err = f
                .service
                .create_message(f.channel, f.alice, "alice", raw, None, true)
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "input {raw:?}");
        }
    }

    #[tokio::test]
    async fn content_is_sanitized_on_create() {
        let f = fixture();
        let message = f
            .service
            .create_message(
                f.channel,
                f.alice,
                "alice",
                r#"<p onclick="x()">hi</p><script>bad()</script>"#,
                None,
                false,
            )
            .await
            .unwrap();
        assert!(!message.content.contains("onclick"));
        assert!(!message.content.contains("<script"));
        assert!(message.content.contains("hi"));
    }

    #[tokio::test]
    async fn publish_clears_draft_and_resets_created_at() {
        let f = fixture();
        let draft = f
            .service
            .create_message(f.channel, f.alice, "alice", "<p>hello</p>", None, true)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        let published = f.service.publish(draft.id, f.alice, None).await.unwrap();
        assert!(!published.is_draft);
        assert_eq!(published.version, 0);
        assert!(published.created_at > draft.created_at);
    }

    #[tokio::test]
    async fn publish_applies_a_sanitized_content_override() {
        let f = fixture();
        let draft = f
            .service
            .create_message(f.channel, f.alice, "alice", "<p>old</p>", None, true)
            .await
            .unwrap();

        let published = f
            .service
            .publish(draft.id, f.alice, Some("<p>new <script>x</script></p>"))
            .await
            .unwrap();
        assert!(published.content.contains("new"));
        assert!(!published.content.contains("<script"));
    }

    #[tokio::test]
    async fn publish_rejects_an_empty_content_override() {
        let f = fixture();
        let draft = f
            .service
            .create_message(f.channel, f.alice, "alice", "<p>old</p>", None, true)
            .await
            .unwrap();

        let err = f
            .service
            .publish(draft.id, f.alice, Some("<p></p>"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        // The failed publish left the draft untouched.
        let draft = f.service.get_message(draft.id, Some(f.alice)).await.unwrap();
        assert!(draft.is_draft);
        assert_eq!(draft.content, "<p>old</p>");
    }

    #[tokio::test]
    async fn double_publish_is_a_conflict() {
        let f = fixture();
        let draft = f
            .service
            .create_message(f.channel, f.alice, "alice", "<p>x</p>", None, true)
            .await
            .unwrap();
        f.service.publish(draft.id, f.alice, None).await.unwrap();

        let err = f.service.publish(draft.id, f.alice, None).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn editing_a_draft_never_bumps_version() {
        let f = fixture();
        let draft = f
            .service
            .create_message(f.channel, f.alice, "alice", "<p>one</p>", None, true)
            .await
            .unwrap();
        let saved = f
            .service
            .save_draft(draft.id, f.alice, "<p>two</p>")
            .await
            .unwrap();
        assert_eq!(saved.id, draft.id);
        assert_eq!(saved.version, 0);
        assert!(saved.is_draft);
    }

    #[tokio::test]
    async fn save_draft_on_published_message_is_a_conflict() {
        let f = fixture();
        let message = f.published(f.alice, "<p>x</p>").await;
        let err = f
            .service
            .save_draft(message.id, f.alice, "<p>y</p>")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn edit_published_bumps_version_by_exactly_one_per_call() {
        let f = fixture();
        let message = f.published(f.alice, "<p>v0</p>").await;

        let edited = f
            .service
            .edit_published(message.id, f.alice, "<p>v1</p>")
            .await
            .unwrap();
        assert_eq!(edited.version, 1);
        assert!(!edited.is_draft);
        assert_eq!(edited.created_at, message.created_at);

        let edited = f
            .service
            .edit_published(message.id, f.alice, "<p>v2</p>")
            .await
            .unwrap();
        assert_eq!(edited.version, 2);
    }

    #[tokio::test]
    async fn only_the_author_may_edit() {
        let f = fixture();
        let message = f.published(f.alice, "<p>x</p>").await;
        let err = f
            .service
            .edit_published(message.id, f.bob, "<p>y</p>")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn edit_op_on_a_draft_is_a_validation_error() {
        let f = fixture();
        let draft = f
            .service
            .create_message(f.channel, f.alice, "alice", "<p>x</p>", None, true)
            .await
            .unwrap();
        let err = f
            .service
            .edit_published(draft.id, f.alice, "<p>y</p>")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn replies_cannot_target_missing_draft_or_cross_channel_parents() {
        let f = fixture();

        let err = f
            .service
            .create_message(f.channel, f.alice, "alice", "<p>r</p>", Some(Uuid::new_v4()), false)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let bob_draft = f
            .service
            .create_message(f.channel, f.bob, "bob", "<p>d</p>", None, true)
            .await
            .unwrap();
        let err = f
            .service
            .create_message(f.channel, f.alice, "alice", "<p>r</p>", Some(bob_draft.id), false)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let root = f.published(f.bob, "<p>root</p>").await;
        let err = f
            .service
            .create_message(
                f.other_channel,
                f.alice,
                "alice",
                "<p>r</p>",
                Some(root.id),
                false,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn replies_cannot_target_an_orphaned_parent() {
        let f = fixture();
        let root = f.published(f.alice, "<p>root</p>").await;
        let reply = f
            .service
            .create_message(f.channel, f.bob, "bob", "<p>reply</p>", Some(root.id), false)
            .await
            .unwrap();
        f.service.delete_message(root.id, f.alice).await.unwrap();

        // `reply` is orphaned now; nothing may attach beneath it.
        let err = f
            .service
            .create_message(f.channel, f.alice, "alice", "<p>x</p>", Some(reply.id), false)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn publishing_a_reply_after_its_parent_was_deleted_is_a_conflict() {
        let f = fixture();
        let root = f.published(f.alice, "<p>root</p>").await;
        let draft_reply = f
            .service
            .create_message(f.channel, f.bob, "bob", "<p>reply</p>", Some(root.id), true)
            .await
            .unwrap();

        f.service.delete_message(root.id, f.alice).await.unwrap();

        let err = f
            .service
            .publish(draft_reply.id, f.bob, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // The draft survives the failed publish for the author to resolve.
        let still_draft = f
            .service
            .get_message(draft_reply.id, Some(f.bob))
            .await
            .unwrap();
        assert!(still_draft.is_draft);
    }

    #[tokio::test]
    async fn delete_orphans_direct_children_and_spares_grandchildren() {
        let f = fixture();
        let root = f.published(f.alice, "<p>root</p>").await;
        let child = f
            .service
            .create_message(f.channel, f.bob, "bob", "<p>child</p>", Some(root.id), false)
            .await
            .unwrap();
        let grandchild = f
            .service
            .create_message(f.channel, f.alice, "alice", "<p>gc</p>", Some(child.id), false)
            .await
            .unwrap();

        f.service.delete_message(root.id, f.alice).await.unwrap();

        let err = f.service.get_message(root.id, Some(f.alice)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let child = f.service.get_message(child.id, None).await.unwrap();
        assert!(child.is_orphaned);
        assert_eq!(child.content, "<p>child</p>");

        let grandchild = f.service.get_message(grandchild.id, None).await.unwrap();
        assert!(!grandchild.is_orphaned);
    }

    #[tokio::test]
    async fn deleting_twice_is_not_found() {
        let f = fixture();
        let message = f.published(f.alice, "<p>x</p>").await;
        f.service.delete_message(message.id, f.alice).await.unwrap();
        let err = f
            .service
            .delete_message(message.id, f.alice)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn only_the_author_may_delete() {
        let f = fixture();
        let message = f.published(f.alice, "<p>x</p>").await;
        let err = f.service.delete_message(message.id, f.bob).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn someone_elses_draft_reads_as_absent() {
        let f = fixture();
        let draft = f
            .service
            .create_message(f.channel, f.alice, "alice", "<p>d</p>", None, true)
            .await
            .unwrap();

        let err = f.service.get_message(draft.id, Some(f.bob)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        let err = f.service.get_message(draft.id, None).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        // Mutations by a non-author also read as absent, not forbidden.
        let err = f
            .service
            .save_draft(draft.id, f.bob, "<p>y</p>")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn draft_only_channel_is_empty_for_other_viewers() {
        let f = fixture();
        f.service
            .create_message(f.channel, f.alice, "alice", "<p>d</p>", None, true)
            .await
            .unwrap();

        let threads = f
            .service
            .list_channel_threads(f.channel, Some(f.bob), true)
            .await
            .unwrap();
        assert!(threads.primary.is_none());
        assert!(threads.others.is_empty());

        let threads = f
            .service
            .list_channel_threads(f.channel, Some(f.alice), true)
            .await
            .unwrap();
        assert!(threads.primary.unwrap().root.is_draft);
    }

    #[tokio::test]
    async fn listing_drafts_anonymously_is_unauthorized() {
        let f = fixture();
        let err = f
            .service
            .list_channel_threads(f.channel, None, true)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn full_draft_publish_edit_delete_lifecycle() {
        let f = fixture();

        // Draft, then re-save: same id, newer content.
        let d1 = f
            .service
            .create_message(f.channel, f.alice, "alice", "<p>hello</p>", None, true)
            .await
            .unwrap();
        assert!(d1.is_draft);
        let d1 = f
            .service
            .create_message(f.channel, f.alice, "alice", "<p>hello world</p>", None, true)
            .await
            .unwrap();
        assert_eq!(d1.content, "<p>hello world</p>");

        // Publish: visible, version 0.
        let published = f.service.publish(d1.id, f.alice, None).await.unwrap();
        assert!(!published.is_draft);
        assert_eq!(published.version, 0);

        // Edit: version 1.
        let edited = f
            .service
            .edit_published(published.id, f.alice, "<p>hello world!</p>")
            .await
            .unwrap();
        assert_eq!(edited.version, 1);

        // A stranger cannot edit.
        let err = f
            .service
            .edit_published(published.id, f.bob, "<p>nope</p>")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        // Bob replies, Alice deletes her root: the reply is orphaned and the
        // reconstructed channel shows it under a placeholder.
        let reply = f
            .service
            .create_message(f.channel, f.bob, "bob", "<p>reply</p>", Some(published.id), false)
            .await
            .unwrap();
        f.service.delete_message(published.id, f.alice).await.unwrap();

        let reply = f.service.get_message(reply.id, None).await.unwrap();
        assert!(reply.is_orphaned);

        let threads = f
            .service
            .list_channel_threads(f.channel, None, false)
            .await
            .unwrap();
        let primary = threads.primary.expect("placeholder thread");
        assert!(primary.root.is_placeholder);
        assert_eq!(primary.replies.len(), 1);
        assert_eq!(primary.replies[0].id, reply.id);
        assert!(threads.others.is_empty());
    }
}
