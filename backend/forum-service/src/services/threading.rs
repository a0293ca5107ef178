//! Thread reconstruction.
//!
//! [`reconstruct`] is a pure function over the set of messages visible to
//! one viewer: the caller (route handler, background job, or a client with
//! the same data) decides visibility, this module only builds the shape.
//! The output is two-level: one primary thread (the earliest root) plus the
//! remaining root threads, each with its directly-attached replies in
//! chronological order.
//!
//! Replies whose parent is absent from the visible set — deleted, or a draft
//! the viewer cannot see — are re-anchored under a synthesized placeholder
//! root so the conversation never silently loses them.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Message;

/// Author label shown on placeholder roots.
pub const DELETED_AUTHOR_LABEL: &str = "Deleted message";
/// Content shown on placeholder roots.
pub const DELETED_CONTENT: &str = "Message has been deleted";

/// A message as it appears inside a reconstructed thread.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ThreadedMessage {
    pub id: Uuid,
    pub channel_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub author_id: Uuid,
    pub author_display_name: String,
    pub content: String,
    pub is_draft: bool,
    pub is_orphaned: bool,
    /// True only for synthesized stand-ins for a deleted parent.
    pub is_placeholder: bool,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Message> for ThreadedMessage {
    fn from(m: Message) -> Self {
        Self {
            id: m.id,
            channel_id: m.channel_id,
            parent_id: m.parent_id,
            author_id: m.author_id,
            author_display_name: m.author_display_name,
            content: m.content,
            is_draft: m.is_draft,
            is_orphaned: m.is_orphaned,
            is_placeholder: false,
            version: m.version,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

impl ThreadedMessage {
    /// Stand-in root for a parent that is missing from the visible set.
    ///
    /// The id is derived from the missing parent id (UUIDv5), so repeated
    /// reconstructions agree on it and it can never collide with the id of
    /// a message that still exists.
    fn placeholder(
        missing_parent_id: Uuid,
        channel_id: Uuid,
        earliest_child: DateTime<Utc>,
    ) -> Self {
        let timestamp = earliest_child - Duration::seconds(1);
        Self {
            id: Uuid::new_v5(&Uuid::NAMESPACE_OID, missing_parent_id.as_bytes()),
            channel_id,
            parent_id: None,
            author_id: Uuid::nil(),
            author_display_name: DELETED_AUTHOR_LABEL.to_string(),
            content: DELETED_CONTENT.to_string(),
            is_draft: false,
            is_orphaned: true,
            is_placeholder: true,
            version: 0,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }
}

/// One root with its directly-attached replies, oldest first.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Thread {
    pub root: ThreadedMessage,
    pub replies: Vec<ThreadedMessage>,
}

/// The reconstructed view of a channel.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct ChannelThreads {
    /// The earliest root thread, rendered with emphasis. `None` only when
    /// the visible set is empty.
    pub primary: Option<Thread>,
    /// Remaining root threads in chronological order.
    pub others: Vec<Thread>,
}

/// Build the two-level thread view from the visible message set.
pub fn reconstruct(mut messages: Vec<Message>) -> ChannelThreads {
    // Chronological base order; ties broken by id so the result is stable
    // regardless of input order.
    messages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

    let visible_ids: HashSet<Uuid> = messages.iter().map(|m| m.id).collect();

    let mut roots: Vec<ThreadedMessage> = Vec::new();
    let mut children_by_parent: HashMap<Uuid, Vec<ThreadedMessage>> = HashMap::new();
    for message in messages {
        match message.parent_id {
            None => roots.push(message.into()),
            Some(parent_id) => children_by_parent
                .entry(parent_id)
                .or_default()
                .push(message.into()),
        }
    }

    // Replies pointing at a parent outside the visible set get re-anchored
    // under one placeholder root per missing parent.
    let missing_parents: Vec<Uuid> = children_by_parent
        .keys()
        .filter(|parent_id| !visible_ids.contains(parent_id))
        .copied()
        .collect();
    for missing_parent_id in missing_parents {
        let mut orphans = children_by_parent
            .remove(&missing_parent_id)
            .unwrap_or_default();
        let placeholder = ThreadedMessage::placeholder(
            missing_parent_id,
            orphans[0].channel_id,
            orphans[0].created_at,
        );
        for orphan in &mut orphans {
            orphan.parent_id = Some(placeholder.id);
            orphan.is_orphaned = true;
        }
        children_by_parent.insert(placeholder.id, orphans);
        roots.push(placeholder);
    }

    roots.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

    let mut threads = roots.into_iter().map(|root| {
        let replies = children_by_parent.remove(&root.id).unwrap_or_default();
        Thread { root, replies }
    });

    let primary = threads.next();
    let others = threads.collect();
    ChannelThreads { primary, others }
}
