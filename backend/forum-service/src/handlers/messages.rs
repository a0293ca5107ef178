/// Message handlers - HTTP endpoints for the thread view and the message
/// lifecycle
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::Result;
use crate::middleware::{AuthenticatedUser, MaybeUser};
use crate::models::Message;
use crate::services::threading::ChannelThreads;
use crate::services::MessageService;

/// Query parameters for the thread listing
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListMessagesQuery {
    /// Also include the caller's own drafts (requires authentication)
    #[serde(default)]
    pub include_drafts: bool,
}

/// Request body for creating a message
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMessageRequest {
    pub content: String,
    /// Reply target; absent for a new root message
    pub parent_id: Option<Uuid>,
    /// Create as a private draft instead of publishing immediately
    #[serde(default)]
    pub is_draft: bool,
}

/// Request body for mutating an existing message: one explicit operation
/// per request.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum UpdateMessageRequest {
    /// Replace the content of an existing draft
    SaveDraft { content: String },
    /// Publish a draft, optionally replacing its content in the same step
    Publish {
        #[serde(default)]
        content: Option<String>,
    },
    /// Edit an already-published message (bumps the edit version)
    Edit { content: String },
}

/// Reconstructed thread view of a channel
#[utoipa::path(
    get,
    path = "/api/v1/channels/{channel_id}/messages",
    params(
        ("channel_id" = Uuid, Path, description = "Channel id"),
        ListMessagesQuery,
    ),
    responses(
        (status = 200, description = "Primary and other threads", body = ChannelThreads),
        (status = 401, description = "Drafts requested without authentication"),
        (status = 404, description = "No such channel"),
    )
)]
pub async fn list_channel_messages(
    service: web::Data<MessageService>,
    channel_id: web::Path<Uuid>,
    query: web::Query<ListMessagesQuery>,
    viewer: MaybeUser,
) -> Result<HttpResponse> {
    let threads = service
        .list_channel_threads(*channel_id, viewer.user_id(), query.include_drafts)
        .await?;
    Ok(HttpResponse::Ok().json(threads))
}

/// Create a message in a channel, as a draft or published directly
#[utoipa::path(
    post,
    path = "/api/v1/channels/{channel_id}/messages",
    params(("channel_id" = Uuid, Path, description = "Channel id")),
    request_body = CreateMessageRequest,
    responses(
        (status = 201, description = "The created (or re-saved draft) message", body = Message),
        (status = 400, description = "Empty or oversized content"),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Channel or parent not found"),
        (status = 409, description = "Parent no longer accepts replies"),
    )
)]
pub async fn create_message(
    service: web::Data<MessageService>,
    channel_id: web::Path<Uuid>,
    user: AuthenticatedUser,
    req: web::Json<CreateMessageRequest>,
) -> Result<HttpResponse> {
    let message = service
        .create_message(
            *channel_id,
            user.id,
            &user.display_name,
            &req.content,
            req.parent_id,
            req.is_draft,
        )
        .await?;
    Ok(HttpResponse::Created().json(message))
}

/// Get a single message
#[utoipa::path(
    get,
    path = "/api/v1/messages/{message_id}",
    params(("message_id" = Uuid, Path, description = "Message id")),
    responses(
        (status = 200, description = "The message", body = Message),
        (status = 404, description = "No such message (drafts are private)"),
    )
)]
pub async fn get_message(
    service: web::Data<MessageService>,
    message_id: web::Path<Uuid>,
    viewer: MaybeUser,
) -> Result<HttpResponse> {
    let message = service.get_message(*message_id, viewer.user_id()).await?;
    Ok(HttpResponse::Ok().json(message))
}

/// Apply one lifecycle operation to a message
#[utoipa::path(
    patch,
    path = "/api/v1/messages/{message_id}",
    params(("message_id" = Uuid, Path, description = "Message id")),
    request_body = UpdateMessageRequest,
    responses(
        (status = 200, description = "The message after the operation", body = Message),
        (status = 400, description = "Validation failure"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Caller is not the author"),
        (status = 404, description = "No such message"),
        (status = 409, description = "Lifecycle conflict (double publish, orphaned parent, ...)"),
    )
)]
pub async fn update_message(
    service: web::Data<MessageService>,
    message_id: web::Path<Uuid>,
    user: AuthenticatedUser,
    req: web::Json<UpdateMessageRequest>,
) -> Result<HttpResponse> {
    let message = match req.into_inner() {
        UpdateMessageRequest::SaveDraft { content } => {
            service.save_draft(*message_id, user.id, &content).await?
        }
        UpdateMessageRequest::Publish { content } => {
            service
                .publish(*message_id, user.id, content.as_deref())
                .await?
        }
        UpdateMessageRequest::Edit { content } => {
            service
                .edit_published(*message_id, user.id, &content)
                .await?
        }
    };
    Ok(HttpResponse::Ok().json(message))
}

/// Delete a message, orphaning its direct replies
#[utoipa::path(
    delete,
    path = "/api/v1/messages/{message_id}",
    params(("message_id" = Uuid, Path, description = "Message id")),
    responses(
        (status = 204, description = "Message deleted"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Caller is not the author"),
        (status = 404, description = "No such message"),
    )
)]
pub async fn delete_message(
    service: web::Data<MessageService>,
    message_id: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<HttpResponse> {
    service.delete_message(*message_id, user.id).await?;
    Ok(HttpResponse::NoContent().finish())
}
