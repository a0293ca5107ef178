/// Channel handlers - HTTP endpoints for channel operations
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::Result;
use crate::middleware::AuthenticatedUser;
use crate::models::Channel;
use crate::services::ChannelService;

/// Request body for creating a channel
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateChannelRequest {
    pub name: String,
    #[serde(default)]
    pub topics: Vec<String>,
}

/// Create a new channel
#[utoipa::path(
    post,
    path = "/api/v1/channels",
    request_body = CreateChannelRequest,
    responses(
        (status = 201, description = "Channel created", body = Channel),
        (status = 400, description = "Invalid name or topics"),
        (status = 401, description = "Authentication required"),
    )
)]
pub async fn create_channel(
    service: web::Data<ChannelService>,
    user: AuthenticatedUser,
    req: web::Json<CreateChannelRequest>,
) -> Result<HttpResponse> {
    let channel = service
        .create_channel(&req.name, &req.topics, user.id)
        .await?;
    Ok(HttpResponse::Created().json(channel))
}

/// List all channels
#[utoipa::path(
    get,
    path = "/api/v1/channels",
    responses(
        (status = 200, description = "All channels, newest first", body = [Channel]),
    )
)]
pub async fn list_channels(service: web::Data<ChannelService>) -> Result<HttpResponse> {
    let channels = service.list_channels().await?;
    Ok(HttpResponse::Ok().json(channels))
}

/// Get a single channel
#[utoipa::path(
    get,
    path = "/api/v1/channels/{channel_id}",
    params(("channel_id" = Uuid, Path, description = "Channel id")),
    responses(
        (status = 200, description = "The channel", body = Channel),
        (status = 404, description = "No such channel"),
    )
)]
pub async fn get_channel(
    service: web::Data<ChannelService>,
    channel_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let channel = service.get_channel(*channel_id).await?;
    Ok(HttpResponse::Ok().json(channel))
}
