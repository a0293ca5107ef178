/// OpenAPI documentation for Agora Forum Service
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

use crate::handlers;
use crate::handlers::channels::CreateChannelRequest;
use crate::handlers::messages::{CreateMessageRequest, UpdateMessageRequest};
use crate::models::{Channel, Message};
use crate::services::threading::{ChannelThreads, Thread, ThreadedMessage};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Agora Forum Service API",
        version = "1.0.0",
        description = "Discussion-forum backend: topic-tagged channels with two-level \
                       threaded messages, per-author drafts, publish-once lifecycle, edit \
                       versioning, and deletion by orphaning.",
        contact(
            name = "Agora Team",
            email = "team@agora.dev"
        ),
        license(
            name = "MIT"
        )
    ),
    servers(
        (url = "http://localhost:8085", description = "Development server"),
    ),
    tags(
        (name = "channels", description = "Channel creation and listing"),
        (name = "messages", description = "Thread views and the message lifecycle"),
    ),
    paths(
        handlers::channels::create_channel,
        handlers::channels::list_channels,
        handlers::channels::get_channel,
        handlers::messages::list_channel_messages,
        handlers::messages::create_message,
        handlers::messages::get_message,
        handlers::messages::update_message,
        handlers::messages::delete_message,
    ),
    components(schemas(
        Channel,
        Message,
        ChannelThreads,
        Thread,
        ThreadedMessage,
        CreateChannelRequest,
        CreateMessageRequest,
        UpdateMessageRequest,
    )),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT Bearer token from the identity provider"))
                        .build(),
                ),
            )
        }
    }
}
