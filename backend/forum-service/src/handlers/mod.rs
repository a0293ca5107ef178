/// HTTP handlers for forum endpoints
///
/// - Channels: create and list topic-tagged channels
/// - Messages: thread listing, create (draft or published), the draft
///   lifecycle operations, and deletion
pub mod channels;
pub mod messages;

pub use channels::{create_channel, get_channel, list_channels};
pub use messages::{
    create_message, delete_message, get_message, list_channel_messages, update_message,
};
