/// Data models for forum-service
///
/// - `Message`: a channel message in any lifecycle state (draft, published,
///   orphaned)
/// - `Channel`: a topic-tagged discussion channel
pub mod channel;
pub mod message;

pub use channel::Channel;
pub use message::Message;
