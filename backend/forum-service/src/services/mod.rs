/// Business logic layer for forum-service
///
/// - `messages`: draft/publish lifecycle, deletion-by-orphaning, listing
/// - `threading`: pure thread reconstruction over a visible message set
/// - `channels`: channel creation and lookup
pub mod channels;
pub mod messages;
pub mod threading;

pub use channels::ChannelService;
pub use messages::MessageService;
