/// Agora Forum Service Library
///
/// Discussion-forum backend: topic-tagged channels holding two-level threaded
/// messages with a per-author draft/publish lifecycle, edit versioning, and
/// deletion by orphaning.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers
/// - `services`: business logic (message lifecycle, thread reconstruction)
/// - `db`: database access layer, message store contract, migrations
/// - `models`: data structures for channels and messages
/// - `sanitize`: rich-text content sanitizer
/// - `middleware`: HTTP middleware for authentication
/// - `security`: JWT validation
/// - `error`: error types and handling
/// - `config`: configuration management
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod openapi;
pub mod sanitize;
pub mod security;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
