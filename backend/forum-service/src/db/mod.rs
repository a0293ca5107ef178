/// Database access layer
///
/// - connection pool setup and embedded migrations
/// - `store`: the message store contract and its PostgreSQL implementation
/// - `channel_repo`: channel rows and the channel-existence collaborator
pub mod channel_repo;
pub mod store;

use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};

use crate::config::DatabaseConfig;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

pub async fn init_pool(config: &DatabaseConfig) -> Result<Pool<Postgres>, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await
}
