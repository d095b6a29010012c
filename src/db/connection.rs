use crate::db::INIT_SCHEMA;
use sqlx::{migrate::MigrateDatabase, Pool, Sqlite, SqlitePool};
use tracing::info;

pub async fn establish_connection(database_url: &str) -> Result<Pool<Sqlite>, sqlx::Error> {
    // Create database if it doesn't exist
    if !Sqlite::database_exists(database_url).await.unwrap_or(false) {
        Sqlite::create_database(database_url).await?;
        info!("Created ledger database {}", database_url);
    }

    let pool = SqlitePool::connect(database_url).await?;

    sqlx::query("PRAGMA journal_mode=WAL").execute(&pool).await?;

    sqlx::query(INIT_SCHEMA).execute(&pool).await?;

    Ok(pool)
}
