use std::{str::FromStr, time::Duration};

use sqlx::{
    Pool, Sqlite,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};

mod users;

pub use users::SqliteUserRepository;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const CREATE_USERS_TABLE: &str = "CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY NOT NULL,
    username TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    refresh_token_hash TEXT,
    rating REAL NOT NULL,
    wins INTEGER NOT NULL DEFAULT 0,
    draws INTEGER NOT NULL DEFAULT 0,
    losses INTEGER NOT NULL DEFAULT 0
)";

/// Opens (and creates, if missing) the database behind `database_url`,
/// e.g. `sqlite://quiz.db`.
pub async fn create_user_db_pool(database_url: &str) -> Result<Pool<Sqlite>, sqlx::Error> {
    let conn_options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(conn_options)
        .await?;
    create_schema(&pool).await?;
    Ok(pool)
}

pub async fn create_schema(pool: &Pool<Sqlite>) -> Result<(), sqlx::Error> {
    sqlx::query(CREATE_USERS_TABLE).execute(pool).await?;
    Ok(())
}
