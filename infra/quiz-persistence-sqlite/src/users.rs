use quiz_match_app::domain::{
    RepoCreateError, RepoRetrieveError, RepoUpdateError, UserId,
    user::{User, UserRepository, UserStats},
};
use sqlx::{Pool, Row, Sqlite, SqliteConnection, sqlite::SqliteRow};
use uuid::Uuid;

const USER_CACHE_CAPACITY: u64 = 1000;

pub struct SqliteUserRepository {
    pool: Pool<Sqlite>,
    user_cache: moka::sync::Cache<UserId, User>,
}

impl SqliteUserRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self {
            pool,
            user_cache: moka::sync::Cache::builder()
                .max_capacity(USER_CACHE_CAPACITY)
                .build(),
        }
    }

    fn user_from_row(row: &SqliteRow) -> Result<User, RepoRetrieveError> {
        let id: String = row.try_get("id").map_err(storage_error)?;
        let id = Uuid::parse_str(&id)
            .map_err(|e| RepoRetrieveError::StorageError(format!("Bad user id {}: {}", id, e)))?;
        Ok(User {
            id: UserId(id),
            username: row.try_get("username").map_err(storage_error)?,
            password_hash: row.try_get("password_hash").map_err(storage_error)?,
            refresh_token_hash: row.try_get("refresh_token_hash").map_err(storage_error)?,
            stats: Self::stats_from_row(row).map_err(storage_error)?,
        })
    }

    fn stats_from_row(row: &SqliteRow) -> sqlx::Result<UserStats> {
        Ok(UserStats {
            rating: row.try_get("rating")?,
            wins: row.try_get::<i64, _>("wins")? as u32,
            draws: row.try_get::<i64, _>("draws")? as u32,
            losses: row.try_get::<i64, _>("losses")? as u32,
        })
    }

    async fn fetch_stats(
        conn: &mut SqliteConnection,
        id: UserId,
    ) -> Result<UserStats, RepoUpdateError> {
        let row = sqlx::query("SELECT rating, wins, draws, losses FROM users WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| RepoUpdateError::StorageError(e.to_string()))?
            .ok_or(RepoUpdateError::NotFound)?;
        Self::stats_from_row(&row).map_err(|e| RepoUpdateError::StorageError(e.to_string()))
    }

    async fn write_stats(
        conn: &mut SqliteConnection,
        id: UserId,
        stats: UserStats,
    ) -> Result<(), RepoUpdateError> {
        sqlx::query("UPDATE users SET rating = ?, wins = ?, draws = ?, losses = ? WHERE id = ?")
            .bind(stats.rating)
            .bind(i64::from(stats.wins))
            .bind(i64::from(stats.draws))
            .bind(i64::from(stats.losses))
            .bind(id.to_string())
            .execute(&mut *conn)
            .await
            .map_err(|e| RepoUpdateError::StorageError(e.to_string()))?;
        Ok(())
    }

    async fn update_column(
        &self,
        id: UserId,
        query: &str,
        value: Option<String>,
    ) -> Result<(), RepoUpdateError> {
        let res = sqlx::query(query)
            .bind(value)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| RepoUpdateError::StorageError(e.to_string()))?;
        self.user_cache.invalidate(&id);
        if res.rows_affected() == 0 {
            return Err(RepoUpdateError::NotFound);
        }
        Ok(())
    }
}

fn storage_error(e: sqlx::Error) -> RepoRetrieveError {
    RepoRetrieveError::StorageError(e.to_string())
}

#[async_trait::async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create_user(&self, user: User) -> Result<(), RepoCreateError> {
        sqlx::query(
            "INSERT INTO users (id, username, password_hash, refresh_token_hash, rating, wins, draws, losses) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(user.id.to_string())
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.refresh_token_hash)
        .bind(user.stats.rating)
        .bind(i64::from(user.stats.wins))
        .bind(i64::from(user.stats.draws))
        .bind(i64::from(user.stats.losses))
        .execute(&self.pool)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db_err) if db_err.is_unique_violation() => RepoCreateError::Conflict,
            _ => RepoCreateError::StorageError(e.to_string()),
        })?;
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> Result<User, RepoRetrieveError> {
        if let Some(user) = self.user_cache.get(&id) {
            return Ok(user);
        }
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?
            .ok_or(RepoRetrieveError::NotFound)?;
        let user = Self::user_from_row(&row)?;
        self.user_cache.insert(id, user.clone());
        Ok(user)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<User, RepoRetrieveError> {
        let row = sqlx::query("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?
            .ok_or(RepoRetrieveError::NotFound)?;
        Self::user_from_row(&row)
    }

    async fn update_password_hash(
        &self,
        id: UserId,
        password_hash: String,
    ) -> Result<(), RepoUpdateError> {
        self.update_column(
            id,
            "UPDATE users SET password_hash = ? WHERE id = ?",
            Some(password_hash),
        )
        .await
    }

    async fn update_refresh_token_hash(
        &self,
        id: UserId,
        refresh_token_hash: Option<String>,
    ) -> Result<(), RepoUpdateError> {
        self.update_column(
            id,
            "UPDATE users SET refresh_token_hash = ? WHERE id = ?",
            refresh_token_hash,
        )
        .await
    }

    async fn update_user_pair<R: Send + 'static>(
        &self,
        first: UserId,
        second: UserId,
        calc_fn: impl FnOnce(UserStats, UserStats) -> (UserStats, UserStats, R) + Send + 'static,
    ) -> Result<R, RepoUpdateError> {
        // Take the write lock up front. A deferred transaction that reads
        // first fails with SQLITE_BUSY when another writer got there in between.
        let mut tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(|e| RepoUpdateError::StorageError(e.to_string()))?;

        let first_stats = Self::fetch_stats(&mut tx, first).await?;
        let second_stats = Self::fetch_stats(&mut tx, second).await?;
        let (first_stats, second_stats, result) = calc_fn(first_stats, second_stats);
        Self::write_stats(&mut tx, first, first_stats).await?;
        Self::write_stats(&mut tx, second, second_stats).await?;

        tx.commit().await.map_err(|e| {
            log::error!("Failed to commit stats of {} and {}: {}", first, second, e);
            RepoUpdateError::StorageError(e.to_string())
        })?;
        self.user_cache.invalidate(&first);
        self.user_cache.invalidate(&second);
        Ok(result)
    }
}
