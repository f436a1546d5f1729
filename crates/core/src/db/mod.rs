pub mod repository;
pub mod sqlite;

use sqlx::SqlitePool;

use crate::error::Result;

pub enum DatabasePool {
    Sqlite(SqlitePool),
}

impl DatabasePool {
    /// Connect to a SQLite database and make sure the booking tables exist.
    pub async fn new_sqlite(path: &str) -> Result<Self> {
        let pool = SqlitePool::connect(path).await?;
        Self::ensure_schema(&pool).await?;
        Ok(DatabasePool::Sqlite(pool))
    }

    /// Create a new in-memory SQLite database with the booking tables. Useful for testing.
    pub async fn new_sqlite_memory() -> Result<Self> {
        let pool = SqlitePool::connect(":memory:").await?;
        Self::ensure_schema(&pool).await?;
        Ok(DatabasePool::Sqlite(pool))
    }

    /// Close every connection held by the pool.
    pub async fn close(&self) {
        match self {
            DatabasePool::Sqlite(pool) => pool.close().await,
        }
    }

    async fn ensure_schema(pool: &SqlitePool) -> Result<()> {
        let schema = include_str!("../../../../migrations/sqlite/001_initial_schema.sql");

        for statement in schema.split(';') {
            let trimmed = statement.trim();
            if !trimmed.is_empty() {
                sqlx::query(trimmed).execute(pool).await?;
            }
        }
        Ok(())
    }
}
