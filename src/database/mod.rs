//! The SQLite database holding tags and photos.

use std::str::FromStr as _;

use camino::Utf8Path;
use sqlx::{
    query::Query,
    sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePoolOptions},
    Pool, Sqlite,
};

use crate::error::DatabaseError;

pub mod photos;
pub mod tags;

pub const BIRDLENS_DB_FILE: &str = "birdlens.sqlite";

/// A handle to the BirdLens database. Cheap to clone.
#[derive(Clone, Debug)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Opens (or creates) the database file at `path` and runs migrations.
    #[tracing::instrument]
    pub async fn connect(path: &Utf8Path) -> Result<Self, DatabaseError> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite://{path}"))
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .inspect_err(|e| tracing::error!("Failed to connect to the database. err: {e}"))
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

        Self::from_pool(pool).await
    }

    /// A private database that lives in memory. Useful for tests.
    pub async fn in_memory() -> Result<Self, DatabaseError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

        // every in-memory connection gets its own database, so there can
        // only be one, and it can't be allowed to close
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

        Self::from_pool(pool).await
    }

    /// Wraps an existing pool, running migrations on it first.
    pub async fn from_pool(pool: Pool<Sqlite>) -> Result<Self, DatabaseError> {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .inspect_err(|e| {
                tracing::error!(
                    "Database connection succeeded, but migrating the database failed! err: {e}"
                )
            })?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

/// Something that can be written into one of our tables.
pub trait InsertIntoTable {
    /// Makes the `INSERT` for this value.
    fn make_insertion_query(&self) -> Query<'_, Sqlite, SqliteArguments<'_>>;
}
