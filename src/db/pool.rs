use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::{info, instrument};

use crate::db::DbError;

#[derive(Clone)]
pub struct DbPool {
    pool: SqlitePool,
}

impl DbPool {
    /// Open the database at `url`, creating the file if needed, and apply migrations
    #[instrument(skip(url))]
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, DbError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("Database ready ({} max connections)", max_connections);

        Ok(Self { pool })
    }

    pub fn into_inner(self) -> SqlitePool {
        self.pool
    }
}
