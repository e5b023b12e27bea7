//! Connection pool and schema bootstrap.

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::instrument;

use catalog_products::{StoreError, StoreResult};

use crate::config::DatabaseConfig;
use crate::store::postgres::map_sqlx_error;

/// Statements run by [`ensure_schema`], in order. Each is idempotent.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS products (
        id       BIGSERIAL PRIMARY KEY,
        category TEXT NOT NULL,
        name     TEXT NOT NULL
    )
    "#,
    // Serves both the category filter and the seek (category, id > ?) scan.
    "CREATE INDEX IF NOT EXISTS products_category_id_idx ON products (category, id)",
];

/// Open a connection pool for the configured database.
#[instrument(skip(config), fields(max_connections = config.max_connections), err)]
pub async fn connect(config: &DatabaseConfig) -> StoreResult<PgPool> {
    let url = config
        .url
        .as_deref()
        .ok_or_else(|| StoreError::Unavailable("no database url configured".to_string()))?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
        .connect(url)
        .await
        .map_err(|e| map_sqlx_error("connect", e))?;

    tracing::info!("database pool ready");
    Ok(pool)
}

/// Create the products table and its index if they are missing.
#[instrument(skip(pool), err)]
pub async fn ensure_schema(pool: &PgPool) -> StoreResult<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
    }
    Ok(())
}
