//! PostgreSQL persistence for the Canopy wiki.
//!
//! Models are plain `FromRow` structs; repositories are zero-sized structs
//! whose associated functions take a pool or an open connection as their
//! first argument so callers can compose them inside one transaction.

use sqlx::postgres::PgPoolOptions;

pub mod models;
pub mod repositories;
pub mod search_indexer;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to confirm the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply all pending migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}
