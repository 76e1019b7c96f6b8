//! Database initialization: pool construction plus migrations

use docurag_config::DatabaseConfig;
use sqlx::PgPool;

/// Create a connection pool and run pending migrations.
///
/// # Errors
/// Returns an error if the pool cannot be established or a migration fails
/// to apply.
pub async fn initialize_database(config: &DatabaseConfig) -> anyhow::Result<PgPool> {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}
