//! Database migration management for the Postgres store.

use sqlx::PgPool;

use crate::error::StoreError;

/// Run all pending database migrations.
///
/// Migrations are embedded at compile time from the `migrations/`
/// directory and run in filename order.
///
/// # Errors
///
/// Returns `StoreError::MigrationFailed` if any migration fails to apply.
pub async fn run_migrations(pool: &PgPool) -> Result<(), StoreError> {
    tracing::info!("Running database migrations...");

    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(StoreError::MigrationFailed)?;

    tracing::info!("Migrations completed successfully");
    Ok(())
}
