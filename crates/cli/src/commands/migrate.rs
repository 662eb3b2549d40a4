//! Database migration command.
//!
//! Runs the `desk` schema migrations embedded from `crates/web/migrations/`,
//! then the session store's own migration (`tower_sessions` schema).
//!
//! Migration files follow sqlx's naming:
//! ```text
//! migrations/
//! ├── 20260301000001_create_desk_schema.sql
//! ├── 20260301000002_create_products_and_users.sql
//! └── 20260301000003_create_tickets.sql
//! ```

use tower_sessions_sqlx_store::PostgresStore;

use supportdesk_web::db::{MIGRATOR, create_pool};

use super::{MissingDatabaseUrl, database_url};

/// Migration failures.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error(transparent)]
    MissingEnvVar(#[from] MissingDatabaseUrl),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run all migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the database is unreachable or a migration
/// fails.
pub async fn run() -> Result<(), MigrationError> {
    let database_url = database_url()?;

    tracing::info!("Connecting to database...");
    let pool = create_pool(&database_url).await?;

    tracing::info!(count = MIGRATOR.iter().count(), "Running desk migrations...");
    MIGRATOR.run(&pool).await?;

    tracing::info!("Running session store migration...");
    PostgresStore::new(pool).migrate().await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
