//! CLI command implementations.

pub mod migrate;
pub mod seed;

use secrecy::SecretString;

/// Missing `DESK_DATABASE_URL` / `DATABASE_URL`.
#[derive(Debug, thiserror::Error)]
#[error("Missing environment variable: DESK_DATABASE_URL (or DATABASE_URL)")]
pub struct MissingDatabaseUrl;

/// Database URL from the environment, loading `.env` first.
///
/// # Errors
///
/// Returns `MissingDatabaseUrl` if neither variable is set.
pub fn database_url() -> Result<SecretString, MissingDatabaseUrl> {
    dotenvy::dotenv().ok();

    std::env::var("DESK_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| MissingDatabaseUrl)
}
