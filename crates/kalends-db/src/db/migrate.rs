//! Schema migrations embedded from `migrations/`.
//!
//! `diesel_migrations` drives a blocking connection, so every run happens on
//! the blocking thread pool.

use diesel::{Connection, PgConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// ## Summary
/// Applies every migration not yet recorded in `__diesel_schema_migrations`.
///
/// ## Errors
/// Returns an error if the database is unreachable or a migration fails.
#[tracing::instrument(skip(database_url))]
pub async fn apply_schema(database_url: &str) -> anyhow::Result<()> {
    let url = database_url.to_owned();
    let applied = tokio::task::spawn_blocking(move || {
        let mut conn = PgConnection::establish(&url)?;
        let versions = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| anyhow::anyhow!("Failed to run migrations: {e}"))?
            .into_iter()
            .map(|version| version.to_string())
            .collect::<Vec<_>>();
        anyhow::Ok(versions)
    })
    .await??;

    tracing::info!(applied = ?applied, "Database schema is up to date");
    Ok(())
}

/// ## Summary
/// Reverts every applied migration. Used to reset test databases.
///
/// ## Errors
/// Returns an error if the database is unreachable or a revert fails.
#[tracing::instrument(skip(database_url))]
pub async fn drop_schema(database_url: &str) -> anyhow::Result<()> {
    let url = database_url.to_owned();
    tokio::task::spawn_blocking(move || {
        let mut conn = PgConnection::establish(&url)?;
        conn.revert_all_migrations(MIGRATIONS)
            .map_err(|e| anyhow::anyhow!("Failed to revert migrations: {e}"))?;
        anyhow::Ok(())
    })
    .await??;

    tracing::warn!("Reverted all DAV migrations");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::pg::Pg;
    use diesel::migration::MigrationSource;

    #[test_log::test]
    fn dav_tables_migration_is_embedded() {
        let migrations = MigrationSource::<Pg>::migrations(&MIGRATIONS).unwrap();
        assert_eq!(migrations.len(), 1);
        assert!(migrations[0].name().to_string().starts_with("2025-01-01-000000"));
    }

    #[test_log::test]
    fn change_token_constraint_is_created() {
        let up = include_str!("../../migrations/2025-01-01-000000_create_dav_tables/up.sql");
        assert!(up.contains(crate::error::CHANGE_TOKEN_CONSTRAINT));
    }
}
