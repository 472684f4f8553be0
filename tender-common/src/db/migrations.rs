//! Database schema migrations
//!
//! Versioned, idempotent migrations so existing databases upgrade in place
//! without manual deletion. Guidelines:
//!
//! 1. Never modify an existing migration; add a new one.
//! 2. Each migration must be safe to run against a database that already
//!    has the change (check before altering).
//! 3. Prefer ALTER TABLE over DROP/CREATE to preserve data.

use crate::Result;
use sqlx::SqlitePool;
use tracing::info;

/// Current schema version. Increment when adding a migration.
const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Get current schema version; 0 when the table is missing or empty
async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let table_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM sqlite_master
            WHERE type='table' AND name='schema_version'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        return Ok(0);
    }

    let version: Option<i32> =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    Ok(version.unwrap_or(0))
}

async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;
    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let version = get_schema_version(pool).await?;

    if version >= CURRENT_SCHEMA_VERSION {
        return Ok(());
    }

    info!(
        "Migrating database schema from v{} to v{}",
        version, CURRENT_SCHEMA_VERSION
    );

    if version < 1 {
        // v1: baseline schema, created by init::create_tables
        set_schema_version(pool, 1).await?;
    }

    if version < 2 {
        migrate_v2(pool).await?;
        set_schema_version(pool, 2).await?;
    }

    Ok(())
}

/// v2: bidder historical rating column for profiles created before the
/// rating field existed
async fn migrate_v2(pool: &SqlitePool) -> Result<()> {
    let has_column: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM pragma_table_info('bidders') WHERE name = 'rating'",
    )
    .fetch_one(pool)
    .await?;

    if has_column == 0 {
        sqlx::query("ALTER TABLE bidders ADD COLUMN rating INTEGER")
            .execute(pool)
            .await?;
        info!("Migration v2: added rating column to bidders table");
    }

    Ok(())
}
