//! Database initialization
//!
//! Creates the database file and schema on first run; re-running against an
//! existing database is safe (CREATE TABLE IF NOT EXISTS plus idempotent
//! versioned migrations).

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    configure_pool(&pool).await?;
    create_tables(&pool).await?;

    // Idempotent - safe to call multiple times
    crate::db::migrations::run_migrations(&pool).await?;
    crate::db::settings::init_default_settings(&pool).await?;

    // Busy timeout is itself a setting; re-apply the configured value
    let timeout_ms: i64 = crate::db::settings::get_setting_or_init(&pool, "busy_timeout_ms", "5000")
        .await?
        .parse()
        .unwrap_or(5000);
    sqlx::query(&format!("PRAGMA busy_timeout = {}", timeout_ms))
        .execute(&pool)
        .await?;

    Ok(pool)
}

async fn configure_pool(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;

    // WAL allows the report generator to read while a handler writes
    sqlx::query("PRAGMA journal_mode = WAL").execute(pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(pool).await?;

    Ok(())
}

async fn create_tables(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;
    create_settings_table(pool).await?;
    create_tenders_table(pool).await?;
    create_bidders_table(pool).await?;
    create_bids_table(pool).await?;
    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_tenders_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tenders (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            nit_number TEXT NOT NULL,
            work_name TEXT NOT NULL,
            estimated_cost REAL NOT NULL,
            schedule_amount REAL,
            earnest_money REAL,
            time_of_completion_months INTEGER,
            ee_name TEXT,
            tender_date TEXT,
            submission_deadline TEXT,
            status TEXT NOT NULL DEFAULT 'draft',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_tenders_nit ON tenders(nit_number)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_bidders_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS bidders (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            contact TEXT,
            address TEXT,
            registration_number TEXT,
            rating INTEGER,
            last_used TEXT,
            usage_count INTEGER NOT NULL DEFAULT 1
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_bidders_name ON bidders(name)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_bids_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS bids (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            tender_id INTEGER NOT NULL,
            bidder_name TEXT NOT NULL,
            percentage REAL NOT NULL,
            amount REAL NOT NULL,
            contact TEXT,
            submitted_at TEXT,
            is_lowest INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            FOREIGN KEY (tender_id) REFERENCES tenders (id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_bids_tender_id ON bids(tender_id)")
        .execute(pool)
        .await?;

    Ok(())
}
