//! Runtime settings stored in the database
//!
//! Tunable values live in the `settings` table rather than the TOML file
//! so they survive restarts and can be changed without redeploying. Reads
//! follow a read-or-initialize pattern: a missing key is written back with
//! its built-in default so the table always shows the effective value.

use crate::ranking::TieBreak;
use crate::Result;
use sqlx::SqlitePool;
use tracing::info;

/// Read a setting, initializing it with the default when absent
pub async fn get_setting_or_init(pool: &SqlitePool, key: &str, default: &str) -> Result<String> {
    let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;

    match value {
        Some(v) => Ok(v),
        None => {
            info!("Setting '{}' not found, initializing to '{}'", key, default);
            set_setting(pool, key, default).await?;
            Ok(default.to_string())
        }
    }
}

pub async fn set_setting(pool: &SqlitePool, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        "INSERT OR REPLACE INTO settings (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)",
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;
    Ok(())
}

/// Seed every known setting so the table is self-documenting on first run
pub async fn init_default_settings(pool: &SqlitePool) -> Result<()> {
    for (key, default) in [
        ("abnormal_bid_threshold_pct", "20"),
        ("ranking_tie_break", "earliest_submission"),
        ("max_upload_mb", "25"),
        ("busy_timeout_ms", "5000"),
        ("stats_cache_ttl_secs", "60"),
    ] {
        get_setting_or_init(pool, key, default).await?;
    }
    Ok(())
}

/// Effective runtime settings, loaded together
#[derive(Debug, Clone)]
pub struct RuntimeSettings {
    pub abnormal_bid_threshold_pct: f64,
    pub ranking_tie_break: TieBreak,
    pub max_upload_mb: u64,
    pub stats_cache_ttl_secs: u64,
}

impl RuntimeSettings {
    pub async fn load(pool: &SqlitePool) -> Result<Self> {
        let threshold = get_setting_or_init(pool, "abnormal_bid_threshold_pct", "20")
            .await?
            .parse()
            .unwrap_or(20.0);
        let tie_break =
            TieBreak::from_setting(&get_setting_or_init(pool, "ranking_tie_break", "earliest_submission").await?);
        let max_upload_mb = get_setting_or_init(pool, "max_upload_mb", "25")
            .await?
            .parse()
            .unwrap_or(25);
        let stats_cache_ttl_secs = get_setting_or_init(pool, "stats_cache_ttl_secs", "60")
            .await?
            .parse()
            .unwrap_or(60);

        Ok(Self {
            abnormal_bid_threshold_pct: threshold,
            ranking_tie_break: tie_break,
            max_upload_mb,
            stats_cache_ttl_secs,
        })
    }
}
