//! tender-server - Tender document management service
//!
//! Ingests Excel/PDF tender files, stores tenders/bidders/bids in SQLite,
//! computes bid rankings and renders statutory documents via LaTeX.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tender_common::config;
use tender_common::db;
use tender_server::{build_router, AppState};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "tender-server", about = "Tender document management service")]
struct Args {
    /// Root folder for database, templates and outputs
    #[arg(long)]
    root: Option<PathBuf>,

    /// HTTP port (overrides config file)
    #[arg(long)]
    port: Option<u16>,

    /// HTTP bind address (overrides config file)
    #[arg(long)]
    host: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Build identification first, before any database delays
    info!(
        "Starting tender-server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let toml_config = config::load_toml_config()?;
    let root = config::resolve_root_folder(args.root.as_deref(), &toml_config);
    let paths = config::DataPaths::new(root);
    paths.ensure_directories()?;
    info!("Root folder: {}", paths.root.display());

    let db_path = paths.database_path();
    let pool = match db::init_database(&db_path).await {
        Ok(pool) => {
            info!("✓ Database ready: {}", db_path.display());
            pool
        }
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return Err(e.into());
        }
    };

    // Statutory templates must exist before the first report request
    tender_server::reports::ensure_default_templates(&paths.templates_dir())?;

    let settings = db::RuntimeSettings::load(&pool).await?;
    info!(
        "Runtime settings: abnormal threshold {}%, tie-break {}, upload cap {} MB",
        settings.abnormal_bid_threshold_pct,
        settings.ranking_tie_break.as_setting(),
        settings.max_upload_mb
    );

    let state = AppState::new(
        pool,
        paths,
        Duration::from_secs(settings.stats_cache_ttl_secs),
        settings.max_upload_mb,
    );
    let app = build_router(state);

    let host = args.host.unwrap_or(toml_config.host);
    let port = args.port.unwrap_or(toml_config.port);
    let listener = tokio::net::TcpListener::bind((host.as_str(), port)).await?;
    info!("tender-server listening on http://{}:{}", host, port);
    info!("Health check: http://{}:{}/health", host, port);

    axum::serve(listener, app).await?;

    Ok(())
}
