//! tender-server library - Tender management HTTP service
//!
//! JSON API over the tender database: tender/bidder/bid CRUD, bid
//! comparison, file ingestion and statutory report generation.

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::cors::CorsLayer;
use sqlx::SqlitePool;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tender_common::cache::TtlCache;
use tender_common::config::DataPaths;
use tender_common::db::BidderStats;

pub mod api;
pub mod ingest;
pub mod reports;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Root/templates/outputs locations
    pub paths: DataPaths,
    /// Memoized bidder statistics
    pub stats_cache: Arc<Mutex<TtlCache<&'static str, BidderStats>>>,
    /// Upload size cap in bytes
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(db: SqlitePool, paths: DataPaths, stats_ttl: Duration, max_upload_mb: u64) -> Self {
        Self {
            db,
            paths,
            stats_cache: Arc::new(Mutex::new(TtlCache::new(stats_ttl))),
            max_upload_bytes: max_upload_mb as usize * 1024 * 1024,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{delete, get, post, put};

    let max_upload_bytes = state.max_upload_bytes;

    Router::new()
        .route("/health", get(api::health_check))
        .route("/api/tenders", get(api::list_tenders).post(api::create_tender))
        .route(
            "/api/tenders/:id",
            get(api::get_tender)
                .put(api::update_tender)
                .delete(api::delete_tender),
        )
        .route("/api/tenders/:id/status", post(api::update_status))
        .route("/api/tenders/:id/bids", put(api::replace_bids))
        .route("/api/tenders/:id/comparison", get(api::get_comparison))
        .route("/api/tenders/:id/reports", post(api::generate_report))
        .route("/api/bidders", get(api::list_bidders).post(api::create_bidder))
        .route("/api/bidders/recent", get(api::recent_bidders))
        .route("/api/bidders/:id", delete(api::delete_bidder))
        .route("/api/upload", post(api::upload_file))
        .route("/api/stats", get(api::get_stats))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
