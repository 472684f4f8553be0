//! Bidder statistics endpoint with short-lived memoization

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};
use tender_common::db;

use crate::api::ApiError;
use crate::AppState;

const STATS_KEY: &str = "bidder_stats";

pub async fn get_stats(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    if let Ok(mut cache) = state.stats_cache.lock() {
        if let Some(stats) = cache.get(&STATS_KEY) {
            return Ok(Json(json!({ "stats": stats, "cached": true })));
        }
    }

    let stats = db::bidder_statistics(&state.db).await?;

    if let Ok(mut cache) = state.stats_cache.lock() {
        cache.insert(STATS_KEY, stats.clone());
    }

    Ok(Json(json!({ "stats": stats, "cached": false })))
}
