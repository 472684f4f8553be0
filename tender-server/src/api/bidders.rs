//! Bidder directory handlers

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tender_common::db::{self, BidderProfile};

use crate::api::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    100
}

/// Fields accepted when registering a bidder directly
#[derive(Debug, Deserialize)]
pub struct NewBidder {
    pub name: String,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub registration_number: Option<String>,
    #[serde(default)]
    pub rating: Option<i64>,
}

pub async fn list_bidders(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Value>, ApiError> {
    let bidders = db::list_recent_bidders(&state.db, params.limit.clamp(1, 1000)).await?;
    Ok(Json(json!({ "bidders": bidders })))
}

pub async fn create_bidder(
    State(state): State<AppState>,
    Json(body): Json<NewBidder>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let profile = BidderProfile {
        id: 0,
        name: body.name,
        contact: body.contact,
        address: body.address,
        registration_number: body.registration_number,
        rating: body.rating,
        last_used: None,
        usage_count: 0,
    };
    let id = db::create_bidder(&state.db, &profile).await?;
    let created = db::get_bidder(&state.db, id).await?;
    Ok((StatusCode::CREATED, Json(json!({ "bidder": created }))))
}

/// Most-used bidders, for the entry form's auto-suggestion list
pub async fn recent_bidders(
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let bidders = db::list_recent_bidders(&state.db, 20).await?;
    Ok(Json(json!({ "bidders": bidders })))
}

pub async fn delete_bidder(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    db::delete_bidder(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
