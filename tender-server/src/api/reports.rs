//! Report generation handler

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tender_common::db::{self, RuntimeSettings};
use tender_common::ranking;

use crate::api::bids::row_to_quote;
use crate::api::ApiError;
use crate::reports::{self, DocumentType, OutputFormat};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ReportBody {
    pub document: DocumentType,
    #[serde(default)]
    pub format: OutputFormat,
}

pub async fn generate_report(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<ReportBody>,
) -> Result<Json<Value>, ApiError> {
    let tender = db::get_tender(&state.db, id).await?;
    let rows = db::list_bids(&state.db, id).await?;

    // Documents can be generated before bids arrive (e.g. the scrutiny
    // sheet header); award fields render blank in that case
    let ranked = if rows.is_empty() {
        Vec::new()
    } else {
        let quotes: Vec<_> = rows.iter().map(row_to_quote).collect();
        let settings = RuntimeSettings::load(&state.db).await?;
        ranking::rank_bids(
            tender.estimated_cost,
            &quotes,
            settings.ranking_tie_break,
            settings.abnormal_bid_threshold_pct,
        )?
    };

    let report = reports::generate(&state.paths, body.document, body.format, &tender, &ranked).await?;

    Ok(Json(json!({ "report": report })))
}
