//! Tender CRUD handlers
//!
//! Create and update run the full validation pass first and reject with
//! the field-level error list before anything touches the database.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tender_common::db::{self, NewTender, TenderStatus};
use tender_common::{dates, validation, Error};

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

/// Build the validation record from the request body.
///
/// The completion field is stored as `time_of_completion_months` but the
/// validation schema names it `time_of_completion`, matching the entry
/// form label.
fn validation_record(tender: &NewTender) -> Map<String, Value> {
    let mut record = Map::new();
    record.insert("nit_number".into(), json!(tender.nit_number));
    record.insert("work_name".into(), json!(tender.work_name));
    record.insert("estimated_cost".into(), json!(tender.estimated_cost));
    record.insert("schedule_amount".into(), json!(tender.schedule_amount));
    record.insert("earnest_money".into(), json!(tender.earnest_money));
    record.insert(
        "time_of_completion".into(),
        json!(tender.time_of_completion_months),
    );
    record.insert("ee_name".into(), json!(tender.ee_name));
    record.insert("tender_date".into(), json!(tender.tender_date));
    record
}

/// Validate and normalize a tender body, returning the cleaned record.
///
/// Dates are normalized to ISO form here so every downstream consumer
/// (queries, reports) sees one format.
fn check_tender(mut tender: NewTender) -> Result<(NewTender, Vec<String>), Error> {
    let record = validation_record(&tender);
    let report = validation::validate_tender(&record);
    if !report.is_valid() {
        return Err(Error::Validation(report.errors));
    }

    for field in [&mut tender.tender_date, &mut tender.submission_deadline] {
        if let Some(raw) = field.as_deref() {
            let raw = raw.trim();
            if raw.is_empty() {
                *field = None;
            } else {
                let parsed = dates::parse_flexible(raw).ok_or_else(|| {
                    Error::Validation(vec![format!("Unrecognized date: {}", raw)])
                })?;
                *field = Some(parsed.format("%Y-%m-%d").to_string());
            }
        }
    }

    Ok((tender, report.warnings))
}

pub async fn list_tenders(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Value>, ApiError> {
    let tenders = db::list_tenders(&state.db, params.limit.clamp(1, 1000)).await?;
    Ok(Json(json!({ "tenders": tenders })))
}

pub async fn create_tender(
    State(state): State<AppState>,
    Json(body): Json<NewTender>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let (tender, mut warnings) = check_tender(body)?;
    if let Some(existing) = db::get_tender_by_nit(&state.db, &tender.nit_number).await? {
        warnings.push(format!(
            "A tender with NIT {} already exists (id {})",
            existing.nit_number, existing.id
        ));
    }
    let id = db::create_tender(&state.db, &tender).await?;
    let created = db::get_tender(&state.db, id).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "tender": created, "warnings": warnings })),
    ))
}

pub async fn get_tender(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let tender = db::get_tender(&state.db, id).await?;
    let bids = db::list_bids(&state.db, id).await?;
    Ok(Json(json!({ "tender": tender, "bids": bids })))
}

pub async fn update_tender(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<NewTender>,
) -> Result<Json<Value>, ApiError> {
    let (tender, warnings) = check_tender(body)?;
    db::update_tender(&state.db, id, &tender).await?;
    let updated = db::get_tender(&state.db, id).await?;
    Ok(Json(json!({ "tender": updated, "warnings": warnings })))
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: TenderStatus,
}

pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<StatusBody>,
) -> Result<Json<Value>, ApiError> {
    let tender = db::update_tender_status(&state.db, id, body.status).await?;
    Ok(Json(json!({ "tender": tender })))
}

pub async fn delete_tender(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    db::delete_tender(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
