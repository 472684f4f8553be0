//! File upload endpoint
//!
//! Accepts one multipart file, parses it and returns the extracted
//! records with their validation findings. Nothing is persisted; the
//! client reviews the extraction and saves through the tender endpoints.

use axum::extract::{Multipart, State};
use axum::Json;
use serde_json::{json, Value};
use tender_common::{validation, Error};
use tracing::info;

use crate::api::ApiError;
use crate::ingest;
use crate::AppState;

pub async fn upload_file(
    State(_state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidInput(format!("malformed multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .map(|n| n.to_string())
            .ok_or_else(|| Error::InvalidInput("file field has no filename".to_string()))?;
        let data = field
            .bytes()
            .await
            .map_err(|e| Error::InvalidInput(format!("failed to read upload: {}", e)))?;
        upload = Some((filename, data.to_vec()));
        break;
    }

    let (filename, data) = upload
        .ok_or_else(|| Error::InvalidInput("multipart field 'file' is required".to_string()))?;
    if data.is_empty() {
        return Err(Error::InvalidInput("uploaded file is empty".to_string()).into());
    }

    info!("Parsing upload '{}' ({} bytes)", filename, data.len());
    let parsed = ingest::parse_upload(&filename, &data)?;

    // Validate every extracted record so the client can show findings
    // next to the pre-filled form
    let mut report = validation::ValidationReport::default();
    for (i, work) in parsed.works.iter().enumerate() {
        let single = validation::validate_tender(work);
        let prefix = if parsed.works.len() > 1 {
            format!("Work {}: ", i + 1)
        } else {
            String::new()
        };
        report
            .errors
            .extend(single.errors.into_iter().map(|e| format!("{}{}", prefix, e)));
        report
            .warnings
            .extend(single.warnings.into_iter().map(|w| format!("{}{}", prefix, w)));
    }
    if !parsed.bids.is_empty() {
        let estimate = parsed
            .works
            .first()
            .and_then(|w| w.get("estimated_cost"))
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        report.merge(validation::validate_bid_set(&parsed.bids, estimate));
    }

    Ok(Json(json!({
        "filename": filename,
        "works": parsed.works,
        "bids": parsed.bids,
        "notes": parsed.notes,
        "validation": report,
    })))
}
