//! Bid entry and comparison handlers
//!
//! PUT replaces the whole bid set for a tender: entries are validated as a
//! set (duplicates, plausibility), ranked under the configured tie-break
//! policy and stored atomically. The comparison endpoint recomputes ranks
//! from the stored rows, so it always reflects the current settings.

use axum::extract::{Path, State};
use axum::Json;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tender_common::db::{self, BidRow, RuntimeSettings};
use tender_common::ranking::{self, BidQuote};
use tender_common::{dates, validation, Error};

use crate::api::ApiError;
use crate::AppState;

/// One bid as entered. Either the quoted percentage or the amount must be
/// present; the other is derived against the tender's estimate.
#[derive(Debug, Deserialize)]
pub struct BidEntry {
    pub bidder_name: String,
    #[serde(default)]
    pub percentage: Option<f64>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub submitted_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BidSetBody {
    pub bids: Vec<BidEntry>,
}

fn validation_record(entry: &BidEntry, estimated_cost: f64) -> Map<String, Value> {
    let mut record = Map::new();
    record.insert("bidder_name".into(), json!(entry.bidder_name));
    // Derive the missing half so the schema's required-percentage rule
    // only fires when neither value was supplied
    let percentage = entry.percentage.or_else(|| {
        entry
            .amount
            .filter(|_| estimated_cost > 0.0)
            .map(|a| (a - estimated_cost) / estimated_cost * 100.0)
    });
    record.insert("percentage".into(), json!(percentage));
    record.insert("amount".into(), json!(entry.amount));
    record.insert("contact".into(), json!(entry.contact));
    record
}

fn parse_submitted_at(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(ts);
        }
    }
    dates::parse_flexible(raw).and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn to_quote(entry: &BidEntry, estimated_cost: f64) -> Result<BidQuote, Error> {
    let percentage = match (entry.percentage, entry.amount) {
        (Some(p), _) => p,
        (None, Some(a)) => (a - estimated_cost) / estimated_cost * 100.0,
        (None, None) => {
            return Err(Error::Validation(vec![format!(
                "Bidder '{}': either percentage or amount is required",
                entry.bidder_name
            )]))
        }
    };
    let submitted_at = match entry.submitted_at.as_deref() {
        Some(raw) if !raw.trim().is_empty() => Some(parse_submitted_at(raw).ok_or_else(|| {
            Error::Validation(vec![format!(
                "Bidder '{}': unrecognized submission time: {}",
                entry.bidder_name, raw
            )])
        })?),
        _ => None,
    };
    Ok(BidQuote {
        bidder_name: entry.bidder_name.clone(),
        percentage,
        amount: entry.amount,
        contact: entry.contact.clone(),
        submitted_at,
    })
}

pub async fn replace_bids(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<BidSetBody>,
) -> Result<Json<Value>, ApiError> {
    let tender = db::get_tender(&state.db, id).await?;

    let records: Vec<Map<String, Value>> = body
        .bids
        .iter()
        .map(|e| validation_record(e, tender.estimated_cost))
        .collect();
    let report = validation::validate_bid_set(&records, tender.estimated_cost);
    if !report.is_valid() {
        return Err(Error::Validation(report.errors).into());
    }

    let quotes: Vec<BidQuote> = body
        .bids
        .iter()
        .map(|e| to_quote(e, tender.estimated_cost))
        .collect::<Result<_, _>>()?;

    let settings = RuntimeSettings::load(&state.db).await?;
    let ranked = ranking::rank_bids(
        tender.estimated_cost,
        &quotes,
        settings.ranking_tie_break,
        settings.abnormal_bid_threshold_pct,
    )?;

    db::replace_bids(&state.db, id, &ranked).await?;

    // Stored bids changed, so memoized statistics are stale
    if let Ok(mut cache) = state.stats_cache.lock() {
        cache.clear();
    }

    Ok(Json(json!({ "bids": ranked, "warnings": report.warnings })))
}

pub(crate) fn row_to_quote(row: &BidRow) -> BidQuote {
    BidQuote {
        bidder_name: row.bidder_name.clone(),
        percentage: row.percentage,
        amount: Some(row.amount),
        contact: row.contact.clone(),
        submitted_at: row.submitted_at.as_deref().and_then(parse_submitted_at),
    }
}

pub async fn get_comparison(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let tender = db::get_tender(&state.db, id).await?;
    let rows = db::list_bids(&state.db, id).await?;
    if rows.is_empty() {
        return Err(Error::InvalidInput(format!("tender {} has no bids", id)).into());
    }

    let quotes: Vec<BidQuote> = rows.iter().map(row_to_quote).collect();
    let settings = RuntimeSettings::load(&state.db).await?;
    let outcome = ranking::rank_and_analyze(
        tender.estimated_cost,
        &quotes,
        settings.ranking_tie_break,
        settings.abnormal_bid_threshold_pct,
    )?;
    let recommendation = ranking::recommendation(&outcome.analysis);

    Ok(Json(json!({
        "tender": tender,
        "bids": outcome.bids,
        "analysis": outcome.analysis,
        "recommendation": recommendation,
    })))
}
