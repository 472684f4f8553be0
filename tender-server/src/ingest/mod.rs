//! Tender file ingestion
//!
//! Turns an uploaded Excel workbook or PDF notice into candidate tender
//! records. Extraction is best-effort: parsers fill whatever fields they
//! can recognize and leave the rest absent, so the validation layer (not
//! the parser) decides what is usable. Nothing here writes to the
//! database.

pub mod excel;
pub mod pdf;

use serde::Serialize;
use serde_json::{Map, Value};
use tender_common::{Error, Result};

/// Extracted content of one uploaded file, before validation
#[derive(Debug, Default, Serialize)]
pub struct ParsedUpload {
    /// Candidate tender records. A NIT workbook covering several works
    /// yields one record per work, all sharing the NIT number.
    pub works: Vec<Map<String, Value>>,
    /// Candidate bid records, when the file carries bidder columns
    pub bids: Vec<Map<String, Value>>,
    /// Non-fatal observations worth surfacing to the user
    pub notes: Vec<String>,
}

/// Dispatch an upload to the parser for its file type.
pub fn parse_upload(filename: &str, data: &[u8]) -> Result<ParsedUpload> {
    let extension = filename
        .rsplit('.')
        .next()
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => excel::parse(data),
        "pdf" => pdf::parse(data),
        other => Err(Error::InvalidInput(format!(
            "unsupported file type '.{}' (expected .xlsx, .xls, .xlsm or .pdf)",
            other
        ))),
    }
}
