//! PDF tender notice parsing
//!
//! Extracts text with lopdf, then scrapes fields with patterns keyed on
//! the labels departmental notices actually use. PDF text extraction is
//! lossy, so every field is optional and the caller validates the result.

use lopdf::Document;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Map, Value};
use tender_common::{Error, Result};
use tracing::debug;

use super::ParsedUpload;

static NIT_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:nit|tender)[\s:]*(?:no\.?|number)[\s:]*([A-Za-z0-9/\-]+)")
        .expect("static pattern")
});
static ESTIMATED_COST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:estimated?|cost)[\s:]*(?:rs\.?|₹)?\s*([0-9,]+(?:\.[0-9]+)?)")
        .expect("static pattern")
});
static EARNEST_MONEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:earnest|security)[\s:]*(?:money|deposit)?[\s:]*(?:rs\.?|₹)?\s*([0-9,]+(?:\.[0-9]+)?)")
        .expect("static pattern")
});
static COMPLETION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:completion|duration)[\s:]*(?:time|period)?[\s:]*([0-9]+)\s*months?")
        .expect("static pattern")
});
static WORK_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:name of work|work)[\s:]+(.{10,200}?)(?:\n|estimated|cost|rs\.|₹)")
        .expect("static pattern")
});
// Numbered list entries quoting a percentage: "1. ABC Company  -5.5%"
static BIDDER_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*\d+[.)]\s*([A-Za-z][A-Za-z0-9\s.\-&(),]{1,80}?)\s+(-?\d+(?:\.\d+)?)\s*%")
        .expect("static pattern")
});

pub fn parse(data: &[u8]) -> Result<ParsedUpload> {
    let doc = Document::load_mem(data)
        .map_err(|e| Error::Parse(format!("failed to open PDF: {}", e)))?;

    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
    if pages.is_empty() {
        return Err(Error::Parse("PDF contains no pages".to_string()));
    }

    let text = doc
        .extract_text(&pages)
        .map_err(|e| Error::Parse(format!("failed to extract PDF text: {}", e)))?;

    if text.trim().is_empty() {
        return Err(Error::Parse(
            "no text content in PDF (scanned image?)".to_string(),
        ));
    }

    debug!("Extracted {} characters from {} PDF page(s)", text.len(), pages.len());
    scrape(&text)
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.replace(',', "").parse().ok()
}

/// Scrape tender fields out of extracted notice text.
fn scrape(text: &str) -> Result<ParsedUpload> {
    let mut tender = Map::new();
    let mut notes = Vec::new();

    if let Some(caps) = NIT_NUMBER.captures(text) {
        tender.insert("nit_number".into(), json!(caps[1].trim()));
    }
    if let Some(caps) = WORK_NAME.captures(text) {
        tender.insert(
            "work_name".into(),
            json!(caps[1].trim().trim_end_matches([':', '-']).trim()),
        );
    }
    if let Some(n) = ESTIMATED_COST.captures(text).and_then(|c| parse_number(&c[1])) {
        tender.insert("estimated_cost".into(), json!(n));
    }
    if let Some(n) = EARNEST_MONEY.captures(text).and_then(|c| parse_number(&c[1])) {
        tender.insert("earnest_money".into(), json!(n));
    }
    if let Some(months) = COMPLETION.captures(text).and_then(|c| c[1].parse::<i64>().ok()) {
        tender.insert("time_of_completion".into(), json!(months));
    }

    let mut bids = Vec::new();
    for caps in BIDDER_LINE.captures_iter(text) {
        let name = caps[1].trim().to_string();
        if let Ok(pct) = caps[2].parse::<f64>() {
            let mut bid = Map::new();
            bid.insert("bidder_name".into(), json!(name));
            bid.insert("percentage".into(), json!(pct));
            bids.push(bid);
        }
    }
    if !bids.is_empty() {
        notes.push(format!("{} bidder(s) found in notice text", bids.len()));
    }

    if tender.is_empty() {
        return Err(Error::Parse(
            "no recognizable tender fields in PDF text".to_string(),
        ));
    }

    notes.push("PDF extraction is best-effort; review fields before saving".to_string());
    Ok(ParsedUpload {
        works: vec![tender],
        bids,
        notes,
    })
}
