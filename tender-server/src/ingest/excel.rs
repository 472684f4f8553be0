//! Excel workbook parsing
//!
//! Tender workbooks arrive in a handful of shapes. Parsers are tried in
//! order of specificity over a normalized cell grid:
//!
//! 1. NIT schedule: header block (NIT number, calling/receipt/opening
//!    dates), a column-header row, then one work per row with estimated
//!    costs quoted in lacs.
//! 2. Header row: field names across the top, one data row, optional
//!    "Bidder N Name/Percentage/Contact" columns.
//! 3. Vertical: label/value pairs down the first two columns.

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::{Duration, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::io::Cursor;
use tender_common::{currency, Error, Result};
use tracing::debug;

use super::ParsedUpload;

// Headers are normalized (spaces to underscores) before matching
static BIDDER_COLUMN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)bidder[\s_]*(\d+)[\s_]*(name|percentage|contact)")
        .expect("static bidder pattern")
});

/// One lakh in rupees; NIT schedules quote estimates in lacs
const LAKH: f64 = 100_000.0;

type Grid = Vec<Vec<Option<Value>>>;

pub fn parse(data: &[u8]) -> Result<ParsedUpload> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(data))
        .map_err(|e| Error::Parse(format!("failed to open workbook: {}", e)))?;

    let sheet_names = workbook.sheet_names().to_vec();
    let first_sheet = sheet_names
        .first()
        .ok_or_else(|| Error::Parse("workbook contains no sheets".to_string()))?
        .clone();

    let range = workbook
        .worksheet_range(&first_sheet)
        .map_err(|e| Error::Parse(format!("failed to read sheet '{}': {}", first_sheet, e)))?;

    let grid: Grid = range
        .rows()
        .map(|row| row.iter().map(cell_value).collect())
        .collect();

    for (name, parser) in [
        ("nit_schedule", parse_nit_schedule as fn(&Grid) -> Option<ParsedUpload>),
        ("header_row", parse_header_row),
        ("vertical", parse_vertical),
    ] {
        if let Some(parsed) = parser(&grid) {
            debug!("Workbook parsed via {} layout", name);
            return Ok(parsed);
        }
    }

    Err(Error::Parse(
        "no recognizable tender data found in workbook".to_string(),
    ))
}

/// Normalize one cell to a JSON value; empty and error cells become None
fn cell_value(cell: &Data) -> Option<Value> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                None
            } else {
                Some(json!(s))
            }
        }
        Data::Float(n) => Some(json!(n)),
        Data::Int(n) => Some(json!(n)),
        Data::Bool(b) => Some(json!(b)),
        // Excel serial dates count days from 1899-12-30 (1900 system)
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            NaiveDate::from_ymd_opt(1899, 12, 30)
                .and_then(|base| base.checked_add_signed(Duration::days(serial as i64)))
                .map(|date| json!(date.format("%Y-%m-%d").to_string()))
        }
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(json!(s.as_str())),
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => {
            // Integers without trailing decimals, matching what the sheet shows
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else {
                n.to_string()
            }
        }
        other => other.to_string(),
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => currency::parse_amount(s),
        _ => None,
    }
}

/// Pull the first integer out of a cell like "12 months"
fn as_months(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_f64().map(|f| f as i64),
        Value::String(s) => {
            let digits: String = s.chars().skip_while(|c| !c.is_ascii_digit())
                .take_while(|c| c.is_ascii_digit())
                .collect();
            digits.parse().ok()
        }
        _ => None,
    }
}

fn cell<'a>(grid: &'a Grid, row: usize, col: usize) -> Option<&'a Value> {
    grid.get(row).and_then(|r| r.get(col)).and_then(|c| c.as_ref())
}

// ---------------------------------------------------------------------------
// Layout 1: NIT schedule with one work per row
// ---------------------------------------------------------------------------

fn parse_nit_schedule(grid: &Grid) -> Option<ParsedUpload> {
    let mut nit_number: Option<String> = None;
    let mut opening_date: Option<String> = None;
    let mut receipt_date: Option<String> = None;

    // Header block: label in column A, value in column C
    for row in 0..4.min(grid.len()) {
        let (Some(label), Some(value)) = (cell(grid, row, 0), cell(grid, row, 2)) else {
            continue;
        };
        let label = as_text(label).to_lowercase();
        if label.contains("nit") && label.contains("number") {
            nit_number = Some(as_text(value));
        } else if label.contains("opening") {
            opening_date = Some(as_text(value));
        } else if label.contains("receipt") {
            receipt_date = Some(as_text(value));
        }
    }
    let nit_number = nit_number?;

    // Column headers on row 5, works from row 6
    let headers: Vec<String> = grid
        .get(4)?
        .iter()
        .map(|c| c.as_ref().map(|v| as_text(v).to_lowercase()).unwrap_or_default())
        .collect();

    let tender_date = opening_date.or(receipt_date);
    let mut works = Vec::new();

    for row in grid.iter().skip(5) {
        let mut work = Map::new();
        for (col, header) in headers.iter().enumerate() {
            let Some(value) = row.get(col).and_then(|c| c.as_ref()) else {
                continue;
            };
            if header.contains("work") || header.contains("name") {
                work.insert("work_name".into(), json!(as_text(value)));
            } else if header.contains("estimated") || header.contains("cost") {
                // Quoted in lacs on the schedule
                if let Some(lacs) = as_number(value) {
                    work.insert("estimated_cost".into(), json!(lacs * LAKH));
                }
            } else if header.contains("schedule") {
                if let Some(n) = as_number(value) {
                    work.insert("schedule_amount".into(), json!(n));
                }
            } else if header.contains("completion") || header.contains("month") {
                if let Some(months) = as_months(value) {
                    work.insert("time_of_completion".into(), json!(months));
                }
            } else if header.contains("earnest") || header.contains("money") {
                if let Some(n) = as_number(value) {
                    work.insert("earnest_money".into(), json!(n));
                }
            }
        }

        if work.contains_key("work_name") && work.contains_key("estimated_cost") {
            work.insert("nit_number".into(), json!(nit_number));
            if let Some(date) = &tender_date {
                work.insert("tender_date".into(), json!(date));
            }
            works.push(work);
        }
    }

    if works.is_empty() {
        return None;
    }

    let notes = vec![format!(
        "NIT schedule: {} work(s) under NIT {}",
        works.len(),
        nit_number
    )];
    Some(ParsedUpload {
        works,
        bids: Vec::new(),
        notes,
    })
}

// ---------------------------------------------------------------------------
// Layout 2: header row with one data row and optional bidder columns
// ---------------------------------------------------------------------------

const COLUMN_ALIASES: &[(&str, &[&str])] = &[
    ("nit_number", &["nit_number", "nit_no", "tender_number", "tender_no"]),
    ("work_name", &["work_name", "work_description", "description", "work"]),
    ("estimated_cost", &["estimated_cost", "estimate", "cost", "amount"]),
    ("schedule_amount", &["schedule_amount", "schedule", "sch_amount"]),
    ("earnest_money", &["earnest_money", "em", "security_deposit"]),
    (
        "time_of_completion",
        &["time_of_completion", "completion_time", "duration", "months"],
    ),
    ("ee_name", &["ee_name", "executive_engineer", "engineer_name", "ee"]),
    ("tender_date", &["date", "tender_date", "submission_date"]),
];

fn normalize_header(raw: &Value) -> String {
    as_text(raw).to_lowercase().replace(' ', "_")
}

fn parse_header_row(grid: &Grid) -> Option<ParsedUpload> {
    let header_row = grid.iter().position(|row| row.iter().any(Option::is_some))?;
    let data_row = header_row + 1;
    if data_row >= grid.len() {
        return None;
    }

    let headers: Vec<String> = grid[header_row]
        .iter()
        .map(|c| c.as_ref().map(normalize_header).unwrap_or_default())
        .collect();

    let mut tender = Map::new();
    for (field, aliases) in COLUMN_ALIASES {
        for alias in *aliases {
            if let Some(col) = headers.iter().position(|h| h == alias) {
                if let Some(value) = cell(grid, data_row, col) {
                    let converted = match *field {
                        "estimated_cost" | "schedule_amount" | "earnest_money" => {
                            as_number(value).map(|n| json!(n))
                        }
                        "time_of_completion" => as_months(value).map(|m| json!(m)),
                        _ => Some(json!(as_text(value))),
                    };
                    if let Some(v) = converted {
                        tender.insert((*field).into(), v);
                    }
                }
                break;
            }
        }
    }

    // Bidder N Name / Percentage / Contact columns
    let mut bidder_cols: BTreeMap<u32, BTreeMap<String, usize>> = BTreeMap::new();
    for (col, header) in headers.iter().enumerate() {
        if let Some(caps) = BIDDER_COLUMN.captures(header) {
            let num: u32 = caps[1].parse().unwrap_or(0);
            let kind = caps[2].to_lowercase();
            bidder_cols.entry(num).or_default().insert(kind, col);
        }
    }

    let mut bids = Vec::new();
    for cols in bidder_cols.values() {
        let mut bid = Map::new();
        if let Some(value) = cols.get("name").and_then(|&c| cell(grid, data_row, c)) {
            bid.insert("bidder_name".into(), json!(as_text(value)));
        }
        if let Some(value) = cols.get("percentage").and_then(|&c| cell(grid, data_row, c)) {
            let pct = match value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
                _ => None,
            };
            if let Some(pct) = pct {
                bid.insert("percentage".into(), json!(pct));
            }
        }
        if let Some(value) = cols.get("contact").and_then(|&c| cell(grid, data_row, c)) {
            bid.insert("contact".into(), json!(as_text(value)));
        }
        if bid.contains_key("bidder_name") {
            bids.push(bid);
        }
    }

    if !has_required_field(&tender) {
        return None;
    }

    let mut notes = Vec::new();
    if !bids.is_empty() {
        notes.push(format!("{} bidder(s) found in workbook", bids.len()));
    }
    Some(ParsedUpload {
        works: vec![tender],
        bids,
        notes,
    })
}

// ---------------------------------------------------------------------------
// Layout 3: label/value pairs down the first two columns
// ---------------------------------------------------------------------------

fn parse_vertical(grid: &Grid) -> Option<ParsedUpload> {
    let mut tender = Map::new();

    for row in 0..grid.len() {
        let (Some(label), Some(value)) = (cell(grid, row, 0), cell(grid, row, 1)) else {
            continue;
        };
        let key = as_text(label).to_lowercase();

        if key.contains("nit") || key.contains("tender no") {
            tender.insert("nit_number".into(), json!(as_text(value)));
        } else if key.contains("work") || key.contains("description") {
            tender.insert("work_name".into(), json!(as_text(value)));
        } else if key.contains("estimate") || key.contains("cost") {
            if let Some(n) = as_number(value) {
                tender.insert("estimated_cost".into(), json!(n));
            }
        } else if key.contains("schedule") {
            if let Some(n) = as_number(value) {
                tender.insert("schedule_amount".into(), json!(n));
            }
        } else if key.contains("earnest") || key.contains("security") {
            if let Some(n) = as_number(value) {
                tender.insert("earnest_money".into(), json!(n));
            }
        } else if key.contains("completion") || key.contains("duration") {
            if let Some(months) = as_months(value) {
                tender.insert("time_of_completion".into(), json!(months));
            }
        } else if key.contains("engineer") || key == "ee" {
            tender.insert("ee_name".into(), json!(as_text(value)));
        } else if key.contains("date") {
            tender.insert("tender_date".into(), json!(as_text(value)));
        }
    }

    if !has_required_field(&tender) {
        return None;
    }
    Some(ParsedUpload {
        works: vec![tender],
        bids: Vec::new(),
        notes: Vec::new(),
    })
}

/// Minimum signal to accept a parse: any of the identity fields present
fn has_required_field(tender: &Map<String, Value>) -> bool {
    ["nit_number", "work_name", "estimated_cost"]
        .iter()
        .any(|f| tender.contains_key(*f))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: Vec<Vec<Option<Value>>>) -> Grid {
        rows
    }

    #[test]
    fn nit_schedule_layout_extracts_all_works() {
        let g = grid(vec![
            vec![Some(json!("NIT Number")), None, Some(json!("27/2024-25"))],
            vec![Some(json!("Date of Calling")), None, Some(json!("01-06-2024"))],
            vec![Some(json!("Date of Receipt")), None, Some(json!("10-06-2024"))],
            vec![Some(json!("Date of Opening")), None, Some(json!("12-06-2024"))],
            vec![
                Some(json!("Item No")),
                Some(json!("Name of Work")),
                Some(json!("Estimated Cost (in lacs)")),
                Some(json!("Earnest Money")),
                Some(json!("Time of Completion")),
            ],
            vec![
                Some(json!(1)),
                Some(json!("Construction of approach road")),
                Some(json!(12.5)),
                Some(json!(25000)),
                Some(json!("6 months")),
            ],
            vec![
                Some(json!(2)),
                Some(json!("Repair of culvert")),
                Some(json!(4.0)),
                Some(json!(8000)),
                Some(json!(3)),
            ],
        ]);

        let parsed = parse_nit_schedule(&g).unwrap();
        assert_eq!(parsed.works.len(), 2);

        let first = &parsed.works[0];
        assert_eq!(first["nit_number"], json!("27/2024-25"));
        assert_eq!(first["estimated_cost"], json!(1_250_000.0));
        assert_eq!(first["time_of_completion"], json!(6));
        assert_eq!(first["tender_date"], json!("12-06-2024"));

        assert_eq!(parsed.works[1]["estimated_cost"], json!(400_000.0));
    }

    #[test]
    fn header_row_layout_with_bidder_columns() {
        let g = grid(vec![
            vec![
                Some(json!("NIT Number")),
                Some(json!("Work Name")),
                Some(json!("Estimated Cost")),
                Some(json!("Bidder 1 Name")),
                Some(json!("Bidder 1 Percentage")),
                Some(json!("Bidder 2 Name")),
                Some(json!("Bidder 2 Percentage")),
            ],
            vec![
                Some(json!("27/2024-25")),
                Some(json!("Construction of Road")),
                Some(json!(1_000_000)),
                Some(json!("ABC Company")),
                Some(json!(-5.5)),
                Some(json!("XYZ Builders")),
                Some(json!("2.5%")),
            ],
        ]);

        let parsed = parse_header_row(&g).unwrap();
        assert_eq!(parsed.works.len(), 1);
        assert_eq!(parsed.works[0]["nit_number"], json!("27/2024-25"));

        assert_eq!(parsed.bids.len(), 2);
        assert_eq!(parsed.bids[0]["bidder_name"], json!("ABC Company"));
        assert_eq!(parsed.bids[0]["percentage"], json!(-5.5));
        assert_eq!(parsed.bids[1]["percentage"], json!(2.5));
    }

    #[test]
    fn bidder_columns_match_underscored_headers() {
        let g = grid(vec![
            vec![
                Some(json!("nit_number")),
                Some(json!("bidder_1_name")),
                Some(json!("bidder_1_percentage")),
            ],
            vec![
                Some(json!("14/2023-24")),
                Some(json!("Sharma Constructions")),
                Some(json!(3.0)),
            ],
        ]);

        let parsed = parse_header_row(&g).unwrap();
        assert_eq!(parsed.bids.len(), 1);
        assert_eq!(parsed.bids[0]["bidder_name"], json!("Sharma Constructions"));
    }

    #[test]
    fn vertical_layout_key_value_pairs() {
        let g = grid(vec![
            vec![Some(json!("NIT No")), Some(json!("14/2023-24"))],
            vec![Some(json!("Name of Work")), Some(json!("Drain cleaning in ward 7"))],
            vec![Some(json!("Estimated Cost")), Some(json!("₹ 5,00,000"))],
            vec![Some(json!("Earnest Money")), Some(json!(10_000))],
            vec![Some(json!("Time of Completion")), Some(json!("4 months"))],
        ]);

        let parsed = parse_vertical(&g).unwrap();
        let tender = &parsed.works[0];
        assert_eq!(tender["nit_number"], json!("14/2023-24"));
        assert_eq!(tender["estimated_cost"], json!(500_000.0));
        assert_eq!(tender["time_of_completion"], json!(4));
    }

    #[test]
    fn unrecognizable_grid_is_rejected() {
        let g = grid(vec![vec![Some(json!("hello")), Some(json!("world"))]]);
        assert!(parse_nit_schedule(&g).is_none());
        assert!(parse_vertical(&g).is_none());
    }
}
