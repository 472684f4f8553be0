//! Schema-driven record validation
//!
//! Raw records parsed out of uploaded files (or submitted through the API)
//! are untyped `serde_json` maps. Each record kind has a [`RecordSchema`]
//! describing required fields, types and ranges; validation returns every
//! field-level problem at once rather than stopping at the first.
//!
//! Validation fails closed: a missing required field or out-of-range value
//! is always reported, never coerced. The only sanctioned coercions are
//! currency decorations (₹, Rs., comma grouping) and the accepted date
//! formats, both of which normalize to a single canonical value.

use crate::{currency, dates};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

/// Field data types understood by the validator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    /// Monetary or plain numeric value; currency decorations accepted
    Number,
    Integer,
    /// Signed percentage; a trailing '%' is accepted
    Percentage,
    /// Any of the accepted calendar date formats
    Date,
}

/// Validation rule for one field
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub name: &'static str,
    /// Display name used in error messages
    pub label: &'static str,
    pub required: bool,
    pub ty: FieldType,
    /// Inclusive numeric bounds (Number/Integer/Percentage)
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Inclusive text length bounds (Text)
    pub min_len: Option<usize>,
    pub max_len: Option<usize>,
}

impl FieldRule {
    fn new(name: &'static str, label: &'static str, ty: FieldType) -> Self {
        Self {
            name,
            label,
            required: false,
            ty,
            min: None,
            max: None,
            min_len: None,
            max_len: None,
        }
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    fn length(mut self, min: usize, max: usize) -> Self {
        self.min_len = Some(min);
        self.max_len = Some(max);
        self
    }
}

/// Validation schema for one record kind
#[derive(Debug, Clone)]
pub struct RecordSchema {
    pub name: &'static str,
    pub fields: Vec<FieldRule>,
}

/// Field-level findings for one record; empty `errors` signals validity
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn merge(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

static NIT_FORMATS: Lazy<Vec<Regex>> = Lazy::new(|| {
    // 27/2024-25, 27/2024, NIT-27/2024, 27-2024, PWD27/2024
    [
        r"^\d+/\d{4}-\d{2}$",
        r"^\d+/\d{4}$",
        r"^NIT-\d+/\d{4}$",
        r"^\d+-\d{4}$",
        r"^[A-Z]+\d+/\d{4}$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static NIT pattern"))
    .collect()
});

static BIDDER_NAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9\s.\-&(),]+$").expect("static name pattern"));

static PERSON_NAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z\s.\-]+$").expect("static person name pattern"));

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}$").expect("static email pattern")
});

/// Is a value "present"? Nulls, absent keys and blank strings all count as
/// missing for required-field purposes.
fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}

/// Extract a numeric value, tolerating currency/percent decorated strings
fn numeric_value(value: &Value, ty: FieldType) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            if ty == FieldType::Percentage {
                s.trim_end_matches('%').trim().parse().ok()
            } else {
                currency::parse_amount(s)
            }
        }
        _ => None,
    }
}

/// Validate one record against a schema.
pub fn validate(record: &Map<String, Value>, schema: &RecordSchema) -> ValidationReport {
    let mut report = ValidationReport::default();

    for rule in &schema.fields {
        let value = record.get(rule.name);

        if !is_present(value) {
            if rule.required {
                report.errors.push(format!("{} is required", rule.label));
            }
            continue;
        }
        let Some(value) = value else { continue };

        match rule.ty {
            FieldType::Text => {
                let Some(text) = value.as_str().map(str::trim) else {
                    report.errors.push(format!("{} must be text", rule.label));
                    continue;
                };
                if let Some(min) = rule.min_len {
                    if text.len() < min {
                        report.errors.push(format!(
                            "{} too short (minimum {} characters)",
                            rule.label, min
                        ));
                        continue;
                    }
                }
                if let Some(max) = rule.max_len {
                    if text.len() > max {
                        report.errors.push(format!(
                            "{} too long (maximum {} characters)",
                            rule.label, max
                        ));
                    }
                }
            }
            FieldType::Number | FieldType::Integer | FieldType::Percentage => {
                let Some(number) = numeric_value(value, rule.ty) else {
                    report
                        .errors
                        .push(format!("{} must be a valid number", rule.label));
                    continue;
                };
                if rule.ty == FieldType::Integer && number.fract() != 0.0 {
                    report
                        .errors
                        .push(format!("{} must be a whole number", rule.label));
                    continue;
                }
                if let Some(min) = rule.min {
                    if number < min {
                        report
                            .errors
                            .push(format!("{}: value too low (minimum {})", rule.label, min));
                        continue;
                    }
                }
                if let Some(max) = rule.max {
                    if number > max {
                        report
                            .errors
                            .push(format!("{}: value too high (maximum {})", rule.label, max));
                    }
                }
            }
            FieldType::Date => {
                let Some(text) = value.as_str() else {
                    report
                        .errors
                        .push(format!("{} must be a date string", rule.label));
                    continue;
                };
                match dates::parse_flexible(text) {
                    None => report.errors.push(format!(
                        "{}: invalid date format (use DD-MM-YYYY)",
                        rule.label
                    )),
                    Some(date) => {
                        if !dates::is_reasonable_tender_date(date) {
                            report.errors.push(format!(
                                "{}: date is outside reasonable range for tender dates",
                                rule.label
                            ));
                        }
                    }
                }
            }
        }
    }

    report
}

/// Schema for tender (work) records
pub fn tender_schema() -> RecordSchema {
    RecordSchema {
        name: "tender",
        fields: vec![
            FieldRule::new("nit_number", "NIT Number", FieldType::Text)
                .required()
                .length(3, 50),
            FieldRule::new("work_name", "Work Name", FieldType::Text)
                .required()
                .length(10, 500),
            FieldRule::new("estimated_cost", "Estimated Cost", FieldType::Number)
                .required()
                .range(1_000.0, 10_000_000_000.0),
            FieldRule::new("earnest_money", "Earnest Money", FieldType::Number)
                .required()
                .range(100.0, 100_000_000.0),
            FieldRule::new(
                "time_of_completion",
                "Time of Completion",
                FieldType::Integer,
            )
            .required()
            .range(1.0, 120.0),
            FieldRule::new("schedule_amount", "Schedule Amount", FieldType::Number),
            FieldRule::new("tender_date", "Tender Date", FieldType::Date),
            FieldRule::new("ee_name", "Executive Engineer Name", FieldType::Text).length(3, 100),
        ],
    }
}

/// Schema for bid entry records
pub fn bid_schema() -> RecordSchema {
    RecordSchema {
        name: "bid",
        fields: vec![
            FieldRule::new("bidder_name", "Bidder Name", FieldType::Text)
                .required()
                .length(2, 100),
            FieldRule::new("percentage", "Percentage", FieldType::Percentage)
                .required()
                .range(-50.0, 100.0),
            FieldRule::new("amount", "Bid Amount", FieldType::Number),
            FieldRule::new("contact", "Contact", FieldType::Text),
        ],
    }
}

/// Validate a tender record: schema checks plus format/business rules.
pub fn validate_tender(record: &Map<String, Value>) -> ValidationReport {
    let mut report = validate(record, &tender_schema());

    // NIT format check on top of the length rule
    if let Some(nit) = record.get("nit_number").and_then(Value::as_str) {
        let nit = nit.trim();
        if !nit.is_empty() && !NIT_FORMATS.iter().any(|re| re.is_match(nit)) {
            report.errors.push(
                "NIT Number: invalid format (use forms like 27/2024-25 or NIT-27/2024)".to_string(),
            );
        }
    }

    if let Some(ee) = record.get("ee_name").and_then(Value::as_str) {
        let ee = ee.trim();
        if !ee.is_empty() {
            if ee.eq_ignore_ascii_case("executive engineer") {
                report
                    .warnings
                    .push("Executive Engineer Name: provide the actual name, not the title".to_string());
            } else if !PERSON_NAME_CHARS.is_match(ee) {
                report
                    .warnings
                    .push("Executive Engineer Name: contains unusual characters".to_string());
            }
        }
    }

    // Business-rule warnings, only computable when both numbers parsed
    let estimated = record
        .get("estimated_cost")
        .and_then(|v| numeric_value(v, FieldType::Number));
    let earnest = record
        .get("earnest_money")
        .and_then(|v| numeric_value(v, FieldType::Number));
    if let (Some(cost), Some(em)) = (estimated, earnest) {
        if cost > 0.0 && em > 0.0 {
            let pct = em / cost * 100.0;
            if pct < 1.0 {
                report.warnings.push(format!(
                    "Earnest Money ({:.2}%) is below typical range (1-5%)",
                    pct
                ));
            } else if pct > 10.0 {
                report.warnings.push(format!(
                    "Earnest Money ({:.2}%) is above typical range (1-5%)",
                    pct
                ));
            }
        }
    }

    let schedule = record
        .get("schedule_amount")
        .and_then(|v| numeric_value(v, FieldType::Number));
    if let (Some(cost), Some(sched)) = (estimated, schedule) {
        if cost > 0.0 && (sched - cost).abs() > cost * 0.1 {
            report
                .warnings
                .push("Schedule Amount differs significantly from Estimated Cost".to_string());
        }
    }

    let months = record
        .get("time_of_completion")
        .and_then(|v| numeric_value(v, FieldType::Integer));
    if let (Some(cost), Some(months)) = (estimated, months) {
        if cost > 10_000_000.0 && months < 6.0 {
            report
                .warnings
                .push("Short completion time for large project - please verify".to_string());
        } else if cost < 100_000.0 && months > 12.0 {
            report
                .warnings
                .push("Long completion time for small project - please verify".to_string());
        }
    }

    report
}

/// Validate one bid record, including name charset and contact format.
pub fn validate_bid(record: &Map<String, Value>, estimated_cost: f64) -> ValidationReport {
    let mut report = validate(record, &bid_schema());

    if let Some(name) = record.get("bidder_name").and_then(Value::as_str) {
        let name = name.trim();
        if !name.is_empty() && !BIDDER_NAME_CHARS.is_match(name) {
            report
                .errors
                .push("Bidder Name: contains invalid characters".to_string());
        }
    }

    if let Some(contact) = record.get("contact").and_then(Value::as_str) {
        let contact = contact.trim();
        if !contact.is_empty() && !is_valid_contact(contact) {
            report
                .warnings
                .push("Contact: not a recognizable phone number or email".to_string());
        }
    }

    // Explicit amounts must be plausible against the estimate
    if let Some(amount) = record
        .get("amount")
        .and_then(|v| numeric_value(v, FieldType::Number))
    {
        if amount <= 0.0 {
            report
                .errors
                .push("Bid Amount: must be positive".to_string());
        } else if estimated_cost > 0.0 {
            let ratio = amount / estimated_cost;
            if ratio > 2.0 {
                report
                    .errors
                    .push("Bid Amount: unreasonably high (>200% of estimate)".to_string());
            } else if ratio < 0.3 {
                report
                    .errors
                    .push("Bid Amount: unreasonably low (<30% of estimate)".to_string());
            }
        }
    }

    report
}

/// Cross-bid checks over a whole submission for one tender.
pub fn validate_bid_set(records: &[Map<String, Value>], estimated_cost: f64) -> ValidationReport {
    let mut report = ValidationReport::default();

    if records.is_empty() {
        report
            .errors
            .push("At least one bidder is required".to_string());
        return report;
    }

    for (i, record) in records.iter().enumerate() {
        let single = validate_bid(record, estimated_cost);
        report.errors.extend(
            single
                .errors
                .into_iter()
                .map(|e| format!("Bidder {}: {}", i + 1, e)),
        );
        report.warnings.extend(
            single
                .warnings
                .into_iter()
                .map(|w| format!("Bidder {}: {}", i + 1, w)),
        );
    }

    // Duplicate names are a hard error
    let mut names: Vec<String> = records
        .iter()
        .filter_map(|r| r.get("bidder_name").and_then(Value::as_str))
        .map(|n| n.trim().to_lowercase())
        .filter(|n| !n.is_empty())
        .collect();
    let total = names.len();
    names.sort_unstable();
    names.dedup();
    if names.len() != total {
        report
            .errors
            .push("Duplicate bidder names found".to_string());
    }

    // Spread sanity over explicit amounts
    let amounts: Vec<f64> = records
        .iter()
        .filter_map(|r| r.get("amount").and_then(|v| numeric_value(v, FieldType::Number)))
        .collect();
    if amounts.len() > 1 {
        let min = amounts.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = amounts.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        if min > 0.0 {
            let spread = (max - min) / min * 100.0;
            if spread > 50.0 {
                report.warnings.push(format!(
                    "Large bid spread ({:.1}%) - please verify bids",
                    spread
                ));
            } else if spread < 1.0 {
                report
                    .warnings
                    .push("Very similar bid amounts - please verify".to_string());
            }
        }
    }

    report
}

/// Contact is accepted as an Indian phone number (10/11/12 digits once
/// punctuation is stripped) or an email address.
fn is_valid_contact(contact: &str) -> bool {
    let digits: String = contact.chars().filter(|c| c.is_ascii_digit()).collect();
    let is_phone = matches!(digits.len(), 10 | 11) || (digits.len() == 12 && digits.starts_with("91"));
    is_phone || EMAIL.is_match(contact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Map<String, Value> {
        value.as_object().expect("test record is an object").clone()
    }

    fn valid_tender() -> Map<String, Value> {
        record(json!({
            "nit_number": "27/2024-25",
            "work_name": "Construction of 33/11 KV substation building",
            "estimated_cost": 2500000,
            "earnest_money": 50000,
            "time_of_completion": 9,
        }))
    }

    #[test]
    fn valid_tender_passes() {
        let report = validate_tender(&valid_tender());
        assert!(report.is_valid(), "errors: {:?}", report.errors);
    }

    #[test]
    fn missing_required_field_always_errors() {
        for field in [
            "nit_number",
            "work_name",
            "estimated_cost",
            "earnest_money",
            "time_of_completion",
        ] {
            let mut tender = valid_tender();
            tender.remove(field);
            let report = validate_tender(&tender);
            assert!(!report.is_valid(), "{} missing should fail", field);
        }
    }

    #[test]
    fn blank_string_counts_as_missing() {
        let mut tender = valid_tender();
        tender.insert("nit_number".to_string(), json!("   "));
        let report = validate_tender(&tender);
        assert!(report.errors.iter().any(|e| e.contains("NIT Number is required")));
    }

    #[test]
    fn out_of_range_numeric_is_an_error_not_coerced() {
        let mut tender = valid_tender();
        tender.insert("estimated_cost".to_string(), json!(500)); // below 1000 floor
        let report = validate_tender(&tender);
        assert!(report.errors.iter().any(|e| e.contains("Estimated Cost")));
    }

    #[test]
    fn currency_decorated_string_is_accepted() {
        let mut tender = valid_tender();
        tender.insert("estimated_cost".to_string(), json!("₹ 25,00,000"));
        let report = validate_tender(&tender);
        assert!(report.is_valid(), "errors: {:?}", report.errors);
    }

    #[test]
    fn bad_nit_format_rejected() {
        let mut tender = valid_tender();
        tender.insert("nit_number".to_string(), json!("hello world"));
        let report = validate_tender(&tender);
        assert!(report.errors.iter().any(|e| e.contains("invalid format")));
    }

    #[test]
    fn earnest_money_band_warns_but_does_not_fail() {
        let mut tender = valid_tender();
        tender.insert("earnest_money".to_string(), json!(500000)); // 20% of estimate
        let report = validate_tender(&tender);
        assert!(report.is_valid());
        assert!(report.warnings.iter().any(|w| w.contains("Earnest Money")));
    }

    #[test]
    fn date_field_accepts_any_supported_format() {
        for date in ["25/12/2024", "25-12-2024", "2024-12-25", "25.12.2024"] {
            let mut tender = valid_tender();
            tender.insert("tender_date".to_string(), json!(date));
            let report = validate_tender(&tender);
            assert!(report.is_valid(), "{} rejected: {:?}", date, report.errors);
        }
    }

    #[test]
    fn unparseable_date_is_an_error() {
        let mut tender = valid_tender();
        tender.insert("tender_date".to_string(), json!("31/31/2024"));
        let report = validate_tender(&tender);
        assert!(report.errors.iter().any(|e| e.contains("invalid date format")));
    }

    #[test]
    fn bid_requires_name_and_percentage() {
        let report = validate_bid(&record(json!({})), 100000.0);
        assert!(report.errors.iter().any(|e| e.contains("Bidder Name is required")));
        assert!(report.errors.iter().any(|e| e.contains("Percentage is required")));
    }

    #[test]
    fn bid_percentage_range_enforced() {
        let report = validate_bid(
            &record(json!({"bidder_name": "Test Co", "percentage": 150})),
            100000.0,
        );
        assert!(report.errors.iter().any(|e| e.contains("Percentage")));
    }

    #[test]
    fn bid_percent_string_with_sign_accepted() {
        let report = validate_bid(
            &record(json!({"bidder_name": "Test Co", "percentage": "-5.25%"})),
            100000.0,
        );
        assert!(report.is_valid(), "errors: {:?}", report.errors);
    }

    #[test]
    fn implausible_bid_amount_rejected() {
        let report = validate_bid(
            &record(json!({"bidder_name": "Test Co", "percentage": 0, "amount": 250000})),
            100000.0,
        );
        assert!(report.errors.iter().any(|e| e.contains("unreasonably high")));
    }

    #[test]
    fn duplicate_bidder_names_are_an_error() {
        let records = vec![
            record(json!({"bidder_name": "Same Name", "percentage": 2})),
            record(json!({"bidder_name": "same name ", "percentage": 3})),
        ];
        let report = validate_bid_set(&records, 100000.0);
        assert!(report.errors.iter().any(|e| e.contains("Duplicate")));
    }

    #[test]
    fn empty_bid_set_is_an_error() {
        let report = validate_bid_set(&[], 100000.0);
        assert!(!report.is_valid());
    }

    #[test]
    fn contact_formats() {
        assert!(is_valid_contact("9876543210"));
        assert!(is_valid_contact("+91 98765 43210"));
        assert!(is_valid_contact("office@pwdudaipur.gov.in"));
        assert!(!is_valid_contact("not-a-contact"));
    }
}
