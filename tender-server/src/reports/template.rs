//! Template engine for statutory documents
//!
//! Templates use `{{variable}}` placeholders. The context carries every
//! value as an already-formatted string; `{{bidder_table_rows}}` expands
//! to one LaTeX table row per ranked bid in the exact statutory column
//! order (serial, name, estimated cost, percentage display, amount).
//! User-entered text is LaTeX-escaped before it enters the context. Any
//! placeholder left unresolved after substitution fails the render.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use tender_common::db::Tender;
use tender_common::ranking::RankedBid;
use tender_common::{currency, dates, Error, Result};

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{[a-z0-9_]+\}\}").expect("static placeholder pattern"));

/// Escape LaTeX special characters in user text
pub fn escape_latex(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\textbackslash{}"),
            '{' => out.push_str("\\{"),
            '}' => out.push_str("\\}"),
            '$' => out.push_str("\\$"),
            '&' => out.push_str("\\&"),
            '%' => out.push_str("\\%"),
            '#' => out.push_str("\\#"),
            '^' => out.push_str("\\textasciicircum{}"),
            '_' => out.push_str("\\_"),
            '~' => out.push_str("\\textasciitilde{}"),
            other => out.push(other),
        }
    }
    out
}

/// Statutory amounts are printed as whole rupees
fn whole_rupees(amount: f64) -> String {
    format!("{}", amount.round() as i64)
}

/// One table row per bid: serial & name & estimate & percentage & amount
pub fn bidder_table_rows(bids: &[RankedBid], estimated_cost: f64) -> String {
    bids.iter()
        .enumerate()
        .map(|(i, bid)| {
            format!(
                "{} & {} & {} & {} & {} \\\\",
                i + 1,
                escape_latex(&bid.bidder_name),
                whole_rupees(estimated_cost),
                bid.percent_display,
                whole_rupees(bid.amount)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Statutory display for a stored ISO date, today when absent
fn statutory_date(stored: Option<&str>) -> String {
    stored
        .and_then(dates::parse_flexible)
        .map(dates::format_statutory)
        .unwrap_or_else(dates::today_statutory)
}

/// Build the substitution context for a tender and its ranked bids.
///
/// Bids must already be sorted by rank (the output of ranking); the
/// first entry is treated as the lowest bidder.
pub fn build_context(tender: &Tender, bids: &[RankedBid]) -> BTreeMap<String, String> {
    let mut vars = BTreeMap::new();

    vars.insert("nit_number".into(), escape_latex(&tender.nit_number));
    vars.insert("work_name".into(), escape_latex(&tender.work_name));
    vars.insert("estimated_cost".into(), whole_rupees(tender.estimated_cost));
    vars.insert(
        "estimated_cost_words".into(),
        currency::amount_in_words(tender.estimated_cost),
    );
    vars.insert(
        "schedule_amount".into(),
        whole_rupees(tender.schedule_amount.unwrap_or(tender.estimated_cost)),
    );
    vars.insert(
        "earnest_money".into(),
        whole_rupees(tender.earnest_money.unwrap_or(0.0)),
    );
    vars.insert(
        "time_of_completion".into(),
        tender.time_of_completion_months.unwrap_or(12).to_string(),
    );
    vars.insert(
        "ee_name".into(),
        escape_latex(tender.ee_name.as_deref().unwrap_or("Executive Engineer")),
    );

    vars.insert("current_date".into(), dates::today_statutory());
    vars.insert(
        "tender_date".into(),
        statutory_date(tender.tender_date.as_deref()),
    );
    vars.insert(
        "receipt_date".into(),
        statutory_date(tender.submission_deadline.as_deref()),
    );
    if let Some(date) = tender.tender_date.as_deref().and_then(dates::parse_flexible) {
        vars.insert("financial_year".into(), dates::financial_year(date));
    } else {
        vars.insert(
            "financial_year".into(),
            dates::financial_year(chrono::Local::now().date_naive()),
        );
    }
    if let (Some(start), Some(months)) = (
        tender.tender_date.as_deref().and_then(dates::parse_flexible),
        tender.time_of_completion_months,
    ) {
        vars.insert(
            "completion_date".into(),
            dates::format_statutory(completion(start, months)),
        );
    } else {
        vars.insert("completion_date".into(), String::new());
    }

    vars.insert("total_bidders".into(), bids.len().to_string());
    vars.insert(
        "bidder_table_rows".into(),
        bidder_table_rows(bids, tender.estimated_cost),
    );

    if let Some(lowest) = bids.first() {
        vars.insert("lowest_bidder_name".into(), escape_latex(&lowest.bidder_name));
        vars.insert("lowest_bidder_amount".into(), whole_rupees(lowest.amount));
        vars.insert(
            "lowest_bidder_amount_words".into(),
            currency::amount_in_words(lowest.amount),
        );
        vars.insert(
            "lowest_bidder_percentage_display".into(),
            lowest.percent_display.clone(),
        );
        let delta = tender.estimated_cost - lowest.amount;
        vars.insert("savings_amount".into(), whole_rupees(delta.abs()));
        vars.insert(
            "savings_percentage".into(),
            if tender.estimated_cost > 0.0 {
                format!("{:.2}", delta.abs() / tender.estimated_cost * 100.0)
            } else {
                "0.00".to_string()
            },
        );
    } else {
        for key in [
            "lowest_bidder_name",
            "lowest_bidder_amount",
            "lowest_bidder_amount_words",
            "lowest_bidder_percentage_display",
            "savings_amount",
            "savings_percentage",
        ] {
            vars.insert(key.into(), String::new());
        }
    }

    // Fixed statutory boilerplate
    vars.insert(
        "office_header".into(),
        "OFFICE OF THE EXECUTIVE ENGINEER PWD ELECTRIC DIVISION, UDAIPUR".into(),
    );
    vars.insert("contingencies_note".into(), "As per rules".into());
    vars.insert("item_number".into(), "ITEM-1".into());
    vars.insert("nil_amount".into(), "Nil".into());

    vars
}

fn completion(start: NaiveDate, months: i64) -> NaiveDate {
    dates::completion_date(start, months.clamp(0, u32::MAX as i64) as u32)
}

/// Substitute every placeholder; any left unresolved fails the render.
pub fn render(template: &str, vars: &BTreeMap<String, String>) -> Result<String> {
    let mut content = template.to_string();
    for (key, value) in vars {
        content = content.replace(&format!("{{{{{}}}}}", key), value);
    }

    let unresolved: Vec<&str> = PLACEHOLDER
        .find_iter(&content)
        .map(|m| m.as_str())
        .collect();
    if !unresolved.is_empty() {
        return Err(Error::Template(format!(
            "unresolved template variables: {}",
            unresolved.join(", ")
        )));
    }

    Ok(content)
}
