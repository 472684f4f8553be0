//! Date normalization and statutory formatting
//!
//! Tender paperwork arrives with dates in half a dozen regional formats.
//! Everything is normalized to `chrono::NaiveDate` at the boundary and
//! rendered back out in the statutory short form (DD-MM-YY) or the full
//! form (DD-MM-YYYY) when generating documents.

use chrono::{Datelike, Duration, Local, NaiveDate, Weekday};

/// Accepted input formats, tried in order until one parses.
///
/// Day-first formats precede MM/DD/YYYY so ambiguous dates like 05/04/2024
/// resolve day-first, matching departmental convention.
const ACCEPTED_FORMATS: &[&str] = &[
    "%d/%m/%Y", // 25/12/2024
    "%d-%m-%Y", // 25-12-2024
    "%Y-%m-%d", // 2024-12-25
    "%d.%m.%Y", // 25.12.2024
    "%m/%d/%Y", // 12/25/2024 (only reachable when day-first fails)
    "%d-%m-%y", // 25-12-24
    "%d/%m/%y", // 25/12/24
    "%d.%m.%y", // 25.12.24
    "%Y/%m/%d", // 2024/12/25
];

/// Parse a date string in any accepted format.
///
/// Returns `None` when no format matches; callers decide whether that is a
/// validation error or merely a missing optional field.
pub fn parse_flexible(input: &str) -> Option<NaiveDate> {
    let cleaned = input.trim();
    if cleaned.is_empty() {
        return None;
    }

    // chrono's %Y happily parses "24" as year 24 AD; reject those so the
    // two-digit-year formats further down the list get their turn.
    ACCEPTED_FORMATS.iter().find_map(|fmt| {
        NaiveDate::parse_from_str(cleaned, fmt)
            .ok()
            .filter(|d| d.year() >= 1900)
    })
}

/// Format a date in statutory short form (DD-MM-YY)
pub fn format_statutory(date: NaiveDate) -> String {
    date.format("%d-%m-%y").to_string()
}

/// Format a date in full form (DD-MM-YYYY)
pub fn format_full(date: NaiveDate) -> String {
    date.format("%d-%m-%Y").to_string()
}

/// Today's date in statutory short form
pub fn today_statutory() -> String {
    format_statutory(Local::now().date_naive())
}

/// Today's date in full form
pub fn today_full() -> String {
    format_full(Local::now().date_naive())
}

/// Indian financial year label (April 1 start), e.g. "2024-25"
pub fn financial_year(date: NaiveDate) -> String {
    let (start, end) = if date.month() >= 4 {
        (date.year(), date.year() + 1)
    } else {
        (date.year() - 1, date.year())
    };
    format!("{}-{:02}", start, end % 100)
}

/// Completion date = start date + N calendar months, day clamped to the
/// last day of the target month (31 Jan + 1 month = 28/29 Feb).
pub fn completion_date(start: NaiveDate, months: u32) -> NaiveDate {
    let total = start.year() * 12 + start.month0() as i32 + months as i32;
    let year = total.div_euclid(12);
    let month0 = total.rem_euclid(12) as u32;

    let mut day = start.day();
    loop {
        if let Some(date) = NaiveDate::from_ymd_opt(year, month0 + 1, day) {
            return date;
        }
        day -= 1;
    }
}

/// Add working days (skipping Saturday and Sunday)
pub fn add_working_days(start: NaiveDate, days: u32) -> NaiveDate {
    let mut current = start;
    let mut added = 0;
    while added < days {
        current += Duration::days(1);
        if !matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            added += 1;
        }
    }
    current
}

/// Whether a tender date falls in the plausible window: not more than two
/// years in the past and not more than one year in the future.
pub fn is_reasonable_tender_date(date: NaiveDate) -> bool {
    let today = Local::now().date_naive();
    let min = today - Duration::days(730);
    let max = today + Duration::days(365);
    min <= date && date <= max
}

/// Duration in months rendered for display ("1 month", "14 months",
/// "2 years 3 months")
pub fn format_duration_months(months: u32) -> String {
    match months {
        0 => "Invalid duration".to_string(),
        1 => "1 month".to_string(),
        m if m < 12 => format!("{} months", m),
        m => {
            let years = m / 12;
            let rem = m % 12;
            let year_part = if years == 1 {
                "1 year".to_string()
            } else {
                format!("{} years", years)
            };
            match rem {
                0 => year_part,
                1 => format!("{} 1 month", year_part),
                r => format!("{} {} months", year_part, r),
            }
        }
    }
}
