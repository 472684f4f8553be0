//! Currency parsing and formatting
//!
//! Amounts arrive as free text ("₹ 1,23,456", "Rs. 5.5 Lacs") and leave as
//! statutory-formatted figures and rupees-in-words for generated documents.

/// Parse an amount string, tolerating currency symbols, comma grouping and
/// lakh/crore suffixes.
pub fn parse_amount(input: &str) -> Option<f64> {
    let cleaned = input
        .trim()
        .replace('₹', "")
        .replace("Rs.", "")
        .replace("Rs", "")
        .replace(',', "")
        .trim()
        .to_string();

    if cleaned.is_empty() {
        return None;
    }

    let lower = cleaned.to_lowercase();

    // Lakh/crore suffixes ("5.5 lacs" → 550000, "1.2 crore" → 12000000)
    for (suffix, multiplier) in [
        ("crores", 1e7),
        ("crore", 1e7),
        ("cr", 1e7),
        ("lakhs", 1e5),
        ("lakh", 1e5),
        ("lacs", 1e5),
        ("lac", 1e5),
    ] {
        if let Some(prefix) = lower.strip_suffix(suffix) {
            let value: f64 = prefix.trim().parse().ok()?;
            return Some(value * multiplier);
        }
    }

    let value: f64 = lower.parse().ok()?;
    if value.is_finite() {
        Some(value)
    } else {
        None
    }
}

/// Format an amount with Indian digit grouping: 12345678 → "1,23,45,678"
pub fn format_inr(amount: f64) -> String {
    let negative = amount < 0.0;
    let rupees = amount.abs().round() as u64;
    let digits = rupees.to_string();

    let grouped = if digits.len() <= 3 {
        digits
    } else {
        // Last three digits, then groups of two
        let (head, tail) = digits.split_at(digits.len() - 3);
        let mut parts = Vec::new();
        let head_bytes = head.as_bytes();
        let mut i = head_bytes.len();
        while i > 2 {
            parts.push(std::str::from_utf8(&head_bytes[i - 2..i]).unwrap());
            i -= 2;
        }
        parts.push(std::str::from_utf8(&head_bytes[..i]).unwrap());
        parts.reverse();
        format!("{},{}", parts.join(","), tail)
    };

    if negative {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

const ONES: [&str; 20] = [
    "", "One", "Two", "Three", "Four", "Five", "Six", "Seven", "Eight", "Nine",
    "Ten", "Eleven", "Twelve", "Thirteen", "Fourteen", "Fifteen", "Sixteen",
    "Seventeen", "Eighteen", "Nineteen",
];

const TENS: [&str; 10] = [
    "", "", "Twenty", "Thirty", "Forty", "Fifty", "Sixty", "Seventy",
    "Eighty", "Ninety",
];

fn two_digits(n: u64) -> String {
    debug_assert!(n < 100);
    if n < 20 {
        ONES[n as usize].to_string()
    } else if n % 10 == 0 {
        TENS[(n / 10) as usize].to_string()
    } else {
        format!("{} {}", TENS[(n / 10) as usize], ONES[(n % 10) as usize])
    }
}

fn three_digits(n: u64) -> String {
    debug_assert!(n < 1000);
    if n < 100 {
        two_digits(n)
    } else if n % 100 == 0 {
        format!("{} Hundred", ONES[(n / 100) as usize])
    } else {
        format!("{} Hundred {}", ONES[(n / 100) as usize], two_digits(n % 100))
    }
}

/// Indian-system grouping: crore / lakh / thousand / hundreds. The crore
/// count itself can exceed 999 ("Two Thousand Crore"), so it recurses
/// through the same grouping.
fn in_words(n: u64) -> String {
    let crore = n / 1_00_00_000;
    let lakh = (n / 1_00_000) % 100;
    let thousand = (n / 1_000) % 100;
    let rest = n % 1_000;

    let mut parts = Vec::new();
    if crore > 0 {
        parts.push(format!("{} Crore", in_words(crore)));
    }
    if lakh > 0 {
        parts.push(format!("{} Lakh", two_digits(lakh)));
    }
    if thousand > 0 {
        parts.push(format!("{} Thousand", two_digits(thousand)));
    }
    if rest > 0 {
        parts.push(three_digits(rest));
    }
    parts.join(" ")
}

/// Amount in words using the Indian numbering system, as required on
/// statutory documents: 12345678 → "One Crore Twenty Three Lakh Forty Five
/// Thousand Six Hundred Seventy Eight Rupees Only"
pub fn amount_in_words(amount: f64) -> String {
    let rupees = amount.abs().round() as u64;
    if rupees == 0 {
        return "Zero Rupees Only".to_string();
    }
    format!("{} Rupees Only", in_words(rupees))
}
