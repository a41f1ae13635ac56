//! Date phrase recognition for rule-based extraction

use crate::filter::{month_from_name, DateRange};
use chrono::{DateTime, Datelike, Utc};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref YEAR_RE: Regex = Regex::new(r"\b((?:19|20)\d{2})\b").unwrap();
    static ref MONTH_RE: Regex = Regex::new(
        r"\b(january|february|march|april|may|june|july|august|september|october|november|december)\b"
    )
    .unwrap();
    static ref LEADING_YEAR_RE: Regex = Regex::new(r"^[\s,]+(?:19|20)\d{2}\b").unwrap();
    static ref TRAILING_DAYS_RE: Regex =
        Regex::new(r"\b(?:previous|past|last)\s+(\d+)\s+days?\b").unwrap();
}

/// Month names that are also common English words
const AMBIGUOUS_MONTHS: [&str; 2] = ["may", "march"];

/// Words that mark an ambiguous month name as a date when they precede it
const MONTH_CONTEXT: [&str; 13] = [
    "in", "from", "of", "during", "since", "for", "this", "last", "early", "late", "mid",
    "until", "before",
];

/// Find the publication date range a query asks for
///
/// At most one rule fires, checked in this order: "last year", "this year"
/// (or the current year written out with no month), a month name with an
/// optional year, any other written year, "last month", "previous N days",
/// "last week". A month name narrows "last year" and "this year" to that
/// month.
pub fn extract_date_range(query: &str, now: DateTime<Utc>) -> Option<DateRange> {
    let lower = query.to_lowercase();
    let current_year = now.year();
    let month = find_month(&lower);
    let year_token = YEAR_RE
        .captures(&lower)
        .and_then(|c| c[1].parse::<i32>().ok());

    if lower.contains("last year") {
        return year_or_month(current_year - 1, month);
    }

    if lower.contains("this year") {
        return year_or_month(current_year, month);
    }

    if month.is_none() && year_token == Some(current_year) {
        return DateRange::year(current_year);
    }

    if let Some(month) = month {
        return DateRange::month(year_token.unwrap_or(current_year), month);
    }

    if let Some(year) = year_token {
        return DateRange::year(year);
    }

    if lower.contains("last month") {
        return DateRange::previous_month(now);
    }

    if let Some(range) = TRAILING_DAYS_RE
        .captures(&lower)
        .and_then(|c| c[1].parse::<i64>().ok())
        .and_then(|days| DateRange::trailing_days(now, days))
    {
        return Some(range);
    }

    if lower.contains("last week") {
        return DateRange::trailing_days(now, 7);
    }

    None
}

fn year_or_month(year: i32, month: Option<u32>) -> Option<DateRange> {
    match month {
        Some(month) => DateRange::month(year, month),
        None => DateRange::year(year),
    }
}

/// First month name used as a date in already-lowercased text
///
/// "may" and "march" only count next to a year or after a word such as
/// "in" or "from", so "posts that may mention Rohit" has no month.
fn find_month(lower: &str) -> Option<u32> {
    MONTH_RE.captures_iter(lower).find_map(|c| {
        let m = c.get(1)?;
        let name = m.as_str();
        if AMBIGUOUS_MONTHS.contains(&name) {
            let followed_by_year = LEADING_YEAR_RE.is_match(&lower[m.end()..]);
            let preceded_by_context = lower[..m.start()]
                .split_whitespace()
                .next_back()
                .map(|w| w.trim_matches(|ch: char| !ch.is_alphanumeric()))
                .map_or(false, |w| MONTH_CONTEXT.contains(&w));
            if !followed_by_year && !preceded_by_context {
                return None;
            }
        }
        month_from_name(name)
    })
}
