//! Year-range extraction from free-text vehicle identifiers.
//!
//! Model-type strings and filenames carry ranges in many shapes:
//! "(07-14)", "(2007+)", "2007-2014", "(90-present)", "('17)". Two-digit
//! years are expanded around a pivot value, so "(95-02)" reads as 1995-2002.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

pub const DEFAULT_PIVOT_YEAR: i32 = 50;

/// A model-year interval. `end == None` means the model is ongoing, which is
/// distinct from "no range found" (callers get `None` for that).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearRange {
    pub start: i32,
    pub end: Option<i32>,
}

impl YearRange {
    /// Bounded range with the `start <= end` invariant restored if the
    /// source data had the bounds backwards.
    pub fn bounded(start: i32, end: i32) -> Self {
        if end < start {
            Self { start: end, end: Some(start) }
        } else {
            Self { start, end: Some(end) }
        }
    }

    pub fn ongoing(start: i32) -> Self {
        Self { start, end: None }
    }

    pub fn contains(&self, year: i32) -> bool {
        match self.end {
            Some(end) => self.start <= year && year <= end,
            None => year >= self.start,
        }
    }
}

/// Structured range shapes, most specific first. Each pattern captures the
/// start year and, for bounded ranges, the end year; "present" and "+" forms
/// capture only the start.
static YEAR_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\((\d{2})-(\d{2})\)",
        r"\((\d{2})\+\)",
        r"\((\d{2})-present\)",
        r"\((\d{4})-(\d{4})\)",
        r"\((\d{4})[-+](\d{4})\)",
        r"(\d{4})-(\d{4})",
        r"\((\d{4})\+\)",
        r"(\d{4})\+",
        r"\((\d{4})-present\)",
        r"'(\d{2})\)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

static BARE_YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4})").expect("valid regex"));

/// Extracts a model-year interval from free text. Structured patterns win in
/// priority order; failing those, any bare 4-digit number is taken as a
/// single-year range. Returns `None` when nothing year-like appears.
pub fn parse_year_range(text: &str, pivot: i32) -> Option<YearRange> {
    if text.trim().is_empty() {
        return None;
    }

    for pattern in YEAR_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(text) {
            let start = expand_year(&caps[1], pivot);
            return Some(match caps.get(2) {
                Some(end) => YearRange::bounded(start, expand_year(end.as_str(), pivot)),
                None => YearRange::ongoing(start),
            });
        }
    }

    BARE_YEAR_RE.captures(text).map(|caps| {
        let year = expand_year(&caps[1], pivot);
        YearRange::bounded(year, year)
    })
}

/// Expands a 2-digit year to 4 digits using the pivot rule; 4-digit years
/// pass through.
fn expand_year(digits: &str, pivot: i32) -> i32 {
    let year: i32 = digits.parse().expect("pattern captures digits only");
    if digits.len() == 2 {
        if year < pivot { 2000 + year } else { 1900 + year }
    } else {
        year
    }
}
