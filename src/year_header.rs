use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

use crate::model::{RawTableGrid, YearHeaderMap};
use crate::utils::normalize_text;

/// Fiscal years outside this window are treated as stray numbers, not years.
pub const MIN_YEAR: i32 = 1995;
pub const MAX_YEAR: i32 = 2036;

static TOKEN_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w'\-]+").unwrap());

// "FY 24/25" reports under the second half of the range.
static FISCAL_NOTATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)FY\s*(\d{2})\s*/\s*(\d{2})").unwrap());

fn in_range(year: i32) -> Option<i32> {
    (MIN_YEAR..=MAX_YEAR).contains(&year).then_some(year)
}

// Runs of exactly four digits bounded by non-digits. Word boundaries are
// useless here: "FY2025" has none between Y and 2.
fn four_digit_runs(text: &str) -> impl Iterator<Item = i32> + '_ {
    let chars: Vec<char> = text.chars().collect();
    let mut runs = Vec::new();
    let mut start = None;
    for i in 0..=chars.len() {
        let is_digit = i < chars.len() && chars[i].is_ascii_digit();
        match (start, is_digit) {
            (None, true) => start = Some(i),
            (Some(s), false) => {
                if i - s == 4 {
                    let candidate: String = chars[s..i].iter().collect();
                    if let Ok(value) = candidate.parse() {
                        runs.push(value);
                    }
                }
                start = None;
            }
            _ => {}
        }
    }
    runs.into_iter()
}

/// Reads a fiscal year out of a single header token, trying a bare 4-digit
/// year, fiscal-year notation, then a 4-digit year embedded in a longer
/// date-like token ("Mar-31-2025", "FY2025").
pub fn looks_like_year(token: &str) -> Option<i32> {
    let tok = token.trim_matches(|c| c == '\'' || c == '\u{2019}');

    if tok.len() == 4 && tok.chars().all(|c| c.is_ascii_digit()) {
        return in_range(tok.parse().ok()?);
    }

    if let Some(year) = fiscal_notation_year(tok) {
        return Some(year);
    }

    embedded_year(tok)
}

/// "FY aa/bb" resolves to 2000 + bb.
pub fn fiscal_notation_year(text: &str) -> Option<i32> {
    let caps = FISCAL_NOTATION_RE.captures(text)?;
    let second: i32 = caps[2].parse().ok()?;
    in_range(2000 + second)
}

fn embedded_year(token: &str) -> Option<i32> {
    four_digit_runs(token).find_map(in_range)
}

/// Scans rows top-to-bottom for the first row mapping two or more columns to
/// fiscal years. The first token match in a cell wins for that cell; because
/// tokenization splits on "/", fiscal-year notation gets a second chance
/// against the whole cell.
pub fn find_year_header(grid: &RawTableGrid) -> Option<YearHeaderMap> {
    for (i, row) in grid.rows().iter().enumerate() {
        let mut column_years = BTreeMap::new();
        for (j, cell) in row.iter().enumerate() {
            let cell = normalize_text(cell);
            let mut found = None;
            for token in TOKEN_SPLIT_RE.split(&cell).filter(|t| !t.is_empty()) {
                if let Some(year) = looks_like_year(token) {
                    found = Some(year);
                    break;
                }
            }
            if found.is_none() {
                found = fiscal_notation_year(&cell);
            }
            if let Some(year) = found {
                column_years.insert(j, year);
            }
        }
        if column_years.len() >= 2 {
            return Some(YearHeaderMap {
                header_row: i,
                column_years,
            });
        }
    }
    None
}

/// First in-range 4-digit year anywhere in free text, used as the
/// fallback-path fiscal year when a page supplies no default. Run-together
/// forms like "FY2022" count.
pub fn first_year_in_text(text: &str) -> Option<i32> {
    four_digit_runs(text).find_map(in_range)
}
