use crate::utils::normalize_text;

/// Parses a raw table cell into a signed value, tolerating the formatting
/// noise real statements carry: parenthesized negatives, thousands
/// separators, currency symbols, footnote markers, OCR artifacts.
///
/// Returns `None` for cells that hold no value (empty, a bare dash) or that
/// cannot be read as a number. Malformed cells are never an error; upstream
/// skips them.
pub fn parse_numeric(raw: &str) -> Option<f64> {
    let s = normalize_text(raw);
    if matches!(s.as_str(), "" | "-" | "\u{2013}" | "\u{2014}") {
        return None;
    }

    // (1,234.5) is accounting notation for a negative.
    let negative = s.starts_with('(') && s.ends_with(')');
    let s = s.trim_matches(|c| c == '(' || c == ')');

    let mut cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .collect();

    // More than one period: everything but the last is a thousands
    // separator (European grouping or OCR noise).
    let periods = cleaned.matches('.').count();
    if periods > 1 {
        let last = cleaned.rfind('.').unwrap_or(0);
        cleaned = cleaned
            .char_indices()
            .filter(|&(i, c)| c != '.' || i == last)
            .map(|(_, c)| c)
            .collect();
    }
    cleaned.retain(|c| c != ',');

    let value: f64 = cleaned.parse().ok()?;
    Some(if negative { -value } else { value })
}
