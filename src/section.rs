use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{RawTableGrid, SectionLabel};

/// Ordered (label, patterns) pairs; the first label with any matching
/// pattern wins.
static SECTION_PATTERNS: Lazy<Vec<(SectionLabel, Vec<Regex>)>> = Lazy::new(|| {
    let compile = |pats: &[&str]| -> Vec<Regex> {
        pats.iter()
            .map(|p| Regex::new(&format!("(?i){}", p)).unwrap())
            .collect()
    };
    vec![
        (
            SectionLabel::IncomeStatement,
            compile(&[
                r"\bconsolidated\s+statement\s+of\s+(profit|loss|income)\b",
                r"\bstatement\s+of\s+operations\b",
                r"\bprofit\s+or\s+loss\b",
                r"\bincome\s+statement\b",
            ]),
        ),
        (
            SectionLabel::BalanceSheet,
            compile(&[
                r"\bconsolidated\s+statement\s+of\s+financial\s+position\b",
                r"\b(consolidated\s+)?balance\s+sheet\b",
                r"\bstatement\s+of\s+financial\s+position\b",
            ]),
        ),
        (
            SectionLabel::CashFlow,
            compile(&[
                r"\bconsolidated\s+statement\s+of\s+cash\s+flows?\b",
                r"\bcash\s+flow\s+statement\b",
            ]),
        ),
        (
            SectionLabel::Kpi,
            compile(&[
                r"\bkey\s+metrics?\b",
                r"\bkey\s+performance\s+indicators?\b",
                r"\bhighlights?\b",
                r"\bfinancial\s+summary\b",
            ]),
        ),
    ]
});

/// Labels text as belonging to a statement category, or `None` when nothing
/// matches. Unclassified is a valid outcome, not an error.
pub fn classify_section(text: &str) -> Option<SectionLabel> {
    for (label, patterns) in SECTION_PATTERNS.iter() {
        if patterns.iter().any(|re| re.is_match(text)) {
            return Some(*label);
        }
    }
    None
}

/// A table's section: its own caption rows win, otherwise the page label is
/// inherited.
pub fn resolve_table_section(
    grid: &RawTableGrid,
    page_section: Option<SectionLabel>,
) -> Option<SectionLabel> {
    classify_section(&grid.head_text(3)).or(page_section)
}
