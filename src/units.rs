use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{RawTableGrid, UnitInfo};

/// Symbol table scanned in fixed order; the first symbol present in the text
/// wins.
const CURRENCY_SYMBOLS: &[(char, &str)] = &[
    ('€', "EUR"),
    ('$', "USD"),
    ('£', "GBP"),
    ('¥', "JPY"),
];

static CURRENCY_WORDS: Lazy<Vec<(Regex, &str)>> = Lazy::new(|| {
    [
        (r"(?i)\bEUR\b", "EUR"),
        (r"(?i)\bEUROS?\b", "EUR"),
        (r"(?i)\bUSD\b", "USD"),
        (r"(?i)\bUS\s*DOLLARS?\b", "USD"),
        (r"(?i)\bGBP\b", "GBP"),
        (r"(?i)\bPOUNDS?\b", "GBP"),
    ]
    .iter()
    .map(|(pat, code)| (Regex::new(pat).unwrap(), *code))
    .collect()
});

// Compact captions like "€m", "$ bn", "£k".
static COMPACT_SCALE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)([€$£¥])\s*(mn|bn|m|k|b)\b").unwrap());

// Spelled-out captions like "EUR million", "USD thousands".
static WORD_SCALE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(EUR|USD|GBP|JPY)\b\s*(million|millions|mn|m|billion|billions|bn|b|thousand|thousands|k)\b")
        .unwrap()
});

// Picky statement headers like "€'m" or "$’m".
static QUOTE_MILLIONS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)['\u{2019}]m\b").unwrap());

fn scale_for_word(word: &str) -> Option<(&'static str, f64)> {
    match word {
        "thousand" | "thousands" | "000s" | "k" => Some(("×1k", 1e3)),
        "million" | "millions" | "mn" | "m" => Some(("×1m", 1e6)),
        "billion" | "billions" | "bn" | "b" => Some(("×1b", 1e9)),
        _ => None,
    }
}

fn symbol_code(symbol: char) -> Option<&'static str> {
    CURRENCY_SYMBOLS
        .iter()
        .find(|(sym, _)| *sym == symbol)
        .map(|(_, code)| *code)
}

fn contains_currency_symbol(text: &str) -> bool {
    CURRENCY_SYMBOLS
        .iter()
        .any(|(sym, _)| text.contains(*sym))
}

/// Detects currency and scale from free text such as a page caption or table
/// header. Currency and scale resolve independently; no evidence yields the
/// `UnitInfo` default (no currency, multiplier 1).
pub fn infer_units(text: &str) -> UnitInfo {
    let mut currency: Option<String> = None;
    let mut scale_label: Option<String> = None;
    let mut scale_multiplier = 1.0;

    for (sym, code) in CURRENCY_SYMBOLS {
        if text.contains(*sym) {
            currency = Some((*code).to_string());
            break;
        }
    }

    if currency.is_none() {
        for (re, code) in CURRENCY_WORDS.iter() {
            if re.is_match(text) {
                currency = Some((*code).to_string());
                break;
            }
        }
    }

    if let Some(caps) = COMPACT_SCALE_RE.captures(text) {
        if let Some((label, mult)) = scale_for_word(&caps[2].to_lowercase()) {
            scale_label = Some(label.to_string());
            scale_multiplier = mult;
        }
        if currency.is_none() {
            let symbol = caps[1].chars().next();
            currency = symbol.and_then(symbol_code).map(str::to_string);
        }
    }

    // A spelled-out code is more explicit than a symbol; it overrides.
    if let Some(caps) = WORD_SCALE_RE.captures(text) {
        currency = Some(caps[1].to_uppercase());
        if let Some((label, mult)) = scale_for_word(&caps[2].to_lowercase()) {
            scale_label = Some(label.to_string());
            scale_multiplier = mult;
        }
    }

    // Quote-prefixed marker forces millions regardless of earlier evidence.
    if contains_currency_symbol(text) && QUOTE_MILLIONS_RE.is_match(text) {
        scale_label = Some("×1m".to_string());
        scale_multiplier = 1e6;
    }

    UnitInfo {
        currency,
        scale_label,
        scale_multiplier,
    }
}

/// Resolves units for one table: evidence from the table's own header rows
/// wins over the page-level inference, field by field. Currency falls back
/// alone; scale label and multiplier fall back as a pair.
pub fn resolve_table_units(grid: &RawTableGrid, page_units: &UnitInfo) -> UnitInfo {
    let table_units = infer_units(&grid.head_text(3));

    let currency = table_units.currency.or_else(|| page_units.currency.clone());
    let (scale_label, scale_multiplier) = if table_units.scale_label.is_some() {
        (table_units.scale_label, table_units.scale_multiplier)
    } else {
        (page_units.scale_label.clone(), page_units.scale_multiplier)
    };

    UnitInfo {
        currency,
        scale_label,
        scale_multiplier,
    }
}
