use log::debug;

use crate::model::{FinancialFact, PageContext, RawTableGrid, SectionLabel, SourceType, UnitInfo};
use crate::numeric::parse_numeric;
use crate::utils::normalize_text;
use crate::year_header::{find_year_header, first_year_in_text};

/// Minimum fraction of digit-bearing cells a grid without a year header must
/// have to be treated as tabular data at all.
pub const MIN_NUMERIC_DENSITY: f64 = 0.12;

/// Fraction of cells containing at least one digit.
pub fn numeric_density(grid: &RawTableGrid) -> f64 {
    let total: usize = grid.rows().iter().map(Vec::len).sum();
    if total == 0 {
        return 0.0;
    }
    let numeric = grid
        .rows()
        .iter()
        .flatten()
        .filter(|cell| cell.chars().any(|c| c.is_ascii_digit()))
        .count();
    numeric as f64 / total as f64
}

fn metric_label(row: &[String]) -> Option<String> {
    row.first().map(|cell| normalize_text(cell).to_lowercase())
}

fn is_dash(label: &str) -> bool {
    matches!(label, "-" | "\u{2013}" | "\u{2014}")
}

/// Turns one raw grid into zero or more facts.
///
/// A grid with a year header (a row mapping two or more columns to fiscal
/// years) is read column-by-column below that row. Without one, each row
/// contributes at most a single value: the first parseable cell after the
/// label, attributed to the page's default year or the first year mentioned
/// in the page text. Grids with neither a header nor enough numeric cells
/// are discarded as non-tabular noise.
pub fn assemble_facts(
    grid: &RawTableGrid,
    ctx: &PageContext,
    units: &UnitInfo,
    section: Option<SectionLabel>,
) -> Vec<FinancialFact> {
    let mut facts = Vec::new();
    if grid.is_empty() {
        return facts;
    }

    let header = find_year_header(grid);
    if header.is_none() {
        let density = numeric_density(grid);
        if density < MIN_NUMERIC_DENSITY {
            debug!(
                "page {}: grid discarded, numeric density {:.3} below {}",
                ctx.page_number, density, MIN_NUMERIC_DENSITY
            );
            return facts;
        }
    }

    let source_type = ctx.source.table_source();

    match header {
        Some(header) => {
            for row in grid.rows().iter().skip(header.header_row + 1) {
                let metric = match metric_label(row) {
                    Some(m) if !m.is_empty() && !is_dash(&m) => m,
                    _ => continue,
                };
                for (&col, &year) in &header.column_years {
                    let raw = match row.get(col).and_then(|cell| parse_numeric(cell)) {
                        Some(v) => v,
                        None => continue,
                    };
                    facts.push(build_fact(
                        ctx,
                        units,
                        section,
                        metric.clone(),
                        Some(year),
                        raw,
                        source_type,
                    ));
                }
            }
            debug!(
                "page {}: multi-year path emitted {} facts across {} year columns",
                ctx.page_number,
                facts.len(),
                header.column_years.len()
            );
        }
        None => {
            let fallback_year = ctx
                .default_fiscal_year
                .or_else(|| first_year_in_text(&ctx.text));
            for row in grid.rows() {
                let metric = match metric_label(row) {
                    Some(m) if !m.is_empty() => m,
                    _ => continue,
                };
                // First parseable cell wins; later columns are ignored.
                let raw = match row.iter().skip(1).find_map(|cell| parse_numeric(cell)) {
                    Some(v) => v,
                    None => continue,
                };
                facts.push(build_fact(
                    ctx,
                    units,
                    section,
                    metric,
                    fallback_year,
                    raw,
                    source_type,
                ));
            }
            debug!(
                "page {}: fallback path emitted {} facts (year {:?})",
                ctx.page_number,
                facts.len(),
                fallback_year
            );
        }
    }

    facts
}

fn build_fact(
    ctx: &PageContext,
    units: &UnitInfo,
    section: Option<SectionLabel>,
    metric: String,
    fiscal_year: Option<i32>,
    raw_value: f64,
    source_type: SourceType,
) -> FinancialFact {
    FinancialFact {
        company: ctx.default_company.clone(),
        fiscal_year,
        section,
        metric,
        value: raw_value * units.scale_multiplier,
        currency: units.currency.clone(),
        unit_raw: units.scale_label.clone(),
        scale_applied: units.scale_multiplier,
        source_page: ctx.page_number,
        source_type,
        confidence: 1.0,
    }
}
