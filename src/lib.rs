//! # Financial Fact Normalizer
//!
//! A library for converting heterogeneous financial-statement tables (as
//! extracted from scanned or digital documents) into a canonical set of
//! time-stamped numeric facts.
//!
//! ## Core Concepts
//!
//! - **Raw grid**: an ordered grid of cell strings produced by an external
//!   table-recognition step; formatting is arbitrary and inconsistent
//! - **Unit inference**: currency and scale (thousands/millions/billions)
//!   detected from page captions and table headers, table evidence winning
//! - **Year header**: a table row mapping columns to fiscal years; without
//!   one, a single-value fallback path takes the first parseable cell per row
//! - **Fact**: one (company, year, section, metric) observation with
//!   provenance, value pre-multiplied by the inferred scale
//! - **Idempotent store**: facts are keyed by their identity tuple and
//!   upserted create-or-replace, so re-processing a document is idempotent
//!
//! ## Example
//!
//! ```rust
//! use financial_fact_normalizer::*;
//!
//! let store = MemoryFactStore::new();
//! let ctx = PageContext::new(3, "All figures in €m", "Acme", None, PageSource::Native);
//! let grid = RawTableGrid::from_rows([
//!     vec!["", "2024", "2023"],
//!     vec!["Revenue", "1,200", "1,050"],
//!     vec!["Net profit", "(80)", "95"],
//! ]);
//!
//! let upserted = process_page(&store, &ctx, &[grid]).unwrap();
//! assert_eq!(upserted, 4);
//! ```

pub mod assembler;
pub mod error;
pub mod export;
pub mod model;
pub mod numeric;
pub mod section;
pub mod store;
pub mod units;
pub mod utils;
pub mod year_header;

pub use assembler::{assemble_facts, numeric_density, MIN_NUMERIC_DENSITY};
pub use error::{NormalizerError, Result};
pub use export::{
    export_all, export_long, export_wide, write_long_csv, write_long_json, write_wide_csv,
    WideRow, WideTable,
};
pub use model::{
    FactKey, FinancialFact, PageContext, PageSource, RawTableGrid, SectionLabel, SourceType,
    UnitInfo, YearHeaderMap,
};
pub use numeric::parse_numeric;
pub use section::{classify_section, resolve_table_section};
pub use store::{FactStore, MemoryFactStore, SqliteFactStore};
pub use units::{infer_units, resolve_table_units};
pub use utils::{infer_company_and_year, normalize_text};
pub use year_header::{find_year_header, first_year_in_text, looks_like_year};

use log::info;

/// Derives facts for one page without touching a store: classifies the page
/// text, infers page-level units, then per grid resolves table-local
/// overrides and assembles facts. For callers that manage persistence
/// themselves.
pub fn assemble_page_facts(ctx: &PageContext, grids: &[RawTableGrid]) -> Vec<FinancialFact> {
    let page_units = infer_units(&ctx.text);
    let page_section = classify_section(&ctx.text);

    let mut facts = Vec::new();
    for grid in grids {
        if grid.is_empty() {
            continue;
        }
        let units = resolve_table_units(grid, &page_units);
        let section = resolve_table_section(grid, page_section);
        facts.extend(assemble_facts(grid, ctx, &units, section));
    }
    facts
}

/// Processes one page end to end: derives facts from the supplied grids and
/// upserts each into the store. Returns the number of facts upserted. A
/// store write failure aborts the page; empty and gated grids contribute
/// zero facts silently.
pub fn process_page(
    store: &dyn FactStore,
    ctx: &PageContext,
    grids: &[RawTableGrid],
) -> Result<usize> {
    let facts = assemble_page_facts(ctx, grids);
    let count = facts.len();
    for fact in facts {
        store.upsert(fact)?;
    }
    info!(
        "page {}: upserted {} facts from {} grids",
        ctx.page_number,
        count,
        grids.len()
    );
    Ok(count)
}
