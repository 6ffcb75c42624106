use log::{info, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io;
use std::path::Path;

use crate::error::Result;
use crate::model::{FinancialFact, SectionLabel};
use crate::store::FactStore;

/// Long projection: one row per fact, all fields, in store order.
pub fn export_long(store: &dyn FactStore) -> Result<Vec<FinancialFact>> {
    store.all()
}

/// Wide projection: one row per (company, fiscal_year, section), one column
/// per observed metric.
#[derive(Debug, Clone, PartialEq)]
pub struct WideTable {
    pub metrics: Vec<String>,
    pub rows: Vec<WideRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WideRow {
    pub company: String,
    pub fiscal_year: Option<i32>,
    pub section: Option<SectionLabel>,
    /// One slot per metric column, in `WideTable::metrics` order.
    pub values: Vec<Option<f64>>,
}

/// Pivots the store by metric. When the same (row key, metric) pair occurs
/// more than once, the first fact in store iteration order wins; store
/// enumeration is sorted, so the outcome is deterministic.
pub fn export_wide(store: &dyn FactStore) -> Result<WideTable> {
    let facts = store.all()?;

    let mut metrics: BTreeSet<String> = BTreeSet::new();
    let mut cells: BTreeMap<(String, Option<i32>, Option<SectionLabel>), BTreeMap<String, f64>> =
        BTreeMap::new();
    for fact in &facts {
        metrics.insert(fact.metric.clone());
        cells
            .entry((fact.company.clone(), fact.fiscal_year, fact.section))
            .or_default()
            .entry(fact.metric.clone())
            .or_insert(fact.value);
    }

    let metrics: Vec<String> = metrics.into_iter().collect();
    let rows = cells
        .into_iter()
        .map(|((company, fiscal_year, section), values)| WideRow {
            company,
            fiscal_year,
            section,
            values: metrics.iter().map(|m| values.get(m).copied()).collect(),
        })
        .collect();

    Ok(WideTable { metrics, rows })
}

/// Renders facts as CSV, one serde-serialized record per fact.
pub fn write_long_csv<W: io::Write>(facts: &[FinancialFact], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for fact in facts {
        csv_writer.serialize(fact)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Renders facts as a pretty-printed JSON array.
pub fn write_long_json<W: io::Write>(facts: &[FinancialFact], writer: W) -> Result<()> {
    serde_json::to_writer_pretty(writer, facts)?;
    Ok(())
}

/// Renders the wide pivot as CSV. Missing (row, metric) combinations are
/// empty fields, as are null years and sections.
pub fn write_wide_csv<W: io::Write>(table: &WideTable, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header = vec![
        "company".to_string(),
        "fiscal_year".to_string(),
        "section".to_string(),
    ];
    header.extend(table.metrics.iter().cloned());
    csv_writer.write_record(&header)?;

    for row in &table.rows {
        let mut record = vec![
            row.company.clone(),
            row.fiscal_year.map(|y| y.to_string()).unwrap_or_default(),
            row.section.map(|s| s.as_str().to_string()).unwrap_or_default(),
        ];
        record.extend(
            row.values
                .iter()
                .map(|v| v.map(|x| x.to_string()).unwrap_or_default()),
        );
        csv_writer.write_record(&record)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Writes `<prefix>_facts_long.csv`, `<prefix>_facts_long.json`, and
/// `<prefix>_facts_wide.csv` into `output_dir`. An empty store skips all
/// writes and is not an error.
pub fn export_all(store: &dyn FactStore, output_dir: &Path, prefix: &str) -> Result<()> {
    let facts = export_long(store)?;
    if facts.is_empty() {
        warn!("no facts stored; skipping exports");
        return Ok(());
    }

    let long_csv = output_dir.join(format!("{}_facts_long.csv", prefix));
    let long_json = output_dir.join(format!("{}_facts_long.json", prefix));
    let wide_csv = output_dir.join(format!("{}_facts_wide.csv", prefix));

    write_long_csv(&facts, File::create(&long_csv)?)?;
    write_long_json(&facts, File::create(&long_json)?)?;
    let wide = export_wide(store)?;
    write_wide_csv(&wide, File::create(&wide_csv)?)?;

    info!(
        "exported {} facts: {}, {}, {}",
        facts.len(),
        long_csv.display(),
        long_json.display(),
        wide_csv.display()
    );
    Ok(())
}
