use financial_fact_normalizer::*;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

fn acme_page(text: &str) -> PageContext {
    PageContext::new(3, text, "Acme", None, PageSource::Native)
}

fn statement_grid() -> RawTableGrid {
    RawTableGrid::from_rows([
        vec!["", "2024", "2023"],
        vec!["Revenue", "1,200", "1,050"],
        vec!["Net profit", "(80)", "95"],
    ])
}

#[test]
fn test_end_to_end_multi_year_scenario() {
    let store = MemoryFactStore::new();
    let ctx = acme_page("All figures in €m unless otherwise stated");

    let count = process_page(&store, &ctx, &[statement_grid()]).unwrap();
    assert_eq!(count, 4);

    let facts = store.all().unwrap();
    let find = |metric: &str, year: i32| {
        facts
            .iter()
            .find(|f| f.metric == metric && f.fiscal_year == Some(year))
            .unwrap_or_else(|| panic!("missing fact {} {}", metric, year))
    };

    let revenue_2024 = find("revenue", 2024);
    assert_eq!(revenue_2024.company, "Acme");
    assert_eq!(revenue_2024.value, 1_200_000_000.0);
    assert_eq!(revenue_2024.currency.as_deref(), Some("EUR"));
    assert_eq!(revenue_2024.unit_raw.as_deref(), Some("×1m"));
    assert_eq!(revenue_2024.scale_applied, 1e6);
    assert_eq!(revenue_2024.source_page, 3);
    assert_eq!(revenue_2024.source_type, SourceType::NativeTable);
    assert_eq!(revenue_2024.confidence, 1.0);

    assert_eq!(find("net profit", 2024).value, -80_000_000.0);
    assert_eq!(find("revenue", 2023).value, 1_050_000_000.0);
    assert_eq!(find("net profit", 2023).value, 95_000_000.0);
}

#[test]
fn test_idempotence_in_both_backends() {
    let ctx = acme_page("All figures in €m");

    let memory = MemoryFactStore::new();
    process_page(&memory, &ctx, &[statement_grid()]).unwrap();
    let once = memory.all().unwrap();
    process_page(&memory, &ctx, &[statement_grid()]).unwrap();
    assert_eq!(memory.all().unwrap(), once);

    let sqlite = SqliteFactStore::open_in_memory().unwrap();
    process_page(&sqlite, &ctx, &[statement_grid()]).unwrap();
    let once = sqlite.all().unwrap();
    process_page(&sqlite, &ctx, &[statement_grid()]).unwrap();
    assert_eq!(sqlite.all().unwrap(), once);
    assert_eq!(sqlite.count().unwrap(), 4);
}

#[test]
fn test_idempotence_with_null_key_fields() {
    // No year header, no section, no year cues anywhere: facts land with a
    // fully null-extended key and must still overwrite, not duplicate.
    let grid = RawTableGrid::from_rows([vec!["Headcount", "412"], vec!["Stores", "87"]]);
    let ctx = PageContext::new(9, "operational overview", "Acme", None, PageSource::Ocr);

    for store in [
        Box::new(MemoryFactStore::new()) as Box<dyn FactStore>,
        Box::new(SqliteFactStore::open_in_memory().unwrap()),
    ] {
        process_page(store.as_ref(), &ctx, &[grid.clone()]).unwrap();
        process_page(store.as_ref(), &ctx, &[grid.clone()]).unwrap();
        assert_eq!(store.count().unwrap(), 2);
        let facts = store.all().unwrap();
        assert!(facts.iter().all(|f| f.fiscal_year.is_none()));
        assert!(facts.iter().all(|f| f.section.is_none()));
        assert!(facts
            .iter()
            .all(|f| f.source_type == SourceType::OcrTable));
    }
}

#[test]
fn test_negative_parentheses_parsing() {
    assert_eq!(parse_numeric("(1,234.5)"), Some(-1234.5));
    assert_eq!(parse_numeric("-"), None);
    assert_eq!(parse_numeric(""), None);
}

#[test]
fn test_scale_precedence_quote_marker_wins() {
    let units = infer_units("€'m while narrative mentions thousand elsewhere");
    assert_eq!(units.scale_label.as_deref(), Some("×1m"));
    assert_eq!(units.scale_multiplier, 1e6);
}

#[test]
fn test_year_header_minimum_two_mappings() {
    let single = RawTableGrid::from_rows([
        vec!["Overview", "2024"],
        vec!["Revenue", "1,200"],
    ]);
    assert!(find_year_header(&single).is_none());

    let double = RawTableGrid::from_rows([
        vec!["", "2024", "2023"],
        vec!["Revenue", "1,200", "1,050"],
    ]);
    assert!(find_year_header(&double).is_some());
}

#[test]
fn test_numeric_density_gate() {
    // 1 digit-bearing cell out of 9, no year header anywhere.
    let grid = RawTableGrid::from_rows([
        vec!["our", "strategy", "overview"],
        vec!["people", "culture", "planet"],
        vec!["outlook", "page 4", "onwards"],
    ]);
    let ctx = acme_page("chairman's statement");
    assert!(assemble_page_facts(&ctx, &[grid]).is_empty());
}

#[test]
fn test_fiscal_year_notation() {
    assert_eq!(fiscal_year_of("FY 24/25"), Some(2025));

    let grid = RawTableGrid::from_rows([
        vec!["", "FY 24/25", "FY 23/24"],
        vec!["Revenue", "900", "850"],
    ]);
    let header = find_year_header(&grid).unwrap();
    assert_eq!(header.column_years.get(&1), Some(&2025));
    assert_eq!(header.column_years.get(&2), Some(&2024));
}

fn fiscal_year_of(token: &str) -> Option<i32> {
    year_header::fiscal_notation_year(token)
}

#[test]
fn test_fallback_path_takes_page_year() {
    let grid = RawTableGrid::from_rows([
        vec!["Headcount", "412"],
        vec!["Stores", "87"],
        vec!["Revenue per store", "1.4"],
    ]);
    let ctx = acme_page("annual review FY2022 highlights");

    let facts = assemble_page_facts(&ctx, &[grid]);
    assert_eq!(facts.len(), 3);
    assert!(facts.iter().all(|f| f.fiscal_year == Some(2022)));
    assert_eq!(facts[0].value, 412.0);
}

#[test]
fn test_concurrent_upserts_of_distinct_keys() {
    let store = Arc::new(MemoryFactStore::new());
    let ctx = acme_page("All figures in €m");

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = Arc::clone(&store);
            let ctx = ctx.clone();
            thread::spawn(move || {
                let grid = RawTableGrid::from_rows([
                    vec!["".to_string(), "2024".to_string(), "2023".to_string()],
                    vec![format!("metric {}", i), "100".to_string(), "90".to_string()],
                ]);
                process_page(store.as_ref(), &ctx, &[grid]).unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // 8 metrics times 2 years, exactly once each.
    assert_eq!(store.count().unwrap(), 16);
}

#[test]
fn test_export_all_writes_three_artifacts() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = SqliteFactStore::open(dir.path().join("facts.sqlite"))?;
    let ctx = acme_page("All figures in €m");
    process_page(&store, &ctx, &[statement_grid()])?;

    export_all(&store, dir.path(), "run1")?;

    let long_csv = std::fs::read_to_string(dir.path().join("run1_facts_long.csv"))?;
    assert_eq!(long_csv.lines().count(), 5);
    assert!(long_csv.contains("net profit"));

    let long_json: Vec<serde_json::Value> =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("run1_facts_long.json"))?)?;
    assert_eq!(long_json.len(), 4);

    let wide_csv = std::fs::read_to_string(dir.path().join("run1_facts_wide.csv"))?;
    let mut lines = wide_csv.lines();
    assert_eq!(
        lines.next().unwrap(),
        "company,fiscal_year,section,net profit,revenue"
    );
    // One row per (company, fiscal_year, section).
    assert_eq!(wide_csv.lines().count(), 3);
    Ok(())
}

#[test]
fn test_export_all_skips_empty_store() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = MemoryFactStore::new();
    export_all(&store, dir.path(), "empty")?;
    assert!(!dir.path().join("empty_facts_long.csv").exists());
    assert!(!dir.path().join("empty_facts_long.json").exists());
    assert!(!dir.path().join("empty_facts_wide.csv").exists());
    Ok(())
}

#[test]
fn test_wide_export_deterministic_across_runs() {
    let store = MemoryFactStore::new();
    let ctx = acme_page("All figures in €m");
    process_page(&store, &ctx, &[statement_grid()]).unwrap();

    let first = export_wide(&store).unwrap();
    let second = export_wide(&store).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.metrics, vec!["net profit".to_string(), "revenue".to_string()]);
}

#[test]
fn test_filename_heuristic_feeds_page_context() {
    let (company, year) = infer_company_and_year(&PathBuf::from("reports/globex_2023.pdf"));
    let ctx = PageContext::new(1, "no cues here", company, year, PageSource::Native);

    let grid = RawTableGrid::from_rows([vec!["Headcount", "412"]]);
    let facts = assemble_page_facts(&ctx, &[grid]);
    assert_eq!(facts.len(), 1);
    assert_eq!(facts[0].company, "globex");
    assert_eq!(facts[0].fiscal_year, Some(2023));
}

#[test]
fn test_ocr_page_tags_facts_as_ocr_table() {
    let ctx = PageContext::new(5, "key metrics", "Acme", Some(2024), PageSource::Ocr);
    let grid = RawTableGrid::from_rows([vec!["Margin", "12.5"]]);
    let facts = assemble_page_facts(&ctx, &[grid]);
    assert_eq!(facts[0].source_type, SourceType::OcrTable);
    assert_eq!(facts[0].section, Some(SectionLabel::Kpi));
}
