use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::Result;
use crate::utils::normalize_text;

/// A raw table as delivered by the table-recognition collaborator: ordered
/// rows of ordered cell strings. Rows may be ragged; missing trailing cells
/// simply yield no facts for those columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTableGrid {
    rows: Vec<Vec<String>>,
}

impl RawTableGrid {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// Builds a grid from anything stringly-typed, handy in tests and for
    /// collaborators that produce `&str` cells.
    pub fn from_rows<R, C>(rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = C>,
        C: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|r| r.into_iter().map(Into::into).collect())
                .collect(),
        }
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|r| r.is_empty())
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row).and_then(|r| r.get(col)).map(String::as_str)
    }

    /// Concatenated, normalized text of the first `n` rows. Table captions and
    /// unit markers ("€'m", "EUR million") usually live here.
    pub fn head_text(&self, n: usize) -> String {
        let joined = self
            .rows
            .iter()
            .take(n)
            .map(|r| r.join(" "))
            .collect::<Vec<_>>()
            .join(" ");
        normalize_text(&joined)
    }
}

/// How the page text was obtained by the upstream extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageSource {
    Native,
    Ocr,
}

impl PageSource {
    /// The provenance tag facts derived from this page carry.
    pub fn table_source(self) -> SourceType {
        match self {
            PageSource::Native => SourceType::NativeTable,
            PageSource::Ocr => SourceType::OcrTable,
        }
    }
}

/// Provenance of a stored fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    NativeTable,
    OcrTable,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::NativeTable => "native_table",
            SourceType::OcrTable => "ocr_table",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "native_table" => Some(SourceType::NativeTable),
            "ocr_table" => Some(SourceType::OcrTable),
            _ => None,
        }
    }
}

/// Per-page inputs supplied by the document-processing collaborator.
/// Immutable for the lifetime of the page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageContext {
    pub page_number: u32,
    pub text: String,
    pub default_company: String,
    pub default_fiscal_year: Option<i32>,
    pub source: PageSource,
}

impl PageContext {
    pub fn new(
        page_number: u32,
        text: impl Into<String>,
        default_company: impl Into<String>,
        default_fiscal_year: Option<i32>,
        source: PageSource,
    ) -> Self {
        Self {
            page_number,
            text: text.into(),
            default_company: default_company.into(),
            default_fiscal_year,
            source,
        }
    }
}

/// Currency and scale evidence inferred from free text. Never fails to
/// resolve; absence of evidence is `currency: None, scale_label: None`
/// with a multiplier of 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitInfo {
    pub currency: Option<String>,
    pub scale_label: Option<String>,
    pub scale_multiplier: f64,
}

impl Default for UnitInfo {
    fn default() -> Self {
        Self {
            currency: None,
            scale_label: None,
            scale_multiplier: 1.0,
        }
    }
}

/// A header row mapping column indices to fiscal years. Only produced when a
/// single row yields at least two column mappings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearHeaderMap {
    pub header_row: usize,
    pub column_years: BTreeMap<usize, i32>,
}

/// The financial-statement category a page or table belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionLabel {
    IncomeStatement,
    BalanceSheet,
    CashFlow,
    Kpi,
}

impl SectionLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionLabel::IncomeStatement => "income_statement",
            SectionLabel::BalanceSheet => "balance_sheet",
            SectionLabel::CashFlow => "cash_flow",
            SectionLabel::Kpi => "kpi",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "income_statement" => Some(SectionLabel::IncomeStatement),
            "balance_sheet" => Some(SectionLabel::BalanceSheet),
            "cash_flow" => Some(SectionLabel::CashFlow),
            "kpi" => Some(SectionLabel::Kpi),
            _ => None,
        }
    }
}

/// The identity tuple that uniquely addresses a fact slot in the store.
/// Re-deriving a fact for the same key replaces the prior value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FactKey {
    pub company: String,
    pub fiscal_year: Option<i32>,
    pub section: Option<SectionLabel>,
    pub metric: String,
    pub source_page: u32,
    pub source_type: SourceType,
}

impl FactKey {
    /// Canonical string form of the key, used by the SQLite backend as its
    /// conflict column. JSON keeps null years/sections unambiguous.
    pub fn identity(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// A single normalized numeric observation with provenance. `value` has the
/// scale multiplier already applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialFact {
    pub company: String,
    pub fiscal_year: Option<i32>,
    pub section: Option<SectionLabel>,
    pub metric: String,
    pub value: f64,
    pub currency: Option<String>,
    pub unit_raw: Option<String>,
    pub scale_applied: f64,
    pub source_page: u32,
    pub source_type: SourceType,
    pub confidence: f64,
}

impl FinancialFact {
    pub fn key(&self) -> FactKey {
        FactKey {
            company: self.company.clone(),
            fiscal_year: self.fiscal_year,
            section: self.section,
            metric: self.metric.clone(),
            source_page: self.source_page,
            source_type: self.source_type,
        }
    }
}
