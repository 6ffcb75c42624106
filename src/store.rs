use rusqlite::{params, Connection};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, RwLock};

use crate::error::{NormalizerError, Result};
use crate::model::{FactKey, FinancialFact, SectionLabel, SourceType};

/// The one shared mutable resource of the pipeline. Upserts are
/// create-or-replace on the fact's identity key, which makes re-processing a
/// document idempotent; `all()` enumerates facts in a deterministic order
/// sorted by identity.
pub trait FactStore: Send + Sync {
    fn upsert(&self, fact: FinancialFact) -> Result<()>;
    fn all(&self) -> Result<Vec<FinancialFact>>;
    fn count(&self) -> Result<usize>;
}

/// Keyed map behind a read-write lock. The backend for tests and short-lived
/// runs that do not need persistence.
#[derive(Default)]
pub struct MemoryFactStore {
    facts: RwLock<BTreeMap<FactKey, FinancialFact>>,
}

impl MemoryFactStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FactStore for MemoryFactStore {
    fn upsert(&self, fact: FinancialFact) -> Result<()> {
        let mut facts = self
            .facts
            .write()
            .map_err(|_| NormalizerError::PoisonedLock)?;
        facts.insert(fact.key(), fact);
        Ok(())
    }

    fn all(&self) -> Result<Vec<FinancialFact>> {
        let facts = self
            .facts
            .read()
            .map_err(|_| NormalizerError::PoisonedLock)?;
        Ok(facts.values().cloned().collect())
    }

    fn count(&self) -> Result<usize> {
        let facts = self
            .facts
            .read()
            .map_err(|_| NormalizerError::PoisonedLock)?;
        Ok(facts.len())
    }
}

/// SQLite-backed store for persisted runs. The connection is mutex-guarded;
/// the canonical identity string is the table's primary key, so replaced
/// facts never duplicate. Each write is stamped with an RFC 3339 UTC
/// `created_at`; that column is persistence provenance only and never
/// surfaces in `FinancialFact`.
pub struct SqliteFactStore {
    conn: Mutex<Connection>,
}

impl SqliteFactStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS financial_facts (
                identity TEXT PRIMARY KEY,
                company TEXT NOT NULL,
                fiscal_year INTEGER,
                section TEXT,
                metric TEXT NOT NULL,
                value REAL NOT NULL,
                currency TEXT,
                unit_raw TEXT,
                scale_applied REAL NOT NULL,
                source_page INTEGER NOT NULL,
                source_type TEXT NOT NULL,
                confidence REAL NOT NULL,
                created_at TEXT NOT NULL
            );",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl FactStore for SqliteFactStore {
    fn upsert(&self, fact: FinancialFact) -> Result<()> {
        let identity = fact.key().identity()?;
        let created_at = chrono::Utc::now().to_rfc3339();
        let conn = self
            .conn
            .lock()
            .map_err(|_| NormalizerError::PoisonedLock)?;
        conn.execute(
            "INSERT INTO financial_facts
             (identity, company, fiscal_year, section, metric, value, currency,
              unit_raw, scale_applied, source_page, source_type, confidence, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
             ON CONFLICT(identity) DO UPDATE SET
               value = excluded.value,
               currency = excluded.currency,
               unit_raw = excluded.unit_raw,
               scale_applied = excluded.scale_applied,
               confidence = excluded.confidence,
               created_at = excluded.created_at",
            params![
                identity,
                fact.company,
                fact.fiscal_year,
                fact.section.map(|s| s.as_str()),
                fact.metric,
                fact.value,
                fact.currency,
                fact.unit_raw,
                fact.scale_applied,
                fact.source_page,
                fact.source_type.as_str(),
                fact.confidence,
                created_at,
            ],
        )?;
        Ok(())
    }

    fn all(&self) -> Result<Vec<FinancialFact>> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| NormalizerError::PoisonedLock)?;
        let mut stmt = conn.prepare(
            "SELECT company, fiscal_year, section, metric, value, currency,
                    unit_raw, scale_applied, source_page, source_type, confidence
             FROM financial_facts
             ORDER BY company, fiscal_year, section, metric, source_page, source_type",
        )?;
        let rows = stmt.query_map([], |row| {
            let section: Option<String> = row.get(2)?;
            let source_type: String = row.get(9)?;
            Ok(FinancialFact {
                company: row.get(0)?,
                fiscal_year: row.get(1)?,
                section: section.as_deref().and_then(SectionLabel::parse),
                metric: row.get(3)?,
                value: row.get(4)?,
                currency: row.get(5)?,
                unit_raw: row.get(6)?,
                scale_applied: row.get(7)?,
                source_page: row.get(8)?,
                source_type: SourceType::parse(&source_type).ok_or_else(|| {
                    rusqlite::Error::FromSqlConversionFailure(
                        9,
                        rusqlite::types::Type::Text,
                        format!("unknown source_type '{}'", source_type).into(),
                    )
                })?,
                confidence: row.get(10)?,
            })
        })?;
        let mut facts = Vec::new();
        for fact in rows {
            facts.push(fact?);
        }
        Ok(facts)
    }

    fn count(&self) -> Result<usize> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| NormalizerError::PoisonedLock)?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM financial_facts", [], |r| r.get(0))?;
        Ok(count as usize)
    }
}
