//! Append-only record of submitted applications.

pub mod csv_store;
pub mod record;

pub use csv_store::{CsvLedger, MatchMode};
pub use record::{ApplicationRecord, VacancyId};

use std::path::PathBuf;

/// Storage abstraction so the orchestrator can be exercised in isolation.
///
/// Implementations are dumb logs: uniqueness per identifier is the caller's
/// responsibility.
pub trait ApplicationLedger {
    /// Whether an application for `identifier` has already been recorded.
    fn exists(&self, identifier: &VacancyId) -> Result<bool, LedgerError>;

    fn append(&self, record: &ApplicationRecord) -> Result<(), LedgerError>;

    /// Every record in append order.
    fn load_all(&self) -> Result<Vec<ApplicationRecord>, LedgerError>;

    /// Records whose identifier equals `identifier`.
    fn find(&self, identifier: &VacancyId) -> Result<Vec<ApplicationRecord>, LedgerError> {
        Ok(self
            .load_all()?
            .into_iter()
            .filter(|record| &record.identifier == identifier)
            .collect())
    }

    /// Records where any field contains `needle`.
    fn search(&self, needle: &str) -> Result<Vec<ApplicationRecord>, LedgerError> {
        Ok(self
            .load_all()?
            .into_iter()
            .filter(|record| record.contains(needle))
            .collect())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("application ledger not found at {}", .path.display())]
    StoreNotFound { path: PathBuf },
    #[error("failed to read application ledger {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed row in application ledger {}: {source}", .path.display())]
    Malformed { path: PathBuf, source: csv::Error },
    #[error(
        "malformed row in application ledger {} at line {line}: expected 4 fields, found {found}",
        .path.display()
    )]
    RowWidth {
        path: PathBuf,
        line: u64,
        found: usize,
    },
    #[error("failed to write application ledger {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}
