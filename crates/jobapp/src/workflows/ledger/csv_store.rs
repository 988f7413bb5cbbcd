use std::fs::{File, OpenOptions};
use std::io::{self, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::record::{ApplicationRecord, VacancyId};
use super::{ApplicationLedger, LedgerError};
use crate::config::LedgerConfig;

/// Rule used to decide whether a vacancy already appears in the ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Identifier column equals the vacancy id.
    #[default]
    Exact,
    /// Any cell of any row contains the vacancy id.
    ///
    /// Deprecated: an id that happens to occur inside a title or date
    /// registers as a duplicate.
    LegacySubstring,
}

/// Columns per row: date, identifier, title, organization.
const COLUMNS: usize = 4;

/// Headerless CSV file with `date,identifier,title,organization` rows.
#[derive(Debug, Clone)]
pub struct CsvLedger {
    path: PathBuf,
    match_mode: MatchMode,
}

impl CsvLedger {
    pub fn new(path: impl Into<PathBuf>, match_mode: MatchMode) -> Self {
        Self {
            path: path.into(),
            match_mode,
        }
    }

    pub fn from_config(config: &LedgerConfig) -> Self {
        Self::new(config.datafile_path.clone(), config.match_mode)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create an empty ledger if none exists. Returns whether a file was created.
    pub fn initialize(&self) -> Result<bool, LedgerError> {
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(source) => Err(LedgerError::Write {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn open(&self) -> Result<File, LedgerError> {
        File::open(&self.path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => LedgerError::StoreNotFound {
                path: self.path.clone(),
            },
            _ => LedgerError::Read {
                path: self.path.clone(),
                source,
            },
        })
    }

    fn reader(&self) -> Result<csv::Reader<File>, LedgerError> {
        Ok(csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(self.match_mode == MatchMode::LegacySubstring)
            .from_reader(self.open()?))
    }

    fn malformed(&self, source: csv::Error) -> LedgerError {
        LedgerError::Malformed {
            path: self.path.clone(),
            source,
        }
    }

    fn row_width(&self, row: &csv::StringRecord) -> Result<(), LedgerError> {
        if row.len() == COLUMNS {
            return Ok(());
        }
        Err(LedgerError::RowWidth {
            path: self.path.clone(),
            line: row.position().map_or(0, |pos| pos.line()),
            found: row.len(),
        })
    }

    fn scan_cells(&self, needle: &str) -> Result<bool, LedgerError> {
        for row in self.reader()?.records() {
            let row = row.map_err(|err| self.malformed(err))?;
            if row.iter().any(|cell| cell.contains(needle)) {
                debug!(row = ?row, "legacy scan matched");
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl ApplicationLedger for CsvLedger {
    fn exists(&self, identifier: &VacancyId) -> Result<bool, LedgerError> {
        match self.match_mode {
            MatchMode::Exact => Ok(!self.find(identifier)?.is_empty()),
            MatchMode::LegacySubstring => {
                warn!(
                    path = %self.path.display(),
                    "legacy substring matching is deprecated and may report false duplicates"
                );
                self.scan_cells(identifier.as_str())
            }
        }
    }

    fn append(&self, record: &ApplicationRecord) -> Result<(), LedgerError> {
        let write_err = |source| LedgerError::Write {
            path: self.path.clone(),
            source,
        };

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&self.path)
            .map_err(write_err)?;
        if lacks_line_terminator(&mut file).map_err(write_err)? {
            debug!(path = %self.path.display(), "terminating last ledger line before append");
            file.write_all(b"\n").map_err(write_err)?;
        }

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer
            .serialize(record)
            .map_err(|err| write_err(err.into()))?;
        writer.flush().map_err(write_err)?;

        debug!(identifier = %record.identifier, path = %self.path.display(), "ledger row appended");
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<ApplicationRecord>, LedgerError> {
        let mut records = Vec::new();
        for row in self.reader()?.records() {
            let row = row.map_err(|err| self.malformed(err))?;
            self.row_width(&row)?;
            let record: ApplicationRecord =
                row.deserialize(None).map_err(|err| self.malformed(err))?;
            records.push(record);
        }
        Ok(records)
    }
}

/// Whether a non-empty file ends without `\n`.
fn lacks_line_terminator(file: &mut File) -> io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}
