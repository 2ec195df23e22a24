use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, trace};

use crate::domain::Transaction;

use super::StorageError;

/// Repository persisting the transaction list as a single JSON array.
///
/// Every save rewrites the whole file. The new contents go to a temporary file in
/// the same directory which is then renamed over the old one, so a crash mid-write
/// leaves the previous ledger intact.
#[derive(Debug, Clone)]
pub struct Repository {
    path: PathBuf,
}

impl Repository {
    /// Create a repository backed by the file at `path`. Nothing is read yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load every transaction in file order.
    /// A missing file is a fresh ledger and loads as empty.
    pub fn load(&self) -> Result<Vec<Transaction>, StorageError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No ledger at {}, starting empty", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(StorageError::io(&self.path, e)),
        };

        if raw.trim().is_empty() {
            debug!("Ledger {} is empty", self.path.display());
            return Ok(Vec::new());
        }

        let transactions: Vec<Transaction> =
            serde_json::from_str(&raw).map_err(|e| StorageError::format(&self.path, e))?;
        debug!(
            "Loaded {} transactions from {}",
            transactions.len(),
            self.path.display()
        );
        Ok(transactions)
    }

    /// Replace the file contents with `transactions`.
    pub fn save(&self, transactions: &[Transaction]) -> Result<(), StorageError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| StorageError::io(&dir, e))?;

        let mut json = serde_json::to_string_pretty(transactions)
            .map_err(|e| StorageError::format(&self.path, e))?;
        json.push('\n');

        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| StorageError::io(&dir, e))?;
        trace!("Writing ledger via {}", tmp.path().display());
        tmp.write_all(json.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| StorageError::io(tmp.path(), e))?;
        tmp.persist(&self.path)
            .map_err(|e| StorageError::io(&self.path, e.error))?;

        debug!(
            "Saved {} transactions to {}",
            transactions.len(),
            self.path.display()
        );
        Ok(())
    }
}
