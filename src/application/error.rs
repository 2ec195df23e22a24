use thiserror::Error;

use crate::storage::StorageError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid ledger data")]
    DataFormat(#[source] StorageError),

    #[error("Ledger file is not accessible")]
    Io(#[source] StorageError),

    #[error("Invalid category: '{0}'. Valid categories: income, expenses, savings, investments")]
    InvalidCategory(String),

    #[error("Invalid account: '{0}'. Valid accounts: bank, cash, invested, crypto, other")]
    InvalidAccount(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid month: {0} (expected 1-12)")]
    InvalidMonth(u32),
}

impl AppError {
    /// True for caller-supplied values outside what the ledger accepts.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AppError::InvalidCategory(_)
                | AppError::InvalidAccount(_)
                | AppError::InvalidAmount(_)
                | AppError::InvalidMonth(_)
        )
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Format { .. } => AppError::DataFormat(err),
            StorageError::Io { .. } => AppError::Io(err),
        }
    }
}
