mod error;
mod repository;

pub use error::*;
pub use repository::*;

/// File used when neither `--file` nor `BUDGET_LEDGER_FILE` is given.
pub const DEFAULT_LEDGER_FILE: &str = "budget_ledger.json";
