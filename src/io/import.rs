use std::io::Read;

use anyhow::Result;
use chrono::{DateTime, Local, NaiveDate, TimeZone};
use serde::Deserialize;
use tracing::{debug, info};

use crate::application::{parse_account, parse_amount, parse_category, LedgerService};
use crate::domain::{local_timestamp, parse_cents, Account, Category, Transaction};

/// Result of an import operation
#[derive(Debug, Clone, Default)]
pub struct ImportResult {
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<ImportError>,
}

/// A row that could not be imported
#[derive(Debug, Clone)]
pub struct ImportError {
    pub line: usize,
    pub field: Option<String>,
    pub error: String,
}

/// Options for import operations
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Validate every row but record nothing
    pub dry_run: bool,
    /// Skip rows identical to a transaction already in the ledger
    pub skip_duplicates: bool,
    /// Reject negative amounts and unknown categories or accounts.
    /// Otherwise rows are taken as the ledger file would store them.
    pub strict: bool,
}

/// One CSV row, in the layout written by `Exporter::export_transactions_csv`.
#[derive(Debug, Deserialize)]
struct CsvRow {
    date: String,
    amount: String,
    category: String,
    #[serde(default)]
    subcategory: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    account: String,
}

/// Importer for loading transactions from CSV
pub struct Importer<'a> {
    service: &'a mut LedgerService,
}

impl<'a> Importer<'a> {
    pub fn new(service: &'a mut LedgerService) -> Self {
        Self { service }
    }

    /// Import transactions from CSV.
    ///
    /// Rows keep their own dates and are appended in file order. Invalid rows are
    /// reported and skipped; the ledger is written once after all rows are read.
    pub fn import_transactions_csv<R: Read>(
        &mut self,
        reader: R,
        options: ImportOptions,
    ) -> Result<ImportResult> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut result = ImportResult::default();
        let mut accepted: Vec<Transaction> = Vec::new();

        for (index, row) in csv_reader.deserialize::<CsvRow>().enumerate() {
            let line = index + 2; // header is line 1

            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    result.errors.push(ImportError {
                        line,
                        field: None,
                        error: format!("CSV parse error: {}", e),
                    });
                    continue;
                }
            };

            let transaction = match row_to_transaction(row, options.strict) {
                Ok(tx) => tx,
                Err((field, error)) => {
                    result.errors.push(ImportError {
                        line,
                        field: Some(field.to_string()),
                        error,
                    });
                    continue;
                }
            };

            if options.skip_duplicates && self.is_duplicate(&transaction, &accepted) {
                debug!("Skipping duplicate row on line {}", line);
                result.skipped += 1;
                continue;
            }

            accepted.push(transaction);
        }

        result.imported = accepted.len();
        if !options.dry_run && !accepted.is_empty() {
            self.service.append(accepted)?;
            info!("Imported {} transactions", result.imported);
        }

        Ok(result)
    }

    fn is_duplicate(&self, candidate: &Transaction, pending: &[Transaction]) -> bool {
        self.service
            .transactions()
            .iter()
            .chain(pending.iter())
            .any(|tx| tx == candidate)
    }
}

fn row_to_transaction(
    row: CsvRow,
    strict: bool,
) -> std::result::Result<Transaction, (&'static str, String)> {
    let amount = if strict {
        parse_amount(&row.amount).map_err(|e| ("amount", e.to_string()))?
    } else {
        parse_cents(&row.amount).map_err(|e| ("amount", e.to_string()))?
    };
    let timestamp = parse_timestamp(&row.date).ok_or_else(|| {
        (
            "date",
            format!("Invalid timestamp '{}'. Use RFC 3339 or YYYY-MM-DD", row.date),
        )
    })?;
    let category = if strict {
        parse_category(&row.category).map_err(|e| ("category", e.to_string()))?
    } else {
        Category::from(row.category)
    };

    let transaction = Transaction::new(timestamp, amount, category, row.subcategory)
        .with_description(row.description);

    // An empty account column marks a record exported before migration.
    if row.account.trim().is_empty() {
        return Ok(transaction.without_account());
    }
    let account = if strict {
        parse_account(&row.account).map_err(|e| ("account", e.to_string()))?
    } else {
        Account::from(row.account)
    };
    Ok(transaction.with_account(account))
}

fn parse_timestamp(s: &str) -> Option<DateTime<Local>> {
    let s = s.trim();
    if let Some(dt) = local_timestamp::parse(s) {
        return Some(dt);
    }

    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    Local
        .from_local_datetime(&date.and_hms_opt(0, 0, 0)?)
        .earliest()
}
