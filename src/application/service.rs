use std::path::PathBuf;

use chrono::{Datelike, Local};
use tracing::{debug, info};

use crate::domain::{
    account_breakdown, backfill_accounts, compute_balance, format_cents, is_within_limit,
    monthly_summary, parse_cents, Account, AccountBreakdown, Category, Cents, MonthlySummary,
    SavingsTreatment, Transaction,
};
use crate::storage::Repository;

use super::AppError;

/// Application service providing the ledger's operations.
/// It owns the in-memory transaction list and writes it back through the
/// repository after every mutation. This is the only interface clients use.
pub struct LedgerService {
    repo: Repository,
    transactions: Vec<Transaction>,
}

/// Filter for listing transactions
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub category: Option<Category>,
    /// Matches the stored account, or the inferred one for legacy records
    pub account: Option<Account>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    /// Keep only the most recent N matches
    pub limit: Option<usize>,
}

impl TransactionFilter {
    fn matches(&self, tx: &Transaction) -> bool {
        self.category.as_ref().is_none_or(|c| &tx.category == c)
            && self
                .account
                .as_ref()
                .is_none_or(|a| &tx.resolved_account() == a)
            && self.year.is_none_or(|y| tx.timestamp.year() == y)
            && self.month.is_none_or(|m| tx.timestamp.month() == m)
    }
}

impl LedgerService {
    /// Create a service over an already loaded list.
    pub fn new(repo: Repository, transactions: Vec<Transaction>) -> Self {
        Self { repo, transactions }
    }

    /// Load the ledger stored at `path`. A missing file opens an empty ledger;
    /// an unreadable or malformed one is an error, never an empty ledger.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let repo = Repository::new(path);
        let transactions = repo.load()?;
        Ok(Self::new(repo, transactions))
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    // ========================
    // Recording
    // ========================

    /// Record a new transaction stamped with the current local time and persist the ledger.
    ///
    /// The category is not validated: unknown categories are stored and left out of
    /// every total. `account` defaults to bank. Amounts beyond `MAX_AMOUNT` are
    /// rejected so the file always loads back.
    pub fn record_transaction(
        &mut self,
        amount: Cents,
        category: Category,
        subcategory: impl Into<String>,
        description: Option<String>,
        account: Option<Account>,
    ) -> Result<Transaction, AppError> {
        if !is_within_limit(amount) {
            return Err(AppError::InvalidAmount(format!(
                "{} exceeds the largest amount a ledger can hold",
                format_cents(amount)
            )));
        }
        let transaction = Transaction::new(Local::now(), amount, category, subcategory)
            .with_description(description.unwrap_or_default())
            .with_account(account.unwrap_or_default());

        self.append(vec![transaction.clone()])?;
        info!(
            "Recorded {} {} ({}) on {}",
            transaction.category,
            format_cents(transaction.amount),
            transaction.subcategory,
            transaction.resolved_account()
        );
        Ok(transaction)
    }

    /// Append already built transactions in order and persist once.
    /// On a failed save the in-memory list is rolled back to match the file.
    pub(crate) fn append(&mut self, transactions: Vec<Transaction>) -> Result<(), AppError> {
        let previous_len = self.transactions.len();
        self.transactions.extend(transactions);

        if let Err(e) = self.repo.save(&self.transactions) {
            self.transactions.truncate(previous_len);
            return Err(e.into());
        }
        Ok(())
    }

    // ========================
    // Queries
    // ========================

    /// All transactions in insertion order.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn list_transactions(&self, filter: &TransactionFilter) -> Vec<&Transaction> {
        let matching: Vec<&Transaction> = self
            .transactions
            .iter()
            .filter(|tx| filter.matches(tx))
            .collect();

        match filter.limit {
            Some(limit) if matching.len() > limit => matching[matching.len() - limit..].to_vec(),
            _ => matching,
        }
    }

    /// Number of records still lacking an account.
    pub fn legacy_count(&self) -> usize {
        self.transactions.iter().filter(|tx| tx.is_legacy()).count()
    }

    // ========================
    // Reports
    // ========================

    /// Income minus expenses over the whole history.
    pub fn balance(&self) -> Cents {
        compute_balance(&self.transactions)
    }

    /// Totals for a calendar month in local time. An out-of-range month yields zeros.
    pub fn monthly_summary(&self, year: i32, month: u32) -> MonthlySummary {
        monthly_summary(&self.transactions, year, month)
    }

    pub fn account_breakdown(&self, savings: SavingsTreatment) -> AccountBreakdown {
        account_breakdown(&self.transactions, savings)
    }

    // ========================
    // Migration
    // ========================

    /// Store the inferred account on every legacy record.
    /// Persists only when something changed; returns the number of records updated.
    pub fn migrate_legacy_records(&mut self) -> Result<usize, AppError> {
        let legacy = self.legacy_count();
        if legacy == 0 {
            debug!("No legacy records to migrate");
            return Ok(0);
        }

        let before = self.transactions.clone();
        let migrated = backfill_accounts(&mut self.transactions);
        if let Err(e) = self.repo.save(&self.transactions) {
            self.transactions = before;
            return Err(e.into());
        }

        info!("Migrated {} legacy records", migrated);
        Ok(migrated)
    }
}

// ========================
// Input validation
// ========================

/// Parse a known category name. Used by callers that want to reject typos
/// instead of recording an uncounted category.
pub fn parse_category(input: &str) -> Result<Category, AppError> {
    Category::from_str(input).ok_or_else(|| AppError::InvalidCategory(input.to_string()))
}

pub fn parse_account(input: &str) -> Result<Account, AppError> {
    Account::from_str(input).ok_or_else(|| AppError::InvalidAccount(input.to_string()))
}

/// Parse a non-negative amount such as "50" or "12.34" into cents.
pub fn parse_amount(input: &str) -> Result<Cents, AppError> {
    let cents = parse_cents(input).map_err(|e| AppError::InvalidAmount(e.to_string()))?;
    if cents < 0 {
        return Err(AppError::InvalidAmount(format!(
            "'{}' is negative; the category decides the direction",
            input.trim()
        )));
    }
    Ok(cents)
}

/// Validate a month number coming from a caller.
pub fn check_month(month: u32) -> Result<u32, AppError> {
    if (1..=12).contains(&month) {
        Ok(month)
    } else {
        Err(AppError::InvalidMonth(month))
    }
}
