// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use anyhow::Result;
use budget_ledger::application::LedgerService;
use budget_ledger::domain::{Category, Cents, Transaction};
use budget_ledger::storage::Repository;
use chrono::{DateTime, Local, NaiveDate, TimeZone};
use tempfile::TempDir;

/// Helper to create a test service over a fresh ledger file
pub fn test_service() -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let service = LedgerService::open(ledger_path(&temp_dir))?;
    Ok((service, temp_dir))
}

pub fn ledger_path(dir: &TempDir) -> PathBuf {
    dir.path().join("ledger.json")
}

/// Helper to build a local timestamp at noon on the given date
pub fn local_date(date_str: &str) -> DateTime<Local> {
    let naive = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();
    Local.from_local_datetime(&naive).unwrap()
}

/// Write a ledger file directly, bypassing the service
pub fn write_ledger(path: &Path, transactions: &[Transaction]) -> Result<()> {
    Repository::new(path).save(transactions)?;
    Ok(())
}

pub fn dated(
    date_str: &str,
    amount: Cents,
    category: Category,
    subcategory: &str,
) -> Transaction {
    Transaction::new(local_date(date_str), amount, category, subcategory)
}

/// The sample month used across tests: salary, rent, groceries, utilities,
/// an emergency fund deposit and an index fund purchase.
pub struct SampleData;

impl SampleData {
    pub fn record(service: &mut LedgerService) -> Result<()> {
        let rows: [(Cents, Category, &str, &str); 6] = [
            (500000, Category::Income, "salary", "Monthly salary"),
            (120000, Category::Expenses, "housing", "Rent payment"),
            (40000, Category::Expenses, "food", "Groceries"),
            (15000, Category::Expenses, "utilities", "Electric & Internet"),
            (50000, Category::Savings, "emergency", "Emergency fund"),
            (100000, Category::Investments, "stocks", "Index fund purchase"),
        ];
        for (amount, category, subcategory, description) in rows {
            service.record_transaction(
                amount,
                category,
                subcategory,
                Some(description.to_string()),
                None,
            )?;
        }
        Ok(())
    }

    pub fn legacy_file() -> &'static str {
        r#"[
  {"date": "2024-01-01T09:00:00.000001", "amount": 5000, "category": "income", "subcategory": "salary", "description": "Monthly salary"},
  {"date": "2024-01-02T10:15:00", "amount": 60, "category": "expenses", "subcategory": "food", "description": "Cash for market"},
  {"date": "2024-01-03T11:30:00", "amount": 200, "category": "income", "subcategory": "other", "description": "Bank interest"},
  {"date": "2024-01-04T08:00:00", "amount": 1000, "category": "investments", "subcategory": "stocks", "description": "Index fund investment"},
  {"date": "2024-01-05T18:45:00", "amount": 12.5, "category": "expenses", "subcategory": "food", "description": "Lunch", "account": "crypto"}
]"#
    }
}
