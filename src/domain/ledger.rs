use std::collections::BTreeMap;

use chrono::Datelike;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use super::{amount_units, Account, Category, Cents, Transaction};

/// Compute the overall balance from a list of transactions.
/// Balance = sum of income - sum of expenses. Savings and investments are transfers
/// and do not count. Totals saturate at the bounds of `Cents` instead of overflowing.
pub fn compute_balance(transactions: &[Transaction]) -> Cents {
    transactions
        .iter()
        .fold(0, |balance, tx| match tx.category {
            Category::Income => balance.saturating_add(tx.amount),
            Category::Expenses => balance.saturating_sub(tx.amount),
            _ => balance,
        })
}

/// Per-category totals for one calendar month.
/// Serialized with money in currency units, like the ledger file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonthlySummary {
    pub year: i32,
    pub month: u32,
    #[serde(serialize_with = "amount_units::serialize")]
    pub income: Cents,
    #[serde(serialize_with = "amount_units::serialize")]
    pub expenses: Cents,
    #[serde(serialize_with = "amount_units::serialize")]
    pub savings: Cents,
    #[serde(serialize_with = "amount_units::serialize")]
    pub investments: Cents,
    /// income - expenses
    #[serde(serialize_with = "amount_units::serialize")]
    pub net: Cents,
    /// savings / income * 100, or 0 when there is no income
    pub savings_rate: f64,
}

/// Summarize the transactions whose local timestamp falls in `year`/`month` (1-12).
/// A month outside 1-12 matches nothing.
pub fn monthly_summary(transactions: &[Transaction], year: i32, month: u32) -> MonthlySummary {
    let mut summary = MonthlySummary {
        year,
        month,
        ..Default::default()
    };

    let in_month = transactions
        .iter()
        .filter(|tx| tx.timestamp.year() == year && tx.timestamp.month() == month);

    for tx in in_month {
        let total = match tx.category {
            Category::Income => &mut summary.income,
            Category::Expenses => &mut summary.expenses,
            Category::Savings => &mut summary.savings,
            Category::Investments => &mut summary.investments,
            Category::Unknown(_) => continue,
        };
        *total = total.saturating_add(tx.amount);
    }

    summary.net = summary.income.saturating_sub(summary.expenses);
    summary.savings_rate = if summary.income > 0 {
        summary.savings as f64 / summary.income as f64 * 100.0
    } else {
        0.0
    };
    summary
}

/// How savings transactions affect the account breakdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SavingsTreatment {
    /// Savings leave every account untouched, even though the monthly
    /// summary counts them. This is the historical behavior.
    #[default]
    Excluded,
    /// Savings are subtracted from the transaction's account as money set aside.
    Deducted,
}

/// Running totals per account, plus their sum.
/// Serialized with money in currency units, like the ledger file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AccountBreakdown {
    /// Only accounts touched by at least one transaction appear here.
    #[serde(serialize_with = "serialize_account_units")]
    pub accounts: BTreeMap<Account, Cents>,
    #[serde(serialize_with = "amount_units::serialize")]
    pub net: Cents,
}

impl AccountBreakdown {
    pub fn get(&self, account: &Account) -> Option<Cents> {
        self.accounts.get(account).copied()
    }

    fn credit(&mut self, account: Account, amount: Cents) {
        let balance = self.accounts.entry(account).or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    fn debit(&mut self, account: Account, amount: Cents) {
        let balance = self.accounts.entry(account).or_insert(0);
        *balance = balance.saturating_sub(amount);
    }
}

struct Units(Cents);

impl Serialize for Units {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        amount_units::serialize(&self.0, s)
    }
}

fn serialize_account_units<S: Serializer>(
    accounts: &BTreeMap<Account, Cents>,
    s: S,
) -> Result<S::Ok, S::Error> {
    let mut map = s.serialize_map(Some(accounts.len()))?;
    for (account, balance) in accounts {
        map.serialize_entry(account, &Units(*balance))?;
    }
    map.end()
}

/// Compute the balance of each account.
///
/// - income credits the transaction's account, expenses debit it;
/// - investments always move money from `bank` into `invested`, whatever the
///   transaction's own account says;
/// - savings follow `savings`;
/// - unknown categories are ignored.
///
/// Legacy records without an account use the account inferred from their description.
/// Balances saturate at the bounds of `Cents` instead of overflowing.
pub fn account_breakdown(
    transactions: &[Transaction],
    savings: SavingsTreatment,
) -> AccountBreakdown {
    let mut breakdown = AccountBreakdown::default();

    for tx in transactions {
        match tx.category {
            Category::Income => breakdown.credit(tx.resolved_account(), tx.amount),
            Category::Expenses => breakdown.debit(tx.resolved_account(), tx.amount),
            Category::Investments => {
                breakdown.credit(Account::Invested, tx.amount);
                breakdown.debit(Account::Bank, tx.amount);
            }
            Category::Savings => {
                if savings == SavingsTreatment::Deducted {
                    breakdown.debit(tx.resolved_account(), tx.amount);
                }
            }
            Category::Unknown(_) => {}
        }
    }

    breakdown.net = breakdown
        .accounts
        .values()
        .fold(0, |net, balance| net.saturating_add(*balance));
    breakdown
}

/// Backfill `account` on every legacy record with the inferred value.
/// Returns how many records changed; a second call returns 0.
pub fn backfill_accounts(transactions: &mut [Transaction]) -> usize {
    let mut changed = 0;
    for tx in transactions.iter_mut().filter(|tx| tx.is_legacy()) {
        tx.account = Some(Account::infer_from_description(&tx.description));
        changed += 1;
    }
    changed
}
