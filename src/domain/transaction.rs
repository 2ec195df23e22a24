use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use super::{amount_units, Account, Category, Cents};

/// A single recorded financial event.
/// Transactions are never edited; the only write after creation is the
/// one-time backfill of `account` on legacy records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// When the transaction was recorded, in local time
    #[serde(rename = "date", with = "local_timestamp")]
    pub timestamp: DateTime<Local>,
    /// Magnitude in cents; the category decides whether it adds or subtracts
    #[serde(with = "amount_units")]
    pub amount: Cents,
    pub category: Category,
    #[serde(default)]
    pub subcategory: String,
    #[serde(default)]
    pub description: String,
    /// `None` on records written before accounts existed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<Account>,
}

impl Transaction {
    pub fn new(
        timestamp: DateTime<Local>,
        amount: Cents,
        category: Category,
        subcategory: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            amount,
            category,
            subcategory: subcategory.into(),
            description: String::new(),
            account: Some(Account::default()),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_account(mut self, account: Account) -> Self {
        self.account = Some(account);
        self
    }

    /// Mark this record as predating the account field.
    pub fn without_account(mut self) -> Self {
        self.account = None;
        self
    }

    pub fn is_legacy(&self) -> bool {
        self.account.is_none()
    }

    /// The stored account, or the one inferred from the description for legacy records.
    pub fn resolved_account(&self) -> Account {
        match &self.account {
            Some(account) => account.clone(),
            None => Account::infer_from_description(&self.description),
        }
    }
}

/// Reads RFC 3339 timestamps and the naive `YYYY-MM-DDTHH:MM:SS[.f]` form
/// found in older files (taken as local time). Always writes RFC 3339.
pub mod local_timestamp {
    use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
    use serde::{de, Deserialize, Deserializer, Serializer};

    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    pub fn parse(s: &str) -> Option<DateTime<Local>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Local));
        }
        NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
            .and_then(|naive| Local.from_local_datetime(&naive).earliest())
    }

    pub fn serialize<S: Serializer>(dt: &DateTime<Local>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&dt.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Local>, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp '{raw}'")))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, TimeZone, Timelike};

    use super::*;

    fn sample() -> Transaction {
        let ts = Local.with_ymd_and_hms(2024, 3, 15, 9, 30, 0).unwrap();
        Transaction::new(ts, 500000, Category::Income, "salary").with_description("Monthly salary")
    }

    #[test]
    fn test_new_transaction_defaults_to_bank() {
        let tx = sample();
        assert_eq!(tx.account, Some(Account::Bank));
        assert!(!tx.is_legacy());
        assert_eq!(tx.resolved_account(), Account::Bank);
    }

    #[test]
    fn test_resolved_account_for_legacy_record() {
        let tx = sample()
            .with_description("Cash from side job")
            .without_account();
        assert!(tx.is_legacy());
        assert_eq!(tx.resolved_account(), Account::Cash);
    }

    #[test]
    fn test_serialized_field_names() {
        let tx = sample().with_account(Account::Cash);
        let value = serde_json::to_value(&tx).unwrap();

        assert!(value.get("date").unwrap().is_string());
        assert_eq!(value["amount"], serde_json::json!(5000));
        assert_eq!(value["category"], "income");
        assert_eq!(value["subcategory"], "salary");
        assert_eq!(value["description"], "Monthly salary");
        assert_eq!(value["account"], "cash");
    }

    #[test]
    fn test_legacy_record_omits_account() {
        let value = serde_json::to_value(sample().without_account()).unwrap();
        assert!(value.get("account").is_none());
    }

    #[test]
    fn test_fractional_amount_serializes_as_units() {
        let tx = Transaction::new(Local::now(), 1250, Category::Expenses, "food");
        let value = serde_json::to_value(&tx).unwrap();
        assert_eq!(value["amount"], serde_json::json!(12.5));
    }

    #[test]
    fn test_deserialize_legacy_record() {
        let json = r#"{
            "date": "2024-01-15T10:30:00.123456",
            "amount": 1200,
            "category": "expenses",
            "subcategory": "housing",
            "description": "Rent payment"
        }"#;
        let tx: Transaction = serde_json::from_str(json).unwrap();

        assert_eq!(tx.amount, 120000);
        assert_eq!(tx.category, Category::Expenses);
        assert_eq!(tx.account, None);
        assert_eq!(tx.timestamp.year(), 2024);
        assert_eq!(tx.timestamp.month(), 1);
        assert_eq!(tx.timestamp.day(), 15);
        assert_eq!(tx.timestamp.hour(), 10);
    }

    #[test]
    fn test_deserialize_rejects_bad_amount() {
        let json = r#"{"date": "2024-01-15T10:30:00", "amount": "lots", "category": "income"}"#;
        assert!(serde_json::from_str::<Transaction>(json).is_err());
    }

    #[test]
    fn test_deserialize_rejects_amount_over_limit() {
        let json = r#"{"date": "2024-01-15T10:30:00", "amount": 6e16, "category": "income"}"#;
        let err = serde_json::from_str::<Transaction>(json).unwrap_err();
        assert!(err.to_string().contains("invalid amount"));

        let json = r#"{"date": "2024-01-15T10:30:00", "amount": 1e13, "category": "income"}"#;
        let tx: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.amount, crate::domain::MAX_AMOUNT);
    }

    #[test]
    fn test_deserialize_rejects_bad_timestamp() {
        let json = r#"{"date": "last tuesday", "amount": 10, "category": "income"}"#;
        let err = serde_json::from_str::<Transaction>(json).unwrap_err();
        assert!(err.to_string().contains("invalid timestamp"));
    }

    #[test]
    fn test_timestamp_survives_roundtrip() {
        let tx = sample();
        let json = serde_json::to_string(&tx).unwrap();
        let back: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tx);
    }
}
