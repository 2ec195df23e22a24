use std::io::Write;

use anyhow::Result;

use crate::application::LedgerService;
use crate::domain::{format_cents, SavingsTreatment};

/// Exporter for writing ledger data as CSV
pub struct Exporter<'a> {
    service: &'a LedgerService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a LedgerService) -> Self {
        Self { service }
    }

    /// Export every transaction in ledger order. Legacy records get an empty account.
    pub fn export_transactions_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "date",
            "amount",
            "category",
            "subcategory",
            "description",
            "account",
        ])?;

        let mut count = 0;
        for tx in self.service.transactions() {
            csv_writer.write_record([
                tx.timestamp.to_rfc3339().as_str(),
                format_cents(tx.amount).as_str(),
                tx.category.as_str(),
                tx.subcategory.as_str(),
                tx.description.as_str(),
                tx.account.as_ref().map(|a| a.as_str()).unwrap_or_default(),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export the per-account breakdown, with `net` as the last row.
    pub fn export_breakdown_csv<W: Write>(
        &self,
        writer: W,
        savings: SavingsTreatment,
    ) -> Result<usize> {
        let breakdown = self.service.account_breakdown(savings);
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["account", "balance"])?;
        for (account, balance) in &breakdown.accounts {
            csv_writer.write_record([account.as_str(), format_cents(*balance).as_str()])?;
        }
        csv_writer.write_record(["net", format_cents(breakdown.net).as_str()])?;

        csv_writer.flush()?;
        Ok(breakdown.accounts.len())
    }
}
