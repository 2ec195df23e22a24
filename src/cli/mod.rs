use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Datelike, Local};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::warn;
use tracing_subscriber::filter::LevelFilter;

use crate::application::{
    check_month, parse_account, parse_amount, parse_category, LedgerService, TransactionFilter,
};
use crate::domain::{format_cents, Category, MonthlySummary, SavingsTreatment};
use crate::io::ImportOptions;
use crate::storage::DEFAULT_LEDGER_FILE;

/// Budget Ledger - Personal Finance Tracking
#[derive(Parser)]
#[command(name = "budget-ledger")]
#[command(about = "Record income, expenses, savings and investments and summarize them")]
#[command(version)]
pub struct Cli {
    /// Ledger file path
    #[arg(short, long, env = "BUDGET_LEDGER_FILE", default_value = DEFAULT_LEDGER_FILE)]
    pub file: PathBuf,

    /// Log level: off, error, warn, info, debug, trace. RUST_LOG overrides it.
    #[arg(long, global = true, default_value_t = LevelFilter::WARN)]
    pub log_level: LevelFilter,

    /// Shorthand for --log-level debug
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record a transaction
    Add {
        /// Amount (e.g., "50.00" or "50"); the category decides the direction
        amount: String,

        /// Category: income, expenses, savings, investments
        #[arg(short, long)]
        category: String,

        /// Subcategory (e.g., "salary", "housing"); see `categories` for suggestions
        #[arg(short, long, default_value = "other")]
        subcategory: String,

        /// Description of the transaction
        #[arg(short, long)]
        description: Option<String>,

        /// Account: bank, cash, invested, crypto, other (defaults to bank)
        #[arg(short, long)]
        account: Option<String>,
    },

    /// Show the balance (income minus expenses)
    Balance,

    /// Summarize one month
    Summary {
        /// Year (defaults to the current year)
        #[arg(long)]
        year: Option<i32>,

        /// Month, 1-12 (defaults to the current month)
        #[arg(long)]
        month: Option<u32>,

        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// Show the balance of each account
    Accounts {
        /// Subtract savings from their account instead of ignoring them
        #[arg(long)]
        deduct_savings: bool,

        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// List recorded transactions
    Transactions {
        /// Filter by category
        #[arg(long)]
        category: Option<String>,

        /// Filter by account (legacy records match their inferred account)
        #[arg(long)]
        account: Option<String>,

        /// Filter by year
        #[arg(long)]
        year: Option<i32>,

        /// Filter by month, 1-12
        #[arg(long)]
        month: Option<u32>,

        /// Show only the most recent N transactions
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// List categories and their suggested subcategories
    Categories,

    /// Store the inferred account on records that predate accounts
    Migrate,

    /// Export data to CSV
    Export {
        /// What to export: transactions, accounts
        export_type: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// For accounts: subtract savings from their account
        #[arg(long)]
        deduct_savings: bool,
    },

    /// Import transactions from CSV
    Import {
        /// Input file (stdin if omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Validate without recording
        #[arg(long)]
        dry_run: bool,

        /// Skip rows identical to an existing transaction
        #[arg(long)]
        skip_duplicates: bool,

        /// Reject negative amounts and unknown categories or accounts
        #[arg(long)]
        strict: bool,
    },
}

impl Cli {
    /// Effective log level after applying `--verbose`.
    pub fn effective_log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::DEBUG.max(self.log_level)
        } else {
            self.log_level
        }
    }

    fn open(&self) -> Result<LedgerService> {
        LedgerService::open(&self.file)
            .with_context(|| format!("Failed to load ledger {}", self.file.display()))
    }

    pub fn run(self) -> Result<()> {
        match &self.command {
            Commands::Add {
                amount,
                category,
                subcategory,
                description,
                account,
            } => {
                let amount = parse_amount(amount)?;
                let category = parse_category(category)?;
                let account = account.as_deref().map(parse_account).transpose()?;

                if !category.suggested_subcategories().contains(&subcategory.as_str()) {
                    warn!(
                        "'{}' is not a suggested {} subcategory",
                        subcategory, category
                    );
                }

                let mut service = self.open()?;
                let tx = service.record_transaction(
                    amount,
                    category,
                    subcategory.clone(),
                    description.clone(),
                    account,
                )?;

                println!(
                    "Recorded {}: {} {} ({})",
                    tx.category,
                    format_cents(tx.amount),
                    tx.subcategory,
                    tx.resolved_account()
                );
                println!("Balance: {}", format_cents(service.balance()));
            }

            Commands::Balance => {
                let service = self.open()?;
                println!("Balance: {}", format_cents(service.balance()));
            }

            Commands::Summary {
                year,
                month,
                format,
            } => {
                let now = Local::now();
                let year = year.unwrap_or(now.year());
                let month = check_month(month.unwrap_or(now.month()))?;

                let service = self.open()?;
                let summary = service.monthly_summary(year, month);
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
                    OutputFormat::Table => print_summary(&summary),
                }
            }

            Commands::Accounts {
                deduct_savings,
                format,
            } => {
                let service = self.open()?;
                let breakdown = service.account_breakdown(savings_treatment(*deduct_savings));
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&breakdown)?)
                    }
                    OutputFormat::Table => {
                        if breakdown.accounts.is_empty() {
                            println!("No account activity.");
                        } else {
                            println!("{:<12} {:>14}", "ACCOUNT", "BALANCE");
                            println!("{}", "-".repeat(27));
                            for (account, balance) in &breakdown.accounts {
                                println!("{:<12} {:>14}", account, format_cents(*balance));
                            }
                            println!("{}", "-".repeat(27));
                            println!("{:<12} {:>14}", "NET", format_cents(breakdown.net));
                        }
                        let legacy = service.legacy_count();
                        if legacy > 0 {
                            println!();
                            println!(
                                "{} record(s) have an inferred account; run `migrate` to store it.",
                                legacy
                            );
                        }
                    }
                }
            }

            Commands::Transactions {
                category,
                account,
                year,
                month,
                limit,
            } => {
                let filter = TransactionFilter {
                    category: category.as_deref().map(parse_category).transpose()?,
                    account: account.as_deref().map(parse_account).transpose()?,
                    year: *year,
                    month: month.map(check_month).transpose()?,
                    limit: *limit,
                };

                let service = self.open()?;
                let transactions = service.list_transactions(&filter);
                if transactions.is_empty() {
                    println!("No transactions found.");
                } else {
                    println!(
                        "{:<17} {:>12} {:<12} {:<14} {:<9} DESCRIPTION",
                        "DATE", "AMOUNT", "CATEGORY", "SUBCATEGORY", "ACCOUNT"
                    );
                    println!("{}", "-".repeat(80));
                    for tx in transactions {
                        let account = match &tx.account {
                            Some(account) => account.to_string(),
                            None => format!("{}*", tx.resolved_account()),
                        };
                        println!(
                            "{:<17} {:>12} {:<12} {:<14} {:<9} {}",
                            tx.timestamp.format("%Y-%m-%d %H:%M"),
                            format_cents(tx.amount),
                            truncate(tx.category.as_str(), 12),
                            truncate(&tx.subcategory, 14),
                            account,
                            tx.description
                        );
                    }
                }
            }

            Commands::Categories => {
                for category in Category::KNOWN {
                    println!(
                        "{:<12} {}",
                        category,
                        category.suggested_subcategories().join(", ")
                    );
                }
            }

            Commands::Migrate => {
                let mut service = self.open()?;
                let migrated = service.migrate_legacy_records()?;
                if migrated == 0 {
                    println!("Nothing to migrate.");
                } else {
                    println!("Migrated {} legacy record(s).", migrated);
                }
            }

            Commands::Export {
                export_type,
                output,
                deduct_savings,
            } => {
                let service = self.open()?;
                run_export_command(
                    &service,
                    export_type,
                    output.as_deref(),
                    savings_treatment(*deduct_savings),
                )?;
            }

            Commands::Import {
                input,
                dry_run,
                skip_duplicates,
                strict,
            } => {
                let mut service = self.open()?;
                let options = ImportOptions {
                    dry_run: *dry_run,
                    skip_duplicates: *skip_duplicates,
                    strict: *strict,
                };
                run_import_command(&mut service, input.as_deref(), options)?;
            }
        }

        Ok(())
    }
}

fn savings_treatment(deduct_savings: bool) -> SavingsTreatment {
    if deduct_savings {
        SavingsTreatment::Deducted
    } else {
        SavingsTreatment::Excluded
    }
}

fn print_summary(summary: &MonthlySummary) {
    println!("Summary for {}-{:02}", summary.year, summary.month);
    println!();
    println!("  Income:       {:>12}", format_cents(summary.income));
    println!("  Expenses:     {:>12}", format_cents(summary.expenses));
    println!("  Savings:      {:>12}", format_cents(summary.savings));
    println!("  Investments:  {:>12}", format_cents(summary.investments));
    println!("  {}", "-".repeat(26));
    println!("  Net:          {:>12}", format_cents(summary.net));
    println!("  Savings rate: {:>11.1}%", summary.savings_rate);
}

fn run_export_command(
    service: &LedgerService,
    export_type: &str,
    output: Option<&std::path::Path>,
    savings: SavingsTreatment,
) -> Result<()> {
    use crate::io::Exporter;
    use std::fs::File;
    use std::io::{stdout, Write};

    let exporter = Exporter::new(service);

    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    match export_type {
        "transactions" => {
            let count = exporter.export_transactions_csv(writer)?;
            if output.is_some() {
                eprintln!("Exported {} transactions", count);
            }
        }
        "accounts" => {
            let count = exporter.export_breakdown_csv(writer, savings)?;
            if output.is_some() {
                eprintln!("Exported {} account balances", count);
            }
        }
        _ => {
            anyhow::bail!(
                "Invalid export type '{}'. Valid types: transactions, accounts",
                export_type
            );
        }
    }

    Ok(())
}

fn run_import_command(
    service: &mut LedgerService,
    input: Option<&std::path::Path>,
    options: ImportOptions,
) -> Result<()> {
    use crate::io::Importer;
    use std::fs::File;
    use std::io::{stdin, Read};

    let reader: Box<dyn Read> = match input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open input file: {}", path.display()))?;
            Box::new(file)
        }
        None => Box::new(stdin()),
    };

    let dry_run = options.dry_run;
    let result = Importer::new(service).import_transactions_csv(reader, options)?;

    if dry_run {
        println!("Validation complete (nothing recorded)");
    } else {
        println!("Import complete");
    }
    println!("  Imported: {}", result.imported);
    println!("  Skipped:  {}", result.skipped);
    println!("  Errors:   {}", result.errors.len());

    if !result.errors.is_empty() {
        println!("\nErrors:");
        for error in result.errors.iter().take(10) {
            println!(
                "  Line {}: {}{}",
                error.line,
                error
                    .field
                    .as_ref()
                    .map(|f| format!("{}: ", f))
                    .unwrap_or_default(),
                error.error
            );
        }
        if result.errors.len() > 10 {
            println!("  ... and {} more errors", result.errors.len() - 10);
        }
    }

    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_add_command() {
        let cli = Cli::try_parse_from([
            "budget-ledger",
            "--file",
            "my.json",
            "add",
            "5000",
            "--category",
            "income",
            "--subcategory",
            "salary",
            "--account",
            "cash",
        ])
        .unwrap();

        assert_eq!(cli.file, PathBuf::from("my.json"));
        match cli.command {
            Commands::Add {
                amount,
                category,
                subcategory,
                description,
                account,
            } => {
                assert_eq!(amount, "5000");
                assert_eq!(category, "income");
                assert_eq!(subcategory, "salary");
                assert_eq!(description, None);
                assert_eq!(account.as_deref(), Some("cash"));
            }
            _ => panic!("expected add command"),
        }
    }

    #[test]
    fn test_verbose_raises_log_level() {
        let cli = Cli::try_parse_from(["budget-ledger", "balance", "-v"]).unwrap();
        assert_eq!(cli.effective_log_level(), LevelFilter::DEBUG);

        let cli = Cli::try_parse_from(["budget-ledger", "--log-level", "trace", "balance"])
            .unwrap();
        assert_eq!(cli.effective_log_level(), LevelFilter::TRACE);
    }

    #[test]
    fn test_summary_format_flag() {
        let cli =
            Cli::try_parse_from(["budget-ledger", "summary", "--month", "3", "--format", "json"])
                .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Summary {
                month: Some(3),
                format: OutputFormat::Json,
                ..
            }
        ));
    }

    #[test]
    fn test_import_strict_flag() {
        let cli = Cli::try_parse_from(["budget-ledger", "import", "-i", "rows.csv"]).unwrap();
        assert!(matches!(cli.command, Commands::Import { strict: false, .. }));

        let cli =
            Cli::try_parse_from(["budget-ledger", "import", "--strict", "--dry-run"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Import {
                strict: true,
                dry_run: true,
                ..
            }
        ));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("housing", 14), "housing");
        assert_eq!(truncate("entertainment-and-more", 10), "enterta...");
    }
}
