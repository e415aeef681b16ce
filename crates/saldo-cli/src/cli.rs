//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Saldo - Make sense of your bank statements
#[derive(Parser)]
#[command(name = "saldo")]
#[command(about = "Bank statement consolidation and spending analysis", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Directory holding per-user rules (defaults to ~/.local/share/saldo)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// User whose categorization rules are applied
    #[arg(short, long, global = true)]
    pub user: Option<String>,

    /// Config file (defaults to ~/.local/share/saldo/config.toml, then built-in)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load statements and print the consolidated table
    Ingest {
        #[command(flatten)]
        statements: StatementArgs,

        /// Print transactions as JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Maximum rows to print (0 = all)
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },

    /// Generate reports from statements
    Report {
        #[command(subcommand)]
        report_type: ReportType,
    },

    /// Manage categorization rules
    Rules {
        #[command(subcommand)]
        action: Option<RulesAction>,
    },

    /// List categories found in statements plus the defaults
    Categories {
        #[command(flatten)]
        statements: StatementArgs,
    },
}

/// Statement files to load
#[derive(Args, Debug, Clone)]
pub struct StatementArgs {
    /// Statement files (CSV or spreadsheet)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

/// Date, bank and category restrictions for reports
#[derive(Args, Debug, Clone)]
pub struct FilterArgs {
    /// Time period: all, this-month, last-month, this-year, last-30-days, last-90-days
    #[arg(long, default_value = "all")]
    pub period: String,

    /// Custom start date (YYYY-MM-DD) - overrides period
    #[arg(long)]
    pub from: Option<String>,

    /// Custom end date (YYYY-MM-DD) - overrides period
    #[arg(long)]
    pub to: Option<String>,

    /// Only these banks (repeatable)
    #[arg(long)]
    pub bank: Vec<String>,

    /// Only these categories (repeatable)
    #[arg(long)]
    pub category: Vec<String>,
}

#[derive(Subcommand)]
pub enum ReportType {
    /// Income, expenses, balance and savings rate
    Kpis {
        #[command(flatten)]
        statements: StatementArgs,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Change against the preceding period of the same length
    Compare {
        #[command(flatten)]
        statements: StatementArgs,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Recurring charges (subscriptions, frequent apps, monthly bills)
    Subscriptions {
        #[command(flatten)]
        statements: StatementArgs,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Outgoing Pix transfers by beneficiary
    Pix {
        #[command(flatten)]
        statements: StatementArgs,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Spending by category
    Categories {
        #[command(flatten)]
        statements: StatementArgs,

        #[command(flatten)]
        filter: FilterArgs,

        /// Break one category down by description
        #[arg(long)]
        detail: Option<String>,
    },

    /// Inflow and outflow per month
    Monthly {
        #[command(flatten)]
        statements: StatementArgs,

        #[command(flatten)]
        filter: FilterArgs,
    },
}

#[derive(Subcommand)]
pub enum RulesAction {
    /// List rules in priority order
    List,

    /// Add or update a rule
    Add {
        /// Keyword matched against descriptions (case and accent insensitive)
        keyword: String,

        /// Category assigned on match
        category: String,
    },

    /// Delete a rule
    Delete {
        /// Keyword of the rule to delete
        keyword: String,
    },

    /// Show which rule categorizes a description
    Test {
        /// Transaction description to test
        description: String,
    },
}
