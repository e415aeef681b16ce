//! Saldo Core Library
//!
//! Bank statement ingestion and analysis:
//! - Encoding, header row and delimiter sniffing for CSV exports
//! - Spreadsheet statement reading
//! - Column role inference (date, value, description)
//! - Locale-tolerant amount parsing
//! - Layered categorization (user rules, built-in rules, fallback)
//! - Bank identification from file names and content
//! - Derived metrics: KPIs, period comparison, subscriptions, Pix transfers
//! - Per-user rule persistence and layered configuration

pub mod amount;
pub mod bank;
pub mod categorize;
pub mod columns;
pub mod config;
pub mod error;
pub mod frame;
pub mod ingest;
pub mod metrics;
pub mod models;
pub mod rules;
pub mod sniff;

pub use amount::parse_amount;
pub use bank::identify_bank;
pub use categorize::{classify, explain, known_categories, Categorizer, Classification, RuleSource};
pub use config::{Config, IngestConfig, SubscriptionConfig};
pub use error::{Error, Result};
pub use ingest::{ingest, ingest_file, FileReport, IngestCache, IngestOutcome};
pub use models::{Frequency, Transaction, UploadedFile};
pub use rules::{RuleSet, RuleStore};
pub use sniff::TextEncoding;
