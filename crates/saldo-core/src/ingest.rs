//! Statement ingestion
//!
//! Turns uploaded statement files into one canonical transaction table:
//! read → infer column roles → parse rows → categorize → label the bank.
//!
//! Each file is processed on its own. A file that fails at any stage is
//! reported and contributes no rows; the rest of the batch still loads.

use std::collections::HashMap;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::amount::parse_amount;
use crate::bank::identify_bank;
use crate::categorize::Categorizer;
use crate::columns::{infer_roles, parse_date};
use crate::config::IngestConfig;
use crate::error::Result;
use crate::frame::read_frame;
use crate::models::{Transaction, UploadedFile, NO_DESCRIPTION};
use crate::rules::RuleSet;

/// Outcome of one file in a batch
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub name: String,
    pub bank: Option<String>,
    pub rows: usize,
    /// Rows dropped because their date did not parse
    pub dropped: usize,
    /// Set when the file was skipped
    pub error: Option<String>,
}

impl FileReport {
    fn loaded(name: &str, parsed: &ParsedFile) -> Self {
        Self {
            name: name.to_string(),
            bank: parsed.transactions.first().map(|tx| tx.bank.clone()),
            rows: parsed.transactions.len(),
            dropped: parsed.dropped,
            error: None,
        }
    }

    /// Report for a file that contributed no rows
    pub fn skipped(name: &str, error: String) -> Self {
        Self {
            name: name.to_string(),
            bank: None,
            rows: 0,
            dropped: 0,
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Merged table plus per-file reports, in input order
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestOutcome {
    pub transactions: Vec<Transaction>,
    pub reports: Vec<FileReport>,
}

impl IngestOutcome {
    pub fn failed(&self) -> impl Iterator<Item = &FileReport> {
        self.reports.iter().filter(|r| !r.is_ok())
    }
}

/// Rows of a single file plus the count of dropped rows
#[derive(Debug, Clone)]
struct ParsedFile {
    transactions: Vec<Transaction>,
    dropped: usize,
}

/// Ingest one statement, sorted by date
pub fn ingest_file(
    file: &UploadedFile,
    rules: &RuleSet,
    config: &IngestConfig,
) -> Result<Vec<Transaction>> {
    parse_file(file, &Categorizer::new(rules), config).map(|parsed| parsed.transactions)
}

fn parse_file(
    file: &UploadedFile,
    categorizer: &Categorizer<'_>,
    config: &IngestConfig,
) -> Result<ParsedFile> {
    let frame = read_frame(file, &config.encodings)?;
    let roles = infer_roles(&frame)?;

    let mut rows = Vec::with_capacity(frame.rows.len());
    let mut dropped = 0;
    for row in &frame.rows {
        let Some(date) = parse_date(&row[roles.date]) else {
            dropped += 1;
            continue;
        };
        let description = match roles.description {
            Some(i) if !row[i].is_empty() => row[i].clone(),
            Some(_) => String::new(),
            None => NO_DESCRIPTION.to_string(),
        };
        let amount = parse_amount(&row[roles.value]);
        rows.push((date, description, amount));
    }
    // Content sampling for the bank sees the oldest rows first, whatever
    // order the export used
    rows.sort_by_key(|(date, _, _)| *date);

    let descriptions: Vec<&str> = rows.iter().map(|(_, d, _)| d.as_str()).collect();
    let bank = identify_bank(&file.name, &descriptions);

    let mut transactions: Vec<Transaction> = rows
        .into_iter()
        .map(|(date, description, amount)| Transaction {
            date,
            category: categorizer.classify(&description),
            description,
            amount,
            bank: bank.clone(),
        })
        .collect();

    debug!(
        "Parsed {} {} transactions from {} ({} dropped)",
        transactions.len(),
        bank,
        file.name,
        dropped
    );
    Ok(ParsedFile {
        transactions,
        dropped,
    })
}

/// Ingest a batch into one table sorted by date.
///
/// Failing files are logged and reported, never propagated.
pub fn ingest(files: &[UploadedFile], rules: &RuleSet, config: &IngestConfig) -> IngestOutcome {
    let categorizer = Categorizer::new(rules);
    let mut outcome = IngestOutcome::default();

    for file in files {
        match parse_file(file, &categorizer, config) {
            Ok(parsed) => {
                outcome.reports.push(FileReport::loaded(&file.name, &parsed));
                outcome.transactions.extend(parsed.transactions);
            }
            Err(e) => {
                warn!("Skipping {}: {}", file.name, e);
                outcome
                    .reports
                    .push(FileReport::skipped(&file.name, e.to_string()));
            }
        }
    }

    // Stable: equal dates keep file order, then row order
    outcome.transactions.sort_by_key(|tx| tx.date);

    info!(
        "Ingested {} transactions from {} of {} files",
        outcome.transactions.len(),
        outcome.reports.iter().filter(|r| r.is_ok()).count(),
        files.len()
    );
    outcome
}

/// Content hash of a statement (name and bytes)
pub fn file_hash(file: &UploadedFile) -> String {
    let mut hasher = Sha256::new();
    hasher.update((file.name.len() as u64).to_be_bytes());
    hasher.update(file.name.as_bytes());
    hasher.update(&file.bytes);
    hex::encode(hasher.finalize())
}

/// Everything besides file content that changes a parse result
fn cache_fingerprint(rules: &RuleSet, config: &IngestConfig) -> String {
    let encodings: Vec<&str> = config.encodings.iter().map(|e| e.as_str()).collect();
    format!("{}|{}", rules.fingerprint(), encodings.join(","))
}

/// Caller-owned memo of per-file ingestion results.
///
/// Entries are keyed by file content hash and valid for one rule set
/// fingerprint and encoding list; presenting a different rule set or
/// encoding list drops every entry.
#[derive(Debug, Default)]
pub struct IngestCache {
    fingerprint: Option<String>,
    entries: HashMap<String, FileEntry>,
}

#[derive(Debug, Clone)]
struct FileEntry {
    result: std::result::Result<ParsedFile, String>,
}

impl IngestCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop everything, e.g. after the user taught a new rule
    pub fn clear(&mut self) {
        self.entries.clear();
        self.fingerprint = None;
    }

    /// Drop one file's entry
    pub fn invalidate(&mut self, file: &UploadedFile) -> bool {
        self.entries.remove(&file_hash(file)).is_some()
    }

    /// Same result as [`ingest`], reusing cached per-file work
    pub fn get_or_ingest(
        &mut self,
        files: &[UploadedFile],
        rules: &RuleSet,
        config: &IngestConfig,
    ) -> IngestOutcome {
        let fingerprint = cache_fingerprint(rules, config);
        if self.fingerprint.as_deref() != Some(fingerprint.as_str()) {
            if !self.entries.is_empty() {
                debug!(
                    "Rules or encodings changed, dropping {} cached files",
                    self.entries.len()
                );
            }
            self.entries.clear();
            self.fingerprint = Some(fingerprint);
        }

        let categorizer = Categorizer::new(rules);
        let mut outcome = IngestOutcome::default();

        for file in files {
            let key = file_hash(file);
            let entry = self.entries.entry(key).or_insert_with(|| FileEntry {
                result: parse_file(file, &categorizer, config).map_err(|e| {
                    warn!("Skipping {}: {}", file.name, e);
                    e.to_string()
                }),
            });

            match &entry.result {
                Ok(parsed) => {
                    outcome.reports.push(FileReport::loaded(&file.name, parsed));
                    outcome.transactions.extend(parsed.transactions.iter().cloned());
                }
                Err(message) => outcome
                    .reports
                    .push(FileReport::skipped(&file.name, message.clone())),
            }
        }

        outcome.transactions.sort_by_key(|tx| tx.date);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::models::category;
    use chrono::NaiveDate;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn nubank_file() -> UploadedFile {
        UploadedFile::new(
            "nubank_jan.csv",
            "date,description,amount\n2024-01-20,Uber *Trip,-23.90\n2024-01-05,Netflix.com,-39.90\n",
        )
    }

    fn inter_file() -> UploadedFile {
        UploadedFile::new(
            "inter.csv",
            "Extrato Banco Inter\n\
             Data Lançamento;Histórico;Descrição;Valor\n\
             10/01/2024;Pix recebido;Fulano;1.500,00\n\
             11/01/2024;Pix enviado;Ciclano;-10,00\n\
             12/01/2024;Compra cartao;Padaria;-8,50\n\
             13/01/2024;Pagamento;Boleto luz;-120,00\n\
             14/01/2024;Rendimento;Poupanca;0,35\n\
             xx/01/2024;Saldo do dia;-;0,00\n",
        )
    }

    fn broken_file() -> UploadedFile {
        UploadedFile::new("itau.csv", "Descricao;Valor\nPadaria;-5,00\nMercado;-80,00\n")
    }

    #[test]
    fn test_ingest_file_sorted_and_categorized() {
        let rows = ingest_file(&nubank_file(), &RuleSet::new(), &IngestConfig::default()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, ymd(2024, 1, 5));
        assert_eq!(rows[0].category, category::SUBSCRIPTIONS);
        assert_eq!(rows[1].category, category::TRANSPORT);
        assert_eq!(rows[1].amount, -23.90);
        assert!(rows.iter().all(|tx| tx.bank == "Nubank"));
        assert_eq!(rows[0].description, "Netflix.com");
    }

    #[test]
    fn test_bank_sampled_after_sorting() {
        // Newest-first export whose only bank hint is the oldest row
        let mut content = String::from("Data;Descricao;Valor\n");
        for day in (2..=21).rev() {
            content.push_str(&format!("{:02}/02/2024;COMPRA {};-10,00\n", day, day));
        }
        content.push_str("01/01/2024;TED SANTANDER;500,00\n");

        let file = UploadedFile::new("extrato.csv", content);
        let txs = ingest_file(&file, &RuleSet::new(), &IngestConfig::default()).unwrap();
        assert_eq!(txs.len(), 21);
        assert_eq!(txs[0].date, ymd(2024, 1, 1));
        assert!(txs.iter().all(|tx| tx.bank == "Santander"));
    }

    #[test]
    fn test_non_breaking_space_in_latin1_statement() {
        let file = UploadedFile::new(
            "inter.csv",
            b"Data;Descricao;Valor\n01/01/2024;PIX\xA0RECEBIDO FULANO;100,00\n".to_vec(),
        );
        let txs = ingest_file(&file, &RuleSet::new(), &IngestConfig::default()).unwrap();
        assert_eq!(txs[0].category, category::INCOME);
    }

    #[test]
    fn test_ingest_file_drops_bad_dates() {
        let rows = ingest_file(&inter_file(), &RuleSet::new(), &IngestConfig::default()).unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].amount, 1500.0);
        assert_eq!(rows[0].description, "Pix recebido");
        assert_eq!(rows[0].category, category::INCOME);
        assert_eq!(rows[0].bank, "Inter");
    }

    #[test]
    fn test_missing_description_column() {
        let file = UploadedFile::new("c6bank.csv", "Data;Valor\n01/02/2024;-9,90\n");
        let rows = ingest_file(&file, &RuleSet::new(), &IngestConfig::default()).unwrap();
        assert_eq!(rows[0].description, NO_DESCRIPTION);
        assert_eq!(rows[0].category, category::OTHER);
        assert_eq!(rows[0].bank, "C6Bank");
    }

    #[test]
    fn test_ingest_file_without_date_column() {
        let err = ingest_file(&broken_file(), &RuleSet::new(), &IngestConfig::default())
            .unwrap_err();
        assert!(matches!(err, Error::NoDateColumn));
    }

    #[test]
    fn test_partial_failure_isolation() {
        let files = vec![nubank_file(), broken_file(), inter_file()];
        let outcome = ingest(&files, &RuleSet::new(), &IngestConfig::default());

        assert_eq!(outcome.transactions.len(), 7);
        assert!(outcome
            .transactions
            .iter()
            .all(|tx| tx.bank == "Nubank" || tx.bank == "Inter"));
        let dates: Vec<_> = outcome.transactions.iter().map(|tx| tx.date).collect();
        let mut sorted = dates.clone();
        sorted.sort();
        assert_eq!(dates, sorted);

        let failed: Vec<_> = outcome.failed().map(|r| r.name.as_str()).collect();
        assert_eq!(failed, vec!["itau.csv"]);
        assert_eq!(outcome.reports[2].dropped, 1);
    }

    #[test]
    fn test_all_failed_is_empty_not_error() {
        let outcome = ingest(
            &[broken_file(), UploadedFile::new("vazio.csv", "")],
            &RuleSet::new(),
            &IngestConfig::default(),
        );
        assert!(outcome.transactions.is_empty());
        assert_eq!(outcome.failed().count(), 2);
    }

    #[test]
    fn test_decode_failure_is_file_scoped() {
        let config = IngestConfig {
            encodings: vec![crate::sniff::TextEncoding::Utf8],
        };
        let latin1 = UploadedFile::new("bb.csv", b"Data;Descri\xE7\xE3o;Valor\n01/01/2024;x;1\n".to_vec());
        let outcome = ingest(&[latin1, nubank_file()], &RuleSet::new(), &config);
        assert_eq!(outcome.transactions.len(), 2);
        assert!(outcome.reports[0].error.is_some());
    }

    #[test]
    fn test_user_rules_applied() {
        let rules: RuleSet = [("netflix", "Lazer")].into_iter().collect();
        let rows = ingest_file(&nubank_file(), &rules, &IngestConfig::default()).unwrap();
        assert_eq!(rows[0].category, "Lazer");
    }

    #[test]
    fn test_cache_reuses_and_invalidates_on_rule_change() {
        let mut cache = IngestCache::new();
        let files = vec![nubank_file(), broken_file()];
        let config = IngestConfig::default();

        let first = cache.get_or_ingest(&files, &RuleSet::new(), &config);
        assert_eq!(cache.len(), 2);
        assert_eq!(first.transactions.len(), 2);
        assert_eq!(first.failed().count(), 1);

        let again = cache.get_or_ingest(&files, &RuleSet::new(), &config);
        assert_eq!(again.transactions, first.transactions);

        let rules: RuleSet = [("uber", "Trabalho")].into_iter().collect();
        let taught = cache.get_or_ingest(&files, &rules, &config);
        assert_eq!(taught.transactions[1].category, "Trabalho");

        assert!(cache.invalidate(&files[0]));
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_invalidates_on_encoding_change() {
        let mut cache = IngestCache::new();
        let files = vec![UploadedFile::new(
            "extrato.csv",
            b"Data;Descricao;Valor\n01/01/2024;Padaria S\xE3o Jos\xE9;-5,00\n".to_vec(),
        )];

        let latin1 = IngestConfig::default();
        let first = cache.get_or_ingest(&files, &RuleSet::new(), &latin1);
        assert_eq!(first.transactions.len(), 1);

        let utf8_only = IngestConfig {
            encodings: vec![crate::sniff::TextEncoding::Utf8],
        };
        let second = cache.get_or_ingest(&files, &RuleSet::new(), &utf8_only);
        assert!(second.transactions.is_empty());
        assert_eq!(second.failed().count(), 1);
    }

    #[test]
    fn test_file_hash_depends_on_content() {
        let a = UploadedFile::new("a.csv", "x");
        let b = UploadedFile::new("a.csv", "y");
        assert_ne!(file_hash(&a), file_hash(&b));
        assert_eq!(file_hash(&a), file_hash(&a.clone()));
    }
}
