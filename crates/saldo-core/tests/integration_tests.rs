//! Integration tests for saldo-core
//!
//! These tests exercise the full statement → table → metrics workflow.

use chrono::NaiveDate;
use saldo_core::{
    ingest, ingest_file,
    metrics::{self, compare_periods, detect_subscriptions, kpis},
    models::category,
    Config, Frequency, IngestCache, RuleSet, RuleStore, UploadedFile,
};

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Nubank-style export: ISO dates, comma separated, US decimals
fn nubank_csv() -> &'static str {
    "date,description,amount
2024-01-10,Netflix.com,-39.90
2024-01-12,Uber *Trip,-18.40
2024-01-15,Transferência recebida pelo Pix - EMPRESA LTDA,6500.00
2024-02-09,Netflix.com,-39.90
2024-02-14,Ifood *Restaurante,-62.15
2024-03-09,Netflix.com,-39.90
2024-04-09,Netflix.com,-39.90
"
}

/// Generic-named Latin-1 export with a preamble and Brazilian decimals
fn extrato_latin1() -> Vec<u8> {
    let text = "Extrato de conta\n\
                Período: 01/01/2024 a 31/01/2024\n\
                Data;Histórico;Valor\n\
                05/01/2024;Pix enviado - Maria Souza;-1.200,00\n\
                06/01/2024;NU PAGAMENTOS SA;-350,00\n\
                20/01/2024;Drogasil 0042;-45,90\n";
    text.chars().map(|c| c as u32 as u8).collect()
}

/// Statement without any recognizable date column
fn no_dates_csv() -> &'static str {
    "Descricao;Valor\nPadaria;-5,00\nMercado;-80,00\n"
}

#[test]
fn test_full_ingest_workflow() {
    let config = Config::default();
    let files = vec![
        UploadedFile::new("nubank_2024.csv", nubank_csv()),
        UploadedFile::new("extrato.csv", extrato_latin1()),
        UploadedFile::new("itau.csv", no_dates_csv()),
    ];

    let outcome = ingest(&files, &RuleSet::new(), &config.ingest);

    // Partial failure: only the two readable files contribute
    assert_eq!(outcome.transactions.len(), 10);
    assert_eq!(outcome.failed().count(), 1);
    assert!(outcome.transactions.iter().all(|tx| tx.bank != "Itau"));

    // Sorted ascending by date
    assert!(outcome
        .transactions
        .windows(2)
        .all(|w| w[0].date <= w[1].date));

    // Generic file name resolved through content
    let extrato: Vec<_> = outcome
        .transactions
        .iter()
        .filter(|tx| tx.bank == "Nubank" && tx.description.contains("Maria"))
        .collect();
    assert_eq!(extrato.len(), 1);
    assert_eq!(extrato[0].amount, -1200.0);
    assert_eq!(extrato[0].category, category::PIX);

    let pharmacy = outcome
        .transactions
        .iter()
        .find(|tx| tx.description.starts_with("Drogasil"))
        .unwrap();
    assert_eq!(pharmacy.category, category::PHARMACY);
    assert_eq!(pharmacy.date, ymd(2024, 1, 20));
}

#[test]
fn test_metrics_over_ingested_table() {
    let config = Config::default();
    let table = ingest_file(
        &UploadedFile::new("nubank_2024.csv", nubank_csv()),
        &RuleSet::new(),
        &config.ingest,
    )
    .unwrap();

    let january = metrics::filter(&table, ymd(2024, 1, 1), ymd(2024, 1, 31), &[], &[]);
    let k = kpis(&january);
    assert_eq!(k.income, 6500.0);
    assert!((k.expense_abs - 58.30).abs() < 1e-9);

    let subs = detect_subscriptions(&table, &config.subscriptions);
    let netflix = subs.iter().find(|s| s.service == "Netflix").unwrap();
    assert_eq!(netflix.frequency, Frequency::MonthlyFixed);
    assert_eq!(netflix.occurrences, 4);

    let cmp = compare_periods(&table, ymd(2024, 2, 1), ymd(2024, 2, 29));
    assert_eq!(cmp.previous_start, ymd(2024, 1, 3));
    assert_eq!(cmp.previous_end, ymd(2024, 1, 31));
}

#[test]
fn test_taught_rule_reclassifies_on_reingest() {
    let dir = tempfile::tempdir().unwrap();
    let store = RuleStore::new(dir.path(), Some("ana"));
    let config = Config::default();
    let files = vec![UploadedFile::new("nubank_2024.csv", nubank_csv())];
    let mut cache = IngestCache::new();

    let before = cache.get_or_ingest(&files, &store.load(), &config.ingest);
    let uber = before
        .transactions
        .iter()
        .find(|tx| tx.description.starts_with("Uber"))
        .unwrap();
    assert_eq!(uber.category, category::TRANSPORT);

    store.save_rule("UBER", "Trabalho").unwrap();

    let after = cache.get_or_ingest(&files, &store.load(), &config.ingest);
    let uber = after
        .transactions
        .iter()
        .find(|tx| tx.description.starts_with("Uber"))
        .unwrap();
    assert_eq!(uber.category, "Trabalho");
}

#[test]
fn test_statement_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("santander-jan.csv");
    std::fs::write(&path, "Data\tDescrição\tValor\n02/01/2024\tSALARIO\t4.000,00\n").unwrap();

    let file = UploadedFile::from_path(&path).unwrap();
    let table = ingest_file(&file, &RuleSet::new(), &Config::default().ingest).unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(table[0].bank, "Santander");
    assert_eq!(table[0].amount, 4000.0);
    assert_eq!(table[0].category, category::INCOME);
}
