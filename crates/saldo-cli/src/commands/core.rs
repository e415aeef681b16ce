//! Shared command utilities
//!
//! This module contains:
//! - `open_session` - Resolve config and the user's rule store
//! - `ingest_statements` - Read statement files, skipping unreadable ones
//! - `load_statements` - Read statement files into the consolidated table

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use saldo_core::{ingest, Config, FileReport, IngestOutcome, RuleStore, Transaction, UploadedFile};
use tracing::{debug, warn};

/// Everything a command needs besides its own arguments
#[derive(Debug)]
pub struct Session {
    pub config: Config,
    pub store: RuleStore,
}

/// Load configuration and locate the rule store for `user`
pub fn open_session(
    data_dir: Option<&Path>,
    user: Option<&str>,
    config_path: Option<&Path>,
) -> Result<Session> {
    let config = Config::load(config_path).context("Failed to load config")?;

    let data_dir: PathBuf = match data_dir {
        Some(dir) => dir.to_path_buf(),
        None => RuleStore::default_data_dir()
            .context("Could not determine data directory (use --data-dir)")?,
    };
    let store = RuleStore::new(&data_dir, user);
    debug!("Using rules at {}", store.path().display());

    Ok(Session { config, store })
}

/// Read and ingest statement files, printing a line for each skipped one.
///
/// A path that cannot be read is reported like a file that failed to parse.
pub fn ingest_statements(session: &Session, files: &[PathBuf]) -> Result<IngestOutcome> {
    let mut uploads = Vec::with_capacity(files.len());
    let mut unreadable = Vec::new();
    for (index, path) in files.iter().enumerate() {
        match UploadedFile::from_path(path) {
            Ok(file) => uploads.push(file),
            Err(e) => {
                warn!("Failed to read file {}: {}", path.display(), e);
                let report = FileReport::skipped(&path.display().to_string(), e.to_string());
                unreadable.push((index, report));
            }
        }
    }

    let rules = session.store.load();
    let mut outcome = ingest(&uploads, &rules, &session.config.ingest);

    // Keep reports in command-line order
    for (index, report) in unreadable {
        outcome.reports.insert(index, report);
    }

    for report in outcome.failed() {
        println!(
            "⚠️  Skipped {}: {}",
            report.name,
            report.error.as_deref().unwrap_or("unknown error")
        );
    }

    Ok(outcome)
}

/// Consolidated table for reports; fails when no file could be read
pub fn load_statements(session: &Session, files: &[PathBuf]) -> Result<Vec<Transaction>> {
    let outcome = ingest_statements(session, files)?;
    if outcome.transactions.is_empty() && outcome.failed().count() == outcome.reports.len() {
        anyhow::bail!("None of the {} file(s) could be read", files.len());
    }
    Ok(outcome.transactions)
}
