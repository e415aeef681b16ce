//! Consolidated table and category listing commands

use std::path::PathBuf;

use anyhow::Result;
use saldo_core::known_categories;

use super::{brl, ingest_statements, load_statements, truncate, Session};

pub fn cmd_ingest(session: &Session, files: &[PathBuf], json: bool, limit: usize) -> Result<()> {
    let outcome = ingest_statements(session, files)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome.transactions)?);
        return Ok(());
    }

    println!();
    println!("📥 Statements");
    println!("   ─────────────────────────────────────────────────────────────");
    for report in &outcome.reports {
        match &report.error {
            None => {
                let mut line = format!(
                    "   ✅ {:30} {:15} {:>5} rows",
                    truncate(&report.name, 30),
                    report.bank.as_deref().unwrap_or("-"),
                    report.rows
                );
                if report.dropped > 0 {
                    line.push_str(&format!(" ({} dropped)", report.dropped));
                }
                println!("{}", line);
            }
            Some(error) => println!("   ❌ {:30} {}", truncate(&report.name, 30), error),
        }
    }

    if outcome.transactions.is_empty() {
        println!();
        println!("No transactions loaded.");
        return Ok(());
    }

    let shown = if limit == 0 {
        outcome.transactions.len()
    } else {
        limit.min(outcome.transactions.len())
    };

    println!();
    println!(
        "📋 Transactions (showing {} of {})",
        shown,
        outcome.transactions.len()
    );
    println!("   ─────────────────────────────────────────────────────────────");
    println!(
        "   {:10} │ {:12} │ {:35} │ {:22} │ {:>14}",
        "Date", "Bank", "Description", "Category", "Amount"
    );
    println!("   ───────────┼──────────────┼─────────────────────────────────────┼────────────────────────┼───────────────");

    for tx in outcome.transactions.iter().take(shown) {
        println!(
            "   {:10} │ {:12} │ {:35} │ {:22} │ {:>14}",
            tx.date.format("%d/%m/%Y").to_string(),
            truncate(&tx.bank, 12),
            truncate(&tx.description, 35),
            truncate(&tx.category, 22),
            brl(tx.amount)
        );
    }

    Ok(())
}

pub fn cmd_categories(session: &Session, files: &[PathBuf]) -> Result<()> {
    let table = load_statements(session, files)?;
    let categories = known_categories(&table);

    println!();
    println!("🏷️  Categories");
    println!("   ─────────────────────────────────────────────────────────────");
    for category in &categories {
        let count = table.iter().filter(|tx| &tx.category == category).count();
        println!("   {:25} {:>5}", category, count);
    }

    Ok(())
}
