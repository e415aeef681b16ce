//! Categorization rule commands

use anyhow::{Context, Result};
use saldo_core::{explain, RuleSet, RuleSource, RuleStore};

use super::truncate;

pub fn cmd_rules_list(store: &RuleStore) -> Result<()> {
    let rules = store.load();

    if rules.is_empty() {
        println!("No rules defined. Add one with:");
        println!("  saldo rules add <keyword> <category>");
        return Ok(());
    }

    println!();
    println!("📋 Categorization Rules ({})", store.path().display());
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   {:>4} │ {:30} │ {}", "Pri", "Keyword", "Category");
    println!("   ─────┼────────────────────────────────┼─────────────────────");

    for (i, (keyword, category)) in rules.iter().enumerate() {
        println!(
            "   {:>4} │ {:30} │ {}",
            i + 1,
            truncate(keyword, 30),
            category
        );
    }

    Ok(())
}

pub fn cmd_rules_add(store: &RuleStore, keyword: &str, category: &str) -> Result<()> {
    let key = RuleSet::normalize_key(keyword);
    if key.is_empty() {
        anyhow::bail!("Keyword cannot be empty");
    }
    let category = category.trim();
    if category.is_empty() {
        anyhow::bail!("Category cannot be empty");
    }

    let previous = store.load().get(&key).map(str::to_string);
    store
        .save_rule(&key, category)
        .context("Failed to save rule")?;

    match previous {
        Some(old) if old != category => {
            println!("✅ Updated rule '{}': {} -> {}", key, old, category)
        }
        _ => println!("✅ Saved rule '{}' -> {}", key, category),
    }

    Ok(())
}

pub fn cmd_rules_delete(store: &RuleStore, keyword: &str) -> Result<()> {
    let removed = store
        .delete_rule(keyword)
        .context("Failed to delete rule")?;

    if removed {
        println!("✅ Deleted rule '{}'", RuleSet::normalize_key(keyword));
    } else {
        println!("No rule for '{}'", RuleSet::normalize_key(keyword));
    }

    Ok(())
}

pub fn cmd_rules_test(store: &RuleStore, description: &str) -> Result<()> {
    let rules = store.load();
    let result = explain(description, &rules);

    println!();
    println!("🔍 \"{}\"", description);
    println!("   ─────────────────────────────────────────────────────────────");
    match (result.source, result.keyword.as_deref()) {
        (RuleSource::Fallback, _) | (_, None) => {
            println!("   -> {} (no rule matched)", result.category)
        }
        (source, Some(keyword)) => {
            println!("   -> {} ({} rule: {})", result.category, source, keyword)
        }
    }

    Ok(())
}
