//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Shared utilities (open_session, load_statements)
//! - `ingest` - Consolidated table and category listing
//! - `reports` - Report generation commands
//! - `rules` - Categorization rule management

pub mod core;
pub mod ingest;
pub mod reports;
pub mod rules;

// Re-export command functions for main.rs
pub use core::*;
pub use ingest::*;
pub use reports::*;
pub use rules::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Format an amount the way Brazilian statements print it (1.234,56)
pub fn brl(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    format!("{}R$ {},{:02}", sign, grouped, cents % 100)
}
