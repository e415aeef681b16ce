//! Report command implementations

use anyhow::{Context, Result};
use chrono::{Datelike, Duration, NaiveDate, Utc};
use saldo_core::metrics::{self, category_details, category_ranking};
use saldo_core::{SubscriptionConfig, Transaction};

use super::{brl, truncate};
use crate::cli::FilterArgs;

/// Date range plus bank and category restrictions for one report
#[derive(Debug, Clone, PartialEq)]
pub struct ReportScope {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub banks: Vec<String>,
    pub categories: Vec<String>,
}

impl ReportScope {
    /// Rows inside the date range that pass the bank and category filters
    pub fn select(&self, table: &[Transaction]) -> Vec<Transaction> {
        metrics::filter(table, self.from, self.to, &self.banks, &self.categories)
    }

    /// Rows that pass the bank and category filters, whatever their date
    pub fn select_any_date(&self, table: &[Transaction]) -> Vec<Transaction> {
        metrics::filter(
            table,
            NaiveDate::MIN,
            NaiveDate::MAX,
            &self.banks,
            &self.categories,
        )
    }
}

/// Earliest and latest transaction dates
pub fn table_bounds(table: &[Transaction]) -> Option<(NaiveDate, NaiveDate)> {
    let first = table.iter().map(|tx| tx.date).min()?;
    let last = table.iter().map(|tx| tx.date).max()?;
    Some((first, last))
}

pub fn resolve_scope(table: &[Transaction], filter: &FilterArgs) -> Result<ReportScope> {
    let (from, to) = resolve_period(
        &filter.period,
        filter.from.as_deref(),
        filter.to.as_deref(),
        table_bounds(table),
    )?;
    if from > to {
        anyhow::bail!("Start date {} is after end date {}", from, to);
    }

    Ok(ReportScope {
        from,
        to,
        banks: filter.bank.clone(),
        categories: filter.category.clone(),
    })
}

fn first_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .with_context(|| format!("Invalid month {}-{}", year, month))
}

/// Resolve a period string to (from_date, to_date).
///
/// `all` spans the loaded statements; the other named periods are relative
/// to today. Custom dates override either end.
pub fn resolve_period(
    period: &str,
    custom_from: Option<&str>,
    custom_to: Option<&str>,
    bounds: Option<(NaiveDate, NaiveDate)>,
) -> Result<(NaiveDate, NaiveDate)> {
    let today = Utc::now().date_naive();

    let (from, to) = match period.to_lowercase().as_str() {
        "this-month" => (first_of_month(today.year(), today.month())?, today),
        "last-month" => {
            let this_month = first_of_month(today.year(), today.month())?;
            let last_day = this_month - Duration::days(1);
            (first_of_month(last_day.year(), last_day.month())?, last_day)
        }
        "this-year" => (first_of_month(today.year(), 1)?, today),
        "last-30-days" => (today - Duration::days(30), today),
        "last-90-days" => (today - Duration::days(90), today),
        "last-12-months" => (first_of_month(today.year() - 1, today.month())?, today),
        "all" => bounds.unwrap_or((today, today)),
        _ => anyhow::bail!("Unknown period: {}. Available: this-month, last-month, this-year, last-30-days, last-90-days, last-12-months, all", period),
    };

    let from = match custom_from {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .context("Invalid --from date format (use YYYY-MM-DD)")?,
        None => from,
    };
    let to = match custom_to {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .context("Invalid --to date format (use YYYY-MM-DD)")?,
        None => to,
    };

    Ok((from, to))
}

fn print_header(title: &str, scope: &ReportScope) {
    println!();
    println!("{}", title);
    println!(
        "   Period: {} to {}",
        scope.from.format("%d/%m/%Y"),
        scope.to.format("%d/%m/%Y")
    );
    if !scope.banks.is_empty() {
        println!("   Banks: {}", scope.banks.join(", "));
    }
    if !scope.categories.is_empty() {
        println!("   Categories: {}", scope.categories.join(", "));
    }
    println!("   ─────────────────────────────────────────────────────────────");
}

pub fn cmd_report_kpis(table: &[Transaction], scope: &ReportScope) -> Result<()> {
    let selected = scope.select(table);
    let k = metrics::kpis(&selected);

    print_header("💰 Overview", scope);
    if selected.is_empty() {
        println!("   No transactions in this period.");
        return Ok(());
    }

    println!("   {:15} {:>16}", "Income", brl(k.income));
    println!("   {:15} {:>16}", "Expenses", brl(k.expense_abs));
    println!("   {:15} {:>16}", "Balance", brl(k.balance));
    println!("   {:15} {:>15.1}%", "Savings rate", k.savings_rate);
    println!("   {:15} {:>16}", "Transactions", selected.len());

    Ok(())
}

pub fn cmd_report_compare(table: &[Transaction], scope: &ReportScope) -> Result<()> {
    let filtered = scope.select_any_date(table);
    let cmp = metrics::compare_periods(&filtered, scope.from, scope.to);

    print_header("📊 Period Comparison", scope);
    println!(
        "   Previous: {} to {}",
        cmp.previous_start.format("%d/%m/%Y"),
        cmp.previous_end.format("%d/%m/%Y")
    );
    println!();
    println!(
        "   {:10} │ {:>16} │ {:>16} │ {:>8}",
        "", "Current", "Previous", "Change"
    );
    println!("   ───────────┼──────────────────┼──────────────────┼─────────");
    println!(
        "   {:10} │ {:>16} │ {:>16} │ {:>+7.1}%",
        "Expenses",
        brl(cmp.current_expenses),
        brl(cmp.previous_expenses),
        cmp.delta_expenses
    );
    println!(
        "   {:10} │ {:>16} │ {:>16} │ {:>+7.1}%",
        "Income",
        brl(cmp.current_income),
        brl(cmp.previous_income),
        cmp.delta_income
    );

    Ok(())
}

pub fn cmd_report_subscriptions(
    table: &[Transaction],
    scope: &ReportScope,
    config: &SubscriptionConfig,
) -> Result<()> {
    let selected = scope.select(table);
    let charges = metrics::detect_subscriptions(&selected, config);

    print_header("🔁 Recurring Charges", scope);
    if charges.is_empty() {
        println!("   No recurring charges found.");
        return Ok(());
    }

    println!(
        "   {:20} │ {:18} │ {:>14} │ {:>5} │ {:>6} │ {:10}",
        "Service", "Frequency", "Average", "Count", "Gap", "Last"
    );
    println!("   ─────────────────────┼────────────────────┼────────────────┼───────┼────────┼───────────");

    for charge in &charges {
        println!(
            "   {:20} │ {:18} │ {:>14} │ {:>5} │ {:>5.0}d │ {}",
            charge.service,
            charge.frequency.as_str(),
            brl(charge.average_amount),
            charge.occurrences,
            charge.average_gap_days,
            charge.last_payment.format("%d/%m/%Y")
        );
    }

    let monthly_cost: f64 = charges.iter().map(|c| c.average_amount.abs()).sum();
    println!("   ─────────────────────┼────────────────────┼────────────────┼───────┼────────┼───────────");
    println!("   {:20} │ {:18} │ {:>14} │", "Typical charge sum", "", brl(monthly_cost));

    Ok(())
}

pub fn cmd_report_pix(table: &[Transaction], scope: &ReportScope) -> Result<()> {
    let selected = scope.select(table);

    print_header("⚡ Pix Transfers", scope);
    let Some(pix) = metrics::pix_metrics(&selected) else {
        println!("   No outgoing Pix transfers with a beneficiary.");
        return Ok(());
    };

    println!("   Sent: {} in {} transfers", brl(pix.total), pix.count);
    println!(
        "   Average: {}   Largest: {}",
        brl(pix.average),
        brl(pix.max)
    );
    println!();
    println!("   {:30} │ {:>14} │ {:>5}", "Beneficiary", "Total", "Count");
    println!("   ───────────────────────────────┼────────────────┼───────");

    for beneficiary in &pix.ranking {
        println!(
            "   {:30} │ {:>14} │ {:>5}",
            beneficiary.name,
            brl(beneficiary.total),
            beneficiary.count
        );
    }

    Ok(())
}

pub fn cmd_report_categories(
    table: &[Transaction],
    scope: &ReportScope,
    detail: Option<&str>,
) -> Result<()> {
    let selected = scope.select(table);

    if let Some(category) = detail {
        let rows = category_details(&selected, category);
        print_header(&format!("🔎 {}", category), scope);
        if rows.is_empty() {
            println!("   No spending in this category.");
            return Ok(());
        }

        println!("   {:40} │ {:>14} │ {:>5}", "Description", "Total", "Count");
        println!("   ─────────────────────────────────────────┼────────────────┼───────");
        for row in &rows {
            println!(
                "   {:40} │ {:>14} │ {:>5}",
                truncate(&row.description, 40),
                brl(row.total),
                row.count
            );
        }
        return Ok(());
    }

    let ranking = category_ranking(&selected);
    print_header("📊 Spending by Category", scope);
    if ranking.is_empty() {
        println!("   No spending found in this period.");
        return Ok(());
    }

    let total: f64 = ranking.iter().map(|c| c.total).sum();
    println!("   Total: {}", brl(total));
    println!();
    println!(
        "   {:25} │ {:>14} │ {:>6} │ {:>5}",
        "Category", "Amount", "%", "Count"
    );
    println!("   ──────────────────────────┼────────────────┼────────┼───────");

    // Largest first for reading; the ranking itself is ascending for charts
    for cat in ranking.iter().rev() {
        let share = if total != 0.0 {
            cat.total / total * 100.0
        } else {
            0.0
        };
        println!(
            "   {:25} │ {:>14} │ {:>5.1}% │ {:>5}",
            truncate(&cat.category, 25),
            brl(cat.total),
            share,
            cat.count
        );
    }

    Ok(())
}

pub fn cmd_report_monthly(table: &[Transaction], scope: &ReportScope) -> Result<()> {
    let selected = scope.select(table);
    let months = metrics::monthly_flow(&selected);

    print_header("📈 Monthly Flow", scope);
    if months.is_empty() {
        println!("   No transactions in this period.");
        return Ok(());
    }

    println!(
        "   {:8} │ {:>16} │ {:>16} │ {:>16}",
        "Month", "Inflow", "Outflow", "Net"
    );
    println!("   ─────────┼──────────────────┼──────────────────┼─────────────────");

    for month in &months {
        println!(
            "   {:8} │ {:>16} │ {:>16} │ {:>16}",
            month.month,
            brl(month.inflow),
            brl(month.outflow),
            brl(month.inflow - month.outflow)
        );
    }

    Ok(())
}
