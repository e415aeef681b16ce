//! Derived metrics over the canonical transaction table
//!
//! All functions are pure views over a slice of [`Transaction`]s:
//!
//! - **KPIs** - income, expenses, balance and savings rate
//! - **Period comparison** - change against the preceding period of equal length
//! - **Monthly flow** - inflow and outflow per calendar month
//! - **Category ranking** - where the money went, per category and description
//! - **Subscriptions** - recurring charges (see [`subscriptions`])
//! - **Pix** - outgoing transfers per beneficiary (see [`pix`])
//!
//! ## Usage
//!
//! ```rust,ignore
//! use saldo_core::metrics;
//!
//! let month = metrics::filter(&table, start, end, &[], &[]);
//! let kpis = metrics::kpis(&month);
//! let change = metrics::compare_periods(&table, start, end);
//! ```

pub mod pix;
pub mod subscriptions;

pub use pix::{extract_pix_beneficiary, pix_metrics, BeneficiaryTotal, PixMetrics};
pub use subscriptions::{detect_subscriptions, normalize_service, RecurringCharge};

use std::collections::{BTreeMap, HashMap};

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::models::Transaction;

/// Headline figures for a set of transactions
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Kpis {
    /// Sum of inflows
    pub income: f64,
    /// Sum of outflows (negative)
    pub expense: f64,
    pub expense_abs: f64,
    /// `income + expense`
    pub balance: f64,
    /// Balance as a percentage of income, 0 without income
    pub savings_rate: f64,
}

pub fn kpis(transactions: &[Transaction]) -> Kpis {
    let income: f64 = transactions
        .iter()
        .filter(|tx| tx.is_income())
        .map(|tx| tx.amount)
        .sum();
    let expense: f64 = transactions
        .iter()
        .filter(|tx| tx.is_expense())
        .map(|tx| tx.amount)
        .sum();
    let balance = income + expense;
    let savings_rate = if income > 0.0 {
        balance / income * 100.0
    } else {
        0.0
    };

    Kpis {
        income,
        expense,
        expense_abs: expense.abs(),
        balance,
        savings_rate,
    }
}

/// Transactions within `[start, end]`, optionally limited to some banks
/// and categories (an empty list means no restriction)
pub fn filter(
    transactions: &[Transaction],
    start: NaiveDate,
    end: NaiveDate,
    banks: &[String],
    categories: &[String],
) -> Vec<Transaction> {
    transactions
        .iter()
        .filter(|tx| tx.date >= start && tx.date <= end)
        .filter(|tx| banks.is_empty() || banks.contains(&tx.bank))
        .filter(|tx| categories.is_empty() || categories.contains(&tx.category))
        .cloned()
        .collect()
}

/// Current period against the immediately preceding one
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeriodComparison {
    pub current_expenses: f64,
    pub previous_expenses: f64,
    pub current_income: f64,
    pub previous_income: f64,
    /// Percent change in expenses, 0 when the previous period had none
    pub delta_expenses: f64,
    /// Percent change in income, 0 when the previous period had none
    pub delta_income: f64,
    pub previous_start: NaiveDate,
    pub previous_end: NaiveDate,
}

/// Compare `[start, end]` with the period of the same inclusive length
/// ending the day before `start`
pub fn compare_periods(
    transactions: &[Transaction],
    start: NaiveDate,
    end: NaiveDate,
) -> PeriodComparison {
    let days = (end - start).num_days() + 1;
    let previous_end = start - Duration::days(1);
    let previous_start = previous_end - Duration::days(days - 1);

    let totals = |from: NaiveDate, to: NaiveDate| {
        transactions
            .iter()
            .filter(|tx| tx.date >= from && tx.date <= to)
            .fold((0.0_f64, 0.0_f64), |(out, inc), tx| {
                if tx.is_expense() {
                    (out + tx.amount.abs(), inc)
                } else if tx.is_income() {
                    (out, inc + tx.amount)
                } else {
                    (out, inc)
                }
            })
    };

    let (current_expenses, current_income) = totals(start, end);
    let (previous_expenses, previous_income) = totals(previous_start, previous_end);

    PeriodComparison {
        current_expenses,
        previous_expenses,
        current_income,
        previous_income,
        delta_expenses: percent_change(current_expenses, previous_expenses),
        delta_income: percent_change(current_income, previous_income),
        previous_start,
        previous_end,
    }
}

fn percent_change(current: f64, previous: f64) -> f64 {
    if previous > 0.0 {
        (current - previous) / previous * 100.0
    } else {
        0.0
    }
}

/// Inflow and outflow (both positive) for one `YYYY-MM` month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyFlow {
    pub month: String,
    pub inflow: f64,
    pub outflow: f64,
}

/// Monthly totals in calendar order. Zero amounts count as inflow.
pub fn monthly_flow(transactions: &[Transaction]) -> Vec<MonthlyFlow> {
    let mut months: BTreeMap<String, (f64, f64)> = BTreeMap::new();
    for tx in transactions {
        let entry = months.entry(tx.date.format("%Y-%m").to_string()).or_default();
        if tx.amount >= 0.0 {
            entry.0 += tx.amount;
        } else {
            entry.1 += tx.amount.abs();
        }
    }
    months
        .into_iter()
        .map(|(month, (inflow, outflow))| MonthlyFlow {
            month,
            inflow,
            outflow,
        })
        .collect()
}

/// Outflow total for one category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
    pub count: usize,
}

/// Outflow per category, smallest first
pub fn category_ranking(transactions: &[Transaction]) -> Vec<CategoryTotal> {
    let mut totals: HashMap<&str, (f64, usize)> = HashMap::new();
    for tx in transactions.iter().filter(|tx| tx.is_expense()) {
        let entry = totals.entry(tx.category.as_str()).or_default();
        entry.0 += tx.amount.abs();
        entry.1 += 1;
    }

    let mut ranking: Vec<CategoryTotal> = totals
        .into_iter()
        .map(|(category, (total, count))| CategoryTotal {
            category: category.to_string(),
            total,
            count,
        })
        .collect();
    ranking.sort_by(|a, b| {
        a.total
            .total_cmp(&b.total)
            .then_with(|| a.category.cmp(&b.category))
    });
    ranking
}

/// Outflow total for one description
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptionTotal {
    pub description: String,
    pub total: f64,
    pub count: usize,
}

/// Outflow per description within a category, largest first
pub fn category_details(transactions: &[Transaction], category: &str) -> Vec<DescriptionTotal> {
    let mut totals: HashMap<&str, (f64, usize)> = HashMap::new();
    for tx in transactions
        .iter()
        .filter(|tx| tx.is_expense() && tx.category == category)
    {
        let entry = totals.entry(tx.description.as_str()).or_default();
        entry.0 += tx.amount.abs();
        entry.1 += 1;
    }

    let mut details: Vec<DescriptionTotal> = totals
        .into_iter()
        .map(|(description, (total, count))| DescriptionTotal {
            description: description.to_string(),
            total,
            count,
        })
        .collect();
    details.sort_by(|a, b| {
        b.total
            .total_cmp(&a.total)
            .then_with(|| a.description.cmp(&b.description))
    });
    details
}

/// Truncate to `max` characters, appending "..." when cut
pub(crate) fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() < max {
        s.to_string()
    } else {
        format!("{}...", s.chars().take(max).collect::<String>())
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{tx, ymd};
    use super::*;

    #[test]
    fn test_kpis() {
        let table = vec![
            tx(ymd(2024, 1, 1), "Salario", "Receita", 5000.0),
            tx(ymd(2024, 1, 2), "Aluguel", "Moradia", -2000.0),
            tx(ymd(2024, 1, 3), "Mercado", "Alimentação", -1000.0),
        ];
        let k = kpis(&table);
        assert_eq!(k.income, 5000.0);
        assert_eq!(k.expense, -3000.0);
        assert_eq!(k.expense_abs, 3000.0);
        assert_eq!(k.balance, 2000.0);
        assert_eq!(k.savings_rate, 40.0);
    }

    #[test]
    fn test_kpis_without_income() {
        let table = vec![tx(ymd(2024, 1, 2), "Aluguel", "Moradia", -2000.0)];
        let k = kpis(&table);
        assert_eq!(k.savings_rate, 0.0);
        assert_eq!(kpis(&[]), Kpis::default());
    }

    #[test]
    fn test_filter() {
        let mut other_bank = tx(ymd(2024, 1, 10), "Uber", "Transporte", -20.0);
        other_bank.bank = "Inter".to_string();
        let table = vec![
            tx(ymd(2023, 12, 31), "Uber", "Transporte", -10.0),
            tx(ymd(2024, 1, 5), "Padaria", "Alimentação", -5.0),
            other_bank,
            tx(ymd(2024, 1, 31), "Uber", "Transporte", -30.0),
        ];

        let all = filter(&table, ymd(2024, 1, 1), ymd(2024, 1, 31), &[], &[]);
        assert_eq!(all.len(), 3);

        let banks = vec!["Nubank".to_string()];
        let nubank = filter(&table, ymd(2024, 1, 1), ymd(2024, 1, 31), &banks, &[]);
        assert_eq!(nubank.len(), 2);

        let cats = vec!["Transporte".to_string()];
        let both = filter(&table, ymd(2024, 1, 1), ymd(2024, 1, 31), &banks, &cats);
        assert_eq!(both.len(), 1);
        assert_eq!(both[0].amount, -30.0);
    }

    #[test]
    fn test_period_comparison_boundary() {
        let mut table = Vec::new();
        // Previous window 2024-01-01..=2024-01-07: 7 x 50
        for day in 1..=7 {
            table.push(tx(ymd(2024, 1, day), "Mercado", "Alimentação", -50.0));
        }
        // Current window 2024-01-08..=2024-01-14: 7 x 100
        for day in 8..=14 {
            table.push(tx(ymd(2024, 1, day), "Mercado", "Alimentação", -100.0));
        }
        table.push(tx(ymd(2024, 1, 10), "Salario", "Receita", 1000.0));

        let cmp = compare_periods(&table, ymd(2024, 1, 8), ymd(2024, 1, 14));
        assert_eq!(cmp.current_expenses, 700.0);
        assert_eq!(cmp.previous_expenses, 350.0);
        assert_eq!(cmp.delta_expenses, 100.0);
        assert_eq!(cmp.previous_start, ymd(2024, 1, 1));
        assert_eq!(cmp.previous_end, ymd(2024, 1, 7));
        // No previous income: delta is 0, not infinite
        assert_eq!(cmp.delta_income, 0.0);
    }

    #[test]
    fn test_period_comparison_single_day() {
        let cmp = compare_periods(&[], ymd(2024, 3, 1), ymd(2024, 3, 1));
        assert_eq!(cmp.previous_start, ymd(2024, 2, 29));
        assert_eq!(cmp.previous_end, ymd(2024, 2, 29));
    }

    #[test]
    fn test_monthly_flow() {
        let table = vec![
            tx(ymd(2024, 2, 1), "Salario", "Receita", 3000.0),
            tx(ymd(2024, 1, 15), "Luz", "Moradia", -150.0),
            tx(ymd(2024, 1, 20), "Pix", "Receita", 50.0),
            tx(ymd(2024, 1, 21), "Estorno", "Outros", 0.0),
        ];
        let flow = monthly_flow(&table);
        assert_eq!(flow.len(), 2);
        assert_eq!(
            flow[0],
            MonthlyFlow {
                month: "2024-01".to_string(),
                inflow: 50.0,
                outflow: 150.0
            }
        );
        assert_eq!(flow[1].month, "2024-02");
    }

    #[test]
    fn test_category_ranking_and_details() {
        let table = vec![
            tx(ymd(2024, 1, 1), "Padaria", "Alimentação", -10.0),
            tx(ymd(2024, 1, 2), "Mercado", "Alimentação", -90.0),
            tx(ymd(2024, 1, 3), "Padaria", "Alimentação", -15.0),
            tx(ymd(2024, 1, 4), "Uber", "Transporte", -40.0),
            tx(ymd(2024, 1, 5), "Salario", "Receita", 900.0),
        ];

        let ranking = category_ranking(&table);
        let names: Vec<_> = ranking.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(names, vec!["Transporte", "Alimentação"]);
        assert_eq!(ranking[1].total, 115.0);
        assert_eq!(ranking[1].count, 3);

        let details = category_details(&table, "Alimentação");
        assert_eq!(details[0].description, "Mercado");
        assert_eq!(details[1].description, "Padaria");
        assert_eq!(details[1].total, 25.0);
        assert!(category_details(&table, "Receita").is_empty());
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("Netflix", 20), "Netflix");
        assert_eq!(
            truncate_chars("PAGAMENTO CONDOMINIO EDIFICIO", 20),
            "PAGAMENTO CONDOMINIO..."
        );
        assert_eq!(truncate_chars("ações", 3), "açõ...");
    }
}
