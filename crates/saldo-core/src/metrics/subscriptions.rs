//! Recurring charge detection
//!
//! Outgoing transactions are grouped by service (well-known apps are
//! collapsed to one name, everything else keeps its description). A group
//! is flagged when its cadence looks monthly, or when a delivery or ride
//! app is used every few days.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use super::truncate_chars;
use crate::config::SubscriptionConfig;
use crate::models::{Frequency, Transaction};

/// Services whose variable spend still counts when used frequently
const FREQUENT_USE_SERVICES: &[&str] = &["Uber", "iFood", "99 App", "Rappi"];

/// Display names are cut to this many characters
const SERVICE_NAME_MAX: usize = 20;

/// A flagged recurring charge
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecurringCharge {
    /// Service name, truncated for display
    pub service: String,
    /// Mean amount (negative)
    pub average_amount: f64,
    pub total_amount: f64,
    pub frequency: Frequency,
    pub last_payment: NaiveDate,
    pub occurrences: usize,
    /// Mean gap between charges in days
    pub average_gap_days: f64,
}

/// Collapse well-known apps to one service name
pub fn normalize_service(description: &str) -> String {
    let d = description.to_lowercase();
    let name = if d.contains("uber") {
        "Uber"
    } else if d.contains("99 ") {
        // "99 " rather than "99" so amounts like 9.99 don't match
        "99 App"
    } else if d.contains("ifood") {
        "iFood"
    } else if d.contains("rappi") {
        "Rappi"
    } else if d.contains("netflix") {
        "Netflix"
    } else if d.contains("spotify") {
        "Spotify"
    } else if d.contains("amazon") || d.contains("amzn") {
        "Amazon"
    } else if d.contains("apple") {
        "Apple"
    } else if d.contains("google") {
        "Google"
    } else {
        return description.to_string();
    };
    name.to_string()
}

/// Flag recurring charges among outgoing transactions.
///
/// Results are ordered by number of charges, then service name.
pub fn detect_subscriptions(
    transactions: &[Transaction],
    config: &SubscriptionConfig,
) -> Vec<RecurringCharge> {
    let mut groups: HashMap<String, Vec<&Transaction>> = HashMap::new();
    for tx in transactions.iter().filter(|tx| tx.is_expense()) {
        groups
            .entry(normalize_service(&tx.description))
            .or_default()
            .push(tx);
    }

    let min_occurrences = config.min_occurrences.max(2);
    let mut charges: Vec<RecurringCharge> = groups
        .into_iter()
        .filter(|(_, txs)| txs.len() >= min_occurrences)
        .filter_map(|(service, mut txs)| {
            txs.sort_by_key(|tx| tx.date);
            classify_group(&service, &txs, config)
        })
        .collect();

    charges.sort_by(|a, b| {
        b.occurrences
            .cmp(&a.occurrences)
            .then_with(|| a.service.cmp(&b.service))
    });
    debug!("Detected {} recurring charges", charges.len());
    charges
}

fn classify_group(
    service: &str,
    txs: &[&Transaction],
    config: &SubscriptionConfig,
) -> Option<RecurringCharge> {
    let gaps: Vec<f64> = txs
        .windows(2)
        .map(|w| (w[1].date - w[0].date).num_days() as f64)
        .collect();
    let average_gap = mean(&gaps)?;

    let amounts: Vec<f64> = txs.iter().map(|tx| tx.amount).collect();
    let std_dev = sample_std_dev(&amounts);

    let monthly = (config.monthly_min_days..=config.monthly_max_days).contains(&average_gap);
    let stable = std_dev.map_or(true, |s| s < config.fixed_max_std_dev);

    let frequency = if stable && monthly {
        Frequency::MonthlyFixed
    } else if FREQUENT_USE_SERVICES.contains(&service) && average_gap <= config.frequent_max_days
    {
        Frequency::Frequent
    } else if monthly {
        Frequency::MonthlyVariable
    } else {
        return None;
    };

    let total_amount: f64 = amounts.iter().sum();
    Some(RecurringCharge {
        service: truncate_chars(service, SERVICE_NAME_MAX),
        average_amount: total_amount / amounts.len() as f64,
        total_amount,
        frequency,
        last_payment: txs.last()?.date,
        occurrences: txs.len(),
        average_gap_days: average_gap,
    })
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Sample standard deviation (n - 1); undefined below two values
fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{tx, ymd};
    use super::*;

    #[test]
    fn test_normalize_service() {
        assert_eq!(normalize_service("UBER *TRIP HELP.UBER.COM"), "Uber");
        assert_eq!(normalize_service("99 TAXIS"), "99 App");
        assert_eq!(normalize_service("LOJA 9.99"), "LOJA 9.99");
        assert_eq!(normalize_service("IFOOD *Restaurante"), "iFood");
        assert_eq!(normalize_service("AMZN Mktp"), "Amazon");
        assert_eq!(normalize_service("Academia Smart"), "Academia Smart");
    }

    #[test]
    fn test_monthly_fixed_end_to_end() {
        // Gaps of 30, 29 and 31 days, constant amount
        let table = vec![
            tx(ymd(2024, 1, 10), "NETFLIX.COM", "Assinaturas/TV/Net", -39.90),
            tx(ymd(2024, 2, 9), "NETFLIX.COM", "Assinaturas/TV/Net", -39.90),
            tx(ymd(2024, 3, 9), "NETFLIX.COM", "Assinaturas/TV/Net", -39.90),
            tx(ymd(2024, 4, 9), "NETFLIX.COM", "Assinaturas/TV/Net", -39.90),
            tx(ymd(2024, 4, 1), "Salario", "Receita", 39.90),
        ];

        let charges = detect_subscriptions(&table, &SubscriptionConfig::default());
        assert_eq!(charges.len(), 1);
        let netflix = &charges[0];
        assert_eq!(netflix.service, "Netflix");
        assert_eq!(netflix.frequency, Frequency::MonthlyFixed);
        assert!((netflix.average_amount - -39.90).abs() < 1e-9);
        assert_eq!(netflix.last_payment, ymd(2024, 4, 9));
        assert_eq!(netflix.occurrences, 4);
        assert_eq!(netflix.average_gap_days, 30.0);
    }

    #[test]
    fn test_frequent_use() {
        let table: Vec<_> = (1..=6)
            .map(|i| tx(ymd(2024, 1, i * 4), "Uber *Trip", "Transporte", -(10.0 + i as f64 * 7.0)))
            .collect();
        let charges = detect_subscriptions(&table, &SubscriptionConfig::default());
        assert_eq!(charges.len(), 1);
        assert_eq!(charges[0].service, "Uber");
        assert_eq!(charges[0].frequency, Frequency::Frequent);
    }

    #[test]
    fn test_monthly_variable() {
        let table = vec![
            tx(ymd(2024, 1, 5), "CEMIG ENERGIA", "Moradia", -120.0),
            tx(ymd(2024, 2, 5), "CEMIG ENERGIA", "Moradia", -180.0),
            tx(ymd(2024, 3, 5), "CEMIG ENERGIA", "Moradia", -95.0),
        ];
        let charges = detect_subscriptions(&table, &SubscriptionConfig::default());
        assert_eq!(charges.len(), 1);
        assert_eq!(charges[0].frequency, Frequency::MonthlyVariable);
    }

    #[test]
    fn test_irregular_and_single_charges_ignored() {
        let table = vec![
            tx(ymd(2024, 1, 1), "Loja X", "Compras", -50.0),
            tx(ymd(2024, 1, 3), "Loja X", "Compras", -50.0),
            tx(ymd(2024, 1, 5), "Spotify", "Assinaturas/TV/Net", -21.90),
        ];
        assert!(detect_subscriptions(&table, &SubscriptionConfig::default()).is_empty());
    }

    #[test]
    fn test_thresholds_are_configurable() {
        let table = vec![
            tx(ymd(2024, 1, 1), "Academia", "Saúde", -100.0),
            tx(ymd(2024, 1, 15), "Academia", "Saúde", -100.0),
        ];
        assert!(detect_subscriptions(&table, &SubscriptionConfig::default()).is_empty());

        let biweekly = SubscriptionConfig {
            monthly_min_days: 12.0,
            monthly_max_days: 16.0,
            ..Default::default()
        };
        let charges = detect_subscriptions(&table, &biweekly);
        assert_eq!(charges[0].frequency, Frequency::MonthlyFixed);
    }

    #[test]
    fn test_long_service_name_truncated() {
        let table = vec![
            tx(ymd(2024, 1, 10), "CONDOMINIO EDIFICIO SOLAR", "Moradia", -800.0),
            tx(ymd(2024, 2, 10), "CONDOMINIO EDIFICIO SOLAR", "Moradia", -800.0),
        ];
        let charges = detect_subscriptions(&table, &SubscriptionConfig::default());
        assert_eq!(charges[0].service, "CONDOMINIO EDIFICIO ...");
    }

    #[test]
    fn test_sample_std_dev() {
        assert_eq!(sample_std_dev(&[5.0]), None);
        assert_eq!(sample_std_dev(&[2.0, 2.0, 2.0]), Some(0.0));
        assert_eq!(sample_std_dev(&[1.0, 3.0]), Some(2.0_f64.sqrt()));
    }
}
