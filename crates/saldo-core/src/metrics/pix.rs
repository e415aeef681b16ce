//! Pix transfer attribution

use std::collections::HashMap;

use serde::Serialize;

use crate::bank::title_case;
use crate::models::{category, Transaction};

/// Boilerplate that precedes the beneficiary name, stripped in this order
const BENEFICIARY_PREFIXES: &[&str] = &[
    "pelo pix -",
    "via pix -",
    "pelo pix",
    "via pix",
    "pix -",
    "- ",
];

const BENEFICIARY_MAX: usize = 30;

/// Beneficiaries listed in the ranking
const RANKING_SIZE: usize = 10;

/// Beneficiary of a sent Pix, or "Outros" when the description is not one
pub fn extract_pix_beneficiary(description: &str) -> String {
    let d = description.to_lowercase();
    if !d.contains("pix") {
        return category::OTHER.to_string();
    }

    let marker = if d.contains("enviada") {
        "enviada"
    } else if d.contains("enviado") {
        "enviado"
    } else {
        return category::OTHER.to_string();
    };

    let Some((_, rest)) = d.split_once(marker) else {
        return category::OTHER.to_string();
    };
    // Only the text up to a repeated marker belongs to the name
    let rest = rest.split(marker).next().unwrap_or(rest);

    let mut name = rest.trim();
    for prefix in BENEFICIARY_PREFIXES {
        if let Some(stripped) = name.strip_prefix(prefix) {
            name = stripped.trim();
        }
    }

    if name.is_empty() {
        return category::OTHER.to_string();
    }
    title_case(name).chars().take(BENEFICIARY_MAX).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BeneficiaryTotal {
    pub name: String,
    pub total: f64,
    pub count: usize,
}

/// Summary of outgoing Pix transfers with an identified beneficiary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PixMetrics {
    pub total: f64,
    pub count: usize,
    pub average: f64,
    pub max: f64,
    /// Top beneficiaries by total, largest first
    pub ranking: Vec<BeneficiaryTotal>,
}

/// None when no outgoing transfer names a beneficiary
pub fn pix_metrics(transactions: &[Transaction]) -> Option<PixMetrics> {
    let attributed: Vec<(String, f64)> = transactions
        .iter()
        .filter(|tx| tx.is_expense())
        .map(|tx| (extract_pix_beneficiary(&tx.description), tx.amount.abs()))
        .filter(|(name, _)| name != category::OTHER)
        .collect();

    if attributed.is_empty() {
        return None;
    }

    let total: f64 = attributed.iter().map(|(_, v)| v).sum();
    let count = attributed.len();
    let max = attributed.iter().map(|(_, v)| *v).fold(0.0, f64::max);

    let mut per_name: HashMap<&str, (f64, usize)> = HashMap::new();
    for (name, value) in &attributed {
        let entry = per_name.entry(name.as_str()).or_default();
        entry.0 += value;
        entry.1 += 1;
    }
    let mut ranking: Vec<BeneficiaryTotal> = per_name
        .into_iter()
        .map(|(name, (total, count))| BeneficiaryTotal {
            name: name.to_string(),
            total,
            count,
        })
        .collect();
    ranking.sort_by(|a, b| b.total.total_cmp(&a.total).then_with(|| a.name.cmp(&b.name)));
    ranking.truncate(RANKING_SIZE);

    Some(PixMetrics {
        total,
        count,
        average: total / count as f64,
        max,
        ranking,
    })
}
