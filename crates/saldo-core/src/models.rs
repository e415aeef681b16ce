//! Domain models for Saldo

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Built-in category labels
pub mod category {
    pub const INVOICE_PAYMENT: &str = "Pagamento de Fatura";
    pub const CONVENIENCE: &str = "Conveniência";
    pub const TRANSPORT: &str = "Transporte";
    pub const FOOD: &str = "Alimentação";
    pub const SUBSCRIPTIONS: &str = "Assinaturas/TV/Net";
    pub const PHARMACY: &str = "Farmácia";
    pub const HEALTH: &str = "Saúde";
    pub const HOUSING: &str = "Moradia";
    pub const SHOPPING: &str = "Compras";
    pub const EDUCATION: &str = "Educação";
    pub const LEISURE: &str = "Lazer";
    pub const GENERAL: &str = "Gastos Gerais";
    pub const INCOME: &str = "Receita";
    pub const PIX: &str = "Pix";
    pub const TRANSFERS: &str = "Transferências";
    pub const OTHER: &str = "Outros";

    /// Categories always offered for selection, even before any statement
    /// produced them
    pub const DEFAULTS: [&str; 6] = [OTHER, FOOD, TRANSPORT, LEISURE, PHARMACY, CONVENIENCE];
}

/// Description used when a statement has no description column
pub const NO_DESCRIPTION: &str = "Sem descrição";

/// A normalized statement entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    /// Original casing preserved
    pub description: String,
    pub category: String,
    /// Negative = outflow, positive = inflow
    pub amount: f64,
    /// Source institution label
    pub bank: String,
}

impl Transaction {
    pub fn is_expense(&self) -> bool {
        self.amount < 0.0
    }

    pub fn is_income(&self) -> bool {
        self.amount > 0.0
    }
}

/// A statement file as handed to the ingestion pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a statement from disk, keeping only the file name
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, bytes })
    }

    /// Lowercased extension, if any
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
    }
}

/// Cadence assigned to a recurring charge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    /// Roughly monthly with a stable amount
    MonthlyFixed,
    /// Ride-hailing or delivery used every few days
    Frequent,
    /// Roughly monthly with a varying amount
    MonthlyVariable,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MonthlyFixed => "Mensal (Fixo)",
            Self::Frequent => "Uso Frequente",
            Self::MonthlyVariable => "Mensal (Variável)",
        }
    }
}

impl std::str::FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mensal (fixo)" | "monthly_fixed" => Ok(Self::MonthlyFixed),
            "uso frequente" | "frequent" => Ok(Self::Frequent),
            "mensal (variável)" | "mensal (variavel)" | "monthly_variable" => {
                Ok(Self::MonthlyVariable)
            }
            _ => Err(format!("Unknown frequency: {}", s)),
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequency_roundtrip_labels() {
        for freq in [
            Frequency::MonthlyFixed,
            Frequency::Frequent,
            Frequency::MonthlyVariable,
        ] {
            assert_eq!(freq.as_str().parse::<Frequency>().unwrap(), freq);
        }
        assert!("weekly".parse::<Frequency>().is_err());
    }

    #[test]
    fn test_uploaded_file_extension() {
        assert_eq!(
            UploadedFile::new("Nubank_2024.CSV", Vec::<u8>::new()).extension(),
            Some("csv".to_string())
        );
        assert_eq!(UploadedFile::new("extrato", Vec::<u8>::new()).extension(), None);
    }

    #[test]
    fn test_uploaded_file_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inter_jan.csv");
        std::fs::write(&path, b"Data;Valor\n").unwrap();

        let file = UploadedFile::from_path(&path).unwrap();
        assert_eq!(file.name, "inter_jan.csv");
        assert_eq!(file.bytes, b"Data;Valor\n");
    }
}
