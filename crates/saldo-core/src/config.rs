//! Saldo configuration
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a two-layer resolution:
//! 1. An explicit path, or the override in the data dir
//!    (~/.local/share/saldo/config.toml)
//! 2. Embedded defaults (compiled into binary)
//!
//! Keys missing from an override keep their default values.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::sniff::TextEncoding;

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

/// Ingestion settings
#[derive(Debug, Clone, PartialEq)]
pub struct IngestConfig {
    /// Encodings tried in order for delimited statements
    pub encodings: Vec<TextEncoding>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            encodings: TextEncoding::defaults(),
        }
    }
}

/// Thresholds for recurring charge detection
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionConfig {
    /// Amount standard deviation below which a monthly charge is "fixed"
    pub fixed_max_std_dev: f64,
    /// Shortest mean gap in days accepted as monthly
    pub monthly_min_days: f64,
    /// Longest mean gap in days accepted as monthly
    pub monthly_max_days: f64,
    /// Longest mean gap in days for frequent-use services
    pub frequent_max_days: f64,
    /// Minimum charges per service
    pub min_occurrences: usize,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            fixed_max_std_dev: 5.0,
            monthly_min_days: 25.0,
            monthly_max_days: 35.0,
            frequent_max_days: 10.0,
            min_occurrences: 2,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub ingest: IngestConfig,
    pub subscriptions: SubscriptionConfig,
}

impl Config {
    /// Load from `path` if given, else the data dir override, else defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let override_path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => default_config_path().filter(|p| p.exists()),
        };

        match override_path {
            Some(p) => {
                let content = fs::read_to_string(&p).map_err(|e| {
                    Error::Config(format!("Failed to read {}: {}", p.display(), e))
                })?;
                debug!("Loaded config from {}", p.display());
                parse_config(&content)
            }
            None => parse_config(DEFAULT_CONFIG),
        }
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("saldo").join("config.toml"))
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    ingest: Option<RawIngest>,
    subscriptions: Option<RawSubscriptions>,
}

#[derive(Debug, Deserialize)]
struct RawIngest {
    encodings: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawSubscriptions {
    fixed_max_std_dev: Option<f64>,
    monthly_min_days: Option<f64>,
    monthly_max_days: Option<f64>,
    frequent_max_days: Option<f64>,
    min_occurrences: Option<usize>,
}

/// Parse config from TOML content
fn parse_config(content: &str) -> Result<Config> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = Config::default();

    if let Some(ingest) = raw.ingest {
        if let Some(names) = ingest.encodings {
            let encodings = names
                .iter()
                .map(|n| n.parse::<TextEncoding>())
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(Error::Config)?;
            if encodings.is_empty() {
                return Err(Error::Config("ingest.encodings must not be empty".into()));
            }
            config.ingest.encodings = encodings;
        }
    }

    if let Some(subs) = raw.subscriptions {
        let target = &mut config.subscriptions;
        if let Some(v) = subs.fixed_max_std_dev {
            target.fixed_max_std_dev = v;
        }
        if let Some(v) = subs.monthly_min_days {
            target.monthly_min_days = v;
        }
        if let Some(v) = subs.monthly_max_days {
            target.monthly_max_days = v;
        }
        if let Some(v) = subs.frequent_max_days {
            target.frequent_max_days = v;
        }
        if let Some(v) = subs.min_occurrences {
            // A single charge has no interval to measure
            target.min_occurrences = v.max(2);
        }
        if target.monthly_min_days > target.monthly_max_days {
            return Err(Error::Config(
                "subscriptions.monthly_min_days exceeds monthly_max_days".into(),
            ));
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_default_config() {
        let config = parse_config(DEFAULT_CONFIG).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let config = parse_config(
            r#"
[subscriptions]
fixed_max_std_dev = 2.5
"#,
        )
        .unwrap();
        assert_eq!(config.subscriptions.fixed_max_std_dev, 2.5);
        assert_eq!(config.subscriptions.monthly_max_days, 35.0);
        assert_eq!(config.ingest.encodings, TextEncoding::defaults());
    }

    #[test]
    fn test_encodings_override() {
        let config = parse_config("[ingest]\nencodings = [\"utf-8\"]\n").unwrap();
        assert_eq!(config.ingest.encodings, vec![TextEncoding::Utf8]);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            parse_config("[ingest]\nencodings = [\"ebcdic\"]\n"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            parse_config("[ingest]\nencodings = []\n"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            parse_config("[subscriptions]\nmonthly_min_days = 40.0\n"),
            Err(Error::Config(_))
        ));
        assert!(matches!(parse_config("not = [toml"), Err(Error::Config(_))));
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saldo.toml");
        fs::write(&path, "[subscriptions]\nfrequent_max_days = 7.0\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.subscriptions.frequent_max_days, 7.0);

        let missing = dir.path().join("missing.toml");
        assert!(matches!(Config::load(Some(&missing)), Err(Error::Config(_))));
    }
}
