//! User-taught categorization rules
//!
//! A rule set maps a lowercase keyword to a category label. Insertion order
//! is match priority, so the set is kept as an ordered list and serialized
//! as a JSON object whose key order survives a load/save cycle.
//!
//! Rule sets are persisted per user under `<data_dir>/<user>/rules.json`.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::Result;

const RULES_FILE: &str = "rules.json";

/// Ordered keyword → category mapping with unique keys
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    entries: Vec<(String, String)>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical form of a rule keyword
    pub fn normalize_key(keyword: &str) -> String {
        keyword.trim().to_lowercase()
    }

    /// Insert or replace a rule.
    ///
    /// Replacing keeps the rule at its original position.
    pub fn insert(&mut self, keyword: &str, category: &str) {
        let key = Self::normalize_key(keyword);
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = category.to_string(),
            None => self.entries.push((key, category.to_string())),
        }
    }

    /// Remove a rule, returning its category if it existed
    pub fn remove(&mut self, keyword: &str) -> Option<String> {
        let key = Self::normalize_key(keyword);
        let pos = self.entries.iter().position(|(k, _)| *k == key)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn get(&self, keyword: &str) -> Option<&str> {
        let key = Self::normalize_key(keyword);
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, c)| c.as_str())
    }

    /// Rules in priority order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, c)| (k.as_str(), c.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Version identifier for cache keys: SHA-256 over the ordered pairs
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for (keyword, category) in &self.entries {
            hasher.update((keyword.len() as u64).to_be_bytes());
            hasher.update(keyword.as_bytes());
            hasher.update((category.len() as u64).to_be_bytes());
            hasher.update(category.as_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

impl<K: AsRef<str>, C: AsRef<str>> FromIterator<(K, C)> for RuleSet {
    fn from_iter<I: IntoIterator<Item = (K, C)>>(iter: I) -> Self {
        let mut rules = RuleSet::new();
        for (keyword, category) in iter {
            rules.insert(keyword.as_ref(), category.as_ref());
        }
        rules
    }
}

impl Serialize for RuleSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (keyword, category) in &self.entries {
            map.serialize_entry(keyword, category)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RuleSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct RuleSetVisitor;

        impl<'de> Visitor<'de> for RuleSetVisitor {
            type Value = RuleSet;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of keyword to category")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<RuleSet, A::Error> {
                let mut rules = RuleSet::new();
                while let Some((keyword, category)) = access.next_entry::<String, String>()? {
                    rules.insert(&keyword, &category);
                }
                Ok(rules)
            }
        }

        deserializer.deserialize_map(RuleSetVisitor)
    }
}

/// File-backed rule persistence for one user
#[derive(Debug, Clone)]
pub struct RuleStore {
    path: PathBuf,
}

impl RuleStore {
    /// Store rooted at `data_dir`, scoped to `user` when given
    pub fn new(data_dir: &Path, user: Option<&str>) -> Self {
        let path = match user.map(str::trim).filter(|u| !u.is_empty()) {
            Some(user) => data_dir.join(user).join(RULES_FILE),
            None => data_dir.join(RULES_FILE),
        };
        Self { path }
    }

    /// Default data directory (`~/.local/share/saldo` on Linux)
    pub fn default_data_dir() -> Option<PathBuf> {
        dirs::data_local_dir().map(|d| d.join("saldo"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the rule set.
    ///
    /// A missing file is an empty set. An unreadable or malformed file is
    /// logged and also treated as empty.
    pub fn load(&self) -> RuleSet {
        if !self.path.exists() {
            return RuleSet::new();
        }
        match self.read() {
            Ok(rules) => {
                debug!("Loaded {} rules from {}", rules.len(), self.path.display());
                rules
            }
            Err(e) => {
                warn!("Ignoring rules file {}: {}", self.path.display(), e);
                RuleSet::new()
            }
        }
    }

    fn read(&self) -> Result<RuleSet> {
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write the whole rule set, creating parent directories
    pub fn save(&self, rules: &RuleSet) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        rules.serialize(&mut ser)?;
        fs::write(&self.path, buf)?;
        Ok(())
    }

    /// Add or update one rule and persist. Returns the updated set.
    pub fn save_rule(&self, keyword: &str, category: &str) -> Result<RuleSet> {
        let mut rules = self.load();
        rules.insert(keyword, category);
        self.save(&rules)?;
        debug!("Saved rule '{}' -> '{}'", RuleSet::normalize_key(keyword), category);
        Ok(rules)
    }

    /// Remove one rule. Returns false when the keyword was not present.
    pub fn delete_rule(&self, keyword: &str) -> Result<bool> {
        let mut rules = self.load();
        if rules.remove(keyword).is_none() {
            return Ok(false);
        }
        self.save(&rules)?;
        Ok(true)
    }
}
