//! Override table
//!
//! Ordered (pattern, value) rules loaded once at startup. A rule whose pattern
//! equals a metric name replaces every sample of that metric with its value.
//! When several rules share a pattern, the one listed last wins.

use crate::Result;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// One configured override
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OverrideRule {
    /// Exact metric name to match
    pub pattern: String,
    /// Value written into every sample of a matching series
    pub value: f64,
}

impl OverrideRule {
    pub fn new(pattern: impl Into<String>, value: f64) -> Self {
        Self {
            pattern: pattern.into(),
            value,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct OverrideDocument {
    #[serde(default)]
    slo_configs: Vec<OverrideRule>,
}

/// Immutable, ordered set of override rules
#[derive(Debug, Clone, Default)]
pub struct OverrideTable {
    rules: Vec<OverrideRule>,
    /// pattern -> index of the last rule carrying it
    last_index: HashMap<String, usize>,
}

impl OverrideTable {
    /// Build a table from rules in configuration order.
    pub fn from_rules(rules: Vec<OverrideRule>) -> Self {
        let mut last_index = HashMap::with_capacity(rules.len());
        for (idx, rule) in rules.iter().enumerate() {
            last_index.insert(rule.pattern.clone(), idx);
        }
        Self { rules, last_index }
    }

    /// Parse the YAML override document.
    ///
    /// ```yaml
    /// slo_configs:
    ///   - pattern: up
    ///     value: 1.0
    /// ```
    pub fn load(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let doc: OverrideDocument = serde_yaml::from_str(raw)?;
        Ok(Self::from_rules(doc.slo_configs))
    }

    /// Read and parse the override document at `path`.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let table = Self::load(&raw)?;
        info!(
            path = %path.display(),
            rules = table.len(),
            patterns = table.last_index.len(),
            "Loaded override table"
        );
        Ok(table)
    }

    /// Value of the last rule whose pattern equals `name`.
    pub fn lookup(&self, name: &str) -> Option<f64> {
        self.last_index.get(name).map(|&idx| self.rules[idx].value)
    }

    pub fn rules(&self) -> &[OverrideRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
