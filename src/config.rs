//! Engine configuration.
//!
//! Every field has a default matching the ticket spreadsheets the dashboards
//! were built for (`Ticket`, `Tipo`, `Análise`, `Data`), so the YAML file is
//! optional and may override any subset of keys:
//!
//! ```yaml
//! columns:
//!   kind: Categoria
//! normalize: [Análise, Categoria]
//! fuzzy:
//!   limit: 3
//! ```

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TICKET_COLUMN: &str = "Ticket";
pub const DEFAULT_TYPE_COLUMN: &str = "Tipo";
pub const DEFAULT_ANALYSIS_COLUMN: &str = "Análise";
pub const DEFAULT_DATE_COLUMN: &str = "Data";
pub const IDEAL_LABEL: &str = "IDEAL";
pub const NOT_IDEAL_LABEL: &str = "NÃO IDEAL";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InsightConfig {
    pub columns: ColumnNames,
    /// Required columns in report order. Empty means the ticket, type and
    /// analysis columns.
    pub required: Vec<String>,
    /// Columns trimmed and upper-cased before filtering. Empty means the
    /// analysis column only.
    pub normalize: Vec<String>,
    pub labels: Labels,
    pub fuzzy: FuzzySettings,
}

impl InsightConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Opening config file {path:?}"))?;
        Self::from_yaml(&raw).with_context(|| format!("Parsing config file {path:?}"))
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn required_columns(&self) -> Vec<String> {
        if self.required.is_empty() {
            self.columns.required()
        } else {
            self.required.clone()
        }
    }

    pub fn normalized_columns(&self) -> Vec<String> {
        if self.normalize.is_empty() {
            vec![self.columns.analysis.clone()]
        } else {
            self.normalize.clone()
        }
    }

    pub fn is_normalized(&self, column: &str) -> bool {
        self.normalized_columns().iter().any(|c| c == column)
    }
}

/// Names of the columns each role reads from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnNames {
    pub ticket: String,
    pub kind: String,
    pub analysis: String,
    pub date: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            ticket: DEFAULT_TICKET_COLUMN.to_string(),
            kind: DEFAULT_TYPE_COLUMN.to_string(),
            analysis: DEFAULT_ANALYSIS_COLUMN.to_string(),
            date: DEFAULT_DATE_COLUMN.to_string(),
        }
    }
}

impl ColumnNames {
    pub fn required(&self) -> Vec<String> {
        vec![self.ticket.clone(), self.kind.clone(), self.analysis.clone()]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Labels {
    pub ideal: String,
    pub not_ideal: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            ideal: IDEAL_LABEL.to_string(),
            not_ideal: NOT_IDEAL_LABEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FuzzySettings {
    pub limit: usize,
    /// When set, two differing tokens still count as a partial overlap when
    /// their character similarity reaches this ratio (0.0..=1.0). Unset means
    /// plain token-set overlap.
    pub min_token_similarity: Option<f64>,
    /// Results scoring below this are dropped.
    pub score_cutoff: Option<f64>,
}

impl Default for FuzzySettings {
    fn default() -> Self {
        Self {
            limit: 5,
            min_token_similarity: None,
            score_cutoff: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_yields_defaults() {
        let config = InsightConfig::from_yaml("").unwrap();
        assert_eq!(config, InsightConfig::default());
        assert_eq!(config.required_columns(), vec!["Ticket", "Tipo", "Análise"]);
        assert_eq!(config.normalized_columns(), vec!["Análise"]);
    }

    #[test]
    fn partial_yaml_overrides_only_named_keys() {
        let config = InsightConfig::from_yaml(
            "columns:\n  kind: Categoria\nfuzzy:\n  limit: 2\n",
        )
        .unwrap();
        assert_eq!(config.columns.kind, "Categoria");
        assert_eq!(config.columns.ticket, "Ticket");
        assert_eq!(config.fuzzy.limit, 2);
        assert_eq!(config.fuzzy.min_token_similarity, None);
        assert_eq!(config.required_columns(), vec!["Ticket", "Categoria", "Análise"]);
    }

    #[test]
    fn typo_tolerance_is_opt_in() {
        let config = InsightConfig::from_yaml("fuzzy:\n  min_token_similarity: 0.75\n").unwrap();
        assert_eq!(config.fuzzy.min_token_similarity, Some(0.75));
        assert_eq!(config.fuzzy.limit, 5);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(InsightConfig::from_yaml("colums:\n  kind: Categoria\n").is_err());
    }

    #[test]
    fn explicit_normalize_list_replaces_default() {
        let config = InsightConfig::from_yaml("normalize: [Tipo, Análise]\n").unwrap();
        assert!(config.is_normalized("Tipo"));
        assert!(config.is_normalized("Análise"));
        assert!(!config.is_normalized("Ticket"));
    }
}
