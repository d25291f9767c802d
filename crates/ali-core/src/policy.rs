//! ATC policy: natural-language rules used to judge resolutions
//!
//! A policy carries two ordered rule collections:
//!
//! - **filtering rules** are hard constraints; a solution violating any of
//!   them is rejected,
//! - **sorting rules** are soft preferences in priority order; earlier rules
//!   dominate later ones when they conflict.
//!
//! The source document holds both lists under `FILTERING_RULES` and
//! `SORTING_RULES`, each a sequence of single-key `{id: text}` entries:
//!
//! ```json
//! {
//!     "FILTERING_RULES": [{"F1": "Do not change the altitude."}],
//!     "SORTING_RULES": [{"S1": "Prefer heading changes."}]
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::Path;

use crate::error::{AliError, Result};

/// Top-level key holding the hard constraints
pub const FILTERING_KEY: &str = "FILTERING_RULES";

/// Top-level key holding the ordered preferences
pub const SORTING_KEY: &str = "SORTING_RULES";

/// A single natural-language rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub value: String,
}

impl Rule {
    pub fn new(id: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.id, self.value)
    }
}

/// Immutable collection of filtering and sorting rules
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Policy {
    filtering_rules: Vec<Rule>,
    sorting_rules: Vec<Rule>,
}

impl Policy {
    /// Build a policy from already-parsed rules
    pub fn new(filtering_rules: Vec<Rule>, sorting_rules: Vec<Rule>) -> Self {
        Self {
            filtering_rules,
            sorting_rules,
        }
    }

    /// Load a policy file; the format follows the extension (JSON or YAML)
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AliError::file_error(format!("cannot read policy {}: {}", path.display(), e))
        })?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        let policy = match extension.as_deref() {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content)?,
            _ => Self::from_json_str(&content)?,
        };

        tracing::info!(
            path = %path.display(),
            filtering_rules = policy.filtering_rules.len(),
            sorting_rules = policy.sorting_rules.len(),
            "Loaded ATC policy"
        );
        Ok(policy)
    }

    /// Parse a JSON policy document
    pub fn from_json_str(content: &str) -> Result<Self> {
        let document: Value = serde_json::from_str(content)
            .map_err(|e| AliError::configuration(format!("policy is not valid JSON: {}", e)))?;
        Self::from_value(&document)
    }

    /// Parse a YAML policy document
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let yaml: serde_yaml::Value = serde_yaml::from_str(content)
            .map_err(|e| AliError::configuration(format!("policy is not valid YAML: {}", e)))?;
        let document = serde_json::to_value(yaml)
            .map_err(|e| AliError::configuration(format!("policy is not representable: {}", e)))?;
        Self::from_value(&document)
    }

    fn from_value(document: &Value) -> Result<Self> {
        let object = document
            .as_object()
            .ok_or_else(|| AliError::configuration("policy document must be a mapping"))?;

        for key in object.keys() {
            if key != FILTERING_KEY && key != SORTING_KEY {
                tracing::debug!(key = %key, "Ignoring unknown policy section");
            }
        }

        let filtering_rules = parse_rule_list(object.get(FILTERING_KEY), FILTERING_KEY)?;
        let sorting_rules = parse_rule_list(object.get(SORTING_KEY), SORTING_KEY)?;

        Ok(Self {
            filtering_rules,
            sorting_rules,
        })
    }

    /// Hard constraints, in source order
    pub fn filtering_rules(&self) -> &[Rule] {
        &self.filtering_rules
    }

    /// Preferences, highest priority first
    pub fn sorting_rules(&self) -> &[Rule] {
        &self.sorting_rules
    }

    /// Filtering rules as prompt text, one `id: text` per line
    pub fn render_filtering_rules(&self) -> String {
        render_rules(&self.filtering_rules)
    }

    /// Sorting rules as prompt text, one `id: text` per line
    pub fn render_sorting_rules(&self) -> String {
        render_rules(&self.sorting_rules)
    }

    /// Human-readable listing of both rule sets
    pub fn summary(&self) -> String {
        let mut out = String::from("FILTERING RULES:\n");
        for rule in &self.filtering_rules {
            out.push_str(&format!("  {}\n", rule));
        }
        out.push_str("\nSORTING RULES:\n");
        for rule in &self.sorting_rules {
            out.push_str(&format!("  {}\n", rule));
        }
        out
    }
}

fn render_rules(rules: &[Rule]) -> String {
    rules
        .iter()
        .map(Rule::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

fn parse_rule_list(section: Option<&Value>, name: &str) -> Result<Vec<Rule>> {
    let section =
        section.ok_or_else(|| AliError::configuration(format!("policy lacks the {} list", name)))?;
    let entries = section
        .as_array()
        .ok_or_else(|| AliError::configuration(format!("{} must be a list", name)))?;

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| parse_rule(entry, name, index))
        .collect()
}

fn parse_rule(entry: &Value, name: &str, index: usize) -> Result<Rule> {
    let malformed = |reason: &str| {
        AliError::configuration(format!("{}[{}] is malformed: {}", name, index, reason))
    };

    let map = entry
        .as_object()
        .ok_or_else(|| malformed("expected a single-key mapping"))?;
    if map.len() != 1 {
        return Err(malformed("expected exactly one rule id"));
    }

    let (id, text) = map
        .iter()
        .next()
        .ok_or_else(|| malformed("expected exactly one rule id"))?;
    let text = text
        .as_str()
        .ok_or_else(|| malformed("rule text must be a string"))?;

    Ok(Rule::new(id.clone(), text))
}
