//! Judge configuration
//!
//! Loaded from a TOML document with a `[judge]` table:
//!
//! ```toml
//! [judge]
//! host = "http://localhost:11434"
//! model = "llama3.1:8b"
//! timeout_ms = 120000
//!
//! [judge.options]
//! temperature = 0.5
//! top_p = 0.5
//! seed = 42
//! ```
//!
//! Unknown keys in `[judge]` are ignored with a warning. The options table is
//! strict, see [`JudgeOptions::from_table`].

use std::path::Path;

use crate::error::{AliError, Result};
use crate::judge::JudgeOptions;

pub const DEFAULT_HOST: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama3.1:8b";
pub const DEFAULT_TIMEOUT_MS: u64 = 120_000;

/// Where the judge lives and how it is asked
#[derive(Debug, Clone, PartialEq)]
pub struct JudgeConfig {
    pub host: String,
    pub model: String,
    pub timeout_ms: u64,
    pub options: JudgeOptions,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            options: JudgeOptions::default(),
        }
    }
}

impl JudgeConfig {
    /// Load a TOML configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AliError::file_error(format!("cannot read {}: {}", path.display(), e))
        })?;

        let config = Self::from_toml_str(&content)?;
        tracing::info!(
            path = %path.display(),
            host = %config.host,
            model = %config.model,
            "Loaded judge configuration"
        );
        Ok(config)
    }

    /// Parse a TOML configuration document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let document: toml::Table = toml::from_str(content)?;
        let mut config = Self::default();

        let Some(judge) = document.get("judge") else {
            tracing::warn!("No [judge] table in configuration; using defaults");
            return Ok(config);
        };
        let judge = judge
            .as_table()
            .ok_or_else(|| AliError::configuration("`judge` must be a table"))?;

        for (key, value) in judge {
            match key.as_str() {
                "host" => config.host = string_key(key, value)?,
                "model" => config.model = string_key(key, value)?,
                "timeout_ms" => {
                    config.timeout_ms = value
                        .as_integer()
                        .and_then(|ms| u64::try_from(ms).ok())
                        .ok_or_else(|| {
                            AliError::configuration(
                                "`timeout_ms` must be a non-negative integer",
                            )
                        })?
                }
                "options" => {
                    let table = value.as_table().ok_or_else(|| {
                        AliError::configuration("`judge.options` must be a table")
                    })?;
                    config.options = JudgeOptions::from_table(table)?;
                }
                unused => {
                    tracing::warn!(key = %unused, "Unused key in judge configuration");
                }
            }
        }

        Ok(config)
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

fn string_key(key: &str, value: &toml::Value) -> Result<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| AliError::configuration(format!("`{}` must be a string", key)))
}
