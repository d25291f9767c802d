//! Generation options sent with every judge request
//!
//! The option surface is closed: temperature, nucleus top-p and an optional
//! seed. Options are a plain value passed to each call, never global state.

use serde::{Deserialize, Serialize};

use crate::error::{AliError, Result};

/// Decoding options for one judge request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JudgeOptions {
    /// Negative values select greedy decoding
    pub temperature: f64,
    pub top_p: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
}

impl Default for JudgeOptions {
    fn default() -> Self {
        Self {
            temperature: 0.5,
            top_p: 0.5,
            seed: None,
        }
    }
}

impl JudgeOptions {
    /// Greedy, reproducible decoding
    pub fn greedy() -> Self {
        Self {
            temperature: -1.0,
            ..Default::default()
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_top_p(mut self, top_p: f64) -> Self {
        self.top_p = top_p;
        self
    }

    pub fn with_seed(mut self, seed: i64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn is_greedy(&self) -> bool {
        self.temperature < 0.0
    }

    /// Overlay the keys of a configuration table onto the defaults
    ///
    /// Unknown keys and wrongly typed values are configuration errors.
    /// Integers are accepted where a real number is expected.
    pub fn from_table(table: &toml::Table) -> Result<Self> {
        let mut options = Self::default();

        for (key, value) in table {
            match key.as_str() {
                "temperature" => options.temperature = real_option(key, value)?,
                "top_p" => options.top_p = real_option(key, value)?,
                "seed" => {
                    options.seed = Some(value.as_integer().ok_or_else(|| {
                        AliError::configuration(format!(
                            "judge option `seed` must be an integer, not {}",
                            value.type_str()
                        ))
                    })?)
                }
                unknown => {
                    return Err(AliError::configuration(format!(
                        "`{}` is not a valid judge option (expected temperature, top_p or seed)",
                        unknown
                    )))
                }
            }
        }

        Ok(options)
    }
}

fn real_option(key: &str, value: &toml::Value) -> Result<f64> {
    match value {
        toml::Value::Float(real) => Ok(*real),
        toml::Value::Integer(integer) => {
            tracing::debug!(
                option = %key,
                value = integer,
                "Coercing integer judge option to real"
            );
            Ok(*integer as f64)
        }
        other => Err(AliError::configuration(format!(
            "judge option `{}` must be a number, not {}",
            key,
            other.type_str()
        ))),
    }
}
