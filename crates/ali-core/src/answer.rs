//! Structured decisions extracted from free-form judge text
//!
//! The judge is asked to reply with a JSON object such as
//! `{"Explanation": "...", "Answer": "yes"}`, usually wrapped in prose or a
//! code fence. This module is the only place where judge text is trusted:
//! anything that does not yield an in-vocabulary answer is an
//! [`AliError::InvalidAnswer`].

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use crate::error::{AliError, Result};

/// Accepted answers when asking whether a solution violates a hard rule
pub const FILTERING_ANSWERS: [&str; 2] = ["yes", "no"];

/// Accepted answers when asking which of two solutions is preferred
pub const SORTING_ANSWERS: [&str; 2] = ["solution 1", "solution 2"];

const ANSWER_KEY: &str = "Answer";
const EXPLANATION_KEY: &str = "Explanation";

/// A validated judge decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JudgeDecision {
    /// Lowercased, trimmed token from the accepted vocabulary
    pub token: String,
    /// Always empty; the judge's explanation is only logged
    pub explanation: String,
}

/// A `{` and everything up to, not including, the next `{`
fn object_region() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{[^{]*").expect("static answer pattern"))
}

/// Parse the first brace-delimited object that has no nested `{`
///
/// The object starts at the first `{` whose region holds a `}`. Each `}` of
/// that region is tried as the end in turn, so a `}` inside a string value
/// does not cut the object short.
fn extract_object(text: &str) -> Result<Value> {
    for region in object_region().find_iter(text).map(|m| m.as_str()) {
        let mut first_error = None;
        for (end, _) in region.match_indices('}') {
            let candidate = &region[..=end];
            match serde_json::from_str::<Value>(candidate) {
                Ok(object) => return Ok(object),
                Err(e) => {
                    first_error.get_or_insert_with(|| {
                        format!("answer could not be parsed as JSON ({}): {}", e, candidate)
                    });
                }
            }
        }
        if let Some(message) = first_error {
            return Err(AliError::invalid_answer(message));
        }
    }

    Err(AliError::invalid_answer(format!("no JSON object in: {:?}", text)))
}

/// Extract the judge's answer and check it against `accepted`
///
/// Every entry of `accepted` must already be lowercase.
pub fn parse_answer(raw_text: &str, accepted: &[&str]) -> Result<JudgeDecision> {
    debug_assert!(
        accepted.iter().all(|a| a.to_lowercase() == *a),
        "accepted answers must be lowercase"
    );

    let flattened: String = raw_text
        .chars()
        .filter(|c| *c != '\n' && *c != '\r')
        .collect();
    let object = extract_object(&flattened)?;

    let answer = match object.get(ANSWER_KEY) {
        None | Some(Value::Null) => {
            return Err(AliError::invalid_answer(format!(
                "no \"{}\" key in: {}",
                ANSWER_KEY, object
            )))
        }
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    };

    let normalized = answer.trim().to_lowercase();
    if !accepted.contains(&normalized.as_str()) {
        return Err(AliError::invalid_answer(format!(
            "answer {:?} is not one of {:?}",
            answer, accepted
        )));
    }

    if let Some(explanation) = object.get(EXPLANATION_KEY).and_then(Value::as_str) {
        tracing::debug!(answer = %normalized, explanation = %explanation, "Judge explanation");
    }

    Ok(JudgeDecision {
        token: normalized,
        explanation: String::new(),
    })
}
