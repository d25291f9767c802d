//! Hard-constraint filtering
//!
//! Each solution is judged on its own against the filtering rules. The judge
//! is asked whether the solution violates a rule: "no" keeps it, "yes" drops
//! it. Survivors keep their input order.

use super::prompts;
use crate::answer::{parse_answer, FILTERING_ANSWERS};
use crate::error::{AliError, Result};
use crate::judge::{Judge, JudgeOptions};
use crate::maneuver::Solution;
use crate::policy::Policy;
use crate::telemetry::PipelineMetrics;

/// Survivors plus the keep/drop verdict for every input solution
#[derive(Debug, Clone, PartialEq)]
pub struct FilteringOutcome {
    pub survivors: Vec<Solution>,
    /// `mask[i]` is true when input solution `i` was kept
    pub mask: Vec<bool>,
}

impl FilteringOutcome {
    /// Compare the verdicts with known correct ones
    pub fn verify_ground_truth(&self, expected: &[bool]) -> Result<()> {
        if expected.len() != self.mask.len() {
            return Err(AliError::invalid_input(format!(
                "ground truth has {} entries for {} solutions",
                expected.len(),
                self.mask.len()
            )));
        }

        let mismatches: Vec<usize> = self
            .mask
            .iter()
            .zip(expected)
            .enumerate()
            .filter(|(_, (kept, truth))| kept != truth)
            .map(|(index, _)| index)
            .collect();

        if mismatches.is_empty() {
            Ok(())
        } else {
            Err(AliError::FilteringFailure(format!(
                "verdicts differ from ground truth at solutions {:?}",
                mismatches
            )))
        }
    }

    pub fn dropped(&self) -> usize {
        self.mask.iter().filter(|kept| !**kept).count()
    }
}

/// Keep the solutions that violate no filtering rule
pub async fn filter_solutions(
    judge: &dyn Judge,
    solutions: &[Solution],
    policy: &Policy,
    options: &JudgeOptions,
) -> Result<Vec<Solution>> {
    Ok(filter_with_mask(judge, solutions, policy, options)
        .await?
        .survivors)
}

/// Filter and report the verdict for every solution
///
/// The first answer that cannot be understood aborts the whole pass with
/// [`AliError::InvalidAnswer`].
pub async fn filter_with_mask(
    judge: &dyn Judge,
    solutions: &[Solution],
    policy: &Policy,
    options: &JudgeOptions,
) -> Result<FilteringOutcome> {
    run_filtering(judge, solutions, policy, options, None).await
}

/// Filtering pass that counts every verdict as soon as it is made
pub(crate) async fn run_filtering(
    judge: &dyn Judge,
    solutions: &[Solution],
    policy: &Policy,
    options: &JudgeOptions,
    metrics: Option<&PipelineMetrics>,
) -> Result<FilteringOutcome> {
    let context = prompts::filtering_context();
    let rules = policy.render_filtering_rules();
    tracing::debug!(context = %context, "Filtering system context");

    let mut survivors = Vec::with_capacity(solutions.len());
    let mut mask = Vec::with_capacity(solutions.len());

    for (index, solution) in solutions.iter().enumerate() {
        let prompt = prompts::filtering_prompt(solution, &rules);
        tracing::debug!(index, prompt = %prompt, "Filtering prompt");

        let response = judge.ask(context, &prompt, options).await;
        tracing::debug!(index, response = %response, "Filtering answer");

        let decision = parse_answer(&response, &FILTERING_ANSWERS)?;
        let keep = decision.token == "no";
        if let Some(metrics) = metrics {
            metrics.record_filter_decision(keep);
        }
        if keep {
            survivors.push(solution.clone());
        } else {
            tracing::debug!(
                index,
                callsign = %solution.callsign,
                "Solution violates a filtering rule"
            );
        }
        mask.push(keep);
    }

    tracing::info!(
        candidates = solutions.len(),
        kept = survivors.len(),
        "Filtering complete"
    );
    Ok(FilteringOutcome { survivors, mask })
}
