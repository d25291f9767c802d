//! Soft-preference ranking by pairwise tournament
//!
//! While more than one candidate remains, the first and the last candidate
//! are compared. The loser leaves the list; the rest keep their order. The
//! result therefore depends on the input order, and `n` candidates need at
//! most `n - 1` decided comparisons.

use super::prompts;
use crate::answer::{parse_answer, SORTING_ANSWERS};
use crate::error::{AliError, Result};
use crate::judge::{Judge, JudgeOptions};
use crate::maneuver::Solution;
use crate::policy::Policy;
use crate::telemetry::PipelineMetrics;

/// Consecutive unusable answers tolerated for one comparison
pub const MAX_COMPARISON_ATTEMPTS: u32 = 3;

/// Pick the solution the judge prefers under the sorting rules
pub async fn best_solution(
    judge: &dyn Judge,
    solutions: &[Solution],
    policy: &Policy,
    options: &JudgeOptions,
) -> Result<Solution> {
    run_tournament(judge, solutions, policy, options, None).await
}

pub(crate) async fn run_tournament(
    judge: &dyn Judge,
    solutions: &[Solution],
    policy: &Policy,
    options: &JudgeOptions,
    metrics: Option<&PipelineMetrics>,
) -> Result<Solution> {
    match solutions {
        [] => return Err(AliError::invalid_input("cannot sort an empty list of solutions")),
        [only] => {
            tracing::debug!(
                solution = %only.pretty_print(),
                "Single candidate accepted without comparison"
            );
            return Ok(only.clone());
        }
        _ => {}
    }

    let context = prompts::sorting_context(policy);
    tracing::debug!(context = %context, "Sorting system context");

    // Window over the remaining candidates; `lo..=hi` stays contiguous
    // because only the ends are ever removed.
    let mut lo = 0;
    let mut hi = solutions.len() - 1;
    let mut failures = 0;

    while lo < hi {
        let (first, last) = (&solutions[lo], &solutions[hi]);
        let prompt = prompts::sorting_prompt(first, last);
        tracing::debug!(first = lo, last = hi, prompt = %prompt, "Sorting prompt");

        let response = judge.ask(&context, &prompt, options).await;
        tracing::debug!(response = %response, "Sorting answer");

        match parse_answer(&response, &SORTING_ANSWERS) {
            Ok(decision) => {
                failures = 0;
                if let Some(metrics) = metrics {
                    metrics.record_comparison(true);
                }
                if decision.token == "solution 1" {
                    hi -= 1;
                } else {
                    lo += 1;
                }
            }
            Err(e) => {
                failures += 1;
                if let Some(metrics) = metrics {
                    metrics.record_comparison(false);
                }
                tracing::debug!(attempt = failures, error = %e, "Unusable sorting answer");
                if failures >= MAX_COMPARISON_ATTEMPTS {
                    return Err(AliError::SortingFailure {
                        attempts: failures,
                        last: e.to_string(),
                    });
                }
            }
        }
    }

    tracing::info!(candidates = solutions.len(), winner = lo, "Sorting complete");
    Ok(solutions[lo].clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::ScriptedJudge;
    use crate::maneuver::Command;
    use crate::policy::Rule;

    const ONE: &str = r#"{"Explanation": "first is better", "Answer": "Solution 1"}"#;
    const TWO: &str = r#"{"Explanation": "second is better", "Answer": "solution 2"}"#;

    fn policy() -> Policy {
        Policy::new(vec![], vec![Rule::new("S1", "Prefer heading changes over speed changes.")])
    }

    fn candidates(n: i64) -> Vec<Solution> {
        (0..n)
            .map(|i| Solution::new("AFR7", vec![Command::heading(10, 10 * (i + 1))]))
            .collect()
    }

    #[tokio::test]
    async fn test_single_candidate_needs_no_judge() {
        let judge = ScriptedJudge::constant(ONE);
        let solutions = candidates(1);
        let best = best_solution(&judge, &solutions, &policy(), &JudgeOptions::default())
            .await
            .unwrap();
        assert_eq!(best, solutions[0]);
        assert_eq!(judge.calls(), 0);
    }

    #[tokio::test]
    async fn test_two_candidates_one_comparison() {
        let judge = ScriptedJudge::constant(TWO);
        let solutions = candidates(2);
        let best = best_solution(&judge, &solutions, &policy(), &JudgeOptions::default())
            .await
            .unwrap();
        assert_eq!(best, solutions[1]);
        assert_eq!(judge.calls(), 1);
    }

    #[tokio::test]
    async fn test_always_first_returns_first_supplied() {
        let judge = ScriptedJudge::constant(ONE);
        let solutions = candidates(5);
        let best = best_solution(&judge, &solutions, &policy(), &JudgeOptions::default())
            .await
            .unwrap();
        assert_eq!(best, solutions[0]);
        assert_eq!(judge.calls(), 4);
    }

    #[tokio::test]
    async fn test_always_second_returns_last_supplied() {
        let judge = ScriptedJudge::constant(TWO);
        let solutions = candidates(4);
        let best = best_solution(&judge, &solutions, &policy(), &JudgeOptions::default())
            .await
            .unwrap();
        assert_eq!(best, solutions[3]);
        assert_eq!(judge.calls(), 3);
    }

    #[tokio::test]
    async fn test_mixed_answers_follow_tournament_order() {
        // 0 vs 3 keeps 0; 0 vs 2 keeps 2; 1 vs 2 keeps 1
        let judge = ScriptedJudge::sequence(&[ONE, TWO, ONE]);
        let solutions = candidates(4);
        let best = best_solution(&judge, &solutions, &policy(), &JudgeOptions::default())
            .await
            .unwrap();
        assert_eq!(best, solutions[1]);
    }

    #[tokio::test]
    async fn test_invalid_answer_retries_same_comparison() {
        let judge = ScriptedJudge::sequence(&["no idea", "{\"Answer\": \"both\"}", TWO]);
        let solutions = candidates(2);
        let best = best_solution(&judge, &solutions, &policy(), &JudgeOptions::default())
            .await
            .unwrap();
        assert_eq!(best, solutions[1]);
        assert_eq!(judge.calls(), 3);
    }

    #[tokio::test]
    async fn test_failure_counter_resets_after_success() {
        let judge = ScriptedJudge::sequence(&["", "", ONE, "", "", ONE]);
        let solutions = candidates(3);
        let best = best_solution(&judge, &solutions, &policy(), &JudgeOptions::default())
            .await
            .unwrap();
        assert_eq!(best, solutions[0]);
        assert_eq!(judge.calls(), 6);
    }

    #[tokio::test]
    async fn test_degraded_judge_fails_after_three_attempts() {
        let judge = ScriptedJudge::constant("");
        let err = best_solution(&judge, &candidates(3), &policy(), &JudgeOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AliError::SortingFailure { attempts: 3, .. }));
        assert_eq!(judge.calls(), 3);
    }

    #[tokio::test]
    async fn test_empty_input_is_rejected() {
        let judge = ScriptedJudge::constant(ONE);
        let err = best_solution(&judge, &[], &policy(), &JudgeOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AliError::InvalidInput(_)));
        assert_eq!(judge.calls(), 0);
    }

    #[tokio::test]
    async fn test_comparisons_are_counted() {
        let metrics = PipelineMetrics::new().unwrap();
        let judge = ScriptedJudge::sequence(&["garbage", ONE]);
        run_tournament(&judge, &candidates(2), &policy(), &JudgeOptions::default(), Some(&metrics))
            .await
            .unwrap();

        let text = metrics.encode_text().unwrap();
        assert!(text.contains("ali_sort_comparisons_total{result=\"decided\"} 1"));
        assert!(text.contains("ali_sort_comparisons_total{result=\"invalid\"} 1"));
    }
}
