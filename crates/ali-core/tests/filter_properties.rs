//! Filtering and sorting properties with a deterministic judge

use ali_core::{
    best_solution, filter_solutions, Command, CommandKind, Judge, JudgeOptions, Policy, Rule,
    Solution,
};
use async_trait::async_trait;
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Flags any solution whose prompt mentions an altitude change; prefers the
/// first solution in every comparison
#[derive(Default)]
struct RuleJudge {
    calls: AtomicUsize,
}

#[async_trait]
impl Judge for RuleJudge {
    async fn ask(&self, _system: &str, user: &str, _options: &JudgeOptions) -> String {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if user.contains("# Solution 1") {
            r#"{"Explanation": "rule S1", "Answer": "Solution 1"}"#.to_string()
        } else if user.contains("Change altitude") {
            r#"{"Explanation": "altitude is changed", "Answer": "yes"}"#.to_string()
        } else {
            r#"{"Explanation": "no rule applies", "Answer": "no"}"#.to_string()
        }
    }
}

fn policy() -> Policy {
    Policy::new(
        vec![Rule::new("F1", "No altitude changes are allowed.")],
        vec![Rule::new("S1", "Prefer the earliest maneuver.")],
    )
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn arb_command() -> impl Strategy<Value = Command> {
    let kind = prop_oneof![
        Just(CommandKind::Heading),
        Just(CommandKind::Altitude),
        Just(CommandKind::Speed),
    ];
    (kind, 0u64..3600, 0i64..12000).prop_map(|(kind, time, value)| Command::new(kind, time, value))
}

fn arb_solution() -> impl Strategy<Value = Solution> {
    ("[A-Z]{3}[0-9]{1,3}", prop::collection::vec(arb_command(), 0..4))
        .prop_map(|(callsign, commands)| Solution::new(callsign, commands))
}

fn is_subsequence(sub: &[Solution], full: &[Solution]) -> bool {
    let mut rest = full.iter();
    sub.iter().all(|s| rest.any(|f| f == s))
}

proptest! {
    #[test]
    fn filtered_set_is_ordered_subsequence(
        solutions in prop::collection::vec(arb_solution(), 0..8),
    ) {
        let judge = RuleJudge::default();
        let kept = runtime()
            .block_on(filter_solutions(&judge, &solutions, &policy(), &JudgeOptions::default()))
            .unwrap();

        prop_assert!(is_subsequence(&kept, &solutions));
        prop_assert!(kept.iter().all(|s| !s.touches(CommandKind::Altitude)));
        prop_assert_eq!(judge.calls.load(Ordering::SeqCst), solutions.len());
    }

    #[test]
    fn filtering_is_idempotent(solutions in prop::collection::vec(arb_solution(), 0..8)) {
        let judge = RuleJudge::default();
        let rt = runtime();
        let once = rt
            .block_on(filter_solutions(&judge, &solutions, &policy(), &JudgeOptions::default()))
            .unwrap();
        let twice = rt
            .block_on(filter_solutions(&judge, &once, &policy(), &JudgeOptions::default()))
            .unwrap();

        prop_assert_eq!(once, twice);
    }

    #[test]
    fn tournament_uses_at_most_n_minus_one_comparisons(
        solutions in prop::collection::vec(arb_solution(), 1..8),
    ) {
        let judge = RuleJudge::default();
        let best = runtime()
            .block_on(best_solution(&judge, &solutions, &policy(), &JudgeOptions::default()))
            .unwrap();

        prop_assert_eq!(&best, &solutions[0]);
        prop_assert_eq!(judge.calls.load(Ordering::SeqCst), solutions.len() - 1);
    }
}
