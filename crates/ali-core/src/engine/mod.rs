//! Judgment engines
//!
//! Filtering rejects candidates that break a hard rule; sorting ranks what is
//! left by the ordered soft preferences. Both consult the judge one question
//! at a time and never modify the solutions they are given.

pub mod filtering;
pub mod prompts;
pub mod sorting;

#[cfg(test)]
pub(crate) mod testing;

pub use filtering::{filter_solutions, filter_with_mask, FilteringOutcome};
pub use sorting::{best_solution, MAX_COMPARISON_ATTEMPTS};
