//! ALI Core
//!
//! Policy-aligned selection of air-traffic conflict resolutions, with a
//! language model acting as judge.
//!
//! ## Features
//!
//! - **Policy**: hard filtering rules and priority-ordered sorting rules loaded from JSON or YAML
//! - **Filtering**: drop candidate maneuvers that break a hard rule
//! - **Sorting**: pairwise tournament picking the maneuver the soft rules prefer
//! - **Judge gateway**: bounded retries with linear backoff, degrading to an empty reply
//! - **Answer parsing**: the only place judge text is trusted
//! - **Lifecycle tracking**: conflicts under resolution are skipped until resolved or stale
//! - **Telemetry**: Prometheus counters for judge traffic and fallbacks
//!
//! ## Architecture
//!
//! 1. **Policy** (`policy`) and **maneuvers** (`maneuver`): value types.
//! 2. **Judge** (`judge/`): the [`Judge`] capability, the Ollama transport and
//!    the retrying [`JudgeGateway`].
//! 3. **Answer** (`answer`): structured decisions from free text.
//! 4. **Engine** (`engine/`): filtering and sorting.
//! 5. **Lifecycle** (`lifecycle`) and **pipeline** (`pipeline`): the decision loop.
//!
//! ## Example
//!
//! ```rust,no_run
//! use ali_core::{
//!     best_solution, filter_solutions, Command, JudgeConfig, JudgeGateway, OllamaClient,
//!     Policy, Solution,
//! };
//!
//! #[tokio::main]
//! async fn main() -> ali_core::Result<()> {
//!     let policy = Policy::load("atco-policy.json")?;
//!     let config = JudgeConfig::default();
//!     let judge = JudgeGateway::new(OllamaClient::from_config(&config)?);
//!
//!     let candidates = vec![
//!         Solution::new("KLM12", vec![Command::heading(60, 90)]),
//!         Solution::new("KLM12", vec![Command::altitude(60, 9000)]),
//!     ];
//!     let valid = filter_solutions(&judge, &candidates, &policy, &config.options).await?;
//!     let best = best_solution(&judge, &valid, &policy, &config.options).await?;
//!     println!("{}", best.pretty_print());
//!     Ok(())
//! }
//! ```

pub mod answer;
pub mod config;
pub mod engine;
pub mod error;
pub mod judge;
pub mod lifecycle;
pub mod maneuver;
pub mod pipeline;
pub mod policy;
pub mod telemetry;

pub use answer::{parse_answer, JudgeDecision, FILTERING_ANSWERS, SORTING_ANSWERS};
pub use config::JudgeConfig;
pub use engine::{best_solution, filter_solutions, filter_with_mask, FilteringOutcome};
pub use error::{AliError, Result};
pub use judge::{ChatTransport, Judge, JudgeGateway, JudgeOptions, OllamaClient, RetryPolicy};
pub use lifecycle::{ConflictResolutionRecord, ConflictTracker, Eviction};
pub use maneuver::{CallsignPair, Command, CommandKind, Conflict, Solution};
pub use pipeline::{CandidateSource, ClearanceSink, CycleReport, Pipeline, Resolution, Tick};
pub use policy::{Policy, Rule};
pub use telemetry::PipelineMetrics;
