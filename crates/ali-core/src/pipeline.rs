//! Decision loop
//!
//! One cycle takes the conflicts detected at a point in simulation time,
//! forgets conflicts that are resolved or stale, and resolves every conflict
//! not already under resolution: candidates are requested from a
//! [`CandidateSource`], filtered, sorted, and the winner is handed to a
//! [`ClearanceSink`]. Failures are contained per conflict: filtering falls
//! back to all candidates, sorting falls back to the first candidate, and
//! collaborator errors are logged.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::engine::filtering::run_filtering;
use crate::engine::sorting::run_tournament;
use crate::error::{AliError, Result};
use crate::judge::{Judge, JudgeOptions};
use crate::lifecycle::{ConflictTracker, Eviction};
use crate::maneuver::{Conflict, Solution};
use crate::policy::Policy;
use crate::telemetry::PipelineMetrics;

/// Produces candidate maneuvers for a conflict
#[async_trait]
pub trait CandidateSource: Send {
    async fn candidates(&mut self, conflict: &Conflict, now: f64) -> Result<Vec<Solution>>;
}

/// Executes the chosen maneuver
#[async_trait]
pub trait ClearanceSink: Send {
    async fn execute(&mut self, conflict: &Conflict, solution: &Solution) -> Result<()>;
}

/// Detected conflicts at one point in simulation time
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tick {
    /// Simulation time, seconds
    pub time: f64,
    #[serde(default)]
    pub conflicts: Vec<Conflict>,
}

/// A conflict and the solution issued for it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub conflict: Conflict,
    pub solution: Solution,
}

/// What happened in one cycle
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub time: f64,
    pub detected: usize,
    /// Conflicts left alone because a solution is already in flight
    pub skipped: Vec<Conflict>,
    pub resolved: Vec<Resolution>,
    /// Conflicts for which no solution could be issued
    pub unresolved: Vec<Conflict>,
    pub evicted: Eviction,
}

pub struct Pipeline {
    judge: Arc<dyn Judge>,
    policy: Arc<Policy>,
    options: JudgeOptions,
    tracker: ConflictTracker,
    metrics: Option<Arc<PipelineMetrics>>,
}

impl Pipeline {
    pub fn new(judge: Arc<dyn Judge>, policy: Arc<Policy>, options: JudgeOptions) -> Self {
        Self {
            judge,
            policy,
            options,
            tracker: ConflictTracker::new(),
            metrics: None,
        }
    }

    pub fn with_tracker(mut self, tracker: ConflictTracker) -> Self {
        self.tracker = tracker;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<PipelineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn tracker(&self) -> &ConflictTracker {
        &self.tracker
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Filter `candidates`, or return them all when filtering is unusable
    pub async fn try_filtering(&self, candidates: &[Solution]) -> Vec<Solution> {
        let outcome = run_filtering(
            self.judge.as_ref(),
            candidates,
            &self.policy,
            &self.options,
            self.metrics.as_deref(),
        )
        .await
        .and_then(|outcome| {
            if outcome.survivors.is_empty() {
                Err(AliError::FilteringFailure(
                    "no solution survived filtering; the policy may be too strict, \
                     the candidates not diverse enough, or the judge wrong"
                        .to_string(),
                ))
            } else {
                Ok(outcome.survivors)
            }
        });

        match outcome {
            Ok(survivors) => survivors,
            Err(e) => {
                tracing::info!(error = %e, "Failed to filter solutions");
                tracing::debug!(
                    error = ?e,
                    candidates = candidates.len(),
                    "Filtering error detail"
                );
                tracing::warn!("Filtering skipped; keeping all candidates");
                if let Some(metrics) = &self.metrics {
                    metrics.record_fallback("filtering");
                }
                candidates.to_vec()
            }
        }
    }

    /// Pick the preferred candidate, or the first one when sorting fails
    pub async fn try_sorting(&self, candidates: &[Solution]) -> Option<Solution> {
        let first = candidates.first()?;
        match run_tournament(
            self.judge.as_ref(),
            candidates,
            &self.policy,
            &self.options,
            self.metrics.as_deref(),
        )
        .await
        {
            Ok(best) => Some(best),
            Err(e) => {
                tracing::info!(error = %e, "Failed to sort solutions");
                tracing::debug!(
                    error = ?e,
                    candidates = candidates.len(),
                    "Sorting error detail"
                );
                if let Some(metrics) = &self.metrics {
                    metrics.record_fallback("sorting");
                }
                Some(first.clone())
            }
        }
    }

    /// Filter then sort the candidates of one conflict
    pub async fn resolve_conflict(
        &self,
        conflict: &Conflict,
        candidates: &[Solution],
    ) -> Option<Solution> {
        if candidates.is_empty() {
            tracing::warn!(conflict = %conflict, "No candidate solutions");
            return None;
        }

        let valid = self.try_filtering(candidates).await;
        let best = self.try_sorting(&valid).await?;
        tracing::info!(
            conflict = %conflict,
            solution = %best.pretty_print(),
            "Best solution chosen"
        );
        Some(best)
    }

    /// Run one detect, evict, resolve cycle
    pub async fn run_cycle(
        &mut self,
        detected: &[Conflict],
        now: f64,
        source: &mut dyn CandidateSource,
        sink: &mut dyn ClearanceSink,
    ) -> CycleReport {
        let evicted = self.tracker.evict(detected, now);
        if let Some(metrics) = &self.metrics {
            for _ in &evicted.resolved {
                metrics.record_eviction("resolved");
            }
            for _ in &evicted.stale {
                metrics.record_eviction("stale");
            }
        }

        let mut report = CycleReport {
            time: now,
            detected: detected.len(),
            evicted,
            ..CycleReport::default()
        };

        for conflict in detected {
            if self.tracker.is_tracked(conflict) {
                report.skipped.push(conflict.clone());
                continue;
            }
            tracing::info!(
                conflict = %conflict,
                dcpa = conflict.dcpa,
                tcpa = conflict.tcpa,
                "Resolving conflict"
            );

            let candidates = match source.candidates(conflict, now).await {
                Ok(candidates) => candidates,
                Err(e) => {
                    tracing::error!(
                        conflict = %conflict,
                        error = %e,
                        "Failed to generate candidate solutions"
                    );
                    report.unresolved.push(conflict.clone());
                    continue;
                }
            };

            let Some(best) = self.resolve_conflict(conflict, &candidates).await else {
                report.unresolved.push(conflict.clone());
                continue;
            };

            if let Err(e) = sink.execute(conflict, &best).await {
                tracing::error!(conflict = %conflict, error = %e, "Failed to execute solution");
                report.unresolved.push(conflict.clone());
                continue;
            }

            if let Some(metrics) = &self.metrics {
                metrics.record_resolution();
            }
            self.tracker.register(conflict.clone(), best.clone(), now);
            report.resolved.push(Resolution {
                conflict: conflict.clone(),
                solution: best,
            });
        }

        report
    }

    /// Run cycles until the ticks run out or `stop` is raised
    ///
    /// `stop` is only checked before a cycle starts; a cycle in progress
    /// finishes its judge calls.
    pub async fn run<I>(
        &mut self,
        ticks: I,
        stop: &AtomicBool,
        source: &mut dyn CandidateSource,
        sink: &mut dyn ClearanceSink,
    ) -> Vec<CycleReport>
    where
        I: IntoIterator<Item = Tick>,
    {
        let mut reports = Vec::new();
        for tick in ticks {
            if stop.load(Ordering::SeqCst) {
                tracing::info!(time = tick.time, "Stop requested; leaving decision loop");
                break;
            }
            reports.push(self.run_cycle(&tick.conflicts, tick.time, source, sink).await);
        }
        reports
    }
}
