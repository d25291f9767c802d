//! Prometheus metrics for the judgment pipeline
//!
//! - `ali_judge_requests_total` (counter) - questions put to the judge
//! - `ali_judge_attempt_failures_total` (counter) - failed transport attempts
//! - `ali_judge_degraded_total` (counter) - questions answered with empty text
//! - `ali_filter_decisions_total` (counter) - filtering verdicts by decision
//! - `ali_sort_comparisons_total` (counter) - tournament comparisons by result
//! - `ali_fallbacks_total` (counter) - pipeline fallbacks by stage
//! - `ali_tracker_evictions_total` (counter) - lifecycle exits by reason
//! - `ali_resolutions_total` (counter) - solutions handed to execution

use prometheus::{Counter, CounterVec, Encoder, Opts, Registry, TextEncoder};

use crate::error::{AliError, Result};

const NAMESPACE: &str = "ali";

/// Pipeline metrics bound to their own registry
#[derive(Clone)]
pub struct PipelineMetrics {
    registry: Registry,
    judge_requests_total: Counter,
    judge_attempt_failures_total: Counter,
    judge_degraded_total: Counter,
    filter_decisions_total: CounterVec,
    sort_comparisons_total: CounterVec,
    fallbacks_total: CounterVec,
    tracker_evictions_total: CounterVec,
    resolutions_total: Counter,
}

impl PipelineMetrics {
    /// Create the metrics and register them with a fresh registry
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let judge_requests_total = Counter::with_opts(
            Opts::new("judge_requests_total", "Questions put to the judge").namespace(NAMESPACE),
        )?;
        let judge_attempt_failures_total = Counter::with_opts(
            Opts::new(
                "judge_attempt_failures_total",
                "Judge transport attempts that failed and were retried or abandoned",
            )
            .namespace(NAMESPACE),
        )?;
        let judge_degraded_total = Counter::with_opts(
            Opts::new(
                "judge_degraded_total",
                "Questions answered with empty text after exhausting retries",
            )
            .namespace(NAMESPACE),
        )?;
        let filter_decisions_total = CounterVec::new(
            Opts::new("filter_decisions_total", "Filtering verdicts by decision")
                .namespace(NAMESPACE),
            &["decision"],
        )?;
        let sort_comparisons_total = CounterVec::new(
            Opts::new("sort_comparisons_total", "Tournament comparisons by result")
                .namespace(NAMESPACE),
            &["result"],
        )?;
        let fallbacks_total = CounterVec::new(
            Opts::new("fallbacks_total", "Pipeline fallbacks by stage").namespace(NAMESPACE),
            &["stage"],
        )?;
        let tracker_evictions_total = CounterVec::new(
            Opts::new(
                "tracker_evictions_total",
                "Conflicts leaving resolution tracking by reason",
            )
            .namespace(NAMESPACE),
            &["reason"],
        )?;
        let resolutions_total = Counter::with_opts(
            Opts::new("resolutions_total", "Solutions handed over for execution")
                .namespace(NAMESPACE),
        )?;

        registry.register(Box::new(judge_requests_total.clone()))?;
        registry.register(Box::new(judge_attempt_failures_total.clone()))?;
        registry.register(Box::new(judge_degraded_total.clone()))?;
        registry.register(Box::new(filter_decisions_total.clone()))?;
        registry.register(Box::new(sort_comparisons_total.clone()))?;
        registry.register(Box::new(fallbacks_total.clone()))?;
        registry.register(Box::new(tracker_evictions_total.clone()))?;
        registry.register(Box::new(resolutions_total.clone()))?;

        Ok(Self {
            registry,
            judge_requests_total,
            judge_attempt_failures_total,
            judge_degraded_total,
            filter_decisions_total,
            sort_comparisons_total,
            fallbacks_total,
            tracker_evictions_total,
            resolutions_total,
        })
    }

    pub fn record_judge_request(&self) {
        self.judge_requests_total.inc();
    }

    pub fn record_attempt_failure(&self) {
        self.judge_attempt_failures_total.inc();
    }

    pub fn record_degraded(&self) {
        self.judge_degraded_total.inc();
    }

    pub fn record_filter_decision(&self, kept: bool) {
        let decision = if kept { "kept" } else { "dropped" };
        self.filter_decisions_total.with_label_values(&[decision]).inc();
    }

    pub fn record_comparison(&self, decided: bool) {
        let result = if decided { "decided" } else { "invalid" };
        self.sort_comparisons_total.with_label_values(&[result]).inc();
    }

    /// `stage` is `filtering` or `sorting`
    pub fn record_fallback(&self, stage: &str) {
        self.fallbacks_total.with_label_values(&[stage]).inc();
    }

    /// `reason` is `resolved` or `stale`
    pub fn record_eviction(&self, reason: &str) {
        self.tracker_evictions_total.with_label_values(&[reason]).inc();
    }

    pub fn record_resolution(&self) {
        self.resolutions_total.inc();
    }

    /// Encode every metric in the Prometheus text format
    pub fn encode_text(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| AliError::Metrics(e.to_string()))
    }
}

impl std::fmt::Debug for PipelineMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineMetrics").finish_non_exhaustive()
    }
}
