//! Telemetry for the judgment pipeline
//!
//! Logging goes through `tracing` at the call sites; this module holds the
//! Prometheus counters that summarize judge traffic and pipeline outcomes.

pub mod metrics;

pub use metrics::PipelineMetrics;
