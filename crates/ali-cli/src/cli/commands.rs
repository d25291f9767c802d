//! CLI command definitions for `ali`
//!
//! Clap-based commands for inspecting a policy, filtering and sorting
//! candidate maneuvers, replaying a conflict scenario through the decision
//! loop, and sending a raw question to the judge.

use ali_core::{
    filter_with_mask, AliError, CallsignPair, CandidateSource, ClearanceSink, Conflict,
    ConflictTracker, JudgeConfig, JudgeGateway, OllamaClient, Pipeline, PipelineMetrics, Policy,
    Solution, Tick,
};
use anyhow::Context;
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::output::{
    render, AskOutput, CycleOutput, FilterOutput, OutputFormat, PolicyOutput, ResolveOutput,
    SortOutput,
};
use super::ExitCode;

/// ALI: policy-aligned conflict resolution
///
/// Filters and ranks candidate air-traffic conflict resolutions against a
/// natural-language policy, with a language model acting as judge.
#[derive(Parser, Debug)]
#[command(name = "ali")]
#[command(
    about = "Policy-aligned conflict resolution with a language-model judge",
    long_about = None
)]
#[command(version)]
pub struct AliCli {
    /// Output verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Output format for results
    #[arg(long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,

    /// Judge configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Judge server URL, overrides the configuration file
    #[arg(long, env = "ALI_JUDGE_HOST", global = true)]
    pub host: Option<String>,

    /// Judge model, overrides the configuration file
    #[arg(long, env = "ALI_JUDGE_MODEL", global = true)]
    pub model: Option<String>,

    #[command(subcommand)]
    pub command: AliCommands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum AliCommands {
    /// Print the rules of a policy
    Policy {
        /// Policy file (JSON or YAML)
        #[arg(short, long)]
        policy: PathBuf,
    },

    /// Drop candidates that violate a filtering rule
    Filter {
        /// Policy file (JSON or YAML)
        #[arg(short, long)]
        policy: PathBuf,

        /// Candidate solutions file (JSON or YAML list)
        #[arg(short, long)]
        solutions: PathBuf,
    },

    /// Pick the candidate preferred by the sorting rules
    Sort {
        /// Policy file (JSON or YAML)
        #[arg(short, long)]
        policy: PathBuf,

        /// Candidate solutions file (JSON or YAML list)
        #[arg(short, long)]
        solutions: PathBuf,
    },

    /// Replay a conflict scenario through the decision loop
    ///
    /// Ctrl-C stops the replay before the next cycle.
    Resolve {
        /// Policy file (JSON or YAML)
        #[arg(short, long)]
        policy: PathBuf,

        /// Scenario file (JSON or YAML list of ticks)
        #[arg(long)]
        scenario: PathBuf,

        /// Seconds after a solution's first command before its conflict is reprocessed
        #[arg(long, default_value_t = ali_core::lifecycle::DEFAULT_GRACE_PERIOD)]
        grace: f64,

        /// Print Prometheus metrics after the replay
        #[arg(long)]
        metrics: bool,
    },

    /// Send one question to the judge and print the raw answer
    Ask {
        /// User prompt
        #[arg(long)]
        prompt: String,

        /// System context
        #[arg(long, default_value = "You are an assistant to an Air Traffic Controller.")]
        system: String,
    },
}

/// Scenario conflict with the candidates the solver offered for it
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioConflict {
    pub callsigns: CallsignPair,
    #[serde(default)]
    pub dcpa: f64,
    #[serde(default)]
    pub tcpa: f64,
    #[serde(default)]
    pub candidates: Vec<Solution>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioTick {
    pub time: f64,
    #[serde(default)]
    pub conflicts: Vec<ScenarioConflict>,
}

/// Candidates taken from a scenario file
///
/// For a conflict at time `now`, the candidates listed at the latest tick
/// not after `now` are offered. Ticks that list a conflict without
/// candidates keep the earlier offer.
#[derive(Debug, Default)]
pub struct ScenarioSource {
    offers: HashMap<CallsignPair, Vec<(f64, Vec<Solution>)>>,
}

impl ScenarioSource {
    pub fn from_ticks(ticks: &[ScenarioTick]) -> Self {
        let mut offers: HashMap<CallsignPair, Vec<(f64, Vec<Solution>)>> = HashMap::new();
        for tick in ticks {
            for conflict in tick.conflicts.iter().filter(|c| !c.candidates.is_empty()) {
                offers
                    .entry(conflict.callsigns.clone())
                    .or_default()
                    .push((tick.time, conflict.candidates.clone()));
            }
        }
        Self { offers }
    }
}

#[async_trait]
impl CandidateSource for ScenarioSource {
    async fn candidates(
        &mut self,
        conflict: &Conflict,
        now: f64,
    ) -> ali_core::Result<Vec<Solution>> {
        self.offers
            .get(&conflict.callsigns)
            .and_then(|offers| {
                offers
                    .iter()
                    .filter(|(time, _)| *time <= now)
                    .last()
                    .map(|(_, solutions)| solutions.clone())
            })
            .ok_or_else(|| {
                AliError::invalid_input(format!(
                    "scenario has no candidates for {} at t={}",
                    conflict, now
                ))
            })
    }
}

/// Prints the scheduled simulator commands of every issued solution
#[derive(Debug, Default)]
pub struct StdoutSink {
    pub echo: bool,
    pub issued: usize,
}

#[async_trait]
impl ClearanceSink for StdoutSink {
    async fn execute(&mut self, conflict: &Conflict, solution: &Solution) -> ali_core::Result<()> {
        let lines = solution.scheduled_commands()?;
        if self.echo {
            println!("# {}", conflict);
            for line in &lines {
                println!("{}", line);
            }
        }
        self.issued += 1;
        Ok(())
    }
}

/// Read a JSON or YAML document, chosen by extension
pub fn load_document<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| AliError::file_error(format!("cannot read {}: {}", path.display(), e)))?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let value = match extension.as_str() {
        "json" => serde_json::from_str(&content).map_err(AliError::from),
        "yaml" | "yml" => serde_yaml::from_str(&content).map_err(AliError::from),
        other => Err(AliError::invalid_input(format!(
            "unsupported file extension '{}' (expected json, yaml or yml)",
            other
        ))),
    };
    value.with_context(|| format!("failed to load {}", path.display()))
}

fn load_policy(path: &Path) -> anyhow::Result<Arc<Policy>> {
    let policy = Policy::load(path)
        .with_context(|| format!("failed to load policy {}", path.display()))?;
    Ok(Arc::new(policy))
}

/// Judge settings after applying the file and command-line overrides
pub fn judge_config(cli: &AliCli) -> anyhow::Result<JudgeConfig> {
    let mut config = match &cli.config {
        Some(path) => JudgeConfig::load(path)
            .with_context(|| format!("failed to load judge configuration {}", path.display()))?,
        None => JudgeConfig::default(),
    };
    if let Some(host) = &cli.host {
        config = config.with_host(host.clone());
    }
    if let Some(model) = &cli.model {
        config = config.with_model(model.clone());
    }
    Ok(config)
}

async fn connect(
    config: &JudgeConfig,
    metrics: Option<Arc<PipelineMetrics>>,
) -> anyhow::Result<JudgeGateway<OllamaClient>> {
    let client = OllamaClient::from_config(config)?;
    client.ensure_model_available().await?;

    let gateway = JudgeGateway::new(client);
    Ok(match metrics {
        Some(metrics) => gateway.with_metrics(metrics),
        None => gateway,
    })
}

/// Execute the policy command
pub fn execute_policy(policy: &Path, format: OutputFormat) -> anyhow::Result<ExitCode> {
    let policy = load_policy(policy)?;
    tracing::debug!(summary = %policy.summary(), "Policy loaded");

    let output = PolicyOutput::from_policy(&policy);
    render(&output, format, |o, out| o.render_table(out))?;
    Ok(ExitCode::Success)
}

/// Execute the filter command
pub async fn execute_filter(
    config: &JudgeConfig,
    policy: &Path,
    solutions: &Path,
    format: OutputFormat,
) -> anyhow::Result<ExitCode> {
    let policy = load_policy(policy)?;
    let candidates: Vec<Solution> = load_document(solutions)?;
    let judge = connect(config, None).await?;

    let outcome = filter_with_mask(&judge, &candidates, &policy, &config.options).await?;
    let output = FilterOutput {
        candidates: candidates.len(),
        kept: outcome.survivors.len(),
        mask: outcome.mask,
        survivors: outcome.survivors,
    };
    render(&output, format, |o, out| o.render_table(out, &candidates))?;
    Ok(ExitCode::Success)
}

/// Execute the sort command
pub async fn execute_sort(
    config: &JudgeConfig,
    policy: &Path,
    solutions: &Path,
    format: OutputFormat,
) -> anyhow::Result<ExitCode> {
    let policy = load_policy(policy)?;
    let candidates: Vec<Solution> = load_document(solutions)?;
    let judge = connect(config, None).await?;

    let best = ali_core::best_solution(&judge, &candidates, &policy, &config.options).await?;
    let output = SortOutput {
        candidates: candidates.len(),
        best,
    };
    render(&output, format, |o, out| o.render_table(out))?;
    Ok(ExitCode::Success)
}

/// Execute the resolve command
pub async fn execute_resolve(
    config: &JudgeConfig,
    policy: &Path,
    scenario: &Path,
    grace: f64,
    with_metrics: bool,
    format: OutputFormat,
) -> anyhow::Result<ExitCode> {
    if !grace.is_finite() || grace < 0.0 {
        return Err(
            AliError::invalid_input("grace period must be a non-negative number of seconds").into(),
        );
    }

    let policy = load_policy(policy)?;
    let ticks: Vec<ScenarioTick> = load_document(scenario)?;
    let metrics = Arc::new(PipelineMetrics::new()?);
    let judge = connect(config, Some(metrics.clone())).await?;

    let mut pipeline = Pipeline::new(Arc::new(judge), policy, config.options)
        .with_tracker(ConflictTracker::new().with_grace_period(grace))
        .with_metrics(metrics.clone());

    let stop = Arc::new(AtomicBool::new(false));
    let signal_stop = stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received; stopping after the current cycle");
            signal_stop.store(true, Ordering::SeqCst);
        }
    });

    let mut source = ScenarioSource::from_ticks(&ticks);
    let mut sink = StdoutSink {
        echo: format == OutputFormat::Table,
        issued: 0,
    };
    let detections: Vec<Tick> = ticks
        .iter()
        .map(|tick| Tick {
            time: tick.time,
            conflicts: tick
                .conflicts
                .iter()
                .map(|c| Conflict {
                    callsigns: c.callsigns.clone(),
                    dcpa: c.dcpa,
                    tcpa: c.tcpa,
                })
                .collect(),
        })
        .collect();

    let reports = pipeline.run(detections, &stop, &mut source, &mut sink).await;
    tracing::info!(cycles = reports.len(), issued = sink.issued, "Scenario replay finished");

    let output = ResolveOutput {
        cycles: reports.iter().map(CycleOutput::from).collect(),
        stopped_early: reports.len() < ticks.len(),
        metrics: if with_metrics {
            Some(metrics.encode_text()?)
        } else {
            None
        },
    };
    render(&output, format, |o, out| o.render_table(out))?;
    Ok(ExitCode::Success)
}

/// Execute the ask command
pub async fn execute_ask(
    config: &JudgeConfig,
    system: &str,
    prompt: &str,
    format: OutputFormat,
) -> anyhow::Result<ExitCode> {
    use ali_core::Judge;

    let judge = connect(config, None).await?;
    let answer = judge.ask(system, prompt, &config.options).await;
    let output = AskOutput {
        model: config.model.clone(),
        answer,
    };
    render(&output, format, |o, out| o.render_table(out))?;
    Ok(ExitCode::Success)
}
