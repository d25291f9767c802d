//! Output formatting for the `ali` CLI
//!
//! Every command result can be printed as a colored table for operators, or
//! as JSON/YAML for scripts.

use ali_core::{AliError, CycleReport, Policy, Resolution, Solution};
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use std::io::{self, Write};

/// Output format options for CLI results
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Default)]
pub enum OutputFormat {
    /// Human-readable table format with colors
    #[default]
    Table,
    /// JSON format for machine processing
    Json,
    /// YAML format
    Yaml,
}

/// Print `value` as JSON or YAML, or call `table` for the table format
pub fn render<T: Serialize>(
    value: &T,
    format: OutputFormat,
    table: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> Result<(), AliError> {
    let mut stdout = io::stdout().lock();
    match format {
        OutputFormat::Json => writeln!(stdout, "{}", serde_json::to_string_pretty(value)?)?,
        OutputFormat::Yaml => writeln!(stdout, "{}", serde_yaml::to_string(value)?)?,
        OutputFormat::Table => table(value, &mut stdout)?,
    }
    stdout.flush()?;
    Ok(())
}

fn header(out: &mut dyn Write, title: &str) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", title.cyan().bold())?;
    writeln!(out, "{}", "=".repeat(60))
}

#[derive(Debug, Clone, Serialize)]
pub struct RuleOutput {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PolicyOutput {
    pub filtering_rules: Vec<RuleOutput>,
    pub sorting_rules: Vec<RuleOutput>,
}

impl PolicyOutput {
    pub fn from_policy(policy: &Policy) -> Self {
        let rules = |rules: &[ali_core::Rule]| {
            rules
                .iter()
                .map(|r| RuleOutput {
                    id: r.id.clone(),
                    text: r.value.clone(),
                })
                .collect()
        };
        Self {
            filtering_rules: rules(policy.filtering_rules()),
            sorting_rules: rules(policy.sorting_rules()),
        }
    }

    pub fn render_table(&self, out: &mut dyn Write) -> io::Result<()> {
        header(out, "Policy")?;
        writeln!(out, "{}", "Filtering rules (hard):".bold())?;
        for rule in &self.filtering_rules {
            writeln!(out, "  {} {}", format!("{}:", rule.id).yellow(), rule.text)?;
        }
        writeln!(out, "{}", "Sorting rules (by priority):".bold())?;
        for (rank, rule) in self.sorting_rules.iter().enumerate() {
            writeln!(
                out,
                "  {}. {} {}",
                rank + 1,
                format!("{}:", rule.id).yellow(),
                rule.text
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FilterOutput {
    pub candidates: usize,
    pub kept: usize,
    pub mask: Vec<bool>,
    pub survivors: Vec<Solution>,
}

impl FilterOutput {
    pub fn render_table(&self, out: &mut dyn Write, all: &[Solution]) -> io::Result<()> {
        header(out, "Filtering Results")?;
        writeln!(out, "{} of {} candidates kept", self.kept, self.candidates)?;
        writeln!(out, "{}", "-".repeat(60))?;
        for (index, (solution, kept)) in all.iter().zip(&self.mask).enumerate() {
            let status = if *kept { "+ kept".green() } else { "x dropped".red() };
            writeln!(out, "{} [{}] {}", status, index + 1, solution.callsign.cyan())?;
            for command in &solution.commands {
                writeln!(out, "    {}", command.to_string().dimmed())?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SortOutput {
    pub candidates: usize,
    pub best: Solution,
}

impl SortOutput {
    pub fn render_table(&self, out: &mut dyn Write) -> io::Result<()> {
        header(out, "Best Solution")?;
        writeln!(out, "Chosen among {} candidates", self.candidates)?;
        writeln!(out, "{}", self.best.pretty_print())?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CycleOutput {
    pub time: f64,
    pub detected: usize,
    pub skipped: usize,
    pub resolved: Vec<Resolution>,
    pub unresolved: Vec<String>,
    pub evicted_resolved: usize,
    pub evicted_stale: usize,
}

impl From<&CycleReport> for CycleOutput {
    fn from(report: &CycleReport) -> Self {
        Self {
            time: report.time,
            detected: report.detected,
            skipped: report.skipped.len(),
            resolved: report.resolved.clone(),
            unresolved: report.unresolved.iter().map(|c| c.to_string()).collect(),
            evicted_resolved: report.evicted.resolved.len(),
            evicted_stale: report.evicted.stale.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolveOutput {
    pub cycles: Vec<CycleOutput>,
    pub stopped_early: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<String>,
}

impl ResolveOutput {
    pub fn resolutions(&self) -> usize {
        self.cycles.iter().map(|c| c.resolved.len()).sum()
    }

    pub fn render_table(&self, out: &mut dyn Write) -> io::Result<()> {
        header(out, "Resolution Replay")?;
        for cycle in &self.cycles {
            writeln!(
                out,
                "{} detected={} skipped={} resolved={} stale={}",
                format!("t={:>7.1}s", cycle.time).bold(),
                cycle.detected,
                cycle.skipped,
                cycle.resolved.len().to_string().green(),
                cycle.evicted_stale.to_string().yellow()
            )?;
            for resolution in &cycle.resolved {
                writeln!(
                    out,
                    "  {} {} -> {}",
                    "+".green(),
                    resolution.conflict,
                    resolution.solution.callsign.cyan()
                )?;
            }
            for conflict in &cycle.unresolved {
                writeln!(out, "  {} {} unresolved", "x".red(), conflict)?;
            }
        }
        writeln!(out, "{}", "-".repeat(60))?;
        writeln!(
            out,
            "{} solutions issued over {} cycles",
            self.resolutions(),
            self.cycles.len()
        )?;
        if self.stopped_early {
            writeln!(out, "{}", "Stopped before the end of the scenario".yellow())?;
        }
        if let Some(metrics) = &self.metrics {
            writeln!(out)?;
            writeln!(out, "{}", metrics.dimmed())?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AskOutput {
    pub model: String,
    pub answer: String,
}

impl AskOutput {
    pub fn render_table(&self, out: &mut dyn Write) -> io::Result<()> {
        header(out, &format!("Judge ({})", self.model))?;
        if self.answer.is_empty() {
            writeln!(out, "{}", "! no answer (judge unreachable?)".yellow())?;
        } else {
            writeln!(out, "{}", self.answer)?;
        }
        Ok(())
    }
}
