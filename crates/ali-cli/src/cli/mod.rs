//! CLI module for `ali`
//!
//! Command-line access to the policy-aligned resolution pipeline: policy
//! inspection, filtering, sorting, scenario replay and raw judge questions.

pub mod commands;
pub mod output;

pub use commands::{AliCli, AliCommands};

use ali_core::AliError;

/// Exit codes for CLI operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Successful execution
    Success = 0,
    /// Invalid input or arguments
    InvalidInput = 3,
    /// File not found or inaccessible
    FileError = 4,
    /// Policy, judge configuration or model errors
    ConfigurationError = 5,
    /// Internal error
    InternalError = 10,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl ExitCode {
    /// Exit code for a failed command
    pub fn from_error(error: &anyhow::Error) -> Self {
        match error.downcast_ref::<AliError>() {
            Some(AliError::InvalidInput(_)) => ExitCode::InvalidInput,
            Some(AliError::FileError(_)) => ExitCode::FileError,
            Some(AliError::Configuration(_)) => ExitCode::ConfigurationError,
            _ => ExitCode::InternalError,
        }
    }
}

/// Run the CLI with the given arguments and return the exit code
pub async fn run(cli: AliCli) -> anyhow::Result<ExitCode> {
    let format = cli.format;
    let config = commands::judge_config(&cli)?;

    match &cli.command {
        AliCommands::Policy { policy } => commands::execute_policy(policy, format),
        AliCommands::Filter { policy, solutions } => {
            commands::execute_filter(&config, policy, solutions, format).await
        }
        AliCommands::Sort { policy, solutions } => {
            commands::execute_sort(&config, policy, solutions, format).await
        }
        AliCommands::Resolve {
            policy,
            scenario,
            grace,
            metrics,
        } => commands::execute_resolve(&config, policy, scenario, *grace, *metrics, format).await,
        AliCommands::Ask { prompt, system } => {
            commands::execute_ask(&config, system, prompt, format).await
        }
    }
}

/// Run the CLI, reporting any error on stderr
pub async fn run_cli(cli: AliCli) -> ExitCode {
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from_error(&e)
        }
    }
}
