//! ALI command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Show the rules of a policy
//! ali policy --policy atco-policy.json
//!
//! # Filter and rank candidate maneuvers
//! ali filter --policy atco-policy.json --solutions candidates.yaml
//! ali sort --policy atco-policy.json --solutions candidates.yaml --format json
//!
//! # Replay a scenario through the decision loop
//! ali --config ali.toml resolve --policy atco-policy.json --scenario scenario.yaml --metrics
//! ```
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 3: Invalid input or arguments
//! - 4: File not found or inaccessible
//! - 5: Configuration error (policy, judge options, unavailable model)
//! - 10: Internal error

mod cli;

use clap::Parser;
use cli::{run_cli, AliCli};
use tracing_subscriber::EnvFilter;

fn init_tracing(cli: &AliCli) {
    let level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if cli.log_json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() {
    let cli = AliCli::parse();
    init_tracing(&cli);

    let exit_code = run_cli(cli).await;
    std::process::exit(exit_code.into());
}
