//! appconfig - deploy and operate registered web apps

use clap::Parser;
use tracing_subscriber::EnvFilter;

use appconfig_cli::cli::Cli;

/// Env var holding the log filter, e.g. `APPCONFIG_LOG=appconfig_cli=debug`.
const LOG_ENV: &str = "APPCONFIG_LOG";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    if let Err(e) = cli.run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
