//! # yamlet CLI Entry Point
//!
//! Parses arguments, initializes tracing, and exits 1 when any validated
//! document is invalid.

use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cli = yamlet_cli::Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let all_valid = yamlet_cli::run(&cli)?;
    if !all_valid {
        std::process::exit(1);
    }
    Ok(())
}
