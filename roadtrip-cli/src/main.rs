//! Binary crate for the `roadtrip` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration
//! - Human-friendly output formatting

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod render;

fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "roadtrip=warn,roadtrip_core=warn",
        1 => "roadtrip=info,roadtrip_core=info",
        _ => "roadtrip=debug,roadtrip_core=debug",
    }
}

/// Logs go to stderr so `plan --json` output stays clean.
fn init_tracing(verbose: u8) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(verbose).into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();
    init_tracing(cmd.verbose);
    cmd.run().await
}
