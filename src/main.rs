//! Libpack - zero-config bundling for JavaScript and TypeScript libraries
//!
//! Expands entries and module formats into a deterministic build matrix,
//! hands every unit to an external bundler and, in watch mode, rebuilds on
//! change while managing user hook processes.
//!
//! # Features
//! - CommonJS, ES module, UMD and SystemJS output
//! - Development and production builds per format
//! - Watch mode with first-success, success and failure hooks

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use libpack::Cli;

/// Initialize the logging/tracing system
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("libpack=debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("libpack=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    cli.execute().await
}
