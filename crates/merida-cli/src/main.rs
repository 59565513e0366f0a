//! # MERIDA CLI
//!
//! Command-line access to the MERIDA Smart Grow platform.

#![forbid(unsafe_code)]

use clap::Parser;
use merida_cli::{cli::Cli, commands, config::default_log_filter, output::error, Context};
use merida_core::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_log_filter(cli.verbose).into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            error(&format!("Failed to load configuration: {}", e));
            std::process::exit(1);
        }
    };

    let ctx = match Context::new(config, &cli) {
        Ok(ctx) => ctx,
        Err(e) => {
            error(&e.to_string());
            std::process::exit(1);
        }
    };
    tracing::debug!(app = %ctx.config.app.name, version = %ctx.config.app.version, "starting");

    if let Err(e) = commands::run(cli.command, &ctx).await {
        error(&e.to_string());
        std::process::exit(1);
    }
}
