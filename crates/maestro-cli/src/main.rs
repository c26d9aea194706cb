//! Maestro CLI - route tasks across specialized LLM agents
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::panic,
        clippy::missing_panics_doc,
        clippy::assertions_on_result_states,
        reason = "Allow for tests"
    )
)]

use anyhow::Result;
use clap::Parser as _;
use cli::Cli;
use std::io;
use tracing_subscriber::{
    EnvFilter, Registry, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

mod cli;
mod handlers;
mod runtime;

/// Logs go to stderr so command output stays pipeable.
fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "maestro=debug,maestro_agent=debug,maestro_routing=debug,maestro_providers=debug"
    } else {
        "maestro=info,maestro_agent=info,maestro_routing=info,maestro_providers=warn"
    };

    Registry::default()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(verbose)
                .with_level(true),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    handlers::dispatch(cli).await
}
