//! # Synthetic Prometheus Server CLI
//!
//! Command-line interface for the synthetic Prometheus server.
//!
//! Every query is answered with generated series; directives embedded in the
//! query select cardinality, value range, curve shape, latency and failures.

use std::io;
use std::net::SocketAddr;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use prom_synth_rs::http::{build_router, AppState};

mod cli;

use cli::Cli;

#[tokio::main]
async fn main() -> io::Result<()> {
    // Initialize logging
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(env_filter).init();

    // Parse CLI arguments
    let cli = Cli::parse();

    let mut builder =
        AppState::builder().with_latency(cli.latency).with_error_rate(cli.error_rate);

    if let Some(fixed_time) = cli.fixed_now {
        builder = builder.with_fixed_now(fixed_time);
    }

    let state = builder.build()?;

    let app = build_router(state);

    let addr: SocketAddr = cli.listen.parse().map_err(io::Error::other)?;
    tracing::info!("starting prom-synth on http://{addr}");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}
