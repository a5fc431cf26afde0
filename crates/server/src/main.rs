//! KB Indexer server (stateless).
//!
//! Simulates a knowledge-base ingestion pipeline without holding any state:
//! uploads return self-describing lifecycle tokens, and status queries
//! recompute each resource's state from the token and the current time.
//!
//! ## Endpoints
//!
//! - `POST /knowledge_bases` - mint a knowledge-base descriptor
//! - `POST /knowledge_bases/:kb_id/resources` - upload, returns a token
//! - `GET /knowledge_bases/:kb_id/resources/children?ids=..` - batch status
//! - `DELETE /knowledge_bases/:kb_id` - logged no-op
//! - `GET /health` - liveness check
//!
//! Configuration: `CI_RUN_SEED` (default 0) and `FAILURE_RATE`
//! (default 0.3) from the environment; bind address via flags.

use anyhow::{Context, Result};
use clap::Parser;

mod config;
mod request_id;
mod routes;
mod service;

use config::ServiceConfig;

#[derive(Parser, Debug)]
#[command(name = "kb-server", about = "Stateless KB ingestion simulator")]
struct Args {
    /// Address to bind.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8000)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = ServiceConfig::from_env().context("invalid service configuration")?;
    log::info!(
        "starting kb-server: seed={} failure_rate={}",
        config.seed,
        config.failure_rate
    );

    let app = routes::router(config);
    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    log::info!("listening on {addr}");

    axum::serve(listener, app)
        .await
        .context("server exited with an error")?;
    Ok(())
}
