//! Smoke runner for the stateless KB ingestion simulator.
//!
//! Exercises a running `kb-server` end to end: waits for health, creates a
//! knowledge base, uploads the fixture tree concurrently with bounded
//! retry, polls statuses until every resource is terminal (or a timeout),
//! and prints a JSON summary with latency percentiles. The process exit
//! code reflects the run outcome, so it slots straight into CI.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod client;
mod fixtures;
mod smoke;
mod summary;

#[derive(Parser, Debug)]
#[command(name = "kb-runner", about = "Stateless KB smoke runner")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the end-to-end smoke flow against a server.
    Smoke {
        /// Server base URL.
        #[arg(long, default_value = "http://127.0.0.1:8000")]
        base_url: String,

        /// Directory with the fixture tree (see `gen-fixtures`).
        #[arg(long, default_value = "fixtures")]
        fixtures: PathBuf,

        /// Overall poll timeout in seconds.
        #[arg(long, default_value_t = 30.0)]
        timeout: f64,

        /// Seconds between status polls.
        #[arg(long, default_value_t = 0.25)]
        poll: f64,

        /// Expected number of fixture files.
        #[arg(long, default_value_t = fixtures::FIXTURE_COUNT)]
        expect: usize,
    },

    /// Write the deterministic fixture tree used by `smoke`.
    GenFixtures {
        /// Target directory.
        #[arg(long, default_value = "fixtures")]
        dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    match Args::parse().command {
        Command::Smoke {
            base_url,
            fixtures,
            timeout,
            poll,
            expect,
        } => {
            let code = smoke::run(smoke::SmokeOptions {
                base_url: &base_url,
                fixtures_dir: &fixtures,
                poll_interval: Duration::from_secs_f64(poll),
                timeout: Duration::from_secs_f64(timeout),
                expected_fixtures: expect,
            })
            .await?;
            Ok(ExitCode::from(code.clamp(0, u8::MAX as i32) as u8))
        }
        Command::GenFixtures { dir } => {
            let created = fixtures::generate(&dir)?;
            println!("Created fixtures:");
            for path in &created {
                println!(" - {}", path.display());
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
