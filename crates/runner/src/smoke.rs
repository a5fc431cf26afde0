//! End-to-end smoke flow: health, create, concurrent upload fan-out,
//! poll-until-terminal, summary.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};

use kb_protocol::ChildStatus;

use crate::client::{ApiClient, Uploaded};
use crate::{fixtures, summary};

const HEALTH_TIMEOUT: Duration = Duration::from_secs(20);
const CREATE_RETRIES: usize = 3;
const POLL_RETRIES: usize = 3;

pub struct SmokeOptions<'a> {
    pub base_url: &'a str,
    pub fixtures_dir: &'a Path,
    pub poll_interval: Duration,
    pub timeout: Duration,
    pub expected_fixtures: usize,
}

/// Run the smoke flow and return the process exit code.
pub async fn run(opts: SmokeOptions<'_>) -> Result<i32> {
    let client = ApiClient::new(opts.base_url)?;
    client
        .wait_for_health(HEALTH_TIMEOUT)
        .await
        .context("server never became healthy")?;

    let files = fixtures::collect(opts.fixtures_dir, opts.expected_fixtures)?;
    let kb_id = client.create_kb(None, CREATE_RETRIES).await?;
    let uploaded = client.upload_all(&kb_id, &files).await;

    let tokens: Vec<String> = uploaded.iter().map(|u| u.token.clone()).collect();
    let (last_items, terminal_at) = if tokens.is_empty() {
        // Nothing to poll; summarize() turns this into a failing exit code.
        (Vec::new(), HashMap::new())
    } else {
        poll_until_terminal(
            &client,
            &kb_id,
            &tokens,
            opts.poll_interval,
            opts.timeout,
        )
        .await?
    };

    let (summary, exit_code) = summary::summarize(&uploaded, &last_items, &terminal_at);
    println!(
        "{}",
        serde_json::to_string_pretty(&summary).context("failed to render summary")?
    );
    log_outcome(&uploaded, exit_code);
    Ok(exit_code)
}

/// Poll children until every token is terminal or the timeout expires,
/// recording when each token was first observed terminal.
async fn poll_until_terminal(
    client: &ApiClient,
    kb_id: &str,
    tokens: &[String],
    poll_interval: Duration,
    timeout: Duration,
) -> Result<(Vec<ChildStatus>, HashMap<String, i64>)> {
    let deadline = tokio::time::Instant::now() + timeout;
    let mut terminal_at: HashMap<String, i64> = HashMap::new();
    let mut last_items: Vec<ChildStatus> = Vec::new();

    while tokio::time::Instant::now() <= deadline {
        let items = client.poll_children(kb_id, tokens, POLL_RETRIES).await?;
        for item in &items {
            if item.status.is_terminal() && !terminal_at.contains_key(&item.resource_id) {
                terminal_at.insert(item.resource_id.clone(), item.updated_at);
            }
        }
        last_items = items;
        if terminal_at.len() == tokens.len() {
            break;
        }
        tokio::time::sleep(poll_interval).await;
    }
    Ok((last_items, terminal_at))
}

fn log_outcome(uploaded: &[Uploaded], exit_code: i32) {
    if exit_code == 0 {
        log::info!("smoke passed: {} resources terminal", uploaded.len());
    } else {
        log::warn!("smoke failed: exit_code={exit_code}");
    }
}
