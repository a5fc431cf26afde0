use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::multipart::{Form, Part};

use kb_protocol::{ChildStatus, KbCreateResponse, MonitorChildrenResponse, ResourceUploadResponse};

const HEALTH_POLL: Duration = Duration::from_millis(250);

/// Metadata for one resource uploaded during a smoke run.
#[derive(Debug, Clone)]
pub struct Uploaded {
    pub token: String,
    pub path: String,
    pub created_at_ms: i64,
}

/// Thin HTTP client for the stateless KB API.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Ping `/health` until it answers `{"ok": true}` or the deadline passes.
    pub async fn wait_for_health(&self, timeout: Duration) -> Result<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if let Ok(resp) = self.http.get(self.url("/health")).send().await {
                if resp.status().is_success() {
                    let ok = resp
                        .json::<serde_json::Value>()
                        .await
                        .ok()
                        .and_then(|v| v.get("ok").and_then(|b| b.as_bool()))
                        .unwrap_or(false);
                    if ok {
                        log::info!("health ok");
                        return Ok(());
                    }
                }
            }
            tokio::time::sleep(HEALTH_POLL).await;
        }
        bail!("health check did not pass within {timeout:?}")
    }

    /// Create a knowledge base and return its id, with basic retry.
    pub async fn create_kb(&self, name: Option<&str>, retries: usize) -> Result<String> {
        let body = name.map(|n| serde_json::json!({ "name": n }));
        let mut last_err = None;
        for attempt in 1..=retries {
            let mut req = self.http.post(self.url("/knowledge_bases"));
            if let Some(body) = &body {
                req = req.json(body);
            }
            match send_json::<KbCreateResponse>(req).await {
                Ok(out) => {
                    log::info!(
                        "kb created: kb_id={} attempt={attempt}",
                        out.knowledge_base_id
                    );
                    return Ok(out.knowledge_base_id);
                }
                Err(e) => {
                    log::warn!("kb create retry: attempt={attempt} error={e:#}");
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("create_kb failed"))).context("create_kb")
    }

    /// Upload one file and return its token + metadata, with retry.
    ///
    /// The file bytes travel with the request but the server discards them.
    pub async fn upload_one(&self, kb_id: &str, path: &Path, retries: usize) -> Result<Uploaded> {
        let rp = kb_lifecycle::normalize_resource_path(&path.to_string_lossy())
            .with_context(|| format!("unusable fixture path {}", path.display()))?;
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());

        let mut last_err = None;
        for attempt in 1..=retries {
            let form = Form::new()
                .text("resource_type", "file")
                .text("resource_path", rp.clone())
                .part("file", Part::bytes(bytes.clone()).file_name(file_name.clone()));
            let req = self
                .http
                .post(self.url(&format!("/knowledge_bases/{kb_id}/resources")))
                .multipart(form);
            match send_json::<ResourceUploadResponse>(req).await {
                Ok(out) => {
                    log::info!("uploaded: path={} attempt={attempt}", out.resource_path);
                    return Ok(Uploaded {
                        token: out.resource_id,
                        path: out.resource_path,
                        created_at_ms: out.created_at,
                    });
                }
                Err(e) => {
                    log::warn!("upload retry: path={rp} attempt={attempt} error={e:#}");
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("upload failed")))
            .with_context(|| format!("upload failed for {}", path.display()))
    }

    /// Upload files concurrently; per-file failures are logged and skipped.
    pub async fn upload_all(&self, kb_id: &str, files: &[std::path::PathBuf]) -> Vec<Uploaded> {
        let mut join_set = tokio::task::JoinSet::new();
        for path in files {
            let client = self.clone();
            let kb_id = kb_id.to_string();
            let path = path.clone();
            join_set.spawn(async move { client.upload_one(&kb_id, &path, 2).await });
        }

        let mut uploaded = Vec::new();
        let mut failed = 0usize;
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(Ok(up)) => uploaded.push(up),
                Ok(Err(e)) => {
                    failed += 1;
                    log::warn!("upload dropped: {e:#}");
                }
                Err(e) => {
                    failed += 1;
                    log::warn!("upload task panicked: {e}");
                }
            }
        }
        log::info!(
            "upload summary: requested={} succeeded={} failed={failed}",
            files.len(),
            uploaded.len()
        );
        uploaded
    }

    /// Fetch current statuses for the given tokens, with retry.
    pub async fn poll_children(
        &self,
        kb_id: &str,
        tokens: &[String],
        retries: usize,
    ) -> Result<Vec<ChildStatus>> {
        let ids = tokens.join(",");
        let mut last_err = None;
        for attempt in 1..=retries {
            let req = self
                .http
                .get(self.url(&format!("/knowledge_bases/{kb_id}/resources/children")))
                .query(&[("ids", ids.as_str())]);
            match send_json::<MonitorChildrenResponse>(req).await {
                Ok(out) => return Ok(out.items),
                Err(e) => {
                    log::warn!(
                        "poll retry: attempt={attempt} count={} error={e:#}",
                        tokens.len()
                    );
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("poll failed"))).context("poll_children")
    }
}

async fn send_json<T: serde::de::DeserializeOwned>(req: reqwest::RequestBuilder) -> Result<T> {
    let resp = req.send().await.context("request failed")?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        bail!("server returned {status}: {body}");
    }
    resp.json::<T>().await.context("invalid response body")
}
