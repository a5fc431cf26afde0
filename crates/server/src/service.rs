//! Stateless use-cases behind the HTTP handlers.
//!
//! Nothing here holds state between calls: creating a knowledge base only
//! mints an id, uploading a resource only issues a token, and listing
//! children recomputes every status from (token, now).

use std::time::{SystemTime, UNIX_EPOCH};

use kb_lifecycle::{
    compute_status, decode_resource_token, encode_resource_token, normalize_resource_path,
    LifecycleError, LifecycleStatus,
};
use kb_protocol::{ChildStatus, KbCreateResponse, ResourceUploadResponse};
use thiserror::Error;
use uuid::Uuid;

/// Item-level code for a token issued by a different knowledge base.
pub const CODE_KB_MISMATCH: &str = "kb_mismatch";
/// Request-level code for an empty ids batch.
pub const CODE_MISSING_IDS: &str = "missing_ids";

pub type Result<T> = std::result::Result<T, ServiceError>;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("at least one id must be provided")]
    MissingIds,

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

impl ServiceError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingIds => CODE_MISSING_IDS,
            Self::Lifecycle(e) => e.code(),
        }
    }
}

/// Current time in epoch milliseconds. A clock before the epoch clamps to
/// zero, matching the oracle's skew handling.
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// Mint a new knowledge-base descriptor. No state is stored.
pub fn create_kb(name: Option<String>, description: Option<String>, now: i64) -> KbCreateResponse {
    let kb_id = Uuid::new_v4().to_string();
    log::info!("kb created: kb_id={kb_id}");
    KbCreateResponse {
        knowledge_base_id: kb_id,
        name,
        description,
        created_at: now,
    }
}

/// Accept a resource path and issue its lifecycle token.
pub fn upload_resource(
    kb_id: &str,
    resource_path: &str,
    seed: i64,
    now: i64,
) -> Result<ResourceUploadResponse> {
    let rp = normalize_resource_path(resource_path)?;
    let token = encode_resource_token(kb_id, &rp, now, seed)?;
    log::info!("resource upload: kb_id={kb_id} path={rp}");
    Ok(ResourceUploadResponse {
        resource_id: token,
        resource_path: rp,
        status: LifecycleStatus::Pending,
        created_at: now,
    })
}

/// Resolve current statuses for a batch of resource tokens.
///
/// Failures are reported per item so one bad token never blocks the rest
/// of the batch; only an empty batch fails the whole request.
pub fn list_children(
    kb_id: &str,
    ids: &[String],
    failure_rate: f64,
    now: i64,
) -> Result<Vec<ChildStatus>> {
    if ids.is_empty() {
        return Err(ServiceError::MissingIds);
    }

    let mut items = Vec::with_capacity(ids.len());
    for token in ids {
        let payload = match decode_resource_token(token) {
            Ok(p) => p,
            Err(e) => {
                items.push(ChildStatus {
                    resource_id: token.clone(),
                    resource_path: String::new(),
                    status: LifecycleStatus::Error,
                    updated_at: now,
                    error_code: Some(e.code().to_string()),
                    error_message: Some(e.to_string()),
                });
                continue;
            }
        };

        if payload.kb_id != kb_id {
            items.push(ChildStatus {
                resource_id: token.clone(),
                resource_path: payload.rp,
                status: LifecycleStatus::Error,
                updated_at: now,
                error_code: Some(CODE_KB_MISMATCH.to_string()),
                error_message: Some("token belongs to a different knowledge base".to_string()),
            });
            continue;
        }

        let status = compute_status(payload.ca_ms, now, payload.salt, failure_rate)?;
        items.push(ChildStatus {
            resource_id: token.clone(),
            resource_path: payload.rp,
            status,
            updated_at: now,
            error_code: None,
            error_message: None,
        });
    }

    log::info!("children listed: kb_id={kb_id} count={}", ids.len());
    Ok(items)
}

/// Delete a knowledge base. A no-op in this stateless service; only logged.
pub fn delete_kb(kb_id: &str) {
    log::info!("kb delete requested: kb_id={kb_id}");
}
