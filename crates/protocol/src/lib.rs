//! Wire models for the stateless KB HTTP API.
//!
//! Field names here are a fixed contract with existing clients; the
//! structures carry no behavior beyond (de)serialization.

use kb_lifecycle::LifecycleStatus;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Optional inputs for creating a knowledge base.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct KbCreateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Representation of a created knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct KbCreateResponse {
    pub knowledge_base_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: i64,
}

/// Response describing an accepted resource upload request.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ResourceUploadResponse {
    /// Opaque lifecycle token; the client treats it as an id.
    pub resource_id: String,
    pub resource_path: String,
    pub status: LifecycleStatus,
    pub created_at: i64,
}

/// Current state of a single resource within a knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ChildStatus {
    pub resource_id: String,
    pub resource_path: String,
    pub status: LifecycleStatus,
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Statuses for a batch of resources.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MonitorChildrenResponse {
    pub items: Vec<ChildStatus>,
}

/// Body attached to non-2xx API responses.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ErrorBody {
    pub error_code: String,
    pub error_message: String,
}
