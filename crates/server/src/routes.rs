use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use kb_protocol::{ErrorBody, KbCreateRequest, MonitorChildrenResponse};

use crate::config::ServiceConfig;
use crate::request_id::request_id_layer;
use crate::service;

#[derive(Clone)]
pub struct AppState {
    pub config: ServiceConfig,
}

type ApiError = (StatusCode, Json<ErrorBody>);

pub fn router(config: ServiceConfig) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/knowledge_bases", post(create_kb))
        .route("/knowledge_bases/:kb_id/resources", post(upload_resource))
        .route(
            "/knowledge_bases/:kb_id/resources/children",
            get(monitor_children),
        )
        .route("/knowledge_bases/:kb_id", delete(delete_kb))
        .layer(axum::middleware::from_fn(request_id_layer))
        .with_state(AppState { config })
}

fn api_error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error_code: code.to_string(),
            error_message: message.into(),
        }),
    )
}

async fn health() -> impl IntoResponse {
    Json(json!({"ok": true}))
}

async fn create_kb(body: Option<Json<KbCreateRequest>>) -> impl IntoResponse {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let out = service::create_kb(req.name, req.description, service::now_ms());
    Json(out)
}

async fn upload_resource(
    State(state): State<AppState>,
    Path(kb_id): Path<String>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut resource_type: Option<String> = None;
    let mut resource_path: Option<String> = None;
    let mut saw_file = false;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "malformed_request",
            format!("invalid multipart body: {e}"),
        )
    })? {
        match field.name() {
            Some("resource_type") => {
                resource_type = Some(field.text().await.map_err(|e| {
                    api_error(
                        StatusCode::UNPROCESSABLE_ENTITY,
                        "malformed_request",
                        format!("invalid resource_type field: {e}"),
                    )
                })?);
            }
            Some("resource_path") => {
                resource_path = Some(field.text().await.map_err(|e| {
                    api_error(
                        StatusCode::UNPROCESSABLE_ENTITY,
                        "malformed_request",
                        format!("invalid resource_path field: {e}"),
                    )
                })?);
            }
            // File bytes are read and discarded; the service is stateless.
            Some("file") => {
                saw_file = true;
                let _ = field.bytes().await;
            }
            _ => {}
        }
    }

    match resource_type.as_deref() {
        Some(t) if t.eq_ignore_ascii_case("file") => {}
        _ => {
            return Err(api_error(
                StatusCode::UNPROCESSABLE_ENTITY,
                "malformed_request",
                "resource_type must be \"file\"",
            ))
        }
    }
    let resource_path = resource_path.ok_or_else(|| {
        api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "malformed_request",
            "resource_path is required",
        )
    })?;
    if !saw_file {
        return Err(api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "malformed_request",
            "file field is required",
        ));
    }

    let out = service::upload_resource(
        &kb_id,
        &resource_path,
        state.config.seed,
        service::now_ms(),
    )
    .map_err(|e| api_error(StatusCode::BAD_REQUEST, "malformed_request", e.to_string()))?;
    Ok(Json(out))
}

#[derive(Debug, Deserialize)]
struct MonitorParams {
    /// Comma-separated resource tokens.
    #[serde(default)]
    ids: Option<String>,
}

async fn monitor_children(
    State(state): State<AppState>,
    Path(kb_id): Path<String>,
    Query(params): Query<MonitorParams>,
) -> Result<Json<MonitorChildrenResponse>, ApiError> {
    let ids = split_ids(params.ids.as_deref());

    let items = service::list_children(&kb_id, &ids, state.config.failure_rate, service::now_ms())
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.code(), e.to_string()))?;

    Ok(Json(MonitorChildrenResponse { items }))
}

async fn delete_kb(Path(kb_id): Path<String>) -> StatusCode {
    service::delete_kb(&kb_id);
    StatusCode::NO_CONTENT
}

fn split_ids(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
