use axum::{
    extract::rejection::JsonRejection,
    extract::{Path, State},
    http::{Method, StatusCode},
    response::Json,
};
use bson::oid::ObjectId;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::auth::{required_permission, Identity, TokenVerifier};
use crate::model::ModelKind;
use crate::store::DocumentStore;

/// Immutable per-process state shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub api_version: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub items: Vec<Value>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Root message. The only route served without a bearer token.
pub async fn api_root(State(state): State<AppState>) -> Json<MessageResponse> {
    Json(MessageResponse {
        message: format!("API {}", state.api_version),
    })
}

/// Liveness probe.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

fn resolve_model(segment: &str) -> Result<ModelKind, ApiError> {
    ModelKind::resolve(segment).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(&format!("Unknown model: {}", segment))),
        )
    })
}

fn check_permission(
    identity: &Identity,
    method: Method,
    model: ModelKind,
) -> Result<(), ApiError> {
    let permission = required_permission(&method, model);
    if identity.is_allowed(&permission) {
        Ok(())
    } else {
        log::info!(
            "denying {}: {} not granted to {}",
            model.name(),
            permission,
            identity.subject
        );
        Err((StatusCode::FORBIDDEN, Json(ErrorResponse::new("Forbidden"))))
    }
}

/// Item identifiers must be 24 hex characters. Anything else never reaches
/// the item operations and falls through to a generic not-found, matching a
/// route pattern that only admits well-formed identifiers.
fn parse_item_id(id: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(id)
        .map_err(|_| (StatusCode::NOT_FOUND, Json(ErrorResponse::new("Not found"))))
}

fn json_body(
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Value, ApiError> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(&format!("Error: {}", rejection.body_text()))),
        )),
    }
}

/// POST /{model} — create an item.
///
/// Returns a confirmation message rather than the created entity; existing
/// clients depend on that response shape.
pub async fn create_item(
    State(state): State<AppState>,
    identity: Identity,
    Path(model): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let model = resolve_model(&model)?;
    check_permission(&identity, Method::POST, model)?;
    let body = json_body(payload)?;

    let doc = model.parse_payload(body).map_err(|err| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(&format!("Error: {}", err))),
        )
    })?;

    match state.store.insert(model, doc).await {
        Ok(id) => {
            log::info!("created {} {}", model.name(), id);
            Ok(Json(MessageResponse {
                message: format!("{} created", model.name()),
            }))
        }
        Err(e) => Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(&format!("Error: {}", e))),
        )),
    }
}

/// GET /{model} — list every item of a model. No pagination.
pub async fn list_items(
    State(state): State<AppState>,
    identity: Identity,
    Path(model): Path<String>,
) -> Result<Json<ListResponse>, ApiError> {
    let model = resolve_model(&model)?;
    check_permission(&identity, Method::GET, model)?;

    match state.store.find_all(model).await {
        Ok(items) => Ok(Json(ListResponse { items })),
        Err(e) => Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(&format!("Error: {}", e))),
        )),
    }
}

/// GET /{model}/{id} — fetch a single item.
pub async fn get_item(
    State(state): State<AppState>,
    identity: Identity,
    Path((model, id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let oid = parse_item_id(&id)?;
    let model = resolve_model(&model)?;
    check_permission(&identity, Method::GET, model)?;

    match state.store.find_by_id(model, &oid).await {
        Ok(Some(item)) => Ok(Json(item)),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(&format!("No item with id: {}", id))),
        )),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(&format!("Error: {}", e))),
        )),
    }
}

/// PUT /{model}/{id} — partial merge update. A client-supplied `_id` is
/// stripped before persisting; the stored identifier never changes.
pub async fn update_item(
    State(state): State<AppState>,
    identity: Identity,
    Path((model, id)): Path<(String, String)>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let oid = parse_item_id(&id)?;
    let model = resolve_model(&model)?;
    check_permission(&identity, Method::PUT, model)?;
    let body = json_body(payload)?;

    let mut patch: Map<String, Value> = match body {
        Value::Object(map) => map,
        _ => {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("Error: payload must be a JSON object")),
            ))
        }
    };
    patch.remove("_id");

    match state.store.update_by_id(model, &oid, patch).await {
        Ok(true) => {
            log::info!("updated {} {}", model.name(), id);
            Ok(Json(MessageResponse {
                message: format!("{}: {} updated", model.name(), id),
            }))
        }
        Ok(false) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(&format!("No item with id: {}", id))),
        )),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(&format!("Error: {}", e))),
        )),
    }
}

/// DELETE /{model}/{id} — remove an item.
pub async fn delete_item(
    State(state): State<AppState>,
    identity: Identity,
    Path((model, id)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, ApiError> {
    let oid = parse_item_id(&id)?;
    let model = resolve_model(&model)?;
    check_permission(&identity, Method::DELETE, model)?;

    match state.store.delete_by_id(model, &oid).await {
        Ok(true) => {
            log::info!("deleted {} {}", model.name(), id);
            Ok(Json(MessageResponse {
                message: format!("Successfully deleted item with id: {}", id),
            }))
        }
        Ok(false) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(&format!("No item with id: {}", id))),
        )),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(&format!("Error: {}", e))),
        )),
    }
}
