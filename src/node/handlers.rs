use axum::{
    Json, Router,
    extract::{Extension, Query, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{delete, get, post},
};
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::protocol::{
    AddChildRequest, ENDPOINT_ADD_CHILD, ENDPOINT_DELETE, ENDPOINT_DISPLAY, ENDPOINT_GET,
    ENDPOINT_PUT, ENDPOINT_REPLICATE, ENDPOINT_SET_PARENT, GetResponse, KeyQuery,
    MutationResponse, PutRequest, REPLICATION_HEADER, ReplicateRequest, SetParentRequest,
};
use super::service::{MutationOutcome, Node};
use crate::error::NodeError;
use crate::membership::types::Origin;

/// HTTP surface of a node.
pub fn router(node: Arc<Node>) -> Router {
    Router::new()
        .route(ENDPOINT_PUT, post(handle_put))
        .route(ENDPOINT_GET, get(handle_get))
        .route(ENDPOINT_DELETE, delete(handle_delete))
        .route(ENDPOINT_REPLICATE, post(handle_replicate))
        .route(ENDPOINT_DISPLAY, get(handle_display))
        .route(ENDPOINT_SET_PARENT, post(handle_set_parent))
        .route(ENDPOINT_ADD_CHILD, post(handle_add_child))
        .layer(Extension(node))
        .layer(TraceLayer::new_for_http())
}

pub async fn handle_put(
    Extension(node): Extension<Arc<Node>>,
    payload: Result<Json<PutRequest>, JsonRejection>,
) -> Response {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(e) => return invalid_payload(e).into_response(),
    };
    let (Some(key), Some(value)) = (req.key, req.value) else {
        return error_response(NodeError::Validation(
            "missing key or value in request".to_string(),
        ))
        .into_response();
    };

    let message = format!("Stored: {} -> {}", key, value);
    match node.handle_put(key, value).await {
        Ok(outcome) => outcome_response(outcome, message),
        Err(e) => error_response(e).into_response(),
    }
}

pub async fn handle_get(
    Extension(node): Extension<Arc<Node>>,
    Query(query): Query<KeyQuery>,
) -> (StatusCode, Json<GetResponse>) {
    let key = query.key.unwrap_or_default();

    match node.handle_get(&key).await {
        Ok(Some(value)) => (
            StatusCode::OK,
            Json(GetResponse {
                key,
                value: Some(value),
            }),
        ),
        Ok(None) => (StatusCode::NOT_FOUND, Json(GetResponse { key, value: None })),
        Err(e) => {
            tracing::debug!("Rejected get: {}", e);
            (
                StatusCode::BAD_REQUEST,
                Json(GetResponse { key, value: None }),
            )
        }
    }
}

pub async fn handle_delete(
    Extension(node): Extension<Arc<Node>>,
    headers: HeaderMap,
    Query(query): Query<KeyQuery>,
) -> Response {
    let key = query.key.unwrap_or_default();
    let marked = headers
        .get(REPLICATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    let origin = Origin::from_replication_marker(marked);

    let message = if origin.is_replication() && !node.role().is_root() {
        format!("Replicated deletion of key: {}", key)
    } else {
        format!("Deleted key: {}", key)
    };

    match node.handle_delete(key, origin).await {
        Ok(outcome) => outcome_response(outcome, message),
        Err(e) => error_response(e).into_response(),
    }
}

pub async fn handle_replicate(
    Extension(node): Extension<Arc<Node>>,
    payload: Result<Json<ReplicateRequest>, JsonRejection>,
) -> (StatusCode, Json<MutationResponse>) {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(e) => return invalid_payload(e),
    };
    let (Some(key), Some(value)) = (req.key, req.value) else {
        return error_response(NodeError::Validation(
            "missing key or value in replication data".to_string(),
        ));
    };

    if let Some(op_id) = &req.op_id {
        tracing::trace!("Replication {} for key '{}'", op_id, key);
    }

    let message = format!("Replicated: {} -> {}", key, value);
    match node.replicate_set(key, value).await {
        Ok(()) => (StatusCode::OK, Json(MutationResponse::ok(message))),
        Err(e) => error_response(e),
    }
}

pub async fn handle_display(Extension(node): Extension<Arc<Node>>) -> Json<HashMap<String, String>> {
    Json(node.display().await)
}

pub async fn handle_set_parent(
    Extension(node): Extension<Arc<Node>>,
    payload: Result<Json<SetParentRequest>, JsonRejection>,
) -> (StatusCode, Json<MutationResponse>) {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(e) => return invalid_payload(e),
    };
    let parent = req.parent_node.unwrap_or_default();

    match node.set_parent(parent.clone()).await {
        Ok(entries) => (
            StatusCode::OK,
            Json(MutationResponse::ok(format!(
                "Parent node updated to: {} ({} entries synchronized)",
                parent, entries
            ))),
        ),
        Err(e) => error_response(e),
    }
}

pub async fn handle_add_child(
    Extension(node): Extension<Arc<Node>>,
    payload: Result<Json<AddChildRequest>, JsonRejection>,
) -> (StatusCode, Json<MutationResponse>) {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(e) => return invalid_payload(e),
    };
    let child = req.child_node.unwrap_or_default();

    match node.add_child(child.clone()).await {
        Ok(_) => (
            StatusCode::OK,
            Json(MutationResponse::ok(format!("Child node added: {}", child))),
        ),
        Err(e) => error_response(e),
    }
}

fn outcome_response(outcome: MutationOutcome, message: String) -> Response {
    match outcome {
        MutationOutcome::Applied => {
            (StatusCode::OK, Json(MutationResponse::ok(message))).into_response()
        }
        MutationOutcome::Redirect { location } => Redirect::temporary(&location).into_response(),
    }
}

fn invalid_payload(rejection: JsonRejection) -> (StatusCode, Json<MutationResponse>) {
    tracing::warn!("Invalid request payload: {}", rejection);
    (
        StatusCode::BAD_REQUEST,
        Json(MutationResponse::failed("Invalid request payload")),
    )
}

pub fn status_for(error: &NodeError) -> StatusCode {
    match error {
        NodeError::Validation(_) | NodeError::WrongRole { .. } => StatusCode::BAD_REQUEST,
        NodeError::NoParentConfigured => StatusCode::INTERNAL_SERVER_ERROR,
        NodeError::RegistrationFailed { .. } | NodeError::SyncFailed { .. } => {
            StatusCode::BAD_GATEWAY
        }
    }
}

fn error_response(error: NodeError) -> (StatusCode, Json<MutationResponse>) {
    let status = status_for(&error);
    if status.is_server_error() {
        tracing::error!("{}", error);
    } else {
        tracing::debug!("Rejected request: {}", error);
    }
    (status, Json(MutationResponse::failed(error.to_string())))
}
