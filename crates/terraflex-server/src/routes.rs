//! The six wire-protocol endpoints.

use crate::error::ApiError;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use terraflex_core::{Data, Error, LockBody};
use terraflex_engine::StateLockController;

/// Build the router. Every route is wrapped in a [`tower_http::trace::TraceLayer`]
/// by the caller (see [`crate::app::build`]) rather than here, so tests can
/// exercise the router without pulling tracing infrastructure in.
pub fn router(controller: Arc<StateLockController>) -> Router {
    Router::new()
        .route("/ready", get(ready))
        .route("/:stack/state", get(get_state).post(put_state).delete(delete_state))
        .route("/:stack/lock", put(acquire_lock).delete(release_lock))
        .with_state(controller)
}

async fn ready() -> &'static str {
    "Ready"
}

#[derive(Debug, Deserialize)]
struct LockIdQuery {
    #[serde(rename = "ID")]
    id: String,
}

async fn get_state(
    State(controller): State<Arc<StateLockController>>,
    Path(stack): Path<String>,
) -> Result<Json<Data>, ApiError> {
    match controller.get(&stack).await? {
        Some(value) => Ok(Json(value)),
        None => Err(ApiError(Error::NotFound(format!("no state for stack {stack}")))),
    }
}

async fn put_state(
    State(controller): State<Arc<StateLockController>>,
    Path(stack): Path<String>,
    Query(query): Query<LockIdQuery>,
    Json(value): Json<Data>,
) -> Result<StatusCode, ApiError> {
    controller.put(&stack, &query.id, &value).await?;
    Ok(StatusCode::OK)
}

async fn delete_state(
    State(controller): State<Arc<StateLockController>>,
    Path(stack): Path<String>,
) -> Result<StatusCode, ApiError> {
    let held = controller
        .read_lock(&stack)
        .await?
        .ok_or_else(|| Error::lock_conflict("no lock held", String::new()))?;
    controller.delete(&stack, &held.id).await?;
    Ok(StatusCode::OK)
}

async fn acquire_lock(
    State(controller): State<Arc<StateLockController>>,
    Path(stack): Path<String>,
    Json(body): Json<LockBody>,
) -> Result<StatusCode, ApiError> {
    controller.lock(&stack, &body).await?;
    Ok(StatusCode::OK)
}

async fn release_lock(
    State(controller): State<Arc<StateLockController>>,
    Path(stack): Path<String>,
) -> Result<StatusCode, ApiError> {
    controller.unlock(&stack).await?;
    Ok(StatusCode::OK)
}
