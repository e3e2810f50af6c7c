//! Event handlers
//!
//! Malformed input is never rejected: bodies come in as raw JSON values
//! and the sanitizer coerces them. The only error responses are 404 for
//! unknown ids and 500 for persistence failures.

use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use potluck_core::Event;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    error: String,
}

type ErrorReply = (StatusCode, Json<ErrorResponse>);

fn not_found() -> ErrorReply {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "Event not found".to_string(),
        }),
    )
}

fn server_error() -> ErrorReply {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "Server error".to_string(),
        }),
    )
}

pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<Event>), ErrorReply> {
    match state.store.create(&payload).await {
        Ok(event) => Ok((StatusCode::CREATED, Json(event))),
        Err(e) => {
            tracing::error!("Failed to create event: {}", e);
            Err(server_error())
        }
    }
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Event>, ErrorReply> {
    match state.store.get(&id).await {
        Ok(Some(event)) => Ok(Json(event)),
        Ok(None) => Err(not_found()),
        Err(e) => {
            tracing::error!("Failed to get event: {}", e);
            Err(server_error())
        }
    }
}

pub async fn replace(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<Json<Event>, ErrorReply> {
    match state.store.replace(&id, &payload).await {
        Ok(Some(event)) => Ok(Json(event)),
        Ok(None) => Err(not_found()),
        Err(e) => {
            tracing::error!("Failed to replace event: {}", e);
            Err(server_error())
        }
    }
}
