//! HTTP API endpoints.
//!
//! Room creation and lookup for the host UI, plus admin curation of the
//! in-memory prompt library.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::{admin_auth_middleware, AuthConfig};
use crate::content::{ContentQuery, MemoryContentStore, RawPrompt};
use crate::state::{AppState, RoomError};
use crate::types::*;

/// JSON error body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub msg: String,
}

fn error_response(status: StatusCode, code: &str, msg: impl Into<String>) -> Response {
    (
        status,
        Json(ApiError {
            code: code.to_string(),
            msg: msg.into(),
        }),
    )
        .into_response()
}

fn room_error_response(e: RoomError) -> Response {
    let status = match e {
        RoomError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::BAD_REQUEST,
    };
    error_response(status, e.code(), e.to_string())
}

/// Build the API routes. Admin routes sit behind HTTP Basic auth.
pub fn router(auth_config: Arc<AuthConfig>) -> Router<Arc<AppState>> {
    let admin_routes = Router::new()
        .route("/api/admin/content", get(list_content).post(add_content))
        .route("/api/admin/content/count", get(count_content))
        .route("/api/admin/content/{id}", delete(delete_content))
        .layer(middleware::from_fn_with_state(
            auth_config,
            admin_auth_middleware,
        ));

    Router::new()
        .route("/health", get(health))
        .route("/api/rooms", post(create_room))
        .route("/api/rooms/{code}", get(get_room))
        .merge(admin_routes)
}

/// GET /health
pub async fn health() -> &'static str {
    "ok"
}

/// Create a room.
///
/// POST /api/rooms
///
/// The response carries the host token; whoever holds it may run the game.
pub async fn create_room(State(state): State<Arc<AppState>>) -> Response {
    let (_, created) = state.create_room_with_token().await;
    (StatusCode::CREATED, Json(created)).into_response()
}

/// GET /api/rooms/{code}
pub async fn get_room(State(state): State<Arc<AppState>>, Path(code): Path<String>) -> Response {
    match state.snapshot(&code).await {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => room_error_response(e),
    }
}

fn library(state: &AppState) -> Result<&Arc<MemoryContentStore>, Response> {
    state.library.as_ref().ok_or_else(|| {
        error_response(
            StatusCode::CONFLICT,
            "LIBRARY_READ_ONLY",
            format!("Prompts are served by {}", state.content.name()),
        )
    })
}

/// List the prompt library.
///
/// GET /api/admin/content
pub async fn list_content(State(state): State<Arc<AppState>>) -> Response {
    match library(&state) {
        Ok(library) => Json(library.list().await).into_response(),
        Err(response) => response,
    }
}

/// Add a prompt to the library.
///
/// POST /api/admin/content
pub async fn add_content(
    State(state): State<Arc<AppState>>,
    Json(raw): Json<RawPrompt>,
) -> Response {
    let library = match library(&state) {
        Ok(library) => library,
        Err(response) => return response,
    };
    match library.add(raw).await {
        Ok(prompt) => (StatusCode::CREATED, Json(prompt)).into_response(),
        Err(e) => error_response(StatusCode::BAD_REQUEST, "INVALID_PROMPT", e.to_string()),
    }
}

/// Remove a prompt from the library.
///
/// DELETE /api/admin/content/{id}
pub async fn delete_content(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    let library = match library(&state) {
        Ok(library) => library,
        Err(response) => return response,
    };
    if library.remove(&id).await {
        StatusCode::NO_CONTENT.into_response()
    } else {
        error_response(
            StatusCode::NOT_FOUND,
            "PROMPT_NOT_FOUND",
            format!("Prompt {} not found", id),
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct CountParams {
    /// Comma-separated content types, empty for all
    pub types: Option<String>,
    pub max_level: Option<u8>,
    pub adult: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: usize,
}

/// Count prompts in the configured content store matching a filter.
///
/// GET /api/admin/content/count?types=truth,dare&max_level=2&adult=false
pub async fn count_content(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CountParams>,
) -> Response {
    let mut types = std::collections::BTreeSet::new();
    for raw in params.types.iter().flat_map(|t| t.split(',')) {
        if raw.trim().is_empty() {
            continue;
        }
        match ContentType::parse_loose(raw) {
            Some(content_type) => {
                types.insert(content_type);
            }
            None => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    "UNKNOWN_TYPE",
                    format!("Unknown content type '{}'", raw),
                )
            }
        }
    }

    let max_level = match params.max_level {
        None => Level::MAX,
        Some(raw) => match Level::new(raw) {
            Some(level) => level,
            None => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    "INVALID_LEVEL",
                    format!("Level must be {}-{}", Level::MIN.get(), Level::MAX.get()),
                )
            }
        },
    };

    let query = ContentQuery {
        types,
        max_level,
        include_adult: params.adult.unwrap_or(false),
    };

    match state.content.count(&query).await {
        Ok(count) => Json(CountResponse { count }).into_response(),
        Err(e) => {
            tracing::error!("Content count from {} failed: {}", state.content.name(), e);
            error_response(StatusCode::BAD_GATEWAY, "CONTENT_STORE_ERROR", e.to_string())
        }
    }
}
