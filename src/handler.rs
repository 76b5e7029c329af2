//! HTTP Handlers for the bookmarks API

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::db::Database;
use crate::model::Bookmark;
use crate::sanitize;
use crate::store::BookmarkStore;
use crate::validate;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorMessage,
}

#[derive(Debug, Serialize)]
pub struct ErrorMessage {
    pub message: String,
}

fn bad_request(msg: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error: ErrorMessage {
                message: msg.to_string(),
            },
        }),
    )
        .into_response()
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            error: ErrorMessage {
                message: "Bookmark not found.".to_string(),
            },
        }),
    )
        .into_response()
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            error: ErrorMessage {
                message: "server error".to_string(),
            },
        }),
    )
        .into_response()
}

pub async fn healthcheck() -> impl IntoResponse {
    info!("got healthcheck request");
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

// ============================================================================
// Bookmark Handlers
// ============================================================================

pub async fn list_bookmarks(State(state): State<AppState>) -> Response {
    let store = BookmarkStore::new(state.db.connection());

    match store.list().await {
        Ok(bookmarks) => {
            let serialized: Vec<Bookmark> =
                bookmarks.into_iter().map(sanitize::serialize).collect();
            (StatusCode::OK, Json(serialized)).into_response()
        }
        Err(e) => {
            tracing::error!("Failed to list bookmarks: {}", e);
            internal_error()
        }
    }
}

pub async fn create_bookmark(
    State(state): State<AppState>,
    payload: Option<Json<Value>>,
) -> Response {
    let store = BookmarkStore::new(state.db.connection());
    let body = payload.map(|Json(v)| v).unwrap_or(Value::Null);

    let input = match validate::validate_create(&body) {
        Ok(input) => input,
        Err(e) => {
            tracing::error!("Rejected bookmark payload: {}", e);
            return bad_request(&e.to_string());
        }
    };

    match store.create(input).await {
        Ok(bookmark) => {
            info!("bookmark {} created", bookmark.id);
            let location = format!("/api/bookmarks/{}", bookmark.id);
            (
                StatusCode::CREATED,
                [(header::LOCATION, location)],
                Json(sanitize::serialize(bookmark)),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("Failed to create bookmark: {}", e);
            internal_error()
        }
    }
}

pub async fn get_bookmark(State(state): State<AppState>, Path(id): Path<i32>) -> Response {
    let store = BookmarkStore::new(state.db.connection());

    match store.get(id).await {
        Ok(Some(bookmark)) => {
            (StatusCode::OK, Json(sanitize::serialize(bookmark))).into_response()
        }
        Ok(None) => {
            tracing::error!("bookmark {} not found", id);
            not_found()
        }
        Err(e) => {
            tracing::error!("Failed to get bookmark: {}", e);
            internal_error()
        }
    }
}

pub async fn delete_bookmark(State(state): State<AppState>, Path(id): Path<i32>) -> Response {
    let store = BookmarkStore::new(state.db.connection());

    match store.delete(id).await {
        Ok(true) => {
            info!("bookmark {} deleted", id);
            (StatusCode::NO_CONTENT, ()).into_response()
        }
        Ok(false) => {
            tracing::error!("bookmark {} not found", id);
            not_found()
        }
        Err(e) => {
            tracing::error!("Failed to delete bookmark: {}", e);
            internal_error()
        }
    }
}

pub async fn update_bookmark(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    payload: Option<Json<Value>>,
) -> Response {
    let store = BookmarkStore::new(state.db.connection());
    let body = payload.map(|Json(v)| v).unwrap_or(Value::Null);

    // Unknown ids 404 before the payload is inspected.
    match store.get(id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            tracing::error!("bookmark {} not found", id);
            return not_found();
        }
        Err(e) => {
            tracing::error!("Failed to get bookmark: {}", e);
            return internal_error();
        }
    }

    let patch = match validate::validate_update(&body) {
        Ok(patch) => patch,
        Err(e) => {
            tracing::error!("Rejected bookmark patch: {}", e);
            return bad_request(&e.to_string());
        }
    };

    match store.update(id, patch).await {
        Ok(Some(_)) => {
            info!("bookmark {} updated", id);
            (StatusCode::NO_CONTENT, ()).into_response()
        }
        Ok(None) => {
            tracing::error!("bookmark {} not found", id);
            not_found()
        }
        Err(e) => {
            tracing::error!("Failed to update bookmark: {}", e);
            internal_error()
        }
    }
}
