//! Web server module.
//!
//! Exposes the generated backend's HTTP surface: liveness and database health
//! probes, plus the item CRUD routes when a database addon is configured.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};

use crate::db::{DbError, DbRuntime, NewItem};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: DbRuntime,
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    db: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl HealthResponse {
    fn ok(db: Option<&str>) -> Self {
        Self {
            status: "ok".to_string(),
            db: db.map(str::to_string),
            error: None,
        }
    }

    fn error(message: String) -> Self {
        Self {
            status: "error".to_string(),
            db: None,
            error: Some(message),
        }
    }
}

/// Body for `POST /items`. `name` is optional here so its absence produces
/// the documented 400 rather than a deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct CreateItemPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Create the Axum router with all routes.
///
/// Item routes are mounted only when a database addon is configured; an
/// in-memory-only build simply has no `/items` surface.
pub fn create_router(state: AppState) -> Router {
    let has_database = state.db.store().is_some();
    let app_state = Arc::new(state);

    let mut router = Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/health-db", get(health_db_handler));

    if has_database {
        router = router
            .route("/items", get(list_items_handler).post(create_item_handler))
            .route(
                "/items/{id}",
                get(get_item_handler).delete(delete_item_handler),
            );
    }

    router
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

/// Root route.
async fn root_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "API starter backend" }))
}

/// Liveness probe, no adapter dependency.
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok(None))
}

/// Database health probe.
///
/// Without an addon this reports "not-configured" and performs no I/O.
/// Otherwise it delegates to the adapter's health check, which runs exactly
/// once per request with no retry. The startup phase is not consulted:
/// before, during or after a failed initialization, each request reports
/// its own round-trip result.
async fn health_db_handler(State(state): State<Arc<AppState>>) -> Response {
    let Some(store) = state.db.store() else {
        return Json(HealthResponse::ok(Some("not-configured"))).into_response();
    };

    match store.health_check().await {
        Ok(()) => Json(HealthResponse::ok(Some("connected"))).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "database health check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(HealthResponse::error(err.to_string())),
            )
                .into_response()
        }
    }
}

/// GET /items - all items ordered by id ascending.
async fn list_items_handler(State(state): State<Arc<AppState>>) -> Response {
    let Some(store) = state.db.store() else {
        return not_found();
    };

    match store.list_items().await {
        Ok(items) => Json(items).into_response(),
        Err(err) => db_error_response(err),
    }
}

/// POST /items - create an item; the store assigns the id.
async fn create_item_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateItemPayload>,
) -> Response {
    let Some(store) = state.db.store() else {
        return not_found();
    };

    let name = payload.name.unwrap_or_default();
    if name.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "detail": "name is required" })),
        )
            .into_response();
    }

    let new = NewItem {
        name,
        description: payload.description,
    };

    match store.create_item(new).await {
        Ok(item) => (StatusCode::CREATED, Json(item)).into_response(),
        Err(err) => db_error_response(err),
    }
}

/// GET /items/{id}.
async fn get_item_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    let Some(store) = state.db.store() else {
        return not_found();
    };

    match store.get_item(&id).await {
        Ok(Some(item)) => Json(item).into_response(),
        Ok(None) => not_found(),
        Err(err) => db_error_response(err),
    }
}

/// DELETE /items/{id}.
async fn delete_item_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    let Some(store) = state.db.store() else {
        return not_found();
    };

    match store.delete_item(&id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => not_found(),
        Err(err) => db_error_response(err),
    }
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "Not found" })),
    )
        .into_response()
}

/// Translate an adapter error into an HTTP response.
fn db_error_response(err: DbError) -> Response {
    match err {
        DbError::InvalidId(_) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "Invalid id" })),
        )
            .into_response(),
        other => {
            tracing::error!(error = %other, "data route failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": other.to_string() })),
            )
                .into_response()
        }
    }
}
