//! Read-only viewer API.
//!
//! Serves the normalized records as JSON for the browser viewer. The
//! frontend is a separate project fetching from localhost, so CORS is
//! permissive.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/watch-history` | Stored watch events, chronological |
//! | `GET`  | `/search-history` | Stored search events, chronological |
//! | `GET`  | `/comments` | Stored comments, chronological |
//! | `GET`  | `/notes` | Stored Keep notes, by creation time |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! List endpoints accept optional `limit` and `offset` query parameters.
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "internal", "message": "..." } }
//! ```

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::migrate;
use crate::models::ActivityKind;
use crate::store::{Store, StoredActivity, StoredComment, StoredNote};

#[derive(Clone)]
struct AppState {
    store: Store,
}

/// Starts the viewer API on the configured bind address. Runs until the
/// process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let store = Store::connect(config).await?;
    migrate::run_migrations(store.pool()).await?;
    let state = AppState { store };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/watch-history", get(handle_watch_history))
        .route("/search-history", get(handle_search_history))
        .route("/comments", get(handle_comments))
        .route("/notes", get(handle_notes))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state);

    println!("viewer API listening on http://{}", config.server.bind);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn internal(err: anyhow::Error) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: err.to_string(),
    }
}

// ============ Handlers ============

/// Pagination query parameters shared by all list endpoints.
#[derive(Deserialize)]
struct Page {
    limit: Option<i64>,
    offset: Option<i64>,
}

impl Page {
    fn limit(&self) -> i64 {
        // SQLite treats a negative LIMIT as unbounded.
        self.limit.unwrap_or(-1)
    }

    fn offset(&self) -> i64 {
        self.offset.unwrap_or(0)
    }
}

async fn handle_watch_history(
    State(state): State<AppState>,
    Query(page): Query<Page>,
) -> Result<Json<Vec<StoredActivity>>, AppError> {
    state
        .store
        .list_activity(ActivityKind::Watch, page.limit(), page.offset())
        .await
        .map(Json)
        .map_err(internal)
}

async fn handle_search_history(
    State(state): State<AppState>,
    Query(page): Query<Page>,
) -> Result<Json<Vec<StoredActivity>>, AppError> {
    state
        .store
        .list_activity(ActivityKind::Search, page.limit(), page.offset())
        .await
        .map(Json)
        .map_err(internal)
}

async fn handle_comments(
    State(state): State<AppState>,
    Query(page): Query<Page>,
) -> Result<Json<Vec<StoredComment>>, AppError> {
    state
        .store
        .list_comments(page.limit(), page.offset())
        .await
        .map(Json)
        .map_err(internal)
}

async fn handle_notes(
    State(state): State<AppState>,
    Query(page): Query<Page>,
) -> Result<Json<Vec<StoredNote>>, AppError> {
    state
        .store
        .list_notes(page.limit(), page.offset())
        .await
        .map(Json)
        .map_err(internal)
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
