//! HTTP server.
//!
//! Exposes the catalog as a JSON API under `/pokemons`.
//!
//! # Endpoints
//!
//! | Method | Path | Auth | Description |
//! |--------|------|------|-------------|
//! | `GET`  | `/health` | none | Health check (returns version) |
//! | `POST` | `/pokemons/import` | required | Replace the catalog from a multipart CSV upload (field `file`) |
//! | `GET`  | `/pokemons` | optional | Filtered, paginated listing |
//! | `GET`  | `/pokemons/favorites` | required | Caller's favorites, newest first |
//! | `GET`  | `/pokemons/{id}` | optional | One entry |
//! | `POST` | `/pokemons/{id}/favorite` | required | Toggle a favorite |
//!
//! Callers identify themselves with `Authorization: Bearer <token>`. On
//! optional-auth routes a missing header means anonymous and `isFavorite`
//! is omitted from every entry. A header carrying an unknown token is
//! always rejected with 401.
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "invalid limit: must be between 1 and 100" } }
//! ```
//!
//! Error codes: `bad_request` (400), `ingestion_failed` (400),
//! `unauthorized` (401), `not_found` (404), `conflict` (409),
//! `payload_too_large` (413), `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use axum::{
    extract::{multipart::Multipart, DefaultBodyLimit, Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use catalog_core::favorites::{self, ToggleOutcome};
use catalog_core::query::{self, ListQuery};
use catalog_core::store::CatalogStore;
use catalog_core::{CatalogError, EntryView, Page, UserId};

use crate::auth::{bearer_token, Authenticator, TokenAuthenticator};
use crate::config::{Config, QueryConfig};
use crate::db;
use crate::ingest::{self, ImportSummary};
use crate::migrate;
use crate::sqlite_store::SqliteStore;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CatalogStore>,
    pub auth: Arc<dyn Authenticator>,
    pub query: QueryConfig,
    pub max_upload_bytes: usize,
}

/// Starts the HTTP server against the configured SQLite database.
///
/// Binds to `[server].bind` and runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let pool = db::connect(config).await?;
    migrate::create_schema(&pool).await?;

    let state = AppState {
        store: Arc::new(SqliteStore::new(pool)),
        auth: Arc::new(TokenAuthenticator::new(config.auth.tokens.clone())),
        query: config.query.clone(),
        max_upload_bytes: config.import.max_upload_bytes,
    };

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!(bind = %config.server.bind, "catalog server listening");
    axum::serve(listener, router(state)).await?;

    Ok(())
}

/// Build the router for `state`.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Leave room for multipart framing around the file part; the file
    // itself is capped while streaming.
    let body_limit = state.max_upload_bytes.saturating_add(64 * 1024);

    Router::new()
        .route("/health", get(handle_health))
        .route(
            "/pokemons/import",
            post(handle_import).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/pokemons", get(handle_list))
        .route("/pokemons/favorites", get(handle_favorites))
        .route("/pokemons/{id}", get(handle_get))
        .route("/pokemons/{id}/favorite", post(handle_toggle))
        .layer(cors)
        .with_state(state)
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

/// Internal error type that converts into an Axum HTTP response.
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

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn unauthorized(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::UNAUTHORIZED,
        code: "unauthorized".to_string(),
        message: message.into(),
    }
}

fn payload_too_large(limit: usize) -> AppError {
    AppError {
        status: StatusCode::PAYLOAD_TOO_LARGE,
        code: "payload_too_large".to_string(),
        message: format!("upload exceeds {} bytes", limit),
    }
}

fn internal() -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: "internal server error".to_string(),
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        let status = match &err {
            CatalogError::Validation { .. } | CatalogError::Ingestion(_) => {
                StatusCode::BAD_REQUEST
            }
            CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
            CatalogError::Conflict(_) => StatusCode::CONFLICT,
            CatalogError::Store(e) => {
                error!(error = %e, "store failure");
                return internal();
            }
        };
        AppError {
            status,
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

// ============ Caller identity ============

/// Resolve the caller from the `Authorization` header.
///
/// No header → `None`. A header that is not a known bearer token → 401.
async fn caller(state: &AppState, headers: &HeaderMap) -> Result<Option<UserId>, AppError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let token = value
        .to_str()
        .ok()
        .and_then(bearer_token)
        .ok_or_else(|| unauthorized("expected a bearer token"))?;

    match state.auth.authenticate(token).await {
        Ok(Some(user)) => Ok(Some(user)),
        Ok(None) => Err(unauthorized("unknown token")),
        Err(e) => {
            error!(error = %e, "authenticator failure");
            Err(internal())
        }
    }
}

async fn require_caller(state: &AppState, headers: &HeaderMap) -> Result<UserId, AppError> {
    caller(state, headers)
        .await?
        .ok_or_else(|| unauthorized("authentication required"))
}

// ============ GET /health ============

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

// ============ POST /pokemons/import ============

/// Streams the `file` part into a temporary file, then replaces the catalog
/// from it. The temporary file is removed when the handler returns.
async fn handle_import(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<ImportSummary>, AppError> {
    let user = require_caller(&state, &headers).await?;

    let upload = loop {
        let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? else {
            return Err(bad_request("multipart field `file` is required"));
        };
        if field.name() != Some("file") {
            continue;
        }

        let tmp = tempfile::NamedTempFile::new().map_err(|e| {
            error!(error = %e, "cannot create upload file");
            internal()
        })?;
        let std_file = tmp.reopen().map_err(|e| {
            error!(error = %e, "cannot open upload file");
            internal()
        })?;
        let mut file = tokio::fs::File::from_std(std_file);

        let mut written = 0usize;
        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            written += chunk.len();
            if written > state.max_upload_bytes {
                return Err(payload_too_large(state.max_upload_bytes));
            }
            file.write_all(&chunk).await.map_err(|e| {
                error!(error = %e, "cannot write upload file");
                internal()
            })?;
        }
        file.flush().await.map_err(|e| {
            error!(error = %e, "cannot flush upload file");
            internal()
        })?;
        info!(user = %user, bytes = written, "catalog upload received");
        break tmp;
    };

    let summary = ingest::import_file(&*state.store, upload.path()).await?;
    Ok(Json(summary))
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> AppError {
    let status = err.status();
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError {
            status,
            code: "payload_too_large".to_string(),
            message: err.body_text(),
        };
    }
    AppError {
        status,
        code: "bad_request".to_string(),
        message: err.body_text(),
    }
}

// ============ GET /pokemons ============

async fn handle_list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListQuery>,
) -> Result<Json<Page<EntryView>>, AppError> {
    let viewer = caller(&state, &headers).await?;
    let (filter, page) = params.parse(state.query.default_limit, state.query.max_limit)?;
    let result = query::list(&*state.store, &filter, page, viewer.as_deref()).await?;
    Ok(Json(result))
}

// ============ GET /pokemons/favorites ============

async fn handle_favorites(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListQuery>,
) -> Result<Json<Page<EntryView>>, AppError> {
    let user = require_caller(&state, &headers).await?;
    let paging = ListQuery {
        page: params.page,
        limit: params.limit,
        ..Default::default()
    };
    let (_, page) = paging.parse(state.query.default_limit, state.query.max_limit)?;
    let result = query::list_favorites(&*state.store, &user, page).await?;
    Ok(Json(result))
}

// ============ GET /pokemons/{id} ============

async fn handle_get(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<EntryView>, AppError> {
    let viewer = caller(&state, &headers).await?;
    let view = query::get_by_id(&*state.store, &id, viewer.as_deref()).await?;
    Ok(Json(view))
}

// ============ POST /pokemons/{id}/favorite ============

async fn handle_toggle(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<ToggleOutcome>, AppError> {
    let user = require_caller(&state, &headers).await?;
    let outcome = favorites::toggle(&*state.store, &user, &id).await?;
    Ok(Json(outcome))
}
