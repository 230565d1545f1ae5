//! HTTP API for the template corpus.
//!
//! Exposes the query engine, single-document lookup, the download surface,
//! and the retrieval selector to an external request layer.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/templates` | Filtered, paginated listing over the cached index |
//! | `GET`  | `/templates/{slug}` | One full document |
//! | `GET`  | `/templates/{slug}/download` | Raw document JSON as an attachment |
//! | `POST` | `/context` | Top-k retrieval context for a free-text query |
//! | `POST` | `/admin/reindex` | Rebuild the index and reload the cache |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! All error responses carry a JSON body:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "page must be >= 1" } }
//! ```
//!
//! "No data yet" is never an error: an unbuilt index lists as zero records,
//! and a missing cleaned directory yields zero context chunks.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser-based
//! marketplace clients.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::error::CorpusError;
use crate::get::{download_filename, get_document};
use crate::index;
use crate::models::{Complexity, ContextChunk};
use crate::query::{self, IndexCache, QueryParams};
use crate::retrieval;
use crate::store::CorpusStore;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    store: Arc<CorpusStore>,
    cache: Arc<IndexCache>,
}

/// Start the HTTP server on the configured bind address. Runs until the
/// process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let store = CorpusStore::new(config);
    store.ensure_layout()?;

    let state = AppState {
        config: Arc::new(config.clone()),
        store: Arc::new(store),
        cache: Arc::new(IndexCache::new()),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/templates", get(handle_list_templates))
        .route("/templates/{slug}", get(handle_get_template))
        .route("/templates/{slug}/download", get(handle_download_template))
        .route("/context", post(handle_context))
        .route("/admin/reindex", post(handle_reindex))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state);

    println!("flowdex API listening on http://{bind_addr}");

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
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

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

/// Map store errors onto the HTTP error contract. Malformed documents read
/// as 404 on single lookups; a corrupt record must not 500 the endpoint.
fn classify_store_error(err: CorpusError) -> AppError {
    match err {
        CorpusError::NotFound(what) => not_found(format!("not found: {what}")),
        CorpusError::InvalidIdentifier(slug) => AppError {
            status: StatusCode::BAD_REQUEST,
            code: "invalid_identifier".to_string(),
            message: format!("invalid identifier: {slug:?}"),
        },
        CorpusError::MalformedDocument { slug, .. } => not_found(format!("not found: {slug}")),
        other => internal(other.to_string()),
    }
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

// ============ GET /templates ============

#[derive(Deserialize)]
struct TemplatesQuery {
    page: Option<usize>,
    limit: Option<usize>,
    search: Option<String>,
    category: Option<String>,
    complexity: Option<String>,
}

#[derive(Serialize)]
struct TemplatesResponse {
    records: Vec<crate::models::IndexRecord>,
    total: usize,
    page: usize,
    page_size: usize,
    has_more: bool,
}

async fn handle_list_templates(
    State(state): State<AppState>,
    Query(params): Query<TemplatesQuery>,
) -> Result<Json<TemplatesResponse>, AppError> {
    let page = params.page.unwrap_or(1);
    if page < 1 {
        return Err(bad_request("page must be >= 1"));
    }
    let page_size = params
        .limit
        .unwrap_or(state.config.query.default_page_size);
    if page_size < 1 {
        return Err(bad_request("limit must be >= 1"));
    }

    let complexity = match params.complexity.as_deref() {
        Some(raw) => Some(Complexity::parse(raw).ok_or_else(|| {
            bad_request(format!(
                "unknown complexity: '{raw}'. Use Beginner, Intermediate, or Advanced."
            ))
        })?),
        None => None,
    };

    let snapshot = state
        .cache
        .get_or_load(&state.store)
        .map_err(|e| internal(e.to_string()))?;

    let query_params = QueryParams {
        page,
        page_size,
        search: params.search,
        category: params.category,
        complexity,
    };
    let outcome = query::execute(&snapshot, &query_params);
    let has_more = outcome.has_more(&query_params);

    Ok(Json(TemplatesResponse {
        records: outcome.records,
        total: outcome.total,
        page,
        page_size,
        has_more,
    }))
}

// ============ GET /templates/{slug} ============

async fn handle_get_template(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<crate::models::Document>, AppError> {
    let doc = get_document(&state.store, &slug).map_err(classify_store_error)?;
    Ok(Json(doc))
}

// ============ GET /templates/{slug}/download ============

async fn handle_download_template(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, AppError> {
    let raw = state.store.read_raw(&slug).map_err(classify_store_error)?;

    let disposition = format!("attachment; filename=\"{}\"", download_filename(&slug));
    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        raw,
    )
        .into_response())
}

// ============ POST /context ============

#[derive(Deserialize)]
struct ContextRequest {
    query: String,
    k: Option<usize>,
}

#[derive(Serialize)]
struct ContextResponse {
    chunks: Vec<ContextChunk>,
}

async fn handle_context(
    State(state): State<AppState>,
    Json(req): Json<ContextRequest>,
) -> Result<Json<ContextResponse>, AppError> {
    if req.query.trim().is_empty() {
        return Err(bad_request("query must not be empty"));
    }
    let k = req.k.unwrap_or(state.config.retrieval.context_k);
    if k < 1 {
        return Err(bad_request("k must be >= 1"));
    }

    let chunks = retrieval::select_context(
        &state.config.corpus.cleaned_dir,
        &req.query,
        k,
        state.config.retrieval.jitter,
    )
    .map_err(|e| internal(e.to_string()))?;

    Ok(Json(ContextResponse { chunks }))
}

// ============ POST /admin/reindex ============

#[derive(Serialize)]
struct ReindexResponse {
    records: usize,
    skipped: usize,
    bytes: u64,
}

/// Rebuild the index artifact, then reload the serving cache. This is the rebuild
/// completion hook that keeps this process's snapshot current.
async fn handle_reindex(State(state): State<AppState>) -> Result<Json<ReindexResponse>, AppError> {
    let summary = index::rebuild_index(&state.store, &state.config.index)
        .map_err(|e| internal(e.to_string()))?;
    state
        .cache
        .reload(&state.store)
        .map_err(|e| internal(e.to_string()))?;

    Ok(Json(ReindexResponse {
        records: summary.records,
        skipped: summary.skipped,
        bytes: summary.bytes,
    }))
}
