use anyhow::Result;
use axum::{
    extract::rejection::{PathRejection, QueryRejection},
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use retriever_core::{
    DocumentId, DocumentSource, FileSource, FitSummary, IndexStats, Paragraph, RetrievalError, Retriever,
    TfidfRetriever, Vectorizer,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub type SharedRetriever = Arc<TfidfRetriever<Arc<dyn DocumentSource>>>;

#[derive(Deserialize)]
pub struct RetrieveParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
    /// Comma-separated candidate document ids.
    #[serde(default)]
    pub doc_ids: Option<String>,
    #[serde(default)]
    pub verbose: bool,
}
fn default_k() -> usize { 10 }

#[derive(Serialize)]
pub struct RetrieveResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<RetrieveHit>,
}

#[derive(Serialize)]
pub struct RetrieveHit {
    pub document_id: DocumentId,
    pub paragraph_id: u32,
    pub score: f64,
    pub text: String,
}

#[derive(Clone)]
pub struct AppState {
    pub retriever: SharedRetriever,
    pub admin_token: Option<String>,
}

/// Maps retrieval failures to HTTP status codes with a `{"error": ...}` body.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Unauthorized(String),
    NotFitted(String),
    Internal(String),
}

impl From<RetrievalError> for ApiError {
    fn from(err: RetrievalError) -> Self {
        let msg = err.to_string();
        match err {
            RetrievalError::InvalidArgument(_) => ApiError::BadRequest(msg),
            RetrievalError::ModelNotFitted => ApiError::NotFitted(msg),
            RetrievalError::Source(e) => ApiError::Internal(format!("document source: {e:#}")),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rej: QueryRejection) -> Self {
        ApiError::BadRequest(rej.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rej: PathRejection) -> Self {
        ApiError::BadRequest(rej.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            ApiError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, m),
            ApiError::NotFitted(m) => (StatusCode::SERVICE_UNAVAILABLE, m),
            ApiError::Internal(m) => {
                tracing::error!(error = %m, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, m)
            }
        };
        (status, Json(json!({ "error": msg }))).into_response()
    }
}

/// Serve documents from `documents` (file or directory), fitting once before returning.
pub fn build_app(documents: String, vectorizer: Vectorizer) -> Result<Router> {
    let source: Arc<dyn DocumentSource> = Arc::new(FileSource::new(&documents));
    let retriever = Arc::new(TfidfRetriever::with_vectorizer(source, vectorizer));
    retriever.fit()?;
    let admin_token = std::env::var("ADMIN_TOKEN").ok();
    Ok(router(AppState { retriever, admin_token }))
}

pub fn router(app_state: AppState) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/retrieve", get(retrieve_handler))
        .route("/paragraph/:paragraph_id", get(paragraph_handler))
        .route("/stats", get(stats_handler))
        .route("/fit", post(fit_handler))
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

fn parse_doc_ids(raw: &str) -> Result<HashSet<DocumentId>, ApiError> {
    let mut ids = HashSet::new();
    for id in raw.split(',').map(str::trim) {
        if id.is_empty() {
            return Err(RetrievalError::InvalidArgument(format!("empty document id in {raw:?}")).into());
        }
        ids.insert(id.to_string());
    }
    Ok(ids)
}

pub async fn retrieve_handler(
    State(state): State<AppState>,
    params: Result<Query<RetrieveParams>, QueryRejection>,
) -> Result<Json<RetrieveResponse>, ApiError> {
    let Query(params) = params?;
    let start = std::time::Instant::now();
    let candidates = params.doc_ids.as_deref().map(parse_doc_ids).transpose()?;
    let got = state.retriever.retrieve(&params.q, candidates.as_ref(), params.k, params.verbose)?;

    let results: Vec<RetrieveHit> = got
        .meta
        .into_iter()
        .zip(got.passages)
        .zip(got.scores)
        .map(|((m, text), score)| RetrieveHit { document_id: m.document_id, paragraph_id: m.paragraph_id, score, text })
        .collect();
    let elapsed = start.elapsed();
    Ok(Json(RetrieveResponse { query: params.q, took_s: elapsed.as_secs_f64(), total_hits: results.len(), results }))
}

pub async fn paragraph_handler(
    State(state): State<AppState>,
    paragraph_id: Result<Path<u32>, PathRejection>,
) -> Result<Json<Paragraph>, ApiError> {
    let Path(paragraph_id) = paragraph_id?;
    let index = state.retriever.snapshot()?;
    index
        .paragraph(paragraph_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("paragraph {paragraph_id} not found")))
}

pub async fn stats_handler(State(state): State<AppState>) -> Result<Json<IndexStats>, ApiError> {
    Ok(Json(state.retriever.snapshot()?.stats()))
}

// --- Admin endpoints ---
async fn fit_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<FitSummary>, ApiError> {
    authorize(&state, &headers)?;
    let retriever = state.retriever.clone();
    let summary = tokio::task::spawn_blocking(move || retriever.fit())
        .await
        .map_err(|e| ApiError::Internal(format!("fit task failed: {e}")))??;
    Ok(Json(summary))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err(ApiError::Unauthorized("ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err(ApiError::Unauthorized("invalid admin token".into()))
    }
}
