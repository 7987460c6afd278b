use actions::{ActionFilter, ActionList, derive_actions};
use axum::{
    Json, Router,
    extract::{Path, Query, Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use store::{DocumentStore, StoredDocument};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::metrics::{Metrics, MetricsSnapshot, TimedOperation};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            metrics: Metrics::new(),
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    documents: Option<usize>,
}

#[derive(Deserialize)]
struct AnalyzeParams {
    filename: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(get_metrics))
        .route("/documents/analyze", post(analyze_document))
        .route("/documents/:document_id", get(get_document))
        .route("/documents/:document_id/actions", get(get_document_actions))
        .layer(middleware::from_fn_with_state(state.clone(), track_requests))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

async fn track_requests(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let timer = TimedOperation::start();
    let response = next.run(request).await;
    state
        .metrics
        .record_request(response.status().is_success(), timer.elapsed());
    response
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    match state.store.list().await {
        Ok(records) => Json(HealthResponse {
            status: "ok",
            documents: Some(records.len()),
        }),
        Err(e) => {
            tracing::warn!(error = %e, "Store unavailable");
            Json(HealthResponse {
                status: "degraded",
                documents: None,
            })
        }
    }
}

async fn get_metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

/// Full stored record for a document id.
async fn get_document(
    State(state): State<AppState>,
    Path(document_id): Path<String>,
) -> Result<Json<StoredDocument>, ApiError> {
    let record = state
        .store
        .get(&document_id)
        .await
        .map_err(|e| ApiError::from_lookup(e, "Document not found"))?;
    Ok(Json(record))
}

/// Stored record for a previously processed file, matched by name
/// ignoring case. Nothing is classified on demand.
async fn analyze_document(
    State(state): State<AppState>,
    Query(params): Query<AnalyzeParams>,
) -> Result<Json<StoredDocument>, ApiError> {
    let filename = params
        .filename
        .filter(|name| !name.is_empty())
        .ok_or(ApiError::BadRequest("Missing filename query parameter"))?;
    let record = state
        .store
        .find_by_filename(&filename)
        .await
        .map_err(|e| ApiError::from_lookup(e, "File not found"))?;
    Ok(Json(record))
}

async fn get_document_actions(
    State(state): State<AppState>,
    Path(document_id): Path<String>,
    Query(filter): Query<ActionFilter>,
) -> Result<Json<ActionList>, ApiError> {
    let record = state
        .store
        .get(&document_id)
        .await
        .map_err(|e| ApiError::from_lookup(e, "Document not found"))?;

    let actions = derive_actions(record.classification.label, &record.metadata);
    let actions = filter.apply(&actions);
    tracing::debug!(document_id = %record.document_id, count = actions.len(), "Derived actions");

    Ok(Json(ActionList {
        document_id: record.document_id,
        actions,
    }))
}
