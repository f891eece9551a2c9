use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use credscan_core::{
    AnalysisError, AnalysisRequest, AnalysisResult, CredibilityAnalyzer, GENERIC_FAILURE_MESSAGE,
};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;

#[derive(Clone)]
pub(crate) struct AppState {
    analyzer: Arc<CredibilityAnalyzer>,
}

/// Errors returned to HTTP callers as `{ "error": <message> }`.
#[derive(Debug)]
pub(crate) enum ApiError {
    BadPayload(String),
    Analysis(AnalysisError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadPayload(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Analysis(AnalysisError::Invalid(err)) => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            ApiError::Analysis(AnalysisError::Completion { .. }) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                GENERIC_FAILURE_MESSAGE.to_string(),
            ),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub(crate) fn router(analyzer: CredibilityAnalyzer) -> Router {
    let state = AppState {
        analyzer: Arc::new(analyzer),
    };
    Router::new()
        .route("/analyze", post(analyze_endpoint))
        .route("/health", get(healthcheck))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub(crate) async fn run(server: &ServerConfig, analyzer: CredibilityAnalyzer) -> Result<()> {
    let addr = server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "credibility analysis service ready");

    axum::serve(listener, router(analyzer))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server terminated unexpectedly")
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn analyze_endpoint(
    State(state): State<AppState>,
    payload: Result<Json<AnalysisRequest>, JsonRejection>,
) -> Result<Json<AnalysisResult>, ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::BadPayload(rejection.body_text()))?;
    info!(domain = %request.domain, "analysis requested");
    let result = state
        .analyzer
        .analyze(request)
        .await
        .map_err(ApiError::Analysis)?;
    Ok(Json(result))
}
