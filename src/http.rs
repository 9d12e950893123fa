// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! JSON-over-HTTP interface to a [RouteService].
//!
//! - `POST /calculate_route` takes a [RouteRequest] and responds with a [RouteResult],
//! - `GET /health` reports the size of the loaded road network.
//!
//! Failures are reported as `{"error": "<kind>", "message": "<description>"}`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{debug, error, warn};
use serde::Serialize;
use tower_http::cors::CorsLayer;

use crate::{RouteError, RouteRequest, RouteResult, RouteService};

/// Shared state of the HTTP handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    service: RouteService,
}

impl AppState {
    pub fn new(service: RouteService) -> Self {
        Self { service }
    }
}

/// Builds the [Router] serving route requests with permissive CORS.
pub fn router(service: RouteService) -> Router {
    Router::new()
        .route("/calculate_route", post(calculate_route))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(AppState::new(service))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

/// Error returned by the handlers, mapped onto an HTTP status code.
#[derive(Debug)]
enum ApiError {
    Route(RouteError),
    Internal(String),
}

impl ApiError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Route(RouteError::InvalidCoordinate { .. }) => {
                (StatusCode::BAD_REQUEST, "invalid_coordinate")
            }
            Self::Route(RouteError::NoPath { .. }) => (StatusCode::NOT_FOUND, "no_path"),
            Self::Route(RouteError::SearchAborted(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "search_aborted")
            }
            Self::Route(RouteError::EmptyGraph) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "empty_graph")
            }
            Self::Route(RouteError::InvalidNode(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "invalid_node")
            }
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();
        let message = match &self {
            Self::Route(e) => e.to_string(),
            Self::Internal(_) => "internal server error".to_string(),
        };

        match &self {
            Self::Internal(e) => error!("Route request failed: {e}"),
            Self::Route(e) => warn!("Route request failed: {e}"),
        }

        let body = ErrorBody {
            error: kind,
            message,
        };
        (status, Json(body)).into_response()
    }
}

async fn calculate_route(
    State(state): State<AppState>,
    Json(request): Json<RouteRequest>,
) -> Result<Json<RouteResult>, ApiError> {
    debug!("Route request: {request:?}");

    // Searches are CPU-bound, keep them off the async workers
    let result = tokio::task::spawn_blocking(move || state.service.compute_route(&request))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(ApiError::Route)?;

    Ok(Json(result))
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let g = state.service.graph();
    Json(serde_json::json!({
        "status": "ok",
        "nodes": g.len(),
        "edges": g.edge_count(),
    }))
}
