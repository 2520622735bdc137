//! Health, deployment info and cross-module statistics.

use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;

use super::{ok, HandlerResult};
use crate::http::dto::{DeployInfo, ErrorBody, HealthResponse, API_VERSION, SERVICE_NAME};
use crate::db::RepositoryResult;
use crate::http::state::AppState;
use crate::services::stats::{self, GeneralStats};

const DATABASE_UNREACHABLE: &str = "Database is not reachable";

/// Reason the health check failed, if it did.
///
/// Gateway errors are logged in full; the body carries their text only in
/// development.
fn health_failure(outcome: RepositoryResult<bool>, development: bool) -> Option<String> {
    match outcome {
        Ok(true) => None,
        Ok(false) => Some(DATABASE_UNREACHABLE.to_string()),
        Err(e) => {
            tracing::error!(error = %e, "health check failed");
            Some(if development {
                e.to_string()
            } else {
                DATABASE_UNREACHABLE.to_string()
            })
        }
    }
}

/// GET /api/health
///
/// 200 when the database answers, 503 otherwise.
pub async fn health_check(State(state): State<AppState>) -> Response {
    let outcome = state.repository.health_check().await;
    match health_failure(outcome, state.config.is_development()) {
        None => Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now(),
            database: Some("connected".to_string()),
            version: Some(API_VERSION.to_string()),
            environment: Some(state.config.environment.clone()),
            error: None,
        })
        .into_response(),
        Some(error) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "unhealthy".to_string(),
                timestamp: Utc::now(),
                database: None,
                version: None,
                environment: None,
                error: Some(error),
            }),
        )
            .into_response(),
    }
}

/// GET /api/deploy-info
pub async fn deploy_info(State(state): State<AppState>) -> HandlerResult<DeployInfo> {
    let config = &state.config;
    ok(DeployInfo {
        service: SERVICE_NAME.to_string(),
        version: API_VERSION.to_string(),
        timestamp: Utc::now(),
        environment: config.environment.clone(),
        region: config.deploy_region.clone().unwrap_or_else(|| "unknown".to_string()),
        build_id: config
            .build_id
            .as_deref()
            .map(|id| id.chars().take(7).collect())
            .unwrap_or_else(|| "unknown".to_string()),
    })
}

/// GET /api/stats/general
///
/// Sales and expense rollup with `net_profit = paid revenue - approved expenses`.
pub async fn general_stats(State(state): State<AppState>) -> HandlerResult<GeneralStats> {
    ok(stats::load_general_stats(state.repo()).await?)
}

/// Fallback for unknown routes.
pub async fn not_found(uri: Uri) -> Response {
    let body = ErrorBody::new("Endpoint not found").with_details(json!({ "path": uri.path() }));
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}
