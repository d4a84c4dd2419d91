use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use tracing::{info, warn};

use crate::error::AppResult;
use crate::models::HealthResponse;
use crate::state::AppState;

/// Health check endpoint
pub async fn health_handler(State(state): State<AppState>) -> AppResult<Json<HealthResponse>> {
    let staging_ok = staging_writable(&state).await;
    let status = if staging_ok { "healthy" } else { "degraded" };

    let response = HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        active_sessions: state.sessions.len().await,
        rate_limiting: state.limiter.metrics(),
    };

    info!(
        status = status,
        active_sessions = response.active_sessions,
        "Health check completed"
    );

    Ok(Json(response))
}

/// Readiness check endpoint
pub async fn ready_handler(State(state): State<AppState>) -> Result<StatusCode, StatusCode> {
    if staging_writable(&state).await {
        info!("Readiness check passed");
        Ok(StatusCode::OK)
    } else {
        warn!("Readiness check failed - staging directory not writable");
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}

async fn staging_writable(state: &AppState) -> bool {
    let root = state.sessions.staging_root().to_path_buf();
    tokio::task::spawn_blocking(move || tempfile::tempfile_in(root).is_ok())
        .await
        .unwrap_or(false)
}
