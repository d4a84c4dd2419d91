pub mod health;
pub mod pages;
pub mod session;

pub use health::*;
pub use pages::*;
pub use session::*;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{logging_middleware, rate_limit_middleware};
use crate::state::AppState;

/// Builds the full application router over `state`.
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.max_body_bytes();
    let limiter = state.limiter.clone();

    Router::new()
        // Health
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        // Browser flow
        .route("/", get(index_handler))
        .route("/upload", post(upload_form_handler))
        .route("/sessions/:id", get(session_page_handler))
        // JSON API
        .route("/api/v1/sessions", post(upload_handler))
        .route(
            "/api/v1/sessions/:id",
            get(report_handler).put(replace_handler).delete(delete_handler),
        )
        .route("/api/v1/sessions/:id/preview", get(preview_handler))
        .route("/api/v1/sessions/:id/download", get(download_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(body_limit))
                .layer(axum::middleware::from_fn(logging_middleware))
                .layer(axum::middleware::from_fn_with_state(limiter, rate_limit_middleware)),
        )
        .with_state(state)
}
