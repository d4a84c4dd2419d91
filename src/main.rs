use std::env;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use imgtrim::{
    config::Config,
    error::AppError,
    handlers::create_router,
    state::AppState,
};

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing; LOG_FORMAT=json switches to structured output
    let json_logs = env::var("LOG_FORMAT").map(|f| f == "json").unwrap_or(false);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "imgtrim=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(|| tracing_subscriber::fmt::layer().with_target(false)))
        .init();

    let config = Config::from_env().map_err(|e| AppError::config(format!("{:#}", e)))?;

    tracing::info!("Starting imgtrim image service");
    tracing::info!("Max file size: {}MB", config.max_file_size_mb);
    tracing::info!("Max concurrent requests: {}", config.max_concurrent_requests);
    tracing::info!("Optimization threshold: {}MB", config.optimize_threshold_mb);

    let ttl = Duration::from_secs(config.session_ttl_seconds);
    let server_port = config.server_port;
    let host = config.server_host.clone();

    let state = AppState::new(config)?;

    // Idle sessions take their staging directories with them
    let sessions = state.sessions.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            sessions.purge_expired(ttl).await;
        }
    });

    let app = create_router(state);

    // PORT wins over SERVER_PORT when the platform sets it
    let port = env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(server_port);

    let addr = format!("{}:{}", host, port);
    tracing::info!("Server listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
