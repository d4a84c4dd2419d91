use std::sync::Arc;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::middleware::RequestLimiter;
use crate::services::SessionStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sessions: Arc<SessionStore>,
    pub limiter: Arc<RequestLimiter>,
}

impl AppState {
    pub fn new(config: Config) -> AppResult<Self> {
        config
            .validate()
            .map_err(|e| AppError::config(e.to_string()))?;

        let sessions = SessionStore::new(&config.staging_dir, config.optimize_threshold_mb)?;
        let limiter = RequestLimiter::new(config.max_concurrent_requests);
        Ok(Self {
            config: Arc::new(config),
            sessions: Arc::new(sessions),
            limiter: Arc::new(limiter),
        })
    }
}
