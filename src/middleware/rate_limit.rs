use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Semaphore, SemaphorePermit};
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::models::RateLimitStats;

/// Caps in-flight requests. One permit is held for the lifetime of each
/// request that passes through [`rate_limit_middleware`].
#[derive(Debug)]
pub struct RequestLimiter {
    semaphore: Semaphore,
    total_requests: AtomicU64,
    rejected_requests: AtomicU64,
}

impl RequestLimiter {
    pub fn new(max_requests: usize) -> Self {
        info!(max_concurrent_requests = max_requests, "Initializing request semaphore");
        Self {
            semaphore: Semaphore::new(max_requests),
            total_requests: AtomicU64::new(0),
            rejected_requests: AtomicU64::new(0),
        }
    }

    pub fn try_acquire(&self) -> Result<SemaphorePermit<'_>, AppError> {
        let total_requests = self.total_requests.fetch_add(1, Ordering::Relaxed) + 1;

        self.semaphore.try_acquire().map_err(|_| {
            let rejected = self.rejected_requests.fetch_add(1, Ordering::Relaxed) + 1;
            warn!(
                total_requests = total_requests,
                rejected_requests = rejected,
                available_permits = self.semaphore.available_permits(),
                "Rate limit exceeded - too many concurrent requests"
            );
            AppError::RateLimitExceeded
        })
    }

    pub fn metrics(&self) -> RateLimitStats {
        RateLimitStats {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            rejected_requests: self.rejected_requests.load(Ordering::Relaxed),
            available_permits: self.semaphore.available_permits(),
        }
    }
}

pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RequestLimiter>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = request.uri().path().to_string();

    // Health endpoints bypass the limiter
    if path == "/health" || path == "/ready" {
        return Ok(next.run(request).await);
    }

    let _permit = limiter.try_acquire()?;

    debug!(
        path = path,
        available_permits = limiter.semaphore.available_permits(),
        "Request permit acquired"
    );

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_rejections_once_exhausted() {
        let limiter = RequestLimiter::new(1);

        let held = limiter.try_acquire().unwrap();
        assert!(matches!(limiter.try_acquire(), Err(AppError::RateLimitExceeded)));

        let stats = limiter.metrics();
        assert_eq!(stats.total_requests, 2);
        assert_eq!(stats.rejected_requests, 1);
        assert_eq!(stats.available_permits, 0);

        drop(held);
        assert!(limiter.try_acquire().is_ok());
        assert_eq!(limiter.metrics().available_permits, 1);
    }
}
