use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub success: bool,
    pub data: SessionReport,
    pub processing_time_ms: u64,
}

/// Everything the UI needs to render one upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub session_id: Uuid,
    pub file_name: String,
    pub content_type: String,
    pub original_size_bytes: usize,
    pub original_size_mb: f64,
    pub needs_optimization: bool,
    pub default_quality: Option<u8>,
    pub results: Vec<QualityReport>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    pub quality: u8,
    pub size_bytes: usize,
    pub size_mb: f64,
    pub file_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub service: String,
    pub active_sessions: usize,
    pub rate_limiting: RateLimitStats,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RateLimitStats {
    pub total_requests: u64,
    pub rejected_requests: u64,
    pub available_permits: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    pub request_id: String,
    pub timestamp: String,
}

impl SessionResponse {
    pub fn new(data: SessionReport, processing_time_ms: u64) -> Self {
        Self {
            success: true,
            data,
            processing_time_ms,
        }
    }
}

impl SessionReport {
    /// Size formatted the way the page shows it, e.g. `3.00`.
    pub fn display_size(&self) -> String {
        format!("{:.2}", self.original_size_mb)
    }
}

impl QualityReport {
    pub fn display_size(&self) -> String {
        format!("{:.2}", self.size_mb)
    }
}
