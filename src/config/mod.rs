use std::env;
use std::path::PathBuf;
use anyhow::{Result, Context};
use tracing::{info, warn};

/// Allowance for multipart boundaries and part headers on top of the file
/// itself, so an oversized file is caught by the per-file check.
pub const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub max_file_size_mb: usize,
    pub max_concurrent_requests: usize,
    pub optimize_threshold_mb: f64,
    pub session_ttl_seconds: u64,
    pub staging_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        let config = Config {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| {
                info!("SERVER_HOST not set, using default: 0.0.0.0");
                "0.0.0.0".to_string()
            }),
            server_port: Self::parse_env_var("SERVER_PORT", 8080)
                .context("Failed to parse SERVER_PORT")?,
            max_file_size_mb: Self::parse_env_var("MAX_FILE_SIZE_MB", 200)
                .context("Failed to parse MAX_FILE_SIZE_MB")?,
            max_concurrent_requests: Self::parse_env_var("MAX_CONCURRENT_REQUESTS", 100)
                .context("Failed to parse MAX_CONCURRENT_REQUESTS")?,
            optimize_threshold_mb: Self::parse_env_var("OPTIMIZE_THRESHOLD_MB", 2.0)
                .context("Failed to parse OPTIMIZE_THRESHOLD_MB")?,
            session_ttl_seconds: Self::parse_env_var("SESSION_TTL_SECONDS", 3600)
                .context("Failed to parse SESSION_TTL_SECONDS")?,
            staging_dir: env::var("STAGING_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    let dir = env::temp_dir().join("imgtrim");
                    info!("STAGING_DIR not set, using default: {}", dir.display());
                    dir
                }),
        };

        config.validate()?;

        info!("Configuration loaded successfully: {:?}", config);
        Ok(config)
    }

    /// Largest file accepted in an upload.
    pub fn max_file_size_bytes(&self) -> usize {
        self.max_file_size_mb * 1024 * 1024
    }

    /// Byte ceiling applied to whole request bodies.
    pub fn max_body_bytes(&self) -> usize {
        self.max_file_size_bytes() + MULTIPART_OVERHEAD_BYTES
    }

    fn parse_env_var<T>(var_name: &str, default: T) -> Result<T>
    where
        T: std::str::FromStr + Copy + std::fmt::Debug,
        T::Err: std::fmt::Display,
    {
        match env::var(var_name) {
            Ok(val) => match val.parse() {
                Ok(parsed) => Ok(parsed),
                Err(e) => {
                    warn!("Failed to parse {}: {} (using default: {:?})", var_name, e, default);
                    Ok(default)
                }
            },
            Err(_) => {
                info!("{} not set, using default: {:?}", var_name, default);
                Ok(default)
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.server_port == 0 {
            return Err(anyhow::anyhow!("SERVER_PORT must be greater than 0"));
        }
        if self.max_file_size_mb == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be greater than 0"));
        }
        if self.max_concurrent_requests == 0 {
            return Err(anyhow::anyhow!("MAX_CONCURRENT_REQUESTS must be greater than 0"));
        }
        if !self.optimize_threshold_mb.is_finite() || self.optimize_threshold_mb < 0.0 {
            return Err(anyhow::anyhow!("OPTIMIZE_THRESHOLD_MB must be a non-negative number"));
        }
        if self.session_ttl_seconds == 0 {
            return Err(anyhow::anyhow!("SESSION_TTL_SECONDS must be greater than 0"));
        }
        if self.staging_dir.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("STAGING_DIR must not be empty"));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: "0.0.0.0".to_string(),
            server_port: 8080,
            max_file_size_mb: 200,
            max_concurrent_requests: 100,
            optimize_threshold_mb: 2.0,
            session_ttl_seconds: 3600,
            staging_dir: env::temp_dir().join("imgtrim"),
        }
    }
}
