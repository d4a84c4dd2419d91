//! Unit tests for individual components

use axum::http::StatusCode;
use bytes::Bytes;
use imgtrim::{
    config::Config,
    error::AppError,
    models::{ImageKind, UploadedFile},
    services::{measure_size, optimize, truncate, DEFAULT_QUALITY, QUALITY_LEVELS},
    state::AppState,
};
use std::env;

#[test]
fn test_config_loading() {
    let staging = tempfile::tempdir().unwrap();
    env::set_var("SERVER_HOST", "127.0.0.1");
    env::set_var("SERVER_PORT", "9090");
    env::set_var("MAX_FILE_SIZE_MB", "5");
    env::set_var("OPTIMIZE_THRESHOLD_MB", "1.5");
    env::set_var("SESSION_TTL_SECONDS", "not-a-number");
    env::set_var("STAGING_DIR", staging.path());

    let config = Config::from_env().unwrap();
    assert_eq!(config.server_host, "127.0.0.1");
    assert_eq!(config.server_port, 9090);
    assert_eq!(config.max_file_size_mb, 5);
    assert_eq!(config.optimize_threshold_mb, 1.5);
    // Unparsable values fall back to the default
    assert_eq!(config.session_ttl_seconds, 3600);
    assert_eq!(config.staging_dir, staging.path());

    for var in [
        "SERVER_HOST",
        "SERVER_PORT",
        "MAX_FILE_SIZE_MB",
        "OPTIMIZE_THRESHOLD_MB",
        "SESSION_TTL_SECONDS",
        "STAGING_DIR",
    ] {
        env::remove_var(var);
    }
}

#[test]
fn test_error_status_codes() {
    assert_eq!(AppError::MissingFile.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(AppError::RateLimitExceeded.status_code(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(AppError::FileTooLarge { limit: 10 }.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(AppError::InvalidQuality { quality: "10".to_string() }.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(AppError::session_not_found("x").status_code(), StatusCode::NOT_FOUND);
    assert_eq!(
        AppError::UnsupportedFileType { extension: "gif".to_string() }.status_code(),
        StatusCode::UNSUPPORTED_MEDIA_TYPE
    );
    assert_eq!(AppError::staging("disk full").status_code(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn test_error_codes() {
    assert_eq!(AppError::MissingFile.error_code(), "MISSING_FILE");
    assert_eq!(AppError::InvalidQuality { quality: "abc".to_string() }.error_code(), "INVALID_QUALITY");
    assert_eq!(AppError::validation("bad").error_code(), "VALIDATION_ERROR");
    assert_eq!(AppError::config("bad").error_code(), "CONFIG_ERROR");
    assert_eq!(AppError::RateLimitExceeded.error_code(), "RATE_LIMIT_EXCEEDED");
}

#[test]
fn test_invalid_config_is_rejected_at_startup() {
    let staging = tempfile::tempdir().unwrap();
    let config = Config {
        session_ttl_seconds: 0,
        staging_dir: staging.path().to_path_buf(),
        ..Config::default()
    };

    match AppState::new(config) {
        Err(AppError::ConfigError { message }) => assert!(message.contains("SESSION_TTL_SECONDS")),
        Err(other) => panic!("Expected ConfigError, got {:?}", other),
        Ok(_) => panic!("Expected ConfigError"),
    }

    let config = Config {
        staging_dir: staging.path().to_path_buf(),
        ..Config::default()
    };
    assert!(AppState::new(config).is_ok());
}

#[test]
fn test_quality_ladder() {
    assert_eq!(QUALITY_LEVELS, [75, 50, 25]);
    assert_eq!(DEFAULT_QUALITY, 75);
}

#[test]
fn test_truncation_properties() {
    let data: Vec<u8> = (0..=255u8).cycle().take(99_999).collect();

    assert_eq!(truncate(&data, 100), &data[..]);
    assert!(truncate(&data, 0).is_empty());
    assert_eq!(truncate(&data, 25).len(), 24_999);
    assert_eq!(truncate(&data, 50).len(), 49_999);
    assert_eq!(truncate(&data, 75).len(), 74_999);

    let results = optimize(&Bytes::from(data.clone()));
    for pair in results.windows(2) {
        assert!(pair[0].data.starts_with(&pair[1].data));
    }
}

#[test]
fn test_measure_size() {
    assert_eq!(measure_size(&[]), 0.0);
    assert_eq!(measure_size(&vec![0u8; 3 * 1024 * 1024]), 3.0);
    assert_eq!(format!("{:.2}", measure_size(&vec![0u8; 1024 * 1024])), "1.00");
}

#[test]
fn test_uploaded_file_kinds() {
    let jpeg = UploadedFile::new("holiday.JPG", Bytes::from_static(b"\xff\xd8")).unwrap();
    assert_eq!(jpeg.kind, ImageKind::Jpeg);
    assert_eq!(jpeg.kind.content_type(), "image/jpeg");

    let png = UploadedFile::new("diagram.png", Bytes::new()).unwrap();
    assert_eq!(png.kind.content_type(), "image/png");

    // Suffix decides, not content
    let disguised = UploadedFile::new("notes.png", Bytes::from_static(b"plain text")).unwrap();
    assert_eq!(disguised.kind, ImageKind::Png);

    assert!(matches!(
        UploadedFile::new("archive.zip", Bytes::new()),
        Err(AppError::UnsupportedFileType { .. })
    ));
}
