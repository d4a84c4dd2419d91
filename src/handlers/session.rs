use axum::{
    extract::{rejection::QueryRejection, Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use std::time::Instant;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{DownloadQuery, SessionResponse, UploadedFile};
use crate::state::AppState;

const FILE_FIELD: &str = "file";

/// `POST /api/v1/sessions`
pub async fn upload_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<SessionResponse>)> {
    let start = Instant::now();
    info!("Starting upload request");

    let file = read_upload(&mut multipart, state.config.max_file_size_mb).await?;
    let report = state.sessions.create(file).await?;

    let total_time = start.elapsed().as_millis() as u64;
    info!(
        session_id = %report.session_id,
        total_time_ms = total_time,
        "Upload completed successfully"
    );

    Ok((StatusCode::CREATED, Json(SessionResponse::new(report, total_time))))
}

/// `PUT /api/v1/sessions/:id`
pub async fn replace_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> AppResult<Json<SessionResponse>> {
    let start = Instant::now();
    info!(session_id = %id, "Starting file replacement request");

    let file = read_upload(&mut multipart, state.config.max_file_size_mb).await?;
    let report = state.sessions.replace(id, file).await?;

    let total_time = start.elapsed().as_millis() as u64;
    Ok(Json(SessionResponse::new(report, total_time)))
}

/// `GET /api/v1/sessions/:id`
pub async fn report_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SessionResponse>> {
    let report = state.sessions.report(id).await?;
    Ok(Json(SessionResponse::new(report, 0)))
}

/// `GET /api/v1/sessions/:id/preview`
pub async fn preview_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    let (data, content_type) = state.sessions.preview(id).await?;
    debug!(session_id = %id, file_size = data.len(), "Serving preview");

    Ok(([(header::CONTENT_TYPE, content_type)], data).into_response())
}

/// `GET /api/v1/sessions/:id/download?quality=N`
pub async fn download_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    query: Result<Query<DownloadQuery>, QueryRejection>,
) -> AppResult<Response> {
    let Query(query) = query.map_err(|rejection| AppError::validation(rejection.body_text()))?;
    let artifact = state
        .sessions
        .artifact(id, query.quality.as_deref())
        .await?;

    info!(
        session_id = %id,
        quality = ?query.quality,
        file_name = %artifact.file_name,
        file_size = artifact.data.len(),
        "Serving download"
    );

    Ok((
        [
            (header::CONTENT_TYPE, artifact.content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", artifact.file_name),
            ),
        ],
        artifact.data,
    )
        .into_response())
}

/// `DELETE /api/v1/sessions/:id`
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.sessions.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Pulls the `file` field out of a multipart form. Other fields are skipped.
pub async fn read_upload(multipart: &mut Multipart, limit_mb: usize) -> AppResult<UploadedFile> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::FileTooLarge { limit: limit_mb }
        } else {
            AppError::InvalidFile {
                message: format!("Failed to read multipart field: {}", e),
            }
        }
    })? {
        if field.name().unwrap_or("") != FILE_FIELD {
            continue;
        }

        let file_name = match field.file_name() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => return Err(AppError::MissingFile),
        };

        // Reject by suffix before buffering the body
        crate::models::ImageKind::from_file_name(&file_name)?;

        let data = field.bytes().await.map_err(|e| {
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                AppError::FileTooLarge { limit: limit_mb }
            } else {
                error!(file_name = %file_name, error = %e, "Failed to read upload body");
                AppError::InvalidFile {
                    message: format!("Failed to read file data: {}", e),
                }
            }
        })?;

        if data.len() > limit_mb * 1024 * 1024 {
            return Err(AppError::FileTooLarge { limit: limit_mb });
        }

        let file = UploadedFile::new(&file_name, data)?;
        info!(
            file_name = %file.name,
            file_size = file.size(),
            content_type = file.kind.content_type(),
            "File extracted from multipart form"
        );
        return Ok(file);
    }

    Err(AppError::MissingFile)
}
