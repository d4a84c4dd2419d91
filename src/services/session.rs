use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{QualityReport, SessionReport, UploadedFile};
use crate::services::optimizer::{self, QualityResult, DEFAULT_QUALITY, QUALITY_LEVELS};

/// On-disk copy of an upload, kept in its own scratch directory. Dropping
/// the value removes the directory and everything in it.
#[derive(Debug)]
pub struct StagedFile {
    dir: TempDir,
    path: PathBuf,
}

impl StagedFile {
    pub async fn write(root: &Path, file: &UploadedFile) -> AppResult<Self> {
        let dir = tempfile::Builder::new()
            .prefix("session-")
            .tempdir_in(root)
            .map_err(|e| AppError::staging(format!("Failed to create staging directory: {}", e)))?;

        let path = dir.path().join(file.staging_name());
        tokio::fs::write(&path, &file.bytes)
            .await
            .map_err(|e| AppError::staging(format!("Failed to write {}: {}", path.display(), e)))?;

        debug!(path = %path.display(), file_size = file.size(), "Staged upload");
        Ok(Self { dir, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

/// What a session hands back for download.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub file_name: String,
    pub content_type: &'static str,
    pub data: bytes::Bytes,
}

#[derive(Debug)]
pub struct Session {
    pub id: Uuid,
    pub file: UploadedFile,
    pub staged: StagedFile,
    /// Empty when the upload is already under the threshold.
    pub results: Vec<QualityResult>,
    pub created_at: DateTime<Utc>,
    last_access: Instant,
}

impl Session {
    async fn build(
        id: Uuid,
        file: UploadedFile,
        staging_root: &Path,
        threshold_mb: f64,
    ) -> AppResult<Self> {
        let staged = StagedFile::write(staging_root, &file).await?;

        let size_mb = optimizer::measure_size(&file.bytes);
        let results = if optimizer::needs_optimization(size_mb, threshold_mb) {
            optimizer::optimize(&file.bytes)
        } else {
            Vec::new()
        };

        info!(
            session_id = %id,
            file_name = %file.name,
            file_size = file.size(),
            size_mb = size_mb,
            optimized = !results.is_empty(),
            "Session prepared"
        );

        Ok(Self {
            id,
            file,
            staged,
            results,
            created_at: Utc::now(),
            last_access: Instant::now(),
        })
    }

    pub fn original_size_mb(&self) -> f64 {
        optimizer::measure_size(&self.file.bytes)
    }

    pub fn needs_optimization(&self) -> bool {
        !self.results.is_empty()
    }

    pub fn report(&self) -> SessionReport {
        SessionReport {
            session_id: self.id,
            file_name: self.file.name.clone(),
            content_type: self.file.kind.content_type().to_string(),
            original_size_bytes: self.file.size(),
            original_size_mb: self.original_size_mb(),
            needs_optimization: self.needs_optimization(),
            default_quality: self.needs_optimization().then_some(DEFAULT_QUALITY),
            results: self
                .results
                .iter()
                .map(|r| QualityReport {
                    quality: r.quality,
                    size_bytes: r.size_bytes(),
                    size_mb: r.size_mb(),
                    file_name: r.file_name(&self.file.name),
                })
                .collect(),
            created_at: self.created_at,
        }
    }

    /// Picks the download for this session. Oversized uploads serve the
    /// truncated buffer at `quality` (default 75); everything else serves
    /// the original bytes and ignores `quality`, well-formed or not.
    pub fn artifact(&self, quality: Option<&str>) -> AppResult<Artifact> {
        let content_type = self.file.kind.content_type();

        if !self.needs_optimization() {
            if let Some(q) = quality {
                debug!(session_id = %self.id, quality = q, "Quality ignored for small upload");
            }
            return Ok(Artifact {
                file_name: self.file.name.clone(),
                content_type,
                data: self.file.bytes.clone(),
            });
        }

        let result = match quality {
            None => self.results.iter().find(|r| r.quality == DEFAULT_QUALITY),
            Some(raw) => raw
                .trim()
                .parse::<u8>()
                .ok()
                .and_then(|q| self.results.iter().find(|r| r.quality == q)),
        }
        .ok_or_else(|| AppError::InvalidQuality {
            quality: quality.unwrap_or_default().to_string(),
        })?;

        Ok(Artifact {
            file_name: result.file_name(&self.file.name),
            content_type,
            data: result.data.clone(),
        })
    }

    fn touch(&mut self) {
        self.last_access = Instant::now();
    }

    fn idle_for(&self) -> Duration {
        self.last_access.elapsed()
    }
}

/// In-memory registry of live sessions. Each session owns its buffers and
/// staging directory outright; nothing is shared between sessions.
#[derive(Debug)]
pub struct SessionStore {
    staging_root: PathBuf,
    threshold_mb: f64,
    sessions: RwLock<HashMap<Uuid, Session>>,
}

impl SessionStore {
    pub fn new(staging_root: impl Into<PathBuf>, threshold_mb: f64) -> AppResult<Self> {
        let staging_root = staging_root.into();
        std::fs::create_dir_all(&staging_root).map_err(|e| {
            AppError::staging(format!(
                "Failed to create staging root {}: {}",
                staging_root.display(),
                e
            ))
        })?;

        info!(
            staging_root = %staging_root.display(),
            threshold_mb = threshold_mb,
            quality_levels = ?QUALITY_LEVELS,
            "Session store ready"
        );

        Ok(Self {
            staging_root,
            threshold_mb,
            sessions: RwLock::new(HashMap::new()),
        })
    }

    pub fn staging_root(&self) -> &Path {
        &self.staging_root
    }

    pub async fn create(&self, file: UploadedFile) -> AppResult<SessionReport> {
        let id = Uuid::new_v4();
        let session = Session::build(id, file, &self.staging_root, self.threshold_mb).await?;
        let report = session.report();

        self.sessions.write().await.insert(id, session);
        Ok(report)
    }

    /// Swaps in a new upload. The previous staging directory goes away with
    /// the replaced session.
    pub async fn replace(&self, id: Uuid, file: UploadedFile) -> AppResult<SessionReport> {
        if !self.sessions.read().await.contains_key(&id) {
            return Err(AppError::session_not_found(id));
        }

        let mut session = Session::build(id, file, &self.staging_root, self.threshold_mb).await?;

        let mut sessions = self.sessions.write().await;
        let previous = sessions
            .get_mut(&id)
            .ok_or_else(|| AppError::session_not_found(id))?;
        session.created_at = previous.created_at;
        let report = session.report();
        let old = std::mem::replace(previous, session);
        drop(sessions);

        info!(
            session_id = %id,
            replaced_file = %old.file.name,
            "Session file replaced"
        );
        Ok(report)
    }

    pub async fn report(&self, id: Uuid) -> AppResult<SessionReport> {
        self.with_session(id, |s| Ok(s.report())).await
    }

    pub async fn artifact(&self, id: Uuid, quality: Option<&str>) -> AppResult<Artifact> {
        self.with_session(id, |s| s.artifact(quality)).await
    }

    pub async fn preview(&self, id: Uuid) -> AppResult<(Vec<u8>, &'static str)> {
        let (path, content_type) = self
            .with_session(id, |s| Ok((s.staged.path().to_path_buf(), s.file.kind.content_type())))
            .await?;

        let data = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AppError::session_not_found(id),
            _ => AppError::staging(format!("Failed to read {}: {}", path.display(), e)),
        })?;
        Ok((data, content_type))
    }

    pub async fn remove(&self, id: Uuid) -> AppResult<()> {
        let removed = self.sessions.write().await.remove(&id);
        match removed {
            Some(session) => {
                info!(session_id = %id, file_name = %session.file.name, "Session ended");
                Ok(())
            }
            None => Err(AppError::session_not_found(id)),
        }
    }

    /// Drops every session idle for longer than `ttl`; returns how many.
    pub async fn purge_expired(&self, ttl: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.idle_for() <= ttl);
        let purged = before - sessions.len();

        if purged > 0 {
            info!(purged = purged, remaining = sessions.len(), "Expired sessions purged");
        }
        purged
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn with_session<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&Session) -> AppResult<T>,
    ) -> AppResult<T> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&id)
            .ok_or_else(|| AppError::session_not_found(id))?;
        session.touch();
        f(session)
    }
}
