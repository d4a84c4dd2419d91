use bytes::Bytes;
use serde::Deserialize;
use std::path::Path;

use crate::error::{AppError, AppResult};

/// Image formats accepted by the upload filter. Detection is by filename
/// suffix only; the bytes are never inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
}

impl ImageKind {
    pub const ACCEPTED_EXTENSIONS: [&'static str; 3] = ["jpg", "jpeg", "png"];

    pub fn from_file_name(name: &str) -> AppResult<Self> {
        let extension = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "jpg" | "jpeg" => Ok(ImageKind::Jpeg),
            "png" => Ok(ImageKind::Png),
            _ => Err(AppError::UnsupportedFileType { extension }),
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Png => "image/png",
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Bytes,
    pub kind: ImageKind,
}

impl UploadedFile {
    /// Builds an upload from a client-supplied name, keeping only the final
    /// path component so the name is safe to use in staging paths and
    /// download headers.
    pub fn new(raw_name: &str, bytes: Bytes) -> AppResult<Self> {
        let name = Path::new(raw_name)
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.replace('"', ""))
            .filter(|n| !n.is_empty())
            .ok_or_else(|| AppError::InvalidFile {
                message: format!("Invalid file name: {:?}", raw_name),
            })?;

        let kind = ImageKind::from_file_name(&name)?;

        Ok(Self { name, bytes, kind })
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn staging_name(&self) -> String {
        format!("temp_{}", self.name)
    }
}

/// `?quality=` as sent by the client. Kept raw so that a malformed value
/// is judged by the session, which ignores it when nothing was optimized.
#[derive(Debug, Default, Deserialize)]
pub struct DownloadQuery {
    pub quality: Option<String>,
}

impl DownloadQuery {
    /// The requested level, if it parses as a percentage.
    pub fn level(&self) -> Option<u8> {
        self.quality.as_deref().and_then(|q| q.trim().parse().ok())
    }
}
