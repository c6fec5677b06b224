//! Media intake: the validation gate and on-disk upload storage.

use std::path::{Path, PathBuf};

use axum::{
    Json,
    extract::{Multipart, State},
};
use chrono::Utc;
use tokio::fs;
use tracing::info;

use endpage_types::api::UploadResponse;

use crate::AppState;
use crate::error::ApiError;

/// Extensions accepted by the upload gate, lowercase without the dot.
const ALLOWED_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "svg", // images
    "mp3", "wav", "ogg", "m4a", // audio
    "mp4", "webm", "mov", "avi", // video
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Audio,
    Video,
}

/// Classify a file by extension. Anything unrecognized falls back to
/// `Image`; the validation gate rejects unknown extensions before this
/// matters for stored files.
pub fn media_kind(file_name: &str) -> MediaKind {
    match extension(file_name).as_deref() {
        Some("mp3" | "wav" | "ogg" | "m4a") => MediaKind::Audio,
        Some("mp4" | "webm" | "mov" | "avi") => MediaKind::Video,
        _ => MediaKind::Image,
    }
}

pub fn validate(file_name: &str, size: u64, max_bytes: u64) -> Result<(), ApiError> {
    if size > max_bytes {
        return Err(ApiError::BadRequest(format!(
            "file exceeds the maximum size of {} MB",
            max_bytes / (1024 * 1024)
        )));
    }
    match extension(file_name) {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(ApiError::BadRequest(
            "file type not allowed; only image, audio, and video files are accepted".into(),
        )),
    }
}

fn extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

/// Uploaded files live under one flat directory, renamed with a timestamp
/// prefix to avoid collisions.
pub struct MediaStore {
    dir: PathBuf,
}

impl MediaStore {
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self, std::io::Error> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        info!("Upload directory: {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Store the bytes and return the public relative path, never the
    /// filesystem path.
    pub async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<String, std::io::Error> {
        let unique = format!("{}-{}", Utc::now().timestamp_millis(), sanitize(file_name));
        fs::write(self.dir.join(&unique), bytes).await?;
        Ok(format!("/uploads/{unique}"))
    }
}

/// Whitespace and path separators collapse to `-` so a client-supplied
/// name cannot escape the upload directory.
fn sanitize(file_name: &str) -> String {
    file_name
        .chars()
        .map(|c| {
            if c.is_whitespace() || c == '/' || c == '\\' {
                '-'
            } else {
                c
            }
        })
        .collect()
}

pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {e}")))?
    {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("failed to read upload: {e}")))?;

        validate(&file_name, bytes.len() as u64, state.max_upload_bytes)?;

        let url = state
            .media
            .save(&file_name, &bytes)
            .await
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("failed to store upload: {e}")))?;
        info!("Stored upload {} ({} bytes)", url, bytes.len());
        return Ok(Json(UploadResponse { url }));
    }

    Err(ApiError::BadRequest("no file field in upload".into()))
}
