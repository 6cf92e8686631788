//! Attachment ingestion: multipart upload to a file on disk.

use crate::error::ApiError;
use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;
use report_types::Attachment;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const FILE_FIELD: &str = "file";
const DEFAULT_MIMETYPE: &str = "application/octet-stream";
pub const URL_PREFIX: &str = "/uploads";

/// Writes uploaded files under `dir` with storage-assigned unique names.
pub struct DiskAttachmentStore {
    dir: PathBuf,
    max_bytes: usize,
}

impl DiskAttachmentStore {
    pub fn new(dir: impl AsRef<Path>, max_bytes: usize) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            max_bytes,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    /// Store `bytes` and describe the stored file.
    pub async fn save(
        &self,
        original_name: &str,
        mimetype: &str,
        bytes: &[u8],
    ) -> Result<Attachment, ApiError> {
        if bytes.is_empty() {
            return Err(ApiError::Validation("uploaded file is empty".to_string()));
        }
        if bytes.len() > self.max_bytes {
            return Err(ApiError::PayloadTooLarge(format!(
                "file exceeds max size of {} bytes",
                self.max_bytes
            )));
        }
        let filename = storage_name(original_name);
        self.ensure_dir()
            .await
            .map_err(|e| ApiError::Internal(format!("create upload dir: {}", e)))?;
        tokio::fs::write(self.dir.join(&filename), bytes)
            .await
            .map_err(|e| ApiError::Internal(format!("write upload: {}", e)))?;
        Ok(Attachment {
            url: format!("{}/{}", URL_PREFIX, filename),
            filename,
            original_name: original_name.to_string(),
            mimetype: mimetype.to_string(),
            size: bytes.len() as u64,
        })
    }

    /// Read the `file` field of a multipart body and store it.
    pub async fn ingest(&self, mut multipart: Multipart) -> Result<Attachment, ApiError> {
        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            if field.name() != Some(FILE_FIELD) {
                continue;
            }
            let original_name = field
                .file_name()
                .map(str::to_string)
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| "upload".to_string());
            let mimetype = field
                .content_type()
                .map(str::to_string)
                .unwrap_or_else(|| DEFAULT_MIMETYPE.to_string());
            let bytes = field.bytes().await.map_err(multipart_error)?;
            return self.save(&original_name, &mimetype, &bytes).await;
        }
        Err(ApiError::Validation("file is required".to_string()))
    }
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(err.body_text())
    } else {
        ApiError::Validation(format!("invalid multipart payload: {}", err.body_text()))
    }
}

/// `<uuid>` plus the original extension when it is short and alphanumeric.
fn storage_name(original_name: &str) -> String {
    let ext = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 16 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default();
    format!("{}{}", Uuid::new_v4(), ext)
}
