//! Validation and encoding of selected files

use crate::error::{AttachmentError, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use gemchat_core::UploadedImage;
use gemchat_core::config::DEFAULT_MAX_ATTACHMENT_BYTES;
use std::path::Path;
use tokio::io::AsyncReadExt;

/// A file the user picked, before validation
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    /// Declared content type, e.g. `image/png`
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Read a file from disk with the default 4 MiB limit
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_path_with_limit(path, DEFAULT_MAX_ATTACHMENT_BYTES).await
    }

    /// Read a file from disk, declaring its content type from the extension.
    ///
    /// Files over `max_bytes` are rejected from their metadata, and at most
    /// `max_bytes + 1` bytes are ever read for files whose reported length
    /// is unreliable (pipes, device files).
    pub async fn from_path_with_limit(path: impl AsRef<Path>, max_bytes: u64) -> Result<Self> {
        let path = path.as_ref();

        let reported = tokio::fs::metadata(path).await?.len();
        if reported > max_bytes {
            return Err(AttachmentError::TooLarge {
                size: reported,
                limit: max_bytes,
            });
        }

        let file = tokio::fs::File::open(path).await?;
        let mut bytes = Vec::new();
        file.take(max_bytes.saturating_add(1))
            .read_to_end(&mut bytes)
            .await?;
        if bytes.len() as u64 > max_bytes {
            return Err(AttachmentError::TooLarge {
                size: bytes.len() as u64,
                limit: max_bytes,
            });
        }

        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());

        Ok(Self {
            content_type: content_type_for(path).to_string(),
            name,
            bytes,
        })
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Content type implied by a file extension
pub fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        Some("heif") => "image/heif",
        Some("bmp") => "image/bmp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Validate with the default 4 MiB limit
pub async fn validate(file: SelectedFile) -> Result<UploadedImage> {
    validate_with_limit(file, DEFAULT_MAX_ATTACHMENT_BYTES).await
}

/// Check size, then type, then base64-encode the bytes on a blocking worker
pub async fn validate_with_limit(file: SelectedFile, max_bytes: u64) -> Result<UploadedImage> {
    if file.size() > max_bytes {
        return Err(AttachmentError::TooLarge {
            size: file.size(),
            limit: max_bytes,
        });
    }

    if !file.content_type.starts_with("image/") {
        return Err(AttachmentError::UnsupportedType(file.content_type));
    }

    let SelectedFile {
        name,
        content_type,
        bytes,
    } = file;

    let data = tokio::task::spawn_blocking(move || STANDARD.encode(bytes))
        .await
        .map_err(|e| AttachmentError::Encoding(e.to_string()))?;

    tracing::debug!(name = %name, mime_type = %content_type, encoded = data.len(), "Attachment encoded");

    Ok(UploadedImage {
        mime_type: content_type,
        data,
        preview_url: format!("local-preview://{}/{}", uuid::Uuid::new_v4(), name),
    })
}
