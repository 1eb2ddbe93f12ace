//! Pending image uploads and their storage paths.

use std::path::{Path, PathBuf};

use base64::Engine;
use time::OffsetDateTime;

/// Top-level folder for menu images inside the bucket.
pub const STORAGE_FOLDER: &str = "menu";

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("not a file: {0}")]
    NotAFile(PathBuf),
}

/// An image selected for the add-product form and not yet saved.
#[derive(Clone, PartialEq, Eq)]
pub struct PendingUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for PendingUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl PendingUpload {
    #[must_use]
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = content_type_for(&file_name).to_owned();
        Self { file_name, content_type, bytes }
    }

    /// Read a picked file from disk.
    ///
    /// # Errors
    ///
    /// Returns `NotAFile` for paths without a file name and `Read` when the
    /// file cannot be read.
    pub async fn read(path: &Path) -> Result<Self, UploadError> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| UploadError::NotAFile(path.to_path_buf()))?;
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| UploadError::Read { path: path.to_path_buf(), source })?;
        Ok(Self::new(file_name, bytes))
    }

    /// `data:` URL of the image, used as the local preview.
    #[must_use]
    pub fn preview_data_url(&self) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&self.bytes);
        format!("data:{};base64,{encoded}", self.content_type)
    }
}

/// MIME type from the file extension; unknown types upload as octet-stream.
#[must_use]
pub fn content_type_for(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        _ => "application/octet-stream",
    }
}

/// Object path for a sanitized file name: `menu/<YYYY>/<MM>/<millis>_<name>`.
///
/// The millisecond prefix keeps repeated uploads of the same file apart.
#[must_use]
pub fn storage_path(safe_name: &str, now: OffsetDateTime) -> String {
    let millis = now.unix_timestamp_nanos() / 1_000_000;
    format!("{STORAGE_FOLDER}/{:04}/{:02}/{millis}_{safe_name}", now.year(), u8::from(now.month()))
}

#[cfg(test)]
#[path = "upload_test.rs"]
mod tests;
