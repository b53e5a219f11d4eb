//! # Content View
//!
//! [`FileContent`] wraps a resolved file handle and decodes it on demand.
//! Every conversion re-reads the live file, so two calls can observe two
//! different committed versions.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bridge_traits::storage::{FileHandle, FileMetadata};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::error::{Result, StorageError};
use crate::navigator::read_handle;
use crate::payload::Blob;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Lazy view over a file's content.
#[derive(Clone)]
pub struct FileContent {
    file: Arc<dyn FileHandle>,
    path: String,
}

impl FileContent {
    pub fn new(file: Arc<dyn FileHandle>, path: impl Into<String>) -> Self {
        Self {
            file,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn handle(&self) -> &Arc<dyn FileHandle> {
        &self.file
    }

    pub async fn metadata(&self) -> Result<FileMetadata> {
        self.file
            .metadata()
            .await
            .map_err(|e| StorageError::from_host(&self.path, e))
    }

    pub async fn as_bytes(&self) -> Result<Bytes> {
        read_handle(self.file.as_ref(), &self.path).await
    }

    /// Content decoded as UTF-8.
    pub async fn as_text(&self) -> Result<String> {
        let bytes = self.as_bytes().await?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| StorageError::ParseError(format!("{} is not valid UTF-8: {e}", self.path)))
    }

    /// Content parsed as JSON into `T`.
    pub async fn as_json<T: DeserializeOwned>(&self) -> Result<T> {
        let text = self.as_text().await?;
        serde_json::from_str(&text)
            .map_err(|e| StorageError::ParseError(format!("{}: {e}", self.path)))
    }

    pub async fn as_value(&self) -> Result<serde_json::Value> {
        self.as_json().await
    }

    /// Bytes plus the content-type hint recorded by the host.
    pub async fn as_blob(&self) -> Result<Blob> {
        let metadata = self.metadata().await?;
        let data = self.as_bytes().await?;
        Ok(Blob::new(data, metadata.content_type))
    }

    /// `data:<type>;base64,<payload>` URL of the content.
    pub async fn as_data_url(&self) -> Result<String> {
        let blob = self.as_blob().await?;
        let content_type = blob.content_type().unwrap_or(DEFAULT_CONTENT_TYPE);
        Ok(format!(
            "data:{content_type};base64,{}",
            STANDARD.encode(blob.data())
        ))
    }
}

impl std::fmt::Debug for FileContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileContent")
            .field("path", &self.path)
            .finish()
    }
}
