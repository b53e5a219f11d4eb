//! Staged file writer returned by `open_write_stream`.

use bridge_traits::storage::WritableSink;
use tracing::{debug, warn};

use crate::error::{Result, StorageError};
use crate::payload::Payload;

/// Writer over a host sink. Bytes become visible only on [`close`](Self::close).
///
/// Dropping the writer without closing it discards everything written.
pub struct FileWriter {
    path: String,
    sink: Box<dyn WritableSink>,
    position: u64,
    written: u64,
}

impl FileWriter {
    pub(crate) fn new(path: String, sink: Box<dyn WritableSink>) -> Self {
        Self {
            path,
            sink,
            position: 0,
            written: 0,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Bytes written through this writer so far.
    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Writes at the cursor and advances it.
    pub async fn write(&mut self, data: impl Into<Payload>) -> Result<()> {
        let bytes = data.into().into_bytes()?;
        let len = bytes.len() as u64;
        self.sink
            .write(bytes)
            .await
            .map_err(|e| StorageError::from_host(&self.path, e))?;
        self.position = self.position.saturating_add(len);
        self.written = self.written.saturating_add(len);
        Ok(())
    }

    /// Moves the cursor to `position`.
    pub async fn seek(&mut self, position: u64) -> Result<()> {
        self.sink
            .seek(position)
            .await
            .map_err(|e| StorageError::from_host(&self.path, e))?;
        self.position = position;
        Ok(())
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    /// Commits the staged content.
    pub async fn close(self) -> Result<()> {
        let Self {
            path, sink, written, ..
        } = self;
        sink.close()
            .await
            .map_err(|e| StorageError::from_host(&path, e))?;
        debug!(path = %path, written, "Committed streamed write");
        Ok(())
    }

    /// Discards the staged content.
    pub async fn abort(self) -> Result<()> {
        let Self { path, sink, .. } = self;
        if let Err(err) = sink.abort().await {
            warn!(path = %path, error = %err, "Failed to discard streamed write");
            return Err(StorageError::from_host(&path, err));
        }
        Ok(())
    }
}

impl std::fmt::Debug for FileWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWriter")
            .field("path", &self.path)
            .field("position", &self.position)
            .field("written", &self.written)
            .finish()
    }
}
