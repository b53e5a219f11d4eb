//! Staged writer: content goes to a hidden swap file beside the target and
//! replaces it atomically on close.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::{WritableSink, WriteMode},
};
use bytes::Bytes;
use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tracing::{debug, warn};
use uuid::Uuid;

const SWAP_PREFIX: &str = ".sandboxfs-swap-";

/// Swap files are an implementation detail and never listed.
pub(crate) fn is_swap_file(name: &str) -> bool {
    name.starts_with(SWAP_PREFIX)
}

/// Writable sink for a [`TokioFile`](crate::TokioFile).
pub struct TokioSink {
    file: Option<fs::File>,
    swap: PathBuf,
    target: PathBuf,
}

impl TokioSink {
    pub(crate) async fn open(target: &Path, name: &str, mode: WriteMode) -> Result<Self> {
        let parent = target
            .parent()
            .ok_or_else(|| BridgeError::OperationFailed(format!("{} has no parent", target.display())))?;
        let swap = parent.join(format!("{SWAP_PREFIX}{}-{name}", Uuid::new_v4()));

        if mode == WriteMode::KeepExisting {
            match fs::copy(target, &swap).await {
                Ok(_) => {}
                Err(err) if err.kind() == ErrorKind::NotFound => {
                    return Err(BridgeError::NotFound(target.display().to_string()))
                }
                Err(err) => return Err(err.into()),
            }
        }

        let file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(mode == WriteMode::Truncate)
            .open(&swap)
            .await?;

        Ok(Self {
            file: Some(file),
            swap,
            target: target.to_path_buf(),
        })
    }

    fn file(&mut self) -> Result<&mut fs::File> {
        self.file
            .as_mut()
            .ok_or_else(|| BridgeError::OperationFailed("sink already finished".to_string()))
    }
}

#[async_trait]
impl WritableSink for TokioSink {
    async fn seek(&mut self, position: u64) -> Result<()> {
        self.file()?.seek(SeekFrom::Start(position)).await?;
        Ok(())
    }

    async fn write(&mut self, data: Bytes) -> Result<()> {
        self.file()?.write_all(&data).await?;
        Ok(())
    }

    async fn close(mut self: Box<Self>) -> Result<()> {
        let mut file = self.file.take().ok_or_else(|| {
            BridgeError::OperationFailed("sink already finished".to_string())
        })?;

        let committed = async {
            file.flush().await?;
            file.sync_all().await?;
            drop(file);
            fs::rename(&self.swap, &self.target).await
        }
        .await;

        match committed {
            Ok(()) => {
                debug!(path = ?self.target, "Committed write");
                Ok(())
            }
            Err(err) => {
                let _ = fs::remove_file(&self.swap).await;
                Err(err.into())
            }
        }
    }

    async fn abort(mut self: Box<Self>) -> Result<()> {
        drop(self.file.take());
        match fs::remove_file(&self.swap).await {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }
        debug!(path = ?self.target, "Discarded write");
        Ok(())
    }
}

impl Drop for TokioSink {
    fn drop(&mut self) {
        // Dropped without close/abort: discard the staged content.
        if self.file.take().is_some() {
            if let Err(err) = std::fs::remove_file(&self.swap) {
                warn!(path = ?self.swap, error = %err, "Failed to discard swap file");
            }
        }
    }
}
