use std::path::Path;
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Could not stage uploaded file: {0}")]
    Io(#[from] std::io::Error),
}

/// An uploaded file staged on disk for the duration of one request.
///
/// The backing file is removed when this value is dropped, so every exit
/// path of the handler that owns it cleans up. `discard` removes it eagerly
/// and reports failures.
pub struct StagedUpload {
    file: NamedTempFile,
    writer: tokio::fs::File,
    len: usize,
}

impl StagedUpload {
    pub fn create(dir: &Path) -> Result<Self, UploadError> {
        let file = tempfile::Builder::new()
            .prefix("antiplag-")
            .suffix(".upload")
            .tempfile_in(dir)?;
        let writer = tokio::fs::File::from_std(file.as_file().try_clone()?);
        debug!("Staging upload at {}", file.path().display());
        Ok(Self {
            file,
            writer,
            len: 0,
        })
    }

    pub async fn append(&mut self, chunk: &[u8]) -> Result<(), UploadError> {
        self.writer.write_all(chunk).await?;
        self.len += chunk.len();
        Ok(())
    }

    /// Flushes pending writes and reads the whole file back.
    pub async fn contents(&mut self) -> Result<Vec<u8>, UploadError> {
        self.writer.flush().await?;
        Ok(tokio::fs::read(self.file.path()).await?)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn discard(self) {
        let path = self.file.path().to_path_buf();
        drop(self.writer);
        if let Err(e) = self.file.close() {
            warn!("Failed to remove staged upload {}: {}", path.display(), e);
        }
    }
}
