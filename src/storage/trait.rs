use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Upload failed: {0}")]
    UploadFailed(String),
}

/// Image host behind the proof-of-payment and catalog uploads. `upload`
/// returns the public URL of the stored image; there is no retry inside,
/// a failed upload is retried by the user re-submitting.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    async fn upload(&self, filename: &str, data: &[u8]) -> Result<String, StorageError>;
}
