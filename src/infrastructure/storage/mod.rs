use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

pub mod s3;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("download failed: {0}")]
    DownloadFailed(String),

    #[error("upload failed: {0}")]
    UploadFailed(String),

    #[error("bucket operation failed: {0}")]
    Bucket(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    pub fn download_failed(msg: impl Into<String>) -> Self {
        Self::DownloadFailed(msg.into())
    }

    pub fn upload_failed(msg: impl Into<String>) -> Self {
        Self::UploadFailed(msg.into())
    }
}

/// Blob storage contract consumed by the conversion pipeline.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn download_file(&self, bucket: &str, key: &str, path: &Path) -> StorageResult<()>;

    async fn upload_file(&self, bucket: &str, key: &str, path: &Path) -> StorageResult<()>;

    fn public_url(&self, bucket: &str, key: &str) -> String;
}
