use crate::infrastructure::media::MediaError;
use crate::infrastructure::storage::StorageError;
use crate::modules::video::repository::RepositoryError;
use thiserror::Error;
use uuid::Uuid;

pub type ConversionResult<T> = Result<T, ConversionError>;

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("video {0} is already being converted")]
    AlreadyConverting(Uuid),

    #[error("no active video qualities configured")]
    NoActiveQualities,

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("media error: {0}")]
    Media(#[from] MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
