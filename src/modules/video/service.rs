use super::dto::{ConversionStatusResponse, RenditionResponse, StorageLocationResponse};
use super::model::VideoFile;
use super::repository::RepositoryError;
use super::storage_path::StoragePathError;
use crate::state::AppState;
use crate::workers::error::ConversionError;
use axum::http::StatusCode;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum VideoServiceError {
    #[error("video {0} not found")]
    VideoNotFound(Uuid),

    #[error("quality '{0}' not found")]
    QualityNotFound(String),

    #[error(transparent)]
    StoragePath(#[from] StoragePathError),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl VideoServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::VideoNotFound(_) | Self::QualityNotFound(_) => StatusCode::NOT_FOUND,
            Self::StoragePath(_) => StatusCode::BAD_REQUEST,
            Self::Conversion(ConversionError::AlreadyConverting(_)) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub struct VideoService;

impl VideoService {
    pub fn conversion_status(state: &AppState) -> ConversionStatusResponse {
        let active = state.scheduler.active_conversions();
        ConversionStatusResponse {
            running: state.scheduler.is_running(),
            max_concurrent: state.scheduler.max_concurrent(),
            active_count: active.len(),
            active,
        }
    }

    pub async fn convert(
        state: &AppState,
        video_id: Uuid,
        quality_name: &str,
    ) -> Result<RenditionResponse, VideoServiceError> {
        let video = state
            .repository
            .find_video(video_id)
            .await?
            .ok_or(VideoServiceError::VideoNotFound(video_id))?;
        let quality = state
            .repository
            .find_quality(quality_name)
            .await?
            .ok_or_else(|| VideoServiceError::QualityNotFound(quality_name.to_string()))?;

        let record = state.scheduler.convert_video(&video, &quality).await?;
        Ok(RenditionResponse::new(record, &quality.name))
    }

    pub async fn files(
        state: &AppState,
        video_id: Uuid,
    ) -> Result<Vec<VideoFile>, VideoServiceError> {
        if state.repository.find_video(video_id).await?.is_none() {
            return Err(VideoServiceError::VideoNotFound(video_id));
        }
        Ok(state.repository.list_video_files(video_id).await?)
    }

    /// Assigns the storage location a new upload of `filename` is written to.
    pub fn reserve_location(
        state: &AppState,
        filename: &str,
    ) -> Result<StorageLocationResponse, VideoServiceError> {
        let location = state.layout.reserve(filename)?;
        Ok(location.into())
    }
}
