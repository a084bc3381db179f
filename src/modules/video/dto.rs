use super::model::{NewVideoFile, QUALITY_ORIGINAL};
use super::storage_path::StorageLocation;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct ConversionStatusResponse {
    pub running: bool,
    pub max_concurrent: usize,
    pub active_count: usize,
    pub active: Vec<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RenditionResponse {
    pub video_id: Uuid,
    pub quality_id: Uuid,
    pub quality: String,
    /// Extension of the source file, including the dot.
    pub format: String,
    pub file_size: i64,
    pub width: i32,
    pub height: i32,
    pub bitrate: i32,
    pub status: String,
}

impl RenditionResponse {
    pub fn new(file: NewVideoFile, quality: &str) -> Self {
        Self {
            video_id: file.video_id,
            quality_id: file.quality_id,
            quality: quality.to_string(),
            format: file.format,
            file_size: file.file_size,
            width: file.width,
            height: file.height,
            bitrate: file.bitrate,
            status: file.status,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReserveLocationRequest {
    /// Name of the file as uploaded by the client.
    pub filename: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StorageLocationResponse {
    pub bucket_id: String,
    pub shard_id: String,
    pub path_segment1: String,
    pub path_segment2: String,
    pub filename: String,
    /// Object key the original upload must be written to.
    pub original_key: String,
}

impl From<StorageLocation> for StorageLocationResponse {
    fn from(location: StorageLocation) -> Self {
        Self {
            original_key: location.file_path(QUALITY_ORIGINAL),
            bucket_id: location.bucket_id,
            shard_id: location.shard_id,
            path_segment1: location.path_segment1,
            path_segment2: location.path_segment2,
            filename: location.filename,
        }
    }
}
