use super::storage_path::{StorageLocation, split_extension};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

/// Storage path component holding the uploaded source file.
pub const QUALITY_ORIGINAL: &str = "original";

/// Rendition status stored on every `video_files` row this service writes.
pub const FILE_STATUS_COMPLETED: &str = "completed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum VideoStatus {
    Uploaded,
    Processing,
    Ready,
    Error,
    Deleted,
}

impl VideoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Uploaded => "uploaded",
            VideoStatus::Processing => "processing",
            VideoStatus::Ready => "ready",
            VideoStatus::Error => "error",
            VideoStatus::Deleted => "deleted",
        }
    }
}

impl fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VideoStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uploaded" => Ok(VideoStatus::Uploaded),
            "processing" => Ok(VideoStatus::Processing),
            "ready" => Ok(VideoStatus::Ready),
            "error" => Ok(VideoStatus::Error),
            "deleted" => Ok(VideoStatus::Deleted),
            other => Err(format!("unknown video status '{}'", other)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, ToSchema)]
pub struct Video {
    pub id: Uuid,
    pub video_code: String,
    pub bucket_id: String,
    pub shard_id: String,
    pub path_segment1: String,
    pub path_segment2: String,
    pub filename: String,
    pub thumbnail_url: Option<String>,
    pub duration: Option<i32>,
    pub status: String, // Stored as text in DB
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: OffsetDateTime,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub deleted_at: Option<OffsetDateTime>,
}

impl Video {
    /// Storage location assigned at upload time. Every object key is derived from it.
    pub fn location(&self) -> StorageLocation {
        StorageLocation {
            bucket_id: self.bucket_id.clone(),
            shard_id: self.shard_id.clone(),
            path_segment1: self.path_segment1.clone(),
            path_segment2: self.path_segment2.clone(),
            filename: self.filename.clone(),
        }
    }

    /// Filename without its extension.
    pub fn file_stem(&self) -> &str {
        split_extension(&self.filename).0
    }

    /// Extension including the leading dot, or empty.
    pub fn file_extension(&self) -> &str {
        split_extension(&self.filename).1
    }

    /// Local filename of one rendition: `<stem>_<quality><ext>`.
    pub fn rendition_filename(&self, quality: &str) -> String {
        format!("{}_{}{}", self.file_stem(), quality, self.file_extension())
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq, Eq, ToSchema)]
pub struct VideoQuality {
    pub id: Uuid,
    pub name: String,
    pub width: i32,
    pub height: i32,
    /// Target bitrate in kbps.
    #[sqlx(rename = "target_bitrate")]
    pub bitrate: i32,
    pub is_active: bool,
}

/// Rendition record as inserted after a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVideoFile {
    pub video_id: Uuid,
    pub quality_id: Uuid,
    pub format: String,
    pub file_size: i64,
    pub width: i32,
    pub height: i32,
    pub bitrate: i32,
    pub status: String,
}

impl NewVideoFile {
    pub fn completed(video: &Video, quality: &VideoQuality, file_size: i64) -> Self {
        Self {
            video_id: video.id,
            quality_id: quality.id,
            format: video.file_extension().to_string(),
            file_size,
            width: quality.width,
            height: quality.height,
            bitrate: quality.bitrate,
            status: FILE_STATUS_COMPLETED.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, ToSchema)]
pub struct VideoFile {
    pub id: Uuid,
    pub video_id: Uuid,
    pub quality_id: Uuid,
    pub quality_name: String,
    #[sqlx(rename = "file_format")]
    pub format: String,
    pub file_size: i64,
    pub width: i32,
    pub height: i32,
    pub bitrate: i32,
    #[serde(skip)]
    pub status: String,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: OffsetDateTime,
}
