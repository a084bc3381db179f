use super::model::{NewVideoFile, Video, VideoFile, VideoQuality, VideoStatus};
use crate::infrastructure::db::pool::DbPool;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepositoryError>;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,

    #[error("video {id} is no longer in '{expected}' status")]
    StatusConflict { id: Uuid, expected: VideoStatus },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Persistence contract consumed by the conversion pipeline.
#[async_trait]
pub trait AssetRepository: Send + Sync {
    /// Videos waiting for conversion, at most `limit`.
    async fn videos_for_conversion(&self, limit: usize) -> RepoResult<Vec<Video>>;

    /// Moves a video from "uploaded" to "processing".
    /// Fails with `StatusConflict` if another claimant got there first.
    async fn claim_for_conversion(&self, id: Uuid) -> RepoResult<()>;

    async fn update_status(&self, id: Uuid, status: VideoStatus) -> RepoResult<()>;

    /// Active rendition profiles, ascending by height.
    async fn active_qualities(&self) -> RepoResult<Vec<VideoQuality>>;

    async fn create_video_file(&self, file: &NewVideoFile) -> RepoResult<()>;

    async fn update_thumbnail_and_duration(
        &self,
        id: Uuid,
        thumbnail_url: &str,
        duration: i32,
    ) -> RepoResult<()>;

    async fn find_video(&self, id: Uuid) -> RepoResult<Option<Video>>;

    async fn find_quality(&self, name: &str) -> RepoResult<Option<VideoQuality>>;

    async fn list_video_files(&self, video_id: Uuid) -> RepoResult<Vec<VideoFile>>;

    /// Returns "processing" videos untouched for longer than `older_than`
    /// to "uploaded", skipping the ids in `keep`. Returns the number released.
    async fn release_stale_processing(&self, older_than: Duration, keep: &[Uuid])
    -> RepoResult<u64>;
}

const VIDEO_COLUMNS: &str = "id, video_code, bucket_id, shard_id, path_segment1, path_segment2, \
     filename, thumbnail_url, duration, status, updated_at, deleted_at";

const QUALITY_COLUMNS: &str = "id, name, width, height, target_bitrate, is_active";

#[derive(Clone)]
pub struct VideoRepository {
    pool: DbPool,
}

impl VideoRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssetRepository for VideoRepository {
    async fn videos_for_conversion(&self, limit: usize) -> RepoResult<Vec<Video>> {
        let sql = format!(
            "SELECT {VIDEO_COLUMNS} FROM videos WHERE status = $1 AND deleted_at IS NULL LIMIT $2"
        );

        let videos = sqlx::query_as::<_, Video>(&sql)
            .bind(VideoStatus::Uploaded.as_str())
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;
        Ok(videos)
    }

    async fn claim_for_conversion(&self, id: Uuid) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE videos
            SET status = $1, updated_at = NOW()
            WHERE id = $2 AND status = $3 AND deleted_at IS NULL
            "#,
        )
        .bind(VideoStatus::Processing.as_str())
        .bind(id)
        .bind(VideoStatus::Uploaded.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::StatusConflict {
                id,
                expected: VideoStatus::Uploaded,
            });
        }
        Ok(())
    }

    async fn update_status(&self, id: Uuid, status: VideoStatus) -> RepoResult<()> {
        let result = sqlx::query("UPDATE videos SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn active_qualities(&self) -> RepoResult<Vec<VideoQuality>> {
        let sql = format!(
            "SELECT {QUALITY_COLUMNS} FROM video_qualities \
             WHERE is_active = true ORDER BY height ASC"
        );

        let qualities = sqlx::query_as::<_, VideoQuality>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(qualities)
    }

    async fn create_video_file(&self, file: &NewVideoFile) -> RepoResult<()> {
        let now = OffsetDateTime::now_utc();

        sqlx::query(
            r#"
            INSERT INTO video_files (
                video_id, quality_id, file_format, file_size,
                width, height, bitrate, status,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(file.video_id)
        .bind(file.quality_id)
        .bind(&file.format)
        .bind(file.file_size)
        .bind(file.width)
        .bind(file.height)
        .bind(file.bitrate)
        .bind(&file.status)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_thumbnail_and_duration(
        &self,
        id: Uuid,
        thumbnail_url: &str,
        duration: i32,
    ) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE videos
            SET thumbnail_url = $1, duration = $2, updated_at = NOW()
            WHERE id = $3 AND deleted_at IS NULL
            "#,
        )
        .bind(thumbnail_url)
        .bind(duration)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn find_video(&self, id: Uuid) -> RepoResult<Option<Video>> {
        let sql =
            format!("SELECT {VIDEO_COLUMNS} FROM videos WHERE id = $1 AND deleted_at IS NULL");

        let video = sqlx::query_as::<_, Video>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(video)
    }

    async fn find_quality(&self, name: &str) -> RepoResult<Option<VideoQuality>> {
        let sql = format!("SELECT {QUALITY_COLUMNS} FROM video_qualities WHERE name = $1");

        let quality = sqlx::query_as::<_, VideoQuality>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(quality)
    }

    async fn list_video_files(&self, video_id: Uuid) -> RepoResult<Vec<VideoFile>> {
        let files = sqlx::query_as::<_, VideoFile>(
            r#"
            SELECT vf.id, vf.video_id, vf.quality_id, vq.name AS quality_name,
                   vf.file_format, vf.file_size, vf.width, vf.height, vf.bitrate,
                   vf.status, vf.created_at
            FROM video_files vf
            JOIN video_qualities vq ON vq.id = vf.quality_id
            WHERE vf.video_id = $1 AND vf.status = 'completed'
            ORDER BY vf.height ASC
            "#,
        )
        .bind(video_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(files)
    }

    async fn release_stale_processing(
        &self,
        older_than: Duration,
        keep: &[Uuid],
    ) -> RepoResult<u64> {
        let cutoff = OffsetDateTime::now_utc() - older_than;

        let result = sqlx::query(
            r#"
            UPDATE videos
            SET status = $1, updated_at = NOW()
            WHERE status = $2
              AND updated_at < $3
              AND deleted_at IS NULL
              AND NOT (id = ANY($4))
            "#,
        )
        .bind(VideoStatus::Uploaded.as_str())
        .bind(VideoStatus::Processing.as_str())
        .bind(cutoff)
        .bind(keep)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
