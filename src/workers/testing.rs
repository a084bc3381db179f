//! In-memory stand-ins for the repository, object store and media tool.

use crate::infrastructure::media::{MediaError, MediaResult, Transcoder};
use crate::infrastructure::storage::{ObjectStore, StorageError, StorageResult};
use crate::modules::video::model::{NewVideoFile, Video, VideoFile, VideoQuality, VideoStatus};
use crate::modules::video::repository::{AssetRepository, RepoResult, RepositoryError};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use time::OffsetDateTime;
use tokio::sync::Semaphore;
use uuid::Uuid;

#[derive(Default)]
struct RepoState {
    videos: Vec<Video>,
    qualities: Vec<VideoQuality>,
    files: Vec<NewVideoFile>,
    statuses: Vec<(Uuid, VideoStatus)>,
    thumbnails: HashMap<Uuid, (String, i32)>,
    rejected_claims: HashSet<Uuid>,
    fail_quality_lookup: bool,
    fail_candidates: bool,
    fail_thumbnail_update: bool,
    writes: usize,
}

fn status(video: &Video) -> Option<VideoStatus> {
    video.status.parse().ok()
}

#[derive(Default)]
pub struct FakeRepository {
    state: Mutex<RepoState>,
}

impl FakeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_qualities(self, qualities: Vec<VideoQuality>) -> Self {
        self.state.lock().unwrap().qualities = qualities;
        self
    }

    pub fn insert(&self, video: Video) -> Video {
        self.state.lock().unwrap().videos.push(video.clone());
        video
    }

    pub fn reject_claim(&self, id: Uuid) {
        self.state.lock().unwrap().rejected_claims.insert(id);
    }

    pub fn fail_quality_lookup(&self) {
        self.state.lock().unwrap().fail_quality_lookup = true;
    }

    pub fn fail_candidates(&self) {
        self.state.lock().unwrap().fail_candidates = true;
    }

    pub fn fail_thumbnail_update(&self) {
        self.state.lock().unwrap().fail_thumbnail_update = true;
    }

    pub fn status_of(&self, id: Uuid) -> VideoStatus {
        let state = self.state.lock().unwrap();
        state
            .videos
            .iter()
            .find(|v| v.id == id)
            .and_then(status)
            .expect("known video")
    }

    /// Every status written for `id`, in order.
    pub fn status_history(&self, id: Uuid) -> Vec<VideoStatus> {
        let state = self.state.lock().unwrap();
        state
            .statuses
            .iter()
            .filter(|(vid, _)| *vid == id)
            .map(|(_, s)| *s)
            .collect()
    }

    pub fn files(&self) -> Vec<NewVideoFile> {
        self.state.lock().unwrap().files.clone()
    }

    pub fn thumbnail_of(&self, id: Uuid) -> Option<(String, i32)> {
        self.state.lock().unwrap().thumbnails.get(&id).cloned()
    }

    pub fn quality_name(&self, quality_id: Uuid) -> String {
        let state = self.state.lock().unwrap();
        state
            .qualities
            .iter()
            .find(|q| q.id == quality_id)
            .map(|q| q.name.clone())
            .unwrap_or_default()
    }

    pub fn writes(&self) -> usize {
        self.state.lock().unwrap().writes
    }

    fn set_status(state: &mut RepoState, id: Uuid, status: VideoStatus) -> RepoResult<()> {
        let video = state
            .videos
            .iter_mut()
            .find(|v| v.id == id)
            .ok_or(RepositoryError::NotFound)?;
        video.status = status.to_string();
        video.updated_at = OffsetDateTime::now_utc();
        state.statuses.push((id, status));
        state.writes += 1;
        Ok(())
    }
}

#[async_trait]
impl AssetRepository for FakeRepository {
    async fn videos_for_conversion(&self, limit: usize) -> RepoResult<Vec<Video>> {
        let state = self.state.lock().unwrap();
        if state.fail_candidates {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(state
            .videos
            .iter()
            .filter(|v| status(v) == Some(VideoStatus::Uploaded) && v.deleted_at.is_none())
            .take(limit)
            .cloned()
            .collect())
    }

    async fn claim_for_conversion(&self, id: Uuid) -> RepoResult<()> {
        let mut state = self.state.lock().unwrap();
        let current = state.videos.iter().find(|v| v.id == id).and_then(status);
        if state.rejected_claims.contains(&id) || current != Some(VideoStatus::Uploaded) {
            return Err(RepositoryError::StatusConflict {
                id,
                expected: VideoStatus::Uploaded,
            });
        }
        Self::set_status(&mut state, id, VideoStatus::Processing)
    }

    async fn update_status(&self, id: Uuid, status: VideoStatus) -> RepoResult<()> {
        let mut state = self.state.lock().unwrap();
        Self::set_status(&mut state, id, status)
    }

    async fn active_qualities(&self) -> RepoResult<Vec<VideoQuality>> {
        let state = self.state.lock().unwrap();
        if state.fail_quality_lookup {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(state.qualities.iter().filter(|q| q.is_active).cloned().collect())
    }

    async fn create_video_file(&self, file: &NewVideoFile) -> RepoResult<()> {
        let mut state = self.state.lock().unwrap();
        state.files.push(file.clone());
        state.writes += 1;
        Ok(())
    }

    async fn update_thumbnail_and_duration(
        &self,
        id: Uuid,
        thumbnail_url: &str,
        duration: i32,
    ) -> RepoResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_thumbnail_update {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }
        state.thumbnails.insert(id, (thumbnail_url.to_string(), duration));
        state.writes += 1;
        Ok(())
    }

    async fn find_video(&self, id: Uuid) -> RepoResult<Option<Video>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .videos
            .iter()
            .find(|v| v.id == id && v.deleted_at.is_none())
            .cloned())
    }

    async fn find_quality(&self, name: &str) -> RepoResult<Option<VideoQuality>> {
        let state = self.state.lock().unwrap();
        Ok(state.qualities.iter().find(|q| q.name == name).cloned())
    }

    async fn list_video_files(&self, video_id: Uuid) -> RepoResult<Vec<VideoFile>> {
        let state = self.state.lock().unwrap();
        let mut files: Vec<VideoFile> = state
            .files
            .iter()
            .filter(|f| f.video_id == video_id)
            .map(|f| VideoFile {
                id: Uuid::new_v4(),
                video_id: f.video_id,
                quality_id: f.quality_id,
                quality_name: state
                    .qualities
                    .iter()
                    .find(|q| q.id == f.quality_id)
                    .map(|q| q.name.clone())
                    .unwrap_or_default(),
                format: f.format.clone(),
                file_size: f.file_size,
                width: f.width,
                height: f.height,
                bitrate: f.bitrate,
                status: f.status.clone(),
                created_at: OffsetDateTime::now_utc(),
            })
            .collect();
        files.sort_by_key(|f| f.height);
        Ok(files)
    }

    async fn release_stale_processing(
        &self,
        older_than: Duration,
        keep: &[Uuid],
    ) -> RepoResult<u64> {
        let mut state = self.state.lock().unwrap();
        let cutoff = OffsetDateTime::now_utc() - older_than;
        let stale: Vec<Uuid> = state
            .videos
            .iter()
            .filter(|v| {
                status(v) == Some(VideoStatus::Processing)
                    && v.updated_at < cutoff
                    && !keep.contains(&v.id)
            })
            .map(|v| v.id)
            .collect();
        for id in &stale {
            Self::set_status(&mut state, *id, VideoStatus::Uploaded)?;
        }
        Ok(stale.len() as u64)
    }
}

#[derive(Default)]
struct StoreState {
    downloads: Vec<(String, String)>,
    uploads: Vec<(String, String)>,
    fail_downloads: bool,
    fail_upload_fragments: Vec<String>,
}

#[derive(Default)]
pub struct FakeStore {
    state: Mutex<StoreState>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_downloads(&self) {
        self.state.lock().unwrap().fail_downloads = true;
    }

    pub fn fail_uploads_containing(&self, fragment: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_upload_fragments
            .push(fragment.to_string());
    }

    pub fn downloads(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().downloads.clone()
    }

    pub fn uploads(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().uploads.clone()
    }
}

#[async_trait]
impl ObjectStore for FakeStore {
    async fn download_file(&self, bucket: &str, key: &str, path: &Path) -> StorageResult<()> {
        {
            let mut state = self.state.lock().unwrap();
            if state.fail_downloads {
                return Err(StorageError::NotFound {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                });
            }
            state.downloads.push((bucket.to_string(), key.to_string()));
        }
        tokio::fs::write(path, b"original video bytes").await?;
        Ok(())
    }

    async fn upload_file(&self, bucket: &str, key: &str, path: &Path) -> StorageResult<()> {
        if !tokio::fs::try_exists(path).await? {
            return Err(StorageError::upload_failed(format!(
                "{} missing",
                path.display()
            )));
        }
        let mut state = self.state.lock().unwrap();
        if state.fail_upload_fragments.iter().any(|f| key.contains(f.as_str())) {
            return Err(StorageError::upload_failed(format!("refused {}", key)));
        }
        state.uploads.push((bucket.to_string(), key.to_string()));
        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("http://cdn.test/{}/{}", bucket, key)
    }
}

#[derive(Default)]
struct ToolState {
    attempts: Vec<String>,
    thumbnail_offsets: Vec<i32>,
    probes: usize,
    inputs: Vec<PathBuf>,
    outputs: Vec<PathBuf>,
}

/// Writes `height` bytes per rendition so recorded sizes are predictable.
pub struct FakeTranscoder {
    duration: Option<i32>,
    thumbnail_fails: bool,
    failing: HashSet<String>,
    gate: Option<Arc<Semaphore>>,
    state: Mutex<ToolState>,
}

impl FakeTranscoder {
    pub fn new() -> Self {
        Self {
            duration: Some(60),
            thumbnail_fails: false,
            failing: HashSet::new(),
            gate: None,
            state: Mutex::new(ToolState::default()),
        }
    }

    pub fn with_duration(mut self, seconds: i32) -> Self {
        self.duration = Some(seconds);
        self
    }

    pub fn with_probe_failure(mut self) -> Self {
        self.duration = None;
        self
    }

    pub fn with_thumbnail_failure(mut self) -> Self {
        self.thumbnail_fails = true;
        self
    }

    pub fn failing_quality(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }

    /// Probing waits for a permit on `gate`, holding workers in flight.
    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn attempts(&self) -> Vec<String> {
        self.state.lock().unwrap().attempts.clone()
    }

    pub fn thumbnail_offsets(&self) -> Vec<i32> {
        self.state.lock().unwrap().thumbnail_offsets.clone()
    }

    pub fn probe_count(&self) -> usize {
        self.state.lock().unwrap().probes
    }

    /// Every path handed to the tool as input, in call order.
    pub fn inputs(&self) -> Vec<PathBuf> {
        self.state.lock().unwrap().inputs.clone()
    }

    /// Every path the tool was asked to write, in call order.
    pub fn outputs(&self) -> Vec<PathBuf> {
        self.state.lock().unwrap().outputs.clone()
    }
}

#[async_trait]
impl Transcoder for FakeTranscoder {
    async fn probe_duration(&self, input: &Path) -> MediaResult<i32> {
        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await.expect("gate closed");
        }
        {
            let mut state = self.state.lock().unwrap();
            state.probes += 1;
            state.inputs.push(input.to_path_buf());
        }
        if !tokio::fs::try_exists(input).await? {
            return Err(MediaError::InvalidDuration(String::new()));
        }
        self.duration.ok_or_else(|| MediaError::ToolFailed {
            tool: "ffprobe".to_string(),
            exit_code: Some(1),
            stderr: "moov atom not found".to_string(),
        })
    }

    async fn extract_thumbnail(
        &self,
        input: &Path,
        offset_secs: i32,
        output: &Path,
    ) -> MediaResult<()> {
        {
            let mut state = self.state.lock().unwrap();
            state.thumbnail_offsets.push(offset_secs);
            state.inputs.push(input.to_path_buf());
            state.outputs.push(output.to_path_buf());
        }
        if self.thumbnail_fails {
            return Err(MediaError::ToolFailed {
                tool: "ffmpeg".to_string(),
                exit_code: Some(1),
                stderr: "could not seek".to_string(),
            });
        }
        tokio::fs::write(output, b"jpeg").await?;
        Ok(())
    }

    async fn transcode(
        &self,
        input: &Path,
        output: &Path,
        quality: &VideoQuality,
    ) -> MediaResult<()> {
        {
            let mut state = self.state.lock().unwrap();
            state.attempts.push(quality.name.clone());
            state.inputs.push(input.to_path_buf());
            state.outputs.push(output.to_path_buf());
        }
        if self.failing.contains(&quality.name) {
            return Err(MediaError::ToolFailed {
                tool: "ffmpeg".to_string(),
                exit_code: Some(1),
                stderr: "encoder error".to_string(),
            });
        }
        let size = usize::try_from(quality.height).unwrap_or_default();
        tokio::fs::write(output, vec![0u8; size]).await?;
        Ok(())
    }
}
