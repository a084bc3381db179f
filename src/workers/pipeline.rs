use super::error::{ConversionError, ConversionResult};
use crate::config::settings::AppConfig;
use crate::infrastructure::media::Transcoder;
use crate::infrastructure::storage::ObjectStore;
use crate::modules::video::model::{
    NewVideoFile, QUALITY_ORIGINAL, Video, VideoQuality, VideoStatus,
};
use crate::modules::video::repository::AssetRepository;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::{TempDir, TempPath};
use tracing::{error, info, instrument, warn};

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Parent of the per-run scratch directories.
    pub work_dir: PathBuf,
    pub thumbnails_bucket: String,
}

impl PipelineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            work_dir: config.conversion_temp_dir.clone(),
            thumbnails_bucket: config.minio_thumbnails_bucket.clone(),
        }
    }
}

/// Drives one claimed video from its uploaded original to published renditions.
#[derive(Clone)]
pub struct ConversionPipeline {
    repository: Arc<dyn AssetRepository>,
    storage: Arc<dyn ObjectStore>,
    transcoder: Arc<dyn Transcoder>,
    settings: PipelineSettings,
}

impl ConversionPipeline {
    pub fn new(
        repository: Arc<dyn AssetRepository>,
        storage: Arc<dyn ObjectStore>,
        transcoder: Arc<dyn Transcoder>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            repository,
            storage,
            transcoder,
            settings,
        }
    }

    pub fn repository(&self) -> &Arc<dyn AssetRepository> {
        &self.repository
    }

    /// Runs the full pipeline and marks the video as errored if a mandatory stage fails.
    #[instrument(skip_all, fields(video_id = %video.id, code = %video.video_code))]
    pub async fn process(&self, video: &Video) {
        info!("Starting video conversion");

        match self.convert(video).await {
            Ok(()) => info!("Video conversion finished"),
            Err(e) => {
                error!(error = %e, "Video conversion failed");
                if let Err(e) = self.repository.update_status(video.id, VideoStatus::Error).await {
                    error!(error = %e, "Failed to mark video as errored");
                }
            }
        }
    }

    /// Probe, thumbnail, then every active quality lowest first.
    /// The video becomes "ready" as soon as the lowest quality is published;
    /// failures of higher qualities are logged and skipped.
    pub async fn convert(&self, video: &Video) -> ConversionResult<()> {
        let mut qualities = self.repository.active_qualities().await?;
        qualities.sort_by_key(|q| q.height);
        let (lowest, remaining) = qualities
            .split_first()
            .ok_or(ConversionError::NoActiveQualities)?;
        info!(count = qualities.len(), "Loaded active qualities");

        let workspace = self.workspace(video).await?;
        self.download_original(video, &workspace).await?;

        let duration = self.transcoder.probe_duration(&workspace.source).await?;
        info!(duration, "Probed video duration");

        let thumbnail_url = self.publish_thumbnail(video, &workspace, duration).await?;
        self.repository
            .update_thumbnail_and_duration(video.id, &thumbnail_url, duration)
            .await?;
        info!(%thumbnail_url, duration, "Stored thumbnail and duration");

        self.convert_to_quality(video, lowest, &workspace).await?;
        self.repository
            .update_status(video.id, VideoStatus::Ready)
            .await?;
        info!(quality = %lowest.name, "Video is ready");

        for quality in remaining {
            if let Err(e) = self.convert_to_quality(video, quality, &workspace).await {
                warn!(quality = %quality.name, error = %e, "Skipping failed quality");
            }
        }

        Ok(())
    }

    /// Downloads the original and produces a single quality, without touching the video status.
    pub async fn convert_single(
        &self,
        video: &Video,
        quality: &VideoQuality,
    ) -> ConversionResult<NewVideoFile> {
        let workspace = self.workspace(video).await?;
        self.download_original(video, &workspace).await?;
        self.convert_to_quality(video, quality, &workspace).await
    }

    /// Transcodes the downloaded source to `quality`, uploads it and records the rendition.
    #[instrument(skip_all, fields(quality = %quality.name))]
    async fn convert_to_quality(
        &self,
        video: &Video,
        quality: &VideoQuality,
        workspace: &Workspace,
    ) -> ConversionResult<NewVideoFile> {
        let output = TempPath::from_path(workspace.rendition_path(video, &quality.name));

        self.transcoder
            .transcode(&workspace.source, &output, quality)
            .await?;

        let key = video.location().file_path(&quality.name);
        self.storage
            .upload_file(&video.bucket_id, &key, &output)
            .await?;

        let size = tokio::fs::metadata(&output).await?.len();
        let size = i64::try_from(size).unwrap_or(i64::MAX);
        let record = NewVideoFile::completed(video, quality, size);
        self.repository.create_video_file(&record).await?;

        info!(%key, size, "Published quality");
        Ok(record)
    }

    async fn workspace(&self, video: &Video) -> ConversionResult<Workspace> {
        tokio::fs::create_dir_all(&self.settings.work_dir).await?;
        let dir = tempfile::Builder::new()
            .prefix(&format!("{}-", video.id))
            .tempdir_in(&self.settings.work_dir)?;

        for sub in [SOURCE_DIR, THUMBNAIL_DIR, RENDITIONS_DIR] {
            tokio::fs::create_dir(dir.path().join(sub)).await?;
        }

        let source = dir
            .path()
            .join(SOURCE_DIR)
            .join(local_file_name(&video.filename));
        Ok(Workspace { dir, source })
    }

    async fn download_original(
        &self,
        video: &Video,
        workspace: &Workspace,
    ) -> ConversionResult<()> {
        let key = video.location().file_path(QUALITY_ORIGINAL);

        info!(%key, local = %workspace.source.display(), "Downloading original");
        self.storage
            .download_file(&video.bucket_id, &key, &workspace.source)
            .await?;
        Ok(())
    }

    async fn publish_thumbnail(
        &self,
        video: &Video,
        workspace: &Workspace,
        duration: i32,
    ) -> ConversionResult<String> {
        let local = TempPath::from_path(workspace.thumbnail_path(video));

        self.transcoder
            .extract_thumbnail(&workspace.source, duration / 2, &local)
            .await?;

        let key = video.location().thumbnail_path();
        self.storage
            .upload_file(&self.settings.thumbnails_bucket, &key, &local)
            .await?;

        Ok(self.storage.public_url(&self.settings.thumbnails_bucket, &key))
    }
}

const SOURCE_DIR: &str = "source";
const THUMBNAIL_DIR: &str = "thumbnail";
const RENDITIONS_DIR: &str = "renditions";

/// Scratch directory for one run, removed with everything in it when dropped.
/// Source, thumbnail and renditions each get their own subdirectory so no
/// output can land on the input.
struct Workspace {
    dir: TempDir,
    source: PathBuf,
}

impl Workspace {
    fn thumbnail_path(&self, video: &Video) -> PathBuf {
        self.dir
            .path()
            .join(THUMBNAIL_DIR)
            .join(format!("{}.jpg", local_file_name(video.file_stem())))
    }

    fn rendition_path(&self, video: &Video, quality: &str) -> PathBuf {
        self.dir
            .path()
            .join(RENDITIONS_DIR)
            .join(local_file_name(&video.rendition_filename(quality)))
    }
}

/// Keeps only the last path component so a stored filename cannot escape the scratch dir.
fn local_file_name(filename: &str) -> String {
    Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or("source")
        .to_string()
}
