use crate::modules::video::model::VideoQuality;
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

pub mod ffmpeg;

pub type MediaResult<T> = Result<T, MediaError>;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("{tool} not found: {message}")]
    ToolNotFound { tool: String, message: String },

    #[error("{tool} exited with status {exit_code:?}: {stderr}")]
    ToolFailed {
        tool: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("failed to parse duration '{0}'")]
    InvalidDuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Wrapper around the external probe/encode tool.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Duration of the first video stream's container, truncated to whole seconds.
    async fn probe_duration(&self, input: &Path) -> MediaResult<i32>;

    /// Writes a single JPEG frame taken `offset_secs` into the input.
    async fn extract_thumbnail(
        &self,
        input: &Path,
        offset_secs: i32,
        output: &Path,
    ) -> MediaResult<()>;

    /// Re-encodes `input` to the bitrate and exact dimensions of `quality`.
    async fn transcode(
        &self,
        input: &Path,
        output: &Path,
        quality: &VideoQuality,
    ) -> MediaResult<()>;
}
