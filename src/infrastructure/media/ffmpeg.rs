//! FFmpeg/FFprobe command-line wrapper.

use super::{MediaError, MediaResult, Transcoder};
use crate::modules::video::model::VideoQuality;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

pub const VIDEO_CODEC: &str = "libx264";
pub const AUDIO_CODEC: &str = "aac";
const THUMBNAIL_QUALITY: &str = "2";

fn path_arg(path: &Path) -> OsString {
    path.as_os_str().to_owned()
}

pub fn probe_args(input: &Path) -> Vec<OsString> {
    vec![
        "-v".into(),
        "error".into(),
        "-select_streams".into(),
        "v:0".into(),
        "-show_entries".into(),
        "format=duration".into(),
        "-of".into(),
        "default=noprint_wrappers=1:nokey=1".into(),
        path_arg(input),
    ]
}

pub fn thumbnail_args(input: &Path, offset_secs: i32, output: &Path) -> Vec<OsString> {
    vec![
        "-ss".into(),
        offset_secs.to_string().into(),
        "-i".into(),
        path_arg(input),
        "-vframes".into(),
        "1".into(),
        "-q:v".into(),
        THUMBNAIL_QUALITY.into(),
        "-f".into(),
        "image2".into(),
        path_arg(output),
    ]
}

pub fn transcode_args(input: &Path, output: &Path, quality: &VideoQuality) -> Vec<OsString> {
    vec![
        "-i".into(),
        path_arg(input),
        "-c:v".into(),
        VIDEO_CODEC.into(),
        "-b:v".into(),
        format!("{}k", quality.bitrate).into(),
        "-vf".into(),
        format!("scale={}:{}", quality.width, quality.height).into(),
        "-c:a".into(),
        AUDIO_CODEC.into(),
        "-y".into(),
        path_arg(output),
    ]
}

/// Parses ffprobe's bare `format=duration` output and truncates it to seconds.
pub fn parse_duration(output: &str) -> MediaResult<i32> {
    let raw = output.trim();
    let seconds: f64 = raw
        .parse()
        .map_err(|_| MediaError::InvalidDuration(raw.to_string()))?;

    if !seconds.is_finite() || seconds < 0.0 || seconds > f64::from(i32::MAX) {
        return Err(MediaError::InvalidDuration(raw.to_string()));
    }
    Ok(seconds.trunc() as i32)
}

#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    ffmpeg_bin: String,
    ffprobe_bin: String,
}

impl FfmpegTranscoder {
    pub fn new(ffmpeg_bin: impl Into<String>, ffprobe_bin: impl Into<String>) -> Self {
        Self {
            ffmpeg_bin: ffmpeg_bin.into(),
            ffprobe_bin: ffprobe_bin.into(),
        }
    }

    /// Checks that both binaries resolve before the scheduler starts.
    pub fn verify(&self) -> MediaResult<()> {
        for bin in [&self.ffmpeg_bin, &self.ffprobe_bin] {
            which::which(bin).map_err(|e| MediaError::ToolNotFound {
                tool: bin.clone(),
                message: e.to_string(),
            })?;
        }
        Ok(())
    }

    /// Runs `bin` to completion and returns its stdout.
    async fn run(&self, bin: &str, args: &[OsString]) -> MediaResult<Vec<u8>> {
        debug!(tool = bin, ?args, "Running media tool");

        let output = Command::new(bin)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => MediaError::ToolNotFound {
                    tool: bin.to_string(),
                    message: e.to_string(),
                },
                _ => MediaError::Io(e),
            })?;

        if !output.status.success() {
            return Err(MediaError::ToolFailed {
                tool: bin.to_string(),
                exit_code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn probe_duration(&self, input: &Path) -> MediaResult<i32> {
        let stdout = self.run(&self.ffprobe_bin, &probe_args(input)).await?;
        let duration = parse_duration(&String::from_utf8_lossy(&stdout))?;
        debug!(duration, input = %input.display(), "Probed duration");
        Ok(duration)
    }

    async fn extract_thumbnail(
        &self,
        input: &Path,
        offset_secs: i32,
        output: &Path,
    ) -> MediaResult<()> {
        self.run(&self.ffmpeg_bin, &thumbnail_args(input, offset_secs, output))
            .await
            .map(|_| ())
    }

    async fn transcode(
        &self,
        input: &Path,
        output: &Path,
        quality: &VideoQuality,
    ) -> MediaResult<()> {
        self.run(&self.ffmpeg_bin, &transcode_args(input, output, quality))
            .await
            .map(|_| ())
    }
}
