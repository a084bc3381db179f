use crate::config::env::{self, EnvKey};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub server_port: u16,
    pub database_url: String,
    pub minio_url: String,
    pub minio_bucket: String,
    pub minio_thumbnails_bucket: String,
    pub minio_access_key: String,
    pub minio_secret_key: String,
    pub storage_base_url: String,
    pub storage_shard_count: u32,
    pub conversion_interval: Duration,
    pub conversion_max_concurrent: usize,
    pub conversion_temp_dir: PathBuf,
    /// Zero disables recovery of videos stuck in "processing".
    pub conversion_stale_after: Duration,
    pub ffmpeg_bin: String,
    pub ffprobe_bin: String,
}

fn required(key: EnvKey) -> Result<String, ConfigError> {
    let name = key.as_str();
    env::get(key).map_err(|_| ConfigError::Missing(name))
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        let config = Self {
            server_port: env::get_parsed(EnvKey::ServerPort, 3000),
            database_url: required(EnvKey::DatabaseUrl)?,
            minio_url: required(EnvKey::MinioUrl)?,
            minio_bucket: env::get_or(EnvKey::MinioBucket, "videos"),
            minio_thumbnails_bucket: env::get_or(EnvKey::MinioThumbnailsBucket, "thumbnails"),
            minio_access_key: required(EnvKey::MinioAccessKey)?,
            minio_secret_key: required(EnvKey::MinioSecretKey)?,
            storage_base_url: env::get_or(EnvKey::StorageBaseUrl, "http://localhost:9000"),
            storage_shard_count: env::get_parsed(EnvKey::StorageShardCount, 64),
            conversion_interval: Duration::from_secs(env::get_parsed(
                EnvKey::ConversionInterval,
                30,
            )),
            conversion_max_concurrent: env::get_parsed(EnvKey::ConversionMaxConcurrent, 5),
            conversion_temp_dir: PathBuf::from(env::get_or(
                EnvKey::ConversionTempDir,
                "/tmp/video-conversion",
            )),
            conversion_stale_after: Duration::from_secs(env::get_parsed(
                EnvKey::ConversionStaleAfter,
                0,
            )),
            ffmpeg_bin: env::get_or(EnvKey::FfmpegBin, "ffmpeg"),
            ffprobe_bin: env::get_or(EnvKey::FfprobeBin, "ffprobe"),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.conversion_max_concurrent == 0 {
            return Err(ConfigError::Invalid(
                "CONVERSION_MAX_CONCURRENT must be at least 1".to_string(),
            ));
        }
        if self.storage_shard_count == 0 {
            return Err(ConfigError::Invalid(
                "STORAGE_SHARD_COUNT must be at least 1".to_string(),
            ));
        }
        if self.conversion_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "CONVERSION_CHECK_INTERVAL_SECS must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
