use std::env;
use std::str::FromStr;

pub enum EnvKey {
    ServerPort,
    DatabaseUrl,
    MinioUrl,
    MinioBucket,
    MinioThumbnailsBucket,
    MinioAccessKey,
    MinioSecretKey,
    StorageBaseUrl,
    StorageShardCount,
    ConversionInterval,
    ConversionMaxConcurrent,
    ConversionTempDir,
    ConversionStaleAfter,
    FfmpegBin,
    FfprobeBin,
}

impl EnvKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvKey::ServerPort => "APP_PORT",
            EnvKey::DatabaseUrl => "DATABASE_URL",
            EnvKey::MinioUrl => "MINIO_ENDPOINT",
            EnvKey::MinioBucket => "MINIO_BUCKET_VIDEOS",
            EnvKey::MinioThumbnailsBucket => "MINIO_BUCKET_THUMBNAILS",
            EnvKey::MinioAccessKey => "AWS_ACCESS_KEY_ID",
            EnvKey::MinioSecretKey => "AWS_SECRET_ACCESS_KEY",
            EnvKey::StorageBaseUrl => "STORAGE_BASE_URL",
            EnvKey::StorageShardCount => "STORAGE_SHARD_COUNT",
            EnvKey::ConversionInterval => "CONVERSION_CHECK_INTERVAL_SECS",
            EnvKey::ConversionMaxConcurrent => "CONVERSION_MAX_CONCURRENT",
            EnvKey::ConversionTempDir => "CONVERSION_TEMP_DIR",
            EnvKey::ConversionStaleAfter => "CONVERSION_STALE_AFTER_SECS",
            EnvKey::FfmpegBin => "FFMPEG_BIN",
            EnvKey::FfprobeBin => "FFPROBE_BIN",
        }
    }
}

pub fn get(key: EnvKey) -> Result<String, env::VarError> {
    env::var(key.as_str())
}

pub fn get_or(key: EnvKey, default: &str) -> String {
    env::var(key.as_str()).unwrap_or_else(|_| default.to_string())
}

pub fn get_parsed<T: FromStr>(key: EnvKey, default: T) -> T {
    match get(key) {
        Ok(val) => val.parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}
