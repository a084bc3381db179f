use super::{ObjectStore, StorageError, StorageResult};
use async_trait::async_trait;
use aws_sdk_s3::config::Builder;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::{Client, config::BehaviorVersion, config::Credentials, config::Region};
use std::path::Path;
use tokio::fs::File;
use tracing::{debug, info};

#[derive(Clone)]
pub struct StorageService {
    pub client: Client,
    public_base_url: String,
}

impl StorageService {
    pub fn new(endpoint: &str, access_key: &str, secret_key: &str, public_base_url: &str) -> Self {
        let credentials = Credentials::new(access_key, secret_key, None, None, "static");

        let config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .endpoint_url(endpoint)
            .credentials_provider(credentials)
            .force_path_style(true) // Required for MinIO
            .build();

        let client = Client::from_conf(config);

        info!(endpoint, "S3 (MinIO) client configured");

        Self {
            client,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Creates `bucket` if it does not exist yet.
    pub async fn ensure_bucket(&self, bucket: &str) -> StorageResult<()> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => return Ok(()),
            Err(e) => {
                let missing = e
                    .as_service_error()
                    .map(|se| se.is_not_found())
                    .unwrap_or(false);
                if !missing {
                    return Err(StorageError::Bucket(format!(
                        "failed to check bucket {}: {}",
                        bucket,
                        DisplayErrorContext(&e)
                    )));
                }
            }
        }

        self.client
            .create_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| {
                StorageError::Bucket(format!(
                    "failed to create bucket {}: {}",
                    bucket,
                    DisplayErrorContext(&e)
                ))
            })?;

        info!(bucket, "Created bucket");
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for StorageService {
    async fn download_file(&self, bucket: &str, key: &str, path: &Path) -> StorageResult<()> {
        debug!(bucket, key, path = %path.display(), "Downloading object");

        let resp = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let no_such_key = e
                    .as_service_error()
                    .map(|se| se.is_no_such_key())
                    .unwrap_or(false);
                if no_such_key {
                    StorageError::NotFound {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                    }
                } else {
                    StorageError::download_failed(DisplayErrorContext(&e).to_string())
                }
            })?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut reader = resp.body.into_async_read();
        let mut file = File::create(path).await?;
        let bytes = tokio::io::copy(&mut reader, &mut file).await?;
        file.sync_all().await?;

        debug!(bucket, key, bytes, "Downloaded object");
        Ok(())
    }

    async fn upload_file(&self, bucket: &str, key: &str, path: &Path) -> StorageResult<()> {
        let content_type = mime_guess::from_path(key).first_or_octet_stream();
        debug!(bucket, key, path = %path.display(), %content_type, "Uploading object");

        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .content_type(content_type.essence_str())
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(DisplayErrorContext(&e).to_string()))?;

        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/{}/{}", self.public_base_url, bucket, key)
    }
}
