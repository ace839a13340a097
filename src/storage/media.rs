//! Media storage
//!
//! Upload, delete, and URL derivation for user media. Files are
//! served through a custom domain in front of the bucket.

use aws_sdk_s3::Client as S3Client;

use crate::config::StorageConfig;
use crate::error::AppError;

/// Media storage service
pub struct MediaStorage {
    client: S3Client,
    /// Media bucket name
    bucket: String,
    /// Public URL base (custom domain), e.g. "https://media.example.com"
    public_url: String,
}

impl MediaStorage {
    /// Create new media storage client
    pub fn new(config: &StorageConfig) -> Self {
        use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};

        let credentials = Credentials::new(
            &config.s3.access_key_id,
            &config.s3.secret_access_key,
            None,
            None,
            "tandem-media",
        );

        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("auto"))
            .endpoint_url(&config.s3.endpoint)
            .credentials_provider(credentials)
            .http_client(super::build_s3_http_client())
            .build();

        Self {
            client: S3Client::from_conf(s3_config),
            bucket: config.media.bucket.clone(),
            public_url: config.media.public_url.trim_end_matches('/').to_string(),
        }
    }

    /// Upload a media file
    ///
    /// # Returns
    /// Public URL for the uploaded file
    pub async fn upload(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, AppError> {
        use aws_sdk_s3::primitives::ByteStream;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .cache_control("public, max-age=31536000") // 1 year
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("upload failed: {}", e)))?;

        Ok(self.get_public_url(key))
    }

    /// Upload an avatar image, stored under the avatars/ prefix.
    ///
    /// Only image content types are accepted.
    ///
    /// # Returns
    /// (S3 key, public URL)
    pub async fn upload_avatar(
        &self,
        id: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(String, String), AppError> {
        let ext = match content_type {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            "image/webp" => "webp",
            "image/gif" => "gif",
            other => {
                return Err(AppError::Validation(format!(
                    "unsupported avatar content type: {}",
                    other
                )));
            }
        };

        let key = format!("avatars/{}.{}", id, ext);
        let url = self.upload(&key, data, content_type).await?;
        Ok((key, url))
    }

    /// Delete a media file
    pub async fn delete(&self, key: &str) -> Result<(), AppError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("delete failed: {}", e)))?;

        Ok(())
    }

    /// Public URL for an S3 key
    pub fn get_public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_url, key)
    }

    /// The S3 key behind one of our public URLs, if it is one
    pub fn key_for_public_url(&self, url: &str) -> Option<String> {
        url.strip_prefix(&self.public_url)
            .map(|rest| rest.trim_start_matches('/').to_string())
            .filter(|key| !key.is_empty())
    }
}
