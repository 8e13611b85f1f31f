use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::operation::get_object::GetObjectError;
use dealwise_core::config::FeedConfig;
use secrecy::ExposeSecret;
use tracing::debug;

use crate::{ObjectStore, StorageError};

const STATIC_PROVIDER_NAME: &str = "dealwise-static";

pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3ObjectStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self { client, bucket: bucket.into() }
    }

    /// Static keys from config when both are set, otherwise the default AWS provider chain.
    pub async fn from_config(config: &FeedConfig) -> Result<Self, StorageError> {
        let bucket = config
            .bucket
            .as_deref()
            .map(str::trim)
            .filter(|bucket| !bucket.is_empty())
            .ok_or_else(|| StorageError::MissingCredential("feed.bucket is not set".to_string()))?
            .to_string();

        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        match (&config.access_key_id, &config.secret_access_key) {
            (Some(access_key_id), Some(secret_access_key)) => {
                loader = loader.credentials_provider(Credentials::new(
                    access_key_id.expose_secret(),
                    secret_access_key.expose_secret(),
                    None,
                    None,
                    STATIC_PROVIDER_NAME,
                ));
            }
            (None, None) => {}
            _ => {
                return Err(StorageError::MissingCredential(
                    "feed.access_key_id and feed.secret_access_key must be set together"
                        .to_string(),
                ))
            }
        }
        if let Some(endpoint_url) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }

        let sdk_config = loader.load().await;
        debug!(event_name = "storage.s3.client_ready", bucket = %bucket, "s3 client configured");
        Ok(Self::new(aws_sdk_s3::Client::new(&sdk_config), bucket))
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn fetch(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|error| self.map_get_error(key, error))?;

        let data = output.body.collect().await.map_err(|error| {
            StorageError::Backend(format!("reading s3://{}/{key} failed: {error}", self.bucket))
        })?;
        Ok(data.into_bytes().to_vec())
    }

    fn location(&self) -> String {
        format!("s3 bucket `{}`", self.bucket)
    }
}

impl S3ObjectStore {
    fn map_get_error(&self, key: &str, error: SdkError<GetObjectError>) -> StorageError {
        if error.as_service_error().map(GetObjectError::is_no_such_key).unwrap_or(false) {
            return StorageError::NotFound { location: self.location(), key: key.to_string() };
        }

        // Unresolved identities only surface through the rendered error chain.
        let rendered = DisplayErrorContext(&error).to_string();
        if rendered.to_ascii_lowercase().contains("credentials") {
            return StorageError::MissingCredential(format!(
                "AWS credentials not found: {rendered}"
            ));
        }
        StorageError::Backend(rendered)
    }
}
