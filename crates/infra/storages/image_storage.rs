use std::{str::FromStr, time::Duration};

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, timeout::TimeoutConfig};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    Client,
    config::{Region, StalledStreamProtectionConfig},
    error::{ProvideErrorMetadata, SdkError},
    operation::delete_object::DeleteObjectError,
    operation::put_object::PutObjectError,
    primitives::ByteStream,
};
use http::Uri;
use uuid::Uuid;

use crate::domain::{
    repositories::storage::ImageStorage,
    value_objects::images::{StoredObject, extension_for},
};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ImageStorageConfig {
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub prefix: String,
    /// Base URL objects are served from, e.g. a CDN in front of the bucket.
    pub public_base_url: String,
}

pub struct S3ImageStorage {
    client: Client,
    bucket: String,
    prefix: String,
    public_base_url: String,
}

impl S3ImageStorage {
    pub async fn new(config: ImageStorageConfig) -> Result<Self> {
        let client = build_client(&config)
            .await
            .context("failed to build image storage client")?;

        Ok(Self {
            client,
            bucket: config.bucket,
            prefix: normalize_prefix(&config.prefix),
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn object_key(&self, profile_id: Uuid, extension: &str) -> String {
        format!("{}{}/{}.{}", self.prefix, profile_id, Uuid::new_v4(), extension)
    }
}

#[async_trait]
impl ImageStorage for S3ImageStorage {
    async fn upload_image(
        &self,
        profile_id: Uuid,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredObject> {
        let extension = extension_for(content_type)
            .with_context(|| format!("unsupported image content type: {}", content_type))?;
        let object_key = self.object_key(profile_id, extension);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|err| map_put_object_error(err, &self.bucket, &object_key))?;

        Ok(StoredObject {
            url: format!("{}/{}", self.public_base_url, object_key),
            key: object_key,
        })
    }

    async fn delete_object(&self, object_key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(object_key)
            .send()
            .await
            .map_err(|err| map_delete_object_error(err, &self.bucket, object_key))?;

        Ok(())
    }
}

/// S3-compatible client with path-style addressing, so MinIO and R2 style endpoints work.
async fn build_client(config: &ImageStorageConfig) -> Result<Client> {
    let endpoint = format!("{}/", config.endpoint.trim_end_matches('/'));
    Uri::from_str(&endpoint).context("invalid image storage endpoint URL")?;

    let credentials = Credentials::new(
        config.access_key.clone(),
        config.secret_key.clone(),
        None,
        None,
        "loveny-images",
    );
    let region = Region::new(config.region.clone());

    let shared_config = aws_config::defaults(BehaviorVersion::latest())
        .region(region.clone())
        .credentials_provider(credentials)
        .timeout_config(
            TimeoutConfig::builder()
                .connect_timeout(CONNECT_TIMEOUT)
                .read_timeout(READ_TIMEOUT)
                .build(),
        )
        .load()
        .await;

    let s3_config = aws_sdk_s3::config::Builder::from(&shared_config)
        .endpoint_url(endpoint)
        .force_path_style(true)
        .region(region)
        .stalled_stream_protection(StalledStreamProtectionConfig::disabled())
        .build();

    Ok(Client::from_conf(s3_config))
}

/// Content type for an uploaded file when the client did not send one.
pub fn content_type_for_file_name(file_name: &str) -> Option<String> {
    mime_guess::from_path(file_name)
        .first_raw()
        .map(str::to_string)
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}/", trimmed)
    }
}

fn describe_service_error<E: ProvideErrorMetadata>(
    action: &str,
    err: &SdkError<E>,
    bucket: &str,
    object_key: &str,
) -> Option<String> {
    let SdkError::ServiceError(service_err) = err else {
        return None;
    };

    let status = service_err.raw().status().as_u16();
    let code = service_err.err().code().unwrap_or("unknown");
    let message = service_err.err().message().unwrap_or_default();

    let mut detail = format!("failed to {} (status {}, code {})", action, status, code);
    if !message.is_empty() {
        detail.push_str(&format!(": {}", message));
    }
    detail.push_str(&format!(" [bucket={}, key={}]", bucket, object_key));

    Some(detail)
}

fn map_put_object_error(err: SdkError<PutObjectError>, bucket: &str, object_key: &str) -> anyhow::Error {
    match describe_service_error("upload image", &err, bucket, object_key) {
        Some(detail) => anyhow::anyhow!(detail),
        None => anyhow::Error::new(err).context("failed to upload image"),
    }
}

fn map_delete_object_error(
    err: SdkError<DeleteObjectError>,
    bucket: &str,
    object_key: &str,
) -> anyhow::Error {
    match describe_service_error("delete image", &err, bucket, object_key) {
        Some(detail) => anyhow::anyhow!(detail),
        None => anyhow::Error::new(err).context("failed to delete image"),
    }
}
