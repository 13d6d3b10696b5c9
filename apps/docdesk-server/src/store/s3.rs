//! S3-compatible document collections
//!
//! Each record is a JSON object stored at `<prefix><partition>/<id>.json`.
//! Works against MinIO, Cloudflare R2, Backblaze B2 and AWS S3.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    config::{Credentials, Region},
    error::{ProvideErrorMetadata, SdkError},
    primitives::ByteStream,
    Client,
};

use crate::config::S3Config;

use super::types::{Partition, StoreError, StoreResult, StoredRecord};
use super::DocumentStore;

/// S3-compatible document store
#[derive(Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
    prefix: String,
}

impl S3Store {
    /// Create a new store from configuration
    pub async fn new(config: &S3Config) -> StoreResult<Self> {
        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "docdesk",
        );

        let region = config
            .region
            .clone()
            .unwrap_or_else(|| "us-east-1".to_string());

        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint)
            .region(Region::new(region))
            .credentials_provider(credentials)
            .force_path_style(true) // Required for MinIO and other S3-compatible services
            .build();

        let client = Client::from_conf(s3_config);

        let bucket = config.bucket.clone();
        match client.head_bucket().bucket(&bucket).send().await {
            Ok(_) => {
                tracing::info!("Connected to S3 bucket: {}", bucket);
            }
            Err(e) => {
                tracing::warn!(
                    "Could not verify bucket {}: {}. Will attempt operations anyway.",
                    bucket,
                    e
                );
            }
        }

        Ok(Self {
            client,
            bucket,
            prefix: normalize_prefix(&config.prefix),
        })
    }

    /// Object key for a record
    pub fn object_key(&self, partition: Partition, id: &str) -> String {
        object_key(&self.prefix, partition, id)
    }

    /// Write a record (used for seeding and by tooling that moves requests)
    pub async fn put(
        &self,
        partition: Partition,
        id: &str,
        record: &StoredRecord,
    ) -> StoreResult<()> {
        let key = self.object_key(partition, id);
        let body = serde_json::to_vec(record).map_err(|source| StoreError::MalformedRecord {
            key: key.clone(),
            source,
        })?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type("application/json")
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| classify(&key, "put", e))?;

        Ok(())
    }
}

#[async_trait]
impl DocumentStore for S3Store {
    fn backend(&self) -> &'static str {
        "s3"
    }

    async fn get(&self, partition: Partition, id: &str) -> StoreResult<Option<StoredRecord>> {
        let key = self.object_key(partition, id);

        let response = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                if e.as_service_error().map(|se| se.is_no_such_key()).unwrap_or(false) {
                    return Ok(None);
                }
                return Err(classify(&key, "get", e));
            }
        };

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| {
                StoreError::Unavailable(format!("Failed to read object body {}: {}", key, e))
            })?
            .into_bytes();

        let record = serde_json::from_slice(&data)
            .map_err(|source| StoreError::MalformedRecord { key, source })?;
        Ok(Some(record))
    }

    async fn delete(&self, partition: Partition, id: &str) -> StoreResult<()> {
        let key = self.object_key(partition, id);

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| classify(&key, "delete", e))?;

        Ok(())
    }
}

/// Map an SDK failure onto the store taxonomy
fn classify<E, R>(key: &str, operation: &str, err: SdkError<E, R>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let message = format!("Failed to {} object {}: {}", operation, key, err);
    match &err {
        SdkError::ServiceError(service) => match service.err().code() {
            Some("AccessDenied") | Some("Forbidden") => StoreError::AccessDenied(message),
            _ => StoreError::Backend(message),
        },
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => {
            StoreError::Unavailable(message)
        }
        _ => StoreError::Backend(message),
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}/", trimmed)
    }
}

fn object_key(prefix: &str, partition: Partition, id: &str) -> String {
    format!("{}{}/{}.json", prefix, partition.collection(), id)
}
