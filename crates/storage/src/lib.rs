//! Object storage for listing images
//!
//! Provides durable blob storage with support for:
//! - AWS S3 (single put for small bodies, multipart with progress for large ones)
//! - An in-memory mock for tests and local development
//! - LocalStack-style custom endpoints

use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod mock;
pub mod s3;

/// Default multipart part size (S3 requires at least 5 MiB per non-final part)
pub const DEFAULT_PART_SIZE: usize = 8 * 1024 * 1024;

const MIN_PART_SIZE: usize = 5 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage configuration error: {0}")]
    Configuration(String),

    #[error("Storage validation error: {0}")]
    Validation(String),

    #[error("Upload failed: {0}")]
    Upload(String),
}

/// Blob to be stored
#[derive(Debug, Clone)]
pub struct ObjectUpload {
    pub key: String,
    pub content_type: String,
    pub body: Bytes,
}

impl ObjectUpload {
    pub fn new(key: String, content_type: String, body: impl Into<Bytes>) -> Self {
        Self {
            key,
            content_type,
            body: body.into(),
        }
    }

    fn validate(&self) -> Result<(), StorageError> {
        if self.key.trim().is_empty() {
            return Err(StorageError::Validation("Object key is required".to_string()));
        }
        if self.content_type.trim().is_empty() {
            return Err(StorageError::Validation(
                "Content type is required".to_string(),
            ));
        }
        if self.body.is_empty() {
            return Err(StorageError::Validation("Object body is empty".to_string()));
        }
        Ok(())
    }
}

/// A stored object and where to fetch it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    pub key: String,
    pub url: String,
    pub content_type: String,
    pub size: u64,
}

/// Bytes sent so far out of the total
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub loaded: u64,
    pub total: u64,
}

impl UploadProgress {
    /// Whole percentage, rounded to nearest
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        let pct = (self.loaded as f64 / self.total as f64 * 100.0).round();
        pct.clamp(0.0, 100.0) as u8
    }
}

/// Progress observer passed to uploads
pub type ProgressFn = Arc<dyn Fn(UploadProgress) + Send + Sync>;

/// Build the object key for an uploaded file: `{unix_millis}_{file name}`,
/// with anything outside `[A-Za-z0-9._-]` replaced so keys stay URL-safe.
pub fn object_key(file_name: &str, now: DateTime<Utc>) -> String {
    let sanitized: String = file_name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '-'
            }
        })
        .collect();

    let name = if sanitized.trim_matches(|c| c == '-' || c == '.').is_empty() {
        "image".to_string()
    } else {
        sanitized
    };

    format!("{}_{}", now.timestamp_millis(), name)
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Storage provider (s3, mock)
    pub provider: String,
    pub bucket: String,
    pub aws_region: String,
    /// AWS endpoint URL (for LocalStack / S3-compatible stores)
    pub aws_endpoint_url: Option<String>,
    /// Public URL prefix for stored objects; derived from bucket and region when unset
    pub public_base_url: Option<String>,
    pub part_size: usize,
}

impl StorageConfig {
    /// Create storage config from environment variables
    pub fn from_env() -> Result<Self, StorageError> {
        dotenvy::dotenv().ok();

        let provider = std::env::var("STORAGE_PROVIDER").unwrap_or_else(|_| "mock".to_string());

        let bucket = std::env::var("S3_BUCKET").unwrap_or_default();
        if provider != "mock" && bucket.trim().is_empty() {
            return Err(StorageError::Configuration(
                "S3_BUCKET is required for the s3 provider".to_string(),
            ));
        }

        let part_size = match std::env::var("STORAGE_PART_SIZE") {
            Ok(raw) => raw.parse::<usize>().map_err(|_| {
                StorageError::Configuration(format!("Invalid STORAGE_PART_SIZE: {}", raw))
            })?,
            Err(_) => DEFAULT_PART_SIZE,
        };
        if part_size < MIN_PART_SIZE {
            return Err(StorageError::Configuration(format!(
                "STORAGE_PART_SIZE must be at least {} bytes",
                MIN_PART_SIZE
            )));
        }

        Ok(Self {
            provider,
            bucket,
            aws_region: std::env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            aws_endpoint_url: std::env::var("AWS_ENDPOINT_URL").ok(),
            public_base_url: std::env::var("STORAGE_PUBLIC_BASE_URL").ok(),
            part_size,
        })
    }

    /// URL under which an object with `key` is served
    pub fn object_url(&self, key: &str) -> String {
        match (&self.public_base_url, &self.aws_endpoint_url) {
            (Some(base), _) => format!("{}/{}", base.trim_end_matches('/'), key),
            (None, Some(endpoint)) => {
                format!("{}/{}/{}", endpoint.trim_end_matches('/'), self.bucket, key)
            }
            (None, None) => format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket, self.aws_region, key
            ),
        }
    }
}

/// Object storage service trait for different implementations
#[async_trait::async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store a blob and return its durable URL.
    ///
    /// `progress` is called as bytes are acknowledged; the final call always
    /// reports `loaded == total`.
    async fn put_object(
        &self,
        upload: ObjectUpload,
        progress: Option<ProgressFn>,
    ) -> Result<StoredObject, StorageError>;

    /// Service name for logging
    fn service_name(&self) -> &'static str;
}

/// Storage service factory
pub struct ObjectStorageFactory;

impl ObjectStorageFactory {
    /// Create storage service based on configuration
    pub async fn create(config: StorageConfig) -> Result<Box<dyn ObjectStorage>, StorageError> {
        match config.provider.as_str() {
            "s3" | "aws-s3" => {
                tracing::info!(bucket = %config.bucket, "Creating S3 object storage");
                let storage = s3::S3ObjectStorage::new(config).await?;
                Ok(Box::new(storage))
            }
            "mock" => {
                tracing::info!("Creating mock object storage");
                Ok(Box::new(mock::MockObjectStorage::new()))
            }
            provider => Err(StorageError::Configuration(format!(
                "Unknown storage provider: {}. Supported providers: s3, mock",
                provider
            ))),
        }
    }
}
