//! AWS S3 Object Storage Implementation
//!
//! Small bodies go up in one `PutObject`; bodies larger than the configured
//! part size use a multipart upload so progress can be reported per part.

use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::config::SharedCredentialsProvider;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use aws_sdk_s3::Client as S3Client;

use crate::{
    ObjectStorage, ObjectUpload, ProgressFn, StorageConfig, StorageError, StoredObject,
    UploadProgress,
};

/// AWS S3 storage implementation
pub struct S3ObjectStorage {
    client: S3Client,
    config: StorageConfig,
}

impl S3ObjectStorage {
    /// Create a new S3 storage service
    pub async fn new(config: StorageConfig) -> Result<Self, StorageError> {
        if config.bucket.trim().is_empty() {
            return Err(StorageError::Configuration(
                "S3 bucket name is required".to_string(),
            ));
        }

        let region = Region::new(config.aws_region.clone());

        let sdk_config = match config.aws_endpoint_url.as_ref() {
            Some(endpoint_url) => {
                tracing::info!("Using custom S3 endpoint: {}", endpoint_url);

                // LocalStack accepts any credentials
                let credentials = Credentials::new(
                    "test-access-key",
                    "test-secret-key",
                    None,
                    None,
                    "localstack-storage-provider",
                );

                aws_config::defaults(BehaviorVersion::latest())
                    .region(region)
                    .endpoint_url(endpoint_url)
                    .credentials_provider(SharedCredentialsProvider::new(credentials))
                    .load()
                    .await
            }
            None => {
                aws_config::defaults(BehaviorVersion::latest())
                    .region(region)
                    .load()
                    .await
            }
        };

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.aws_endpoint_url.is_some())
            .build();

        Ok(Self {
            client: S3Client::from_conf(s3_config),
            config,
        })
    }

    async fn put_single(&self, upload: &ObjectUpload) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(&upload.key)
            .content_type(&upload.content_type)
            .body(ByteStream::from(upload.body.clone()))
            .send()
            .await
            .map_err(|e| StorageError::Upload(format!("Failed to put object: {}", e)))?;
        Ok(())
    }

    async fn put_multipart(
        &self,
        upload: &ObjectUpload,
        progress: Option<&ProgressFn>,
    ) -> Result<Option<String>, StorageError> {
        let created = self
            .client
            .create_multipart_upload()
            .bucket(&self.config.bucket)
            .key(&upload.key)
            .content_type(&upload.content_type)
            .send()
            .await
            .map_err(|e| StorageError::Upload(format!("Failed to start multipart upload: {}", e)))?;

        let upload_id = created
            .upload_id()
            .ok_or_else(|| StorageError::Upload("S3 returned no upload id".to_string()))?
            .to_string();

        match self.upload_parts(upload, &upload_id, progress).await {
            Ok(parts) => {
                let completed = self
                    .client
                    .complete_multipart_upload()
                    .bucket(&self.config.bucket)
                    .key(&upload.key)
                    .upload_id(&upload_id)
                    .multipart_upload(
                        CompletedMultipartUpload::builder()
                            .set_parts(Some(parts))
                            .build(),
                    )
                    .send()
                    .await
                    .map_err(|e| {
                        StorageError::Upload(format!("Failed to complete multipart upload: {}", e))
                    })?;
                Ok(completed.location().map(str::to_string))
            }
            Err(e) => {
                if let Err(abort_err) = self
                    .client
                    .abort_multipart_upload()
                    .bucket(&self.config.bucket)
                    .key(&upload.key)
                    .upload_id(&upload_id)
                    .send()
                    .await
                {
                    tracing::warn!(
                        key = %upload.key,
                        error = %abort_err,
                        "Failed to abort multipart upload"
                    );
                }
                Err(e)
            }
        }
    }

    async fn upload_parts(
        &self,
        upload: &ObjectUpload,
        upload_id: &str,
        progress: Option<&ProgressFn>,
    ) -> Result<Vec<CompletedPart>, StorageError> {
        let total = upload.body.len();
        let part_size = self.config.part_size;
        let mut parts = Vec::with_capacity(total.div_ceil(part_size));
        let mut offset = 0usize;
        let mut part_number = 1i32;

        while offset < total {
            let end = (offset + part_size).min(total);
            let chunk = upload.body.slice(offset..end);

            let output = self
                .client
                .upload_part()
                .bucket(&self.config.bucket)
                .key(&upload.key)
                .upload_id(upload_id)
                .part_number(part_number)
                .body(ByteStream::from(chunk))
                .send()
                .await
                .map_err(|e| {
                    StorageError::Upload(format!("Failed to upload part {}: {}", part_number, e))
                })?;

            parts.push(
                CompletedPart::builder()
                    .set_e_tag(output.e_tag().map(str::to_string))
                    .part_number(part_number)
                    .build(),
            );

            offset = end;
            part_number += 1;

            if let Some(report) = progress {
                report(UploadProgress {
                    loaded: offset as u64,
                    total: total as u64,
                });
            }
        }

        Ok(parts)
    }
}

#[async_trait::async_trait]
impl ObjectStorage for S3ObjectStorage {
    async fn put_object(
        &self,
        upload: ObjectUpload,
        progress: Option<ProgressFn>,
    ) -> Result<StoredObject, StorageError> {
        upload.validate()?;

        let size = upload.body.len() as u64;
        tracing::info!(key = %upload.key, size, "Uploading object to S3");

        if let Some(report) = &progress {
            report(UploadProgress {
                loaded: 0,
                total: size,
            });
        }

        let location = if upload.body.len() > self.config.part_size {
            self.put_multipart(&upload, progress.as_ref()).await?
        } else {
            self.put_single(&upload).await?;
            if let Some(report) = &progress {
                report(UploadProgress {
                    loaded: size,
                    total: size,
                });
            }
            None
        };

        // S3's multipart Location is percent-encoded and ignores the public prefix
        let url = match (&self.config.public_base_url, location) {
            (None, Some(location)) => location,
            _ => self.config.object_url(&upload.key),
        };

        tracing::info!(key = %upload.key, url = %url, "Object stored");

        Ok(StoredObject {
            key: upload.key,
            url,
            content_type: upload.content_type,
            size,
        })
    }

    fn service_name(&self) -> &'static str {
        "s3"
    }
}
