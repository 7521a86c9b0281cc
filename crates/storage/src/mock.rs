//! Mock Object Storage Implementation
//!
//! Keeps uploaded objects in memory so tests can inspect what a handler
//! stored without an S3 endpoint. Progress is reported in fixed-size chunks
//! to mimic a multipart upload.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bytes::Bytes;

use crate::{
    ObjectStorage, ObjectUpload, ProgressFn, StorageError, StoredObject, UploadProgress,
};

const MOCK_BASE_URL: &str = "https://mock-storage.local";
const MOCK_CHUNK_SIZE: usize = 64 * 1024;

/// Object captured by the mock service
#[derive(Debug, Clone)]
pub struct CapturedObject {
    pub content_type: String,
    pub body: Bytes,
}

/// Mock storage service for testing
#[derive(Debug, Clone, Default)]
pub struct MockObjectStorage {
    objects: Arc<Mutex<HashMap<String, CapturedObject>>>,
    failing: Arc<Mutex<Option<String>>>,
}

impl MockObjectStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following upload fail with `message`
    pub fn fail_uploads(&self, message: &str) {
        *self.failing.lock().unwrap() = Some(message.to_string());
    }

    pub fn get(&self, key: &str) -> Option<CapturedObject> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn clear(&self) {
        self.objects.lock().unwrap().clear();
    }
}

#[async_trait::async_trait]
impl ObjectStorage for MockObjectStorage {
    async fn put_object(
        &self,
        upload: ObjectUpload,
        progress: Option<ProgressFn>,
    ) -> Result<StoredObject, StorageError> {
        upload.validate()?;

        if let Some(message) = self.failing.lock().unwrap().clone() {
            return Err(StorageError::Upload(message));
        }

        let total = upload.body.len();
        if let Some(report) = &progress {
            let mut loaded = 0usize;
            report(UploadProgress {
                loaded: 0,
                total: total as u64,
            });
            while loaded < total {
                loaded = (loaded + MOCK_CHUNK_SIZE).min(total);
                report(UploadProgress {
                    loaded: loaded as u64,
                    total: total as u64,
                });
            }
        }

        tracing::info!(key = %upload.key, size = total, "Mock storage capturing object");

        self.objects.lock().unwrap().insert(
            upload.key.clone(),
            CapturedObject {
                content_type: upload.content_type.clone(),
                body: upload.body,
            },
        );

        Ok(StoredObject {
            url: format!("{}/{}", MOCK_BASE_URL, upload.key),
            key: upload.key,
            content_type: upload.content_type,
            size: total as u64,
        })
    }

    fn service_name(&self) -> &'static str {
        "mock"
    }
}
