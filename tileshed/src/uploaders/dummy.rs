//! Dummy uploader implementation.
//!
//! Records every delegation in memory instead of contacting a provider.
//! Used in tests and local development; tests inspect the recorded calls to
//! assert the handler delegated exactly once with the exact arguments.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::config::DummyUploaderConfig;
use crate::uploaders::{Result, TilesetUploader, UploadError, UploadReceipt, UploadedFile, slugify_tileset_name};

/// One recorded delegation
#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub filename: String,
    pub content_type: String,
    pub bytes: bytes::Bytes,
    pub tileset_name: String,
}

/// Uploader that records calls instead of performing them
#[derive(Debug, Default)]
pub struct DummyUploader {
    uploads: Mutex<Vec<RecordedUpload>>,
    fail_with: Option<String>,
}

impl DummyUploader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dummy uploader whose every call fails with the given message
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            uploads: Mutex::new(Vec::new()),
            fail_with: Some(message.into()),
        }
    }

    /// Snapshot of the delegations recorded so far
    pub fn recorded(&self) -> Vec<RecordedUpload> {
        self.uploads.lock().expect("uploads lock poisoned").clone()
    }
}

impl From<DummyUploaderConfig> for DummyUploader {
    fn from(config: DummyUploaderConfig) -> Self {
        Self {
            uploads: Mutex::new(Vec::new()),
            fail_with: config.fail_with,
        }
    }
}

#[async_trait]
impl TilesetUploader for DummyUploader {
    async fn upload_file(&self, file: &UploadedFile, tileset_name: &str) -> Result<UploadReceipt> {
        self.uploads.lock().expect("uploads lock poisoned").push(RecordedUpload {
            filename: file.filename.clone(),
            content_type: file.content_type.clone(),
            bytes: file.bytes.clone(),
            tileset_name: tileset_name.to_string(),
        });

        if let Some(message) = &self.fail_with {
            return Err(UploadError::ProviderApi(message.clone()));
        }

        tracing::debug!(tileset_name, filename = %file.filename, "Dummy uploader recorded delegation");

        Ok(UploadReceipt {
            upload_id: None,
            tileset_id: slugify_tileset_name(tileset_name),
        })
    }
}
