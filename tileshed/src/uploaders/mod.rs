//! Tiling provider abstraction layer.
//!
//! This module defines the `TilesetUploader` trait which abstracts the
//! external service that turns an uploaded image into a map tileset. The
//! create handler delegates the raw file bytes plus the display name here and
//! never branches on the result.

use async_trait::async_trait;
use bytes::Bytes;

use crate::config::UploaderConfig;

pub mod dummy;
pub mod mapbox;

use std::sync::Arc;

/// Create an uploader from configuration.
///
/// This is the single point where we convert config into uploader instances.
/// Adding a new provider requires adding a match arm here.
pub fn create_uploader(config: &UploaderConfig) -> Arc<dyn TilesetUploader> {
    match config {
        UploaderConfig::Mapbox(mapbox_config) => Arc::new(mapbox::MapboxUploader::from(mapbox_config.clone())),
        UploaderConfig::Dummy(dummy_config) => Arc::new(dummy::DummyUploader::from(dummy_config.clone())),
    }
}

/// Result type for uploader operations
pub type Result<T> = std::result::Result<T, UploadError>;

/// Errors that can occur while delegating an upload to the provider
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Tiling provider API error: {0}")]
    ProviderApi(String),

    #[error("Failed to reach tiling provider: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid tileset name: {0}")]
    InvalidTileset(String),
}

/// An uploaded file as received from the request, held in memory only for
/// the duration of the request
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Receipt returned by the provider for a started upload.
///
/// The create handler ignores this; it exists so provider clients can log
/// precise outcomes and so future callers can poll processing state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    /// Provider-side upload job id, when the provider reports one
    pub upload_id: Option<String>,
    /// Tileset id the provider will publish under
    pub tileset_id: String,
}

/// Abstract tiling provider interface.
///
/// Implementors forward an image to the external service that generates map
/// tiles from it. Implementations must be substitutable so tests can supply
/// a recording fake instead of patching at runtime.
#[async_trait]
pub trait TilesetUploader: Send + Sync {
    /// Delegate one uploaded file to the provider under the given display name.
    ///
    /// Called at most once per create request, before the persistence
    /// decision is finalized.
    async fn upload_file(&self, file: &UploadedFile, tileset_name: &str) -> Result<UploadReceipt>;
}

/// Derive a provider-safe tileset id from a display name: lowercase
/// alphanumerics with single dashes, truncated to 32 characters.
pub fn slugify_tileset_name(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true; // Suppress a leading dash
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug.truncate(32);
    slug
}
