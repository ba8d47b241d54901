//! Mapbox-style uploads API client.
//!
//! Sends the image as a multipart POST to
//! `{api_base}/uploads/v1/{username}?access_token=...` and parses the upload
//! receipt. The provider owns all tiling work from that point on; this client
//! never polls for completion.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use url::Url;

use crate::config::MapboxConfig;
use crate::uploaders::{Result, TilesetUploader, UploadError, UploadReceipt, UploadedFile, slugify_tileset_name};

/// Upload receipt as returned by the provider
#[derive(Debug, Deserialize)]
struct MapboxUploadResponse {
    id: Option<String>,
    tileset: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Mapbox uploads API client
pub struct MapboxUploader {
    client: reqwest::Client,
    api_base: Url,
    username: String,
    access_token: String,
}

impl MapboxUploader {
    pub fn new(api_base: Url, username: String, access_token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base,
            username,
            access_token,
        }
    }

    fn upload_url(&self) -> Result<Url> {
        let mut url = self
            .api_base
            .join(&format!("uploads/v1/{}", self.username))
            .map_err(|e| UploadError::ProviderApi(format!("invalid uploads URL: {e}")))?;
        url.query_pairs_mut().append_pair("access_token", &self.access_token);
        Ok(url)
    }
}

impl From<MapboxConfig> for MapboxUploader {
    fn from(config: MapboxConfig) -> Self {
        Self::new(config.api_base, config.username, config.access_token)
    }
}

#[async_trait]
impl TilesetUploader for MapboxUploader {
    async fn upload_file(&self, file: &UploadedFile, tileset_name: &str) -> Result<UploadReceipt> {
        let slug = slugify_tileset_name(tileset_name);
        if slug.is_empty() {
            return Err(UploadError::InvalidTileset(format!(
                "display name {tileset_name:?} produces an empty tileset id"
            )));
        }
        let tileset_id = format!("{}.{}", self.username, slug);

        let file_part = Part::bytes(file.bytes.to_vec())
            .file_name(file.filename.clone())
            .mime_str(&file.content_type)
            .map_err(|e| UploadError::ProviderApi(format!("invalid content type {:?}: {e}", file.content_type)))?;

        let form = Form::new()
            .part("file", file_part)
            .text("tileset", tileset_id.clone())
            .text("name", tileset_name.to_string());

        let response = self.client.post(self.upload_url()?).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UploadError::ProviderApi(format!("upload rejected with status {status}: {body}")));
        }

        let receipt: MapboxUploadResponse = response.json().await?;
        if let Some(error) = receipt.error {
            return Err(UploadError::ProviderApi(error));
        }

        tracing::info!(
            tileset = %receipt.tileset.as_deref().unwrap_or(&tileset_id),
            upload_id = ?receipt.id,
            "Tiling provider accepted upload"
        );

        Ok(UploadReceipt {
            upload_id: receipt.id,
            tileset_id: receipt.tileset.unwrap_or(tileset_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn export_tiff() -> UploadedFile {
        UploadedFile {
            filename: "export.tiff".to_string(),
            content_type: "image/tiff".to_string(),
            bytes: bytes::Bytes::from_static(b"II*\x00fake tiff"),
        }
    }

    fn uploader_for(server: &MockServer) -> MapboxUploader {
        MapboxUploader::new(server.uri().parse().unwrap(), "surveyor".to_string(), "sk.secret".to_string())
    }

    #[tokio::test]
    async fn posts_multipart_upload_and_parses_receipt() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/uploads/v1/surveyor"))
            .and(query_param("access_token", "sk.secret"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "id": "upload-abc123",
                "tileset": "surveyor.fatma-image",
                "complete": false,
                "error": null
            })))
            .expect(1)
            .mount(&server)
            .await;

        let receipt = uploader_for(&server).upload_file(&export_tiff(), "Fatma image").await.unwrap();

        assert_eq!(receipt.upload_id.as_deref(), Some("upload-abc123"));
        assert_eq!(receipt.tileset_id, "surveyor.fatma-image");
    }

    #[tokio::test]
    async fn non_success_status_maps_to_provider_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/uploads/v1/surveyor"))
            .respond_with(ResponseTemplate::new(422).set_body_string("tileset name unavailable"))
            .mount(&server)
            .await;

        let err = uploader_for(&server).upload_file(&export_tiff(), "Fatma image").await.unwrap_err();

        match err {
            UploadError::ProviderApi(message) => assert!(message.contains("tileset name unavailable")),
            other => panic!("expected provider API error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn provider_error_field_is_surfaced() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/uploads/v1/surveyor"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": null,
                "tileset": null,
                "complete": false,
                "error": "account upload quota exceeded"
            })))
            .mount(&server)
            .await;

        let err = uploader_for(&server).upload_file(&export_tiff(), "Fatma image").await.unwrap_err();

        match err {
            UploadError::ProviderApi(message) => assert_eq!(message, "account upload quota exceeded"),
            other => panic!("expected provider API error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn rejects_names_with_no_usable_tileset_id() {
        let server = MockServer::start().await;
        let err = uploader_for(&server).upload_file(&export_tiff(), "???").await.unwrap_err();
        assert!(matches!(err, UploadError::InvalidTileset(_)));
    }
}
