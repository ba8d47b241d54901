//! Test utilities for integration testing.

use crate::config::{Config, DummyUploaderConfig, UploaderConfig};
use crate::uploaders::{TilesetUploader, dummy::DummyUploader};
use crate::{AppState, build_router};
use axum_test::TestServer;
use axum_test::multipart::{MultipartForm, Part};
use sqlx::PgPool;
use std::sync::Arc;

pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        uploader: UploaderConfig::Dummy(DummyUploaderConfig::default()),
        ..Default::default()
    }
}

/// Build a test server around the given pool, with an uploader whose
/// recorded calls the test can assert on.
pub fn create_test_app(pool: PgPool) -> (TestServer, Arc<DummyUploader>) {
    build_test_app(pool, Arc::new(DummyUploader::new()))
}

/// Like [`create_test_app`], but every delegation to the uploader fails
pub fn create_test_app_with_failing_uploader(pool: PgPool) -> (TestServer, Arc<DummyUploader>) {
    build_test_app(pool, Arc::new(DummyUploader::failing("provider unavailable")))
}

fn build_test_app(pool: PgPool, uploader: Arc<DummyUploader>) -> (TestServer, Arc<DummyUploader>) {
    let state = AppState::builder()
        .db(pool)
        .config(create_test_config())
        .uploader(uploader.clone() as Arc<dyn TilesetUploader>)
        .build();

    let router = build_router(&state).expect("Failed to build router");
    let server = TestServer::new(router).expect("Failed to create test server");
    (server, uploader)
}

/// A complete, valid `image` field group with the given tileset name
pub fn image_upload_form(tileset_name: &str, file_bytes: &[u8]) -> MultipartForm {
    MultipartForm::new()
        .add_text("image[tileset_name]", tileset_name)
        .add_text("image[description]", "This is an image")
        .add_text("image[camera_type]", "Canon Camera")
        .add_text("image[date_taken]", "2016-12-02")
        .add_part(
            "image[image_file]",
            Part::bytes(file_bytes.to_vec()).file_name("export.tiff").mime_type("image/tiff"),
        )
}
