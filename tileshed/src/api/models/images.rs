//! Request/response types for the images API.

use crate::db::models::images::{Image, ImageCreateDBRequest};
use crate::flash::Flash;
use crate::uploaders::UploadedFile;
use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// The `image` field group extracted from a multipart create request.
///
/// Field values are kept as submitted; validation happens in
/// [`ImageParams::into_record`] so the form can be re-rendered with the
/// original input.
#[derive(Debug, Clone, Default)]
pub struct ImageParams {
    pub tileset_name: String,
    pub description: Option<String>,
    pub camera_type: Option<String>,
    /// Raw date string, parsed during validation
    pub date_taken: Option<String>,
    pub file: Option<UploadedFile>,
}

impl ImageParams {
    /// Validate the submitted fields into an insertable record.
    ///
    /// On failure returns the full validation messages, ordered, for the
    /// error flash.
    pub fn into_record(self) -> Result<ImageCreateDBRequest, Vec<String>> {
        let mut errors = Vec::new();

        if self.tileset_name.trim().is_empty() {
            errors.push("Tileset name can't be blank".to_string());
        }

        if self.file.is_none() {
            errors.push("Image file can't be blank".to_string());
        }

        let date_taken = match self.date_taken.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => match raw.parse::<NaiveDate>() {
                Ok(date) => Some(date),
                Err(_) => {
                    errors.push("Date taken is not a valid date".to_string());
                    None
                }
            },
            None => None,
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(ImageCreateDBRequest {
            tileset_name: self.tileset_name,
            description: self.description,
            camera_type: self.camera_type,
            date_taken,
        })
    }
}

/// Submitted field values echoed back when the creation form is re-rendered
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ImageFormValues {
    pub tileset_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_taken: Option<String>,
}

impl From<&ImageParams> for ImageFormValues {
    fn from(params: &ImageParams) -> Self {
        Self {
            tileset_name: params.tileset_name.clone(),
            description: params.description.clone(),
            camera_type: params.camera_type.clone(),
            date_taken: params.date_taken.clone(),
        }
    }
}

/// Body of a re-rendered creation form
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ImageFormResponse {
    pub flash: Flash,
    pub values: ImageFormValues,
}

/// Decision of the create handler: redirect with a success flash, or
/// re-render the creation form with an error flash. Never both.
#[derive(Debug)]
pub enum CreateImageOutcome {
    Redirect { location: String, flash: Flash },
    RenderForm { flash: Flash, values: ImageFormValues },
}

impl CreateImageOutcome {
    pub fn redirect(location: impl Into<String>, flash: Flash) -> Self {
        Self::Redirect {
            location: location.into(),
            flash,
        }
    }

    pub fn render_form(flash: Flash, values: ImageFormValues) -> Self {
        Self::RenderForm { flash, values }
    }
}

impl IntoResponse for CreateImageOutcome {
    fn into_response(self) -> Response {
        match self {
            // The flash rides a one-time cookie to the listing page
            CreateImageOutcome::Redirect { location, flash } => (
                StatusCode::SEE_OTHER,
                [(header::LOCATION, location), (header::SET_COOKIE, flash.to_cookie())],
                (),
            )
                .into_response(),
            CreateImageOutcome::RenderForm { flash, values } => {
                (StatusCode::UNPROCESSABLE_ENTITY, Json(ImageFormResponse { flash, values })).into_response()
            }
        }
    }
}

/// Query parameters for listing images
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListImagesQuery {
    /// Maximum number of images to return (1-1000, default 100)
    #[param(default = 100, minimum = 1, maximum = 1000)]
    pub limit: Option<i64>,

    /// Sort order by created_at (asc or desc, default desc)
    #[serde(default = "default_order")]
    pub order: String,

    /// Filter by camera type
    pub camera_type: Option<String>,
}

fn default_order() -> String {
    "desc".to_string()
}

/// A persisted image record
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ImageResponse {
    pub id: String,
    pub tileset_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_taken: Option<NaiveDate>,
    pub created_at: i64, // Unix timestamp
}

impl From<&Image> for ImageResponse {
    fn from(image: &Image) -> Self {
        Self {
            id: image.id.to_string(),
            tileset_name: image.tileset_name.clone(),
            description: image.description.clone(),
            camera_type: image.camera_type.clone(),
            date_taken: image.date_taken,
            created_at: image.created_at.timestamp(),
        }
    }
}

/// Listing body; carries any flash consumed from the redirect cookie
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ImageListResponse {
    pub images: Vec<ImageResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flash: Option<Flash>,
}

/// Listing response that clears a consumed flash cookie
#[derive(Debug)]
pub struct ImagesIndexResponse {
    pub body: ImageListResponse,
    pub clear_flash: bool,
}

impl IntoResponse for ImagesIndexResponse {
    fn into_response(self) -> Response {
        if self.clear_flash {
            (StatusCode::OK, [(header::SET_COOKIE, Flash::clear_cookie())], Json(self.body)).into_response()
        } else {
            (StatusCode::OK, Json(self.body)).into_response()
        }
    }
}

/// Descriptor of the image creation form: what `POST /images` accepts
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NewImageFormInfo {
    /// Multipart field names, all under the `image` namespace
    pub fields: Vec<String>,
    /// Fields that must be present for the record to persist
    pub required: Vec<String>,
    /// Expected `date_taken` format
    pub date_format: String,
    /// Maximum accepted file size in bytes
    pub max_image_size: u64,
}
