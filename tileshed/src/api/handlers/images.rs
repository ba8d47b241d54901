use crate::AppState;
use crate::api::models::images::{
    CreateImageOutcome, ImageFormValues, ImageListResponse, ImageParams, ImageResponse, ImagesIndexResponse, ListImagesQuery,
    NewImageFormInfo,
};
use crate::db::handlers::{Images, Repository, images::ImageFilter};
use crate::errors::{Error, Result};
use crate::flash::Flash;
use crate::types::{ImageId, abbrev_uuid};
use crate::uploaders::UploadedFile;
use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::{HeaderMap, header},
};

/// Flash shown when the request carries no `image` field group at all
const MISSING_IMAGE_MESSAGE: &str = "Something went wrong. Please try again.";

/// Path the success redirect points at
const IMAGES_PATH: &str = "/images";

/// Collect the `image[...]` field group from a multipart body.
///
/// Returns `None` when no field in the group was submitted. Unknown fields
/// are ignored (forward compatibility). Transport-level multipart failures
/// surface as `BadRequest`.
async fn collect_image_params(multipart: &mut Multipart) -> Result<Option<ImageParams>> {
    let mut params = ImageParams::default();
    let mut saw_group = false;

    while let Some(field) = multipart.next_field().await.map_err(|e| Error::BadRequest {
        message: format!("Failed to parse multipart data: {e}"),
    })? {
        let field_name = field.name().unwrap_or("").to_string();
        if field_name.starts_with("image[") {
            saw_group = true;
        }

        let read_text = |label: &'static str| {
            move |e: axum::extract::multipart::MultipartError| Error::BadRequest {
                message: format!("Failed to read {label}: {e}"),
            }
        };

        match field_name.as_str() {
            "image[tileset_name]" => {
                params.tileset_name = field.text().await.map_err(read_text("image[tileset_name]"))?;
            }
            "image[description]" => {
                let value = field.text().await.map_err(read_text("image[description]"))?;
                params.description = (!value.is_empty()).then_some(value);
            }
            "image[camera_type]" => {
                let value = field.text().await.map_err(read_text("image[camera_type]"))?;
                params.camera_type = (!value.is_empty()).then_some(value);
            }
            "image[date_taken]" => {
                let value = field.text().await.map_err(read_text("image[date_taken]"))?;
                params.date_taken = (!value.is_empty()).then_some(value);
            }
            "image[image_file]" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().unwrap_or("application/octet-stream").to_string();
                let bytes = field.bytes().await.map_err(|e| Error::BadRequest {
                    message: format!("Failed to read image file: {e}"),
                })?;
                params.file = Some(UploadedFile {
                    filename,
                    content_type,
                    bytes,
                });
            }
            _ => {
                // Ignore unknown fields (forward compatibility)
            }
        }
    }

    Ok(saw_group.then_some(params))
}

#[utoipa::path(
    post,
    path = "/images",
    tag = "images",
    summary = "Upload image",
    description = "Upload an image for tileset generation. The file is forwarded to the \
                   configured tiling provider and the metadata is persisted.",
    request_body(
        content_type = "multipart/form-data",
        description = "Image metadata and file under the `image` field namespace"
    ),
    responses(
        (status = 303, description = "Image uploaded; redirect to the images listing with a success flash"),
        (status = 422, description = "Validation failed; creation form re-rendered", body = crate::api::models::images::ImageFormResponse),
        (status = 400, description = "Malformed multipart request"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_image(State(state): State<AppState>, mut multipart: Multipart) -> Result<CreateImageOutcome> {
    let Some(image) = collect_image_params(&mut multipart).await? else {
        tracing::debug!("Image creation request without an image field group");
        return Ok(CreateImageOutcome::render_form(
            Flash::error(MISSING_IMAGE_MESSAGE),
            ImageFormValues::default(),
        ));
    };

    // Delegate the file to the tiling provider before the persistence
    // decision is finalized. The handler does not branch on the result;
    // failures are logged and the request proceeds.
    if let Some(file) = &image.file {
        tracing::info!(
            tileset_name = %image.tileset_name,
            filename = %file.filename,
            size_bytes = file.bytes.len(),
            "Delegating upload to tiling provider"
        );
        if let Err(e) = state.uploader.upload_file(file, &image.tileset_name).await {
            tracing::warn!(tileset_name = %image.tileset_name, error = %e, "Tiling provider delegation failed");
        }
    }

    let values = ImageFormValues::from(&image);

    let record = match image.into_record() {
        Ok(record) => record,
        Err(messages) => {
            tracing::debug!(?messages, "Image record failed validation");
            return Ok(CreateImageOutcome::render_form(Flash::errors(messages), values));
        }
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Images::new(&mut conn);

    match repo.create(&record).await {
        Ok(created) => {
            tracing::info!(
                image_id = %abbrev_uuid(&created.id),
                tileset_name = %created.tileset_name,
                "Image record persisted"
            );
            Ok(CreateImageOutcome::redirect(
                IMAGES_PATH,
                Flash::success(format!(
                    "You have successfully uploaded an image with title of {}!",
                    created.tileset_name
                )),
            ))
        }
        Err(db_err) => {
            // Surface the record's own validation messages, never a generic
            // message when specific errors exist
            let messages = db_err.validation_messages();
            if messages.is_empty() {
                return Err(Error::Database(db_err));
            }
            tracing::debug!(?messages, "Image record failed to persist");
            Ok(CreateImageOutcome::render_form(Flash::errors(messages), values))
        }
    }
}

#[utoipa::path(
    get,
    path = "/images",
    tag = "images",
    summary = "List images",
    description = "Returns persisted image records, newest first. Consumes a pending one-time flash.",
    responses(
        (status = 200, description = "List of images", body = ImageListResponse),
        (status = 400, description = "Invalid query parameters"),
        (status = 500, description = "Internal server error")
    ),
    params(ListImagesQuery)
)]
pub async fn list_images(
    State(state): State<AppState>,
    Query(query): Query<ListImagesQuery>,
    headers: HeaderMap,
) -> Result<ImagesIndexResponse> {
    if query.order != "asc" && query.order != "desc" {
        return Err(Error::BadRequest {
            message: "Order must be 'asc' or 'desc'".to_string(),
        });
    }

    let limit = query.limit.unwrap_or(100).clamp(1, 1000);

    let mut filter = ImageFilter::new().limit(limit).order_desc(query.order == "desc");
    if let Some(camera_type) = query.camera_type {
        filter = filter.camera_type(camera_type);
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Images::new(&mut conn);
    let images = repo.list(&filter).await?;

    // One-time flash left by a create redirect: echo it and clear the cookie
    let flash = headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(Flash::from_cookie_header);
    let clear_flash = flash.is_some();

    Ok(ImagesIndexResponse {
        body: ImageListResponse {
            images: images.iter().map(ImageResponse::from).collect(),
            flash,
        },
        clear_flash,
    })
}

#[utoipa::path(
    get,
    path = "/images/{id}",
    tag = "images",
    summary = "Retrieve image",
    responses(
        (status = 200, description = "Image record", body = ImageResponse),
        (status = 404, description = "Image not found"),
        (status = 500, description = "Internal server error")
    ),
    params(("id" = String, Path, description = "The ID of the image to retrieve"))
)]
pub async fn get_image(State(state): State<AppState>, Path(id_str): Path<String>) -> Result<Json<ImageResponse>> {
    let id = id_str.parse::<ImageId>().map_err(|_| Error::BadRequest {
        message: "Invalid image ID format".to_string(),
    })?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Images::new(&mut conn);

    let image = repo.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Image".to_string(),
        id: id.to_string(),
    })?;

    Ok(Json(ImageResponse::from(&image)))
}

#[utoipa::path(
    get,
    path = "/images/new",
    tag = "images",
    summary = "Describe the creation form",
    description = "Returns the multipart contract for POST /images.",
    responses(
        (status = 200, description = "Form descriptor", body = NewImageFormInfo),
    )
)]
pub async fn new_image(State(state): State<AppState>) -> Json<NewImageFormInfo> {
    Json(NewImageFormInfo {
        fields: [
            "image[tileset_name]",
            "image[description]",
            "image[camera_type]",
            "image[date_taken]",
            "image[image_file]",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
        required: vec!["image[tileset_name]".to_string(), "image[image_file]".to_string()],
        date_format: "YYYY-MM-DD".to_string(),
        max_image_size: state.config.uploads.max_image_size,
    })
}
