//! OpenAPI documentation for the images API.

use crate::api;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tileshed API",
        description = "Image upload service: files are forwarded to a map tiling provider \
                       and their metadata is persisted as image records."
    ),
    paths(
        api::handlers::images::create_image,
        api::handlers::images::list_images,
        api::handlers::images::get_image,
        api::handlers::images::new_image,
    ),
    components(schemas(
        api::models::images::ImageFormValues,
        api::models::images::ImageFormResponse,
        api::models::images::ImageResponse,
        api::models::images::ImageListResponse,
        api::models::images::NewImageFormInfo,
        crate::flash::Flash,
    )),
    tags(
        (name = "images", description = "Image upload and listing")
    )
)]
pub struct ApiDoc;
