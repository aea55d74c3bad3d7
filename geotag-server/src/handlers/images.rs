//! Folder listing handler

use std::time::Instant;

use axum::{
    extract::{Query, State},
    Json,
};
use geotag_core::ImageRecord;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::ApiError;
use crate::handlers::AppState;

/// Query parameters for listing a folder
#[derive(Debug, Deserialize, IntoParams)]
pub struct ImagesQuery {
    /// Drive folder id
    pub folder_id: Option<String>,
}

/// Geotagged images found in a folder
#[derive(Serialize, ToSchema)]
pub struct ImagesResponse {
    #[schema(value_type = Vec<ImageRecordSchema>)]
    pub images: Vec<ImageRecord>,
    pub count: usize,
}

/// OpenAPI shape of a serialized [`ImageRecord`].
#[derive(Serialize, ToSchema)]
#[schema(as = ImageRecord)]
#[serde(rename_all = "camelCase")]
#[allow(dead_code)]
pub struct ImageRecordSchema {
    pub id: String,
    pub name: String,
    pub thumbnail_link: Option<String>,
    pub lat: f64,
    pub lon: f64,
    /// Metres; `null` when the photo carries no altitude
    pub altitude: Option<f64>,
}

/// GET /api/images - List the geotagged images of a folder
///
/// Links found during the listing are cached so that thumbnail requests for
/// these images skip the metadata lookup.
#[utoipa::path(
    get,
    path = "/api/images",
    tag = "Images",
    params(ImagesQuery),
    responses(
        (status = 200, description = "Geotagged images in the folder", body = ImagesResponse),
        (status = 400, description = "Missing folder_id"),
        (status = 500, description = "Listing exceeded the configured page limit"),
        (status = 502, description = "Drive listing failed"),
        (status = 503, description = "Drive credentials unavailable")
    )
)]
pub async fn images_handler(
    State(state): State<AppState>,
    Query(query): Query<ImagesQuery>,
) -> Result<Json<ImagesResponse>, ApiError> {
    let folder_id = query
        .folder_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::bad_request("folder_id is required"))?;

    let start = Instant::now();
    let images = state.discovery.list_geotagged_images(folder_id).await?;
    let cached = state.cache.record_images(&images);

    tracing::info!(
        folder_id = %folder_id,
        count = images.len(),
        cached_links = cached,
        latency_ms = start.elapsed().as_millis() as u64,
        "Listed geotagged images"
    );

    let count = images.len();
    Ok(Json(ImagesResponse { images, count }))
}
