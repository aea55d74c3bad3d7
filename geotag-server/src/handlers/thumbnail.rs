//! Thumbnail handler

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;
use crate::handlers::AppState;

/// GET /api/thumbnail/{file_id} - Thumbnail bytes for one image
///
/// Served from Drive's pre-rendered thumbnail when possible, otherwise from a
/// shrunken copy of the original.
#[utoipa::path(
    get,
    path = "/api/thumbnail/{file_id}",
    tag = "Images",
    params(
        ("file_id" = String, Path, description = "Drive file id")
    ),
    responses(
        (
            status = 200,
            description = "Thumbnail image",
            body = Vec<u8>,
            content_type = "image/jpeg"
        ),
        (status = 500, description = "Thumbnail could not be produced"),
        (status = 502, description = "Drive download failed"),
        (status = 503, description = "Drive credentials unavailable")
    )
)]
pub async fn thumbnail_handler(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<Response, ApiError> {
    let thumbnail = state.resolver.resolve_thumbnail(&file_id).await?;

    Ok((
        [
            (header::CONTENT_TYPE, thumbnail.content_type),
            (header::CACHE_CONTROL, state.thumbnail_cache_control.clone()),
        ],
        thumbnail.bytes,
    )
        .into_response())
}
