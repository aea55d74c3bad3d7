//! OpenAPI documentation configuration
//!
//! Generates the OpenAPI 3 document for the Geotag Map API.

use utoipa::OpenApi;

use crate::handlers::{HealthResponse, ImageRecordSchema, ImagesResponse, ReadyResponse};

/// Geotag Map API - OpenAPI Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Geotag Map API",
        version = "0.1.0",
        description = r#"
## Geotagged images from Google Drive

Lists the images of a Drive folder that carry GPS coordinates and serves
small thumbnails for them, ready to be placed on a map.

### How It Works

1. **List** a folder via `GET /api/images?folder_id=...`
2. Each result carries `lat`, `lon` and, when recorded, `altitude`
3. Fetch a preview via `GET /api/thumbnail/{file_id}`
4. Thumbnails come from Drive's pre-rendered preview when available, otherwise
   the original is downloaded and shrunk to at most 400 px per side
"#,
        license(name = "MIT OR Apache-2.0")
    ),
    servers(
        (url = "http://localhost:5050", description = "Local development server")
    ),
    tags(
        (name = "Images", description = "Folder listing and thumbnails"),
        (name = "Health", description = "Service health and readiness endpoints")
    ),
    paths(
        crate::handlers::health::health,
        crate::handlers::health::ready,
        crate::handlers::images::images_handler,
        crate::handlers::thumbnail::thumbnail_handler,
    ),
    components(
        schemas(
            HealthResponse,
            ReadyResponse,
            ImagesResponse,
            ImageRecordSchema,
        )
    )
)]
pub struct ApiDoc;
