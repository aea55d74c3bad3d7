//! HTTP request handlers
//!
//! This module contains all the request handlers for the API endpoints.

pub mod health;
pub mod images;
pub mod thumbnail;

pub use crate::state::AppState;
pub use health::{health, ready, HealthResponse, ReadyResponse};
pub use images::{images_handler, ImageRecordSchema, ImagesQuery, ImagesResponse};
pub use thumbnail::thumbnail_handler;
