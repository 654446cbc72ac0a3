//! API Routes
//!
//! Route handlers organized by functionality.

pub mod activity;
pub mod coach;
pub mod health;
pub mod insights;
pub mod meals;
pub mod optimizer;
pub mod profile;
pub mod progress;
pub mod recovery;
pub mod stats;

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::api::error::{ApiError, ApiResult};

const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// Decode a base64 image body, accepting a `data:<mime>;base64,` prefix.
///
/// The prefix's MIME type wins over `mime_type`; with neither, JPEG is assumed.
pub(crate) fn decode_image(image: &str, mime_type: Option<&str>) -> ApiResult<(Vec<u8>, String)> {
    let image = image.trim();
    let (prefix_mime, payload) = match image.strip_prefix("data:") {
        Some(rest) => {
            let (header, payload) = rest.split_once(',').ok_or_else(|| {
                ApiError::Validation("malformed data URL: missing ','".to_string())
            })?;
            let mime = header.strip_suffix(";base64").ok_or_else(|| {
                ApiError::Validation("data URL must be base64-encoded".to_string())
            })?;
            (Some(mime), payload)
        }
        None => (None, image),
    };

    if payload.is_empty() {
        return Err(ApiError::Validation("image cannot be empty".to_string()));
    }

    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| ApiError::Validation(format!("image is not valid base64: {}", e)))?;

    let mime = prefix_mime
        .filter(|m| !m.is_empty())
        .or(mime_type)
        .unwrap_or(DEFAULT_IMAGE_MIME)
        .to_string();

    Ok((bytes, mime))
}
