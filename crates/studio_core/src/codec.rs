//! Image codec
//!
//! Turns user-selected files into base64 [`ImageFile`] payloads, unpacks
//! data URLs for export, and names exported files.

use crate::error::CodecError;
use crate::types::ImageFile;
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Utc};
use image::ImageFormat;
use std::path::Path;
use tracing::debug;

/// MIME type assumed when a payload carries none
pub const DEFAULT_IMAGE_MIME: &str = "image/png";

/// Prefix of exported file names
pub const EXPORT_PREFIX: &str = "otto-studio";

/// Remove a `data:<mime>;base64,` prefix if present
pub fn strip_data_url_prefix(data: &str) -> &str {
    if data.starts_with("data:") {
        if let Some((_, payload)) = data.split_once(',') {
            return payload;
        }
    }
    data
}

/// MIME type declared by a data URL, if any
pub fn data_url_mime(data_url: &str) -> Option<&str> {
    let header = data_url.strip_prefix("data:")?.split_once(',')?.0;
    let mime = header.split(';').next()?;
    (!mime.is_empty()).then_some(mime)
}

/// Decoded bytes of an image payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Decode a data URL (or bare base64 payload) into raw bytes
pub fn decode_data_url(data_url: &str) -> Result<DecodedImage, CodecError> {
    let mime_type = data_url_mime(data_url)
        .unwrap_or(DEFAULT_IMAGE_MIME)
        .to_string();
    let bytes = general_purpose::STANDARD.decode(strip_data_url_prefix(data_url).trim())?;
    Ok(DecodedImage { mime_type, bytes })
}

/// Encode raw file bytes as an [`ImageFile`]
///
/// Returns `None` when the bytes are not a recognised raster image.
pub fn encode_image_bytes(bytes: &[u8]) -> Option<ImageFile> {
    let format = image::guess_format(bytes).ok()?;
    let payload = general_purpose::STANDARD.encode(bytes);
    Some(ImageFile::from_base64(format.to_mime_type(), &payload))
}

/// Load a file from disk as an [`ImageFile`]
///
/// Non-image files are ignored: the result is `Ok(None)`, not an error.
pub fn load_image_file(path: &Path) -> Result<Option<ImageFile>, CodecError> {
    let bytes = std::fs::read(path).map_err(|source| CodecError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let file = encode_image_bytes(&bytes);
    if file.is_none() {
        debug!("Ignoring non-image file {}", path.display());
    }
    Ok(file)
}

/// File extension matching a MIME type, falling back to `png`
pub fn extension_for_mime(mime_type: &str) -> &'static str {
    ImageFormat::from_mime_type(mime_type)
        .and_then(|format| format.extensions_str().first().copied())
        .unwrap_or("png")
}

/// Timestamp-derived name for an exported image
pub fn export_file_name(now: DateTime<Utc>, mime_type: &str) -> String {
    format!(
        "{}-{}.{}",
        EXPORT_PREFIX,
        now.timestamp_millis(),
        extension_for_mime(mime_type)
    )
}
