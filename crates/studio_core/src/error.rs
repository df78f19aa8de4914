//! Error types shared across the workspace

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Rejection of a settings update
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("'{value}' is not a valid option for {key}")]
    InvalidOption { key: String, value: String },
}

/// Failures while reading or decoding image payloads
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("image data is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Which image-producing call came back without an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageOperation {
    Generate,
    Edit,
}

impl ImageOperation {
    pub fn no_image_message(&self) -> &'static str {
        match self {
            ImageOperation::Generate => concat!(
                "The AI was unable to generate an image based on your prompt. ",
                "This can sometimes happen with complex requests. ",
                "Please try modifying your prompt."
            ),
            ImageOperation::Edit => {
                "The AI was unable to apply the edit. Please try a different edit instruction."
            }
        }
    }
}

/// Any failure of a provider round trip
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("provider request failed: {0}")]
    Transport(String),

    #[error("provider error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    /// The provider answered successfully but returned no image part
    #[error("{}", .0.no_image_message())]
    NoImageProduced(ImageOperation),
}

impl GenerationError {
    pub fn is_no_image(&self) -> bool {
        matches!(self, GenerationError::NoImageProduced(_))
    }
}
