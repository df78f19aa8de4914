//! Core types for the Otto Studio workflow
//!
//! This module defines the session data model shared by the controller,
//! the provider bridge and the presentation layers.

use crate::codec;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a generated image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GeneratedImageId(pub Uuid);

impl GeneratedImageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GeneratedImageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GeneratedImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// An image payload as it travels between the uploader, the provider and the UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageFile {
    /// Base64 payload, possibly carrying a `data:<mime>;base64,` prefix
    pub data_url: String,
    /// MIME type reported for the payload (e.g. `image/png`)
    pub mime_type: String,
}

impl ImageFile {
    pub fn new(data_url: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            data_url: data_url.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Wrap a bare base64 payload into a data URL
    pub fn from_base64(mime_type: &str, payload: &str) -> Self {
        Self::new(format!("data:{};base64,{}", mime_type, payload), mime_type)
    }

    /// Only `image/*` payloads are accepted by the uploader
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    /// The base64 payload with any data-URI prefix removed
    pub fn base64_payload(&self) -> &str {
        codec::strip_data_url_prefix(&self.data_url)
    }
}

macro_rules! setting_options {
    ($(#[$meta:meta])* $name:ident, default = $default:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            /// Every accepted option, in display order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }

            /// Match a label against the option set, ignoring ASCII case
            pub fn from_label(label: &str) -> Option<Self> {
                let label = label.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|option| option.as_str().eq_ignore_ascii_case(label))
            }

            pub fn labels() -> Vec<&'static str> {
                Self::ALL.iter().map(|option| option.as_str()).collect()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

setting_options! {
    /// Lighting applied to the generated background
    Lighting, default = Soft {
        Studio => "Studio",
        Soft => "Soft",
        Natural => "Natural",
        GoldenHour => "Golden Hour",
        Dramatic => "Dramatic",
        Backlit => "Backlit",
        Neon => "Neon",
    }
}

setting_options! {
    /// Final canvas aspect ratio
    AspectRatio, default = Square {
        Square => "1:1",
        Widescreen => "16:9",
        Standard => "4:3",
        Classic => "3:2",
        Vertical => "9:16",
        Portrait => "3:4",
        Social => "4:5",
        Tall => "2:3",
    }
}

setting_options! {
    /// Camera perspective of the scene
    CameraPerspective, default = EyeLevel {
        EyeLevel => "Eye-level",
        HighAngle => "High Angle",
        LowAngle => "Low Angle",
        TopDown => "Top-down",
        CloseUp => "Close-up",
        ThreeQuarter => "Three-quarter",
    }
}

/// Full set of enumerated generation settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub lighting: Lighting,
    pub aspect_ratio: AspectRatio,
    pub camera_perspective: CameraPerspective,
}

/// A finished generation or edit result
///
/// Immutable once created; `settings` is the snapshot that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    pub id: GeneratedImageId,
    pub data_url: String,
    pub prompt: String,
    pub settings: Settings,
}

impl GeneratedImage {
    pub fn new(image: ImageFile, prompt: impl Into<String>, settings: Settings) -> Self {
        Self {
            id: GeneratedImageId::new(),
            data_url: image.data_url,
            prompt: prompt.into(),
            settings,
        }
    }

    /// Recover the payload and MIME type for a follow-up provider call
    pub fn image_file(&self) -> ImageFile {
        let mime = codec::data_url_mime(&self.data_url).unwrap_or(codec::DEFAULT_IMAGE_MIME);
        ImageFile::new(self.data_url.clone(), mime)
    }
}

/// What the result pane shows
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "image", rename_all = "snake_case")]
pub enum DisplayState {
    #[default]
    NoImage,
    Loading,
    Ready(GeneratedImage),
}

impl DisplayState {
    pub fn current(&self) -> Option<&GeneratedImage> {
        match self {
            DisplayState::Ready(image) => Some(image),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, DisplayState::Loading)
    }
}

/// Workflow phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No product image uploaded yet
    Idle,
    /// Product image present, nothing in flight
    Ready,
    GeneratingIdeasText,
    GeneratingIdeasImage,
    /// Background generation in flight
    Generating,
    /// Edit of the current result in flight
    Editing,
}

impl Phase {
    pub fn is_busy(&self) -> bool {
        !matches!(self, Phase::Idle | Phase::Ready)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_image_id_creation() {
        let id1 = GeneratedImageId::new();
        let id2 = GeneratedImageId::new();
        assert_ne!(id1, id2);
        assert_eq!(serde_json::to_string(&id1).unwrap(), format!("\"{}\"", id1));
    }

    #[test]
    fn test_settings_serialize_as_labels() {
        let settings = Settings {
            lighting: Lighting::GoldenHour,
            aspect_ratio: AspectRatio::Widescreen,
            camera_perspective: CameraPerspective::EyeLevel,
        };

        let json = serde_json::to_value(settings).unwrap();
        assert_eq!(json["lighting"], "Golden Hour");
        assert_eq!(json["aspectRatio"], "16:9");
        assert_eq!(json["cameraPerspective"], "Eye-level");
    }

    #[test]
    fn test_option_labels_case_insensitive() {
        assert_eq!(Lighting::from_label("golden hour"), Some(Lighting::GoldenHour));
        assert_eq!(AspectRatio::from_label(" 4:5 "), Some(AspectRatio::Social));
        assert_eq!(CameraPerspective::from_label("Fisheye"), None);
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.lighting.as_str(), "Soft");
        assert_eq!(settings.aspect_ratio.as_str(), "1:1");
        assert_eq!(settings.camera_perspective.as_str(), "Eye-level");
    }

    #[test]
    fn test_display_state_serialization() {
        let json = serde_json::to_value(DisplayState::Loading).unwrap();
        assert_eq!(json["state"], "loading");

        let image = GeneratedImage::new(
            ImageFile::from_base64("image/png", "AAAA"),
            "marble pedestal",
            Settings::default(),
        );
        let json = serde_json::to_value(DisplayState::Ready(image.clone())).unwrap();
        assert_eq!(json["state"], "ready");
        assert_eq!(json["image"]["prompt"], "marble pedestal");

        let back: DisplayState = serde_json::from_value(json).unwrap();
        assert_eq!(back.current(), Some(&image));
    }

    #[test]
    fn test_generated_image_recovers_mime() {
        let image = GeneratedImage::new(
            ImageFile::from_base64("image/webp", "UklGR"),
            "p",
            Settings::default(),
        );
        let file = image.image_file();
        assert_eq!(file.mime_type, "image/webp");
        assert_eq!(file.base64_payload(), "UklGR");

        let bare = GeneratedImage::new(ImageFile::new("UklGR", "image/webp"), "p", Settings::default());
        assert_eq!(bare.image_file().mime_type, "image/png");
    }

    #[test]
    fn test_phase_busy() {
        assert!(!Phase::Idle.is_busy());
        assert!(!Phase::Ready.is_busy());
        assert!(Phase::Generating.is_busy());
        assert!(Phase::GeneratingIdeasImage.is_busy());
    }
}
