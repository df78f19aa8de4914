//! Browser-side views of the server's JSON
//!
//! Field names follow the server's camelCase wire format.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Ready,
    GeneratingIdeasText,
    GeneratingIdeasImage,
    Generating,
    Editing,
}

impl Phase {
    pub fn is_busy(&self) -> bool {
        !matches!(self, Phase::Idle | Phase::Ready)
    }
}

#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsView {
    pub lighting: String,
    pub aspect_ratio: String,
    pub camera_perspective: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageFileView {
    pub data_url: String,
    pub mime_type: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImageView {
    pub id: String,
    pub data_url: String,
    pub prompt: String,
    pub settings: SettingsView,
}

#[derive(Clone, Debug, PartialEq, Default, Deserialize)]
#[serde(tag = "state", content = "image", rename_all = "snake_case")]
pub enum DisplayView {
    #[default]
    NoImage,
    Loading,
    Ready(GeneratedImageView),
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotView {
    pub phase: Phase,
    pub display: DisplayView,
    pub settings: SettingsView,
    pub custom_prompt: String,
    pub product: Option<ImageFileView>,
    pub ideas: Vec<String>,
    pub history: Vec<GeneratedImageView>,
    pub error: Option<String>,
}

impl SnapshotView {
    pub fn current(&self) -> Option<&GeneratedImageView> {
        match &self.display {
            DisplayView::Ready(image) => Some(image),
            _ => None,
        }
    }

    /// Loader text while the server reports a generate or edit in flight
    pub fn loading_message(&self) -> Option<&'static str> {
        if self.display != DisplayView::Loading {
            return None;
        }
        match self.phase {
            Phase::Editing => Pending::Edit.display_message(),
            _ => Pending::Generate.display_message(),
        }
    }
}

/// Accepted labels per setting key
#[derive(Clone, Debug, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionsView {
    pub lighting: Vec<String>,
    pub aspect_ratio: Vec<String>,
    pub camera_perspective: Vec<String>,
}

/// Request this browser is waiting on
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pending {
    IdeasFromText,
    IdeasFromImage,
    Generate,
    Edit,
    Other,
}

impl Pending {
    /// Message for the result pane, if this request replaces its content
    pub fn display_message(&self) -> Option<&'static str> {
        match self {
            Pending::Generate => Some("Generating..."),
            Pending::Edit => Some("Applying Edit..."),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
