//! Settings model
//!
//! Holds the enumerated generation choices and the free-form scene prompt.

use crate::error::SettingsError;
use crate::types::{AspectRatio, CameraPerspective, Lighting, Settings};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Which enumerated setting a change targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SettingKey {
    Lighting,
    AspectRatio,
    CameraPerspective,
}

impl SettingKey {
    pub const ALL: [SettingKey; 3] = [
        SettingKey::Lighting,
        SettingKey::AspectRatio,
        SettingKey::CameraPerspective,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::Lighting => "lighting",
            SettingKey::AspectRatio => "aspectRatio",
            SettingKey::CameraPerspective => "cameraPerspective",
        }
    }

    /// Accepted labels for this key
    pub fn options(&self) -> Vec<&'static str> {
        match self {
            SettingKey::Lighting => Lighting::labels(),
            SettingKey::AspectRatio => AspectRatio::labels(),
            SettingKey::CameraPerspective => CameraPerspective::labels(),
        }
    }
}

impl FromStr for SettingKey {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lighting" => Ok(SettingKey::Lighting),
            "aspectRatio" | "aspect_ratio" => Ok(SettingKey::AspectRatio),
            "cameraPerspective" | "camera_perspective" => Ok(SettingKey::CameraPerspective),
            other => Err(SettingsError::InvalidOption {
                key: "setting".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// Current settings plus the custom scene prompt
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsModel {
    settings: Settings,
    custom_prompt: String,
}

impl SettingsModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one enumerated option; an out-of-set value leaves the model untouched
    pub fn set(&mut self, key: SettingKey, value: &str) -> Result<(), SettingsError> {
        let invalid = || SettingsError::InvalidOption {
            key: key.as_str().to_string(),
            value: value.to_string(),
        };

        match key {
            SettingKey::Lighting => {
                self.settings.lighting = Lighting::from_label(value).ok_or_else(invalid)?;
            }
            SettingKey::AspectRatio => {
                self.settings.aspect_ratio = AspectRatio::from_label(value).ok_or_else(invalid)?;
            }
            SettingKey::CameraPerspective => {
                self.settings.camera_perspective =
                    CameraPerspective::from_label(value).ok_or_else(invalid)?;
            }
        }
        Ok(())
    }

    /// Same as [`SettingsModel::set`] with the key given by name
    pub fn set_named(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.set(key.parse()?, value)
    }

    pub fn get(&self) -> Settings {
        self.settings
    }

    /// Replace every enumerated option at once (history reuse)
    pub fn adopt(&mut self, settings: Settings) {
        self.settings = settings;
    }

    pub fn custom_prompt(&self) -> &str {
        &self.custom_prompt
    }

    pub fn set_custom_prompt(&mut self, prompt: impl Into<String>) {
        self.custom_prompt = prompt.into();
    }
}
