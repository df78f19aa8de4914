//! Core of Otto Studio
//!
//! Session data model, settings and history, the image codec, the
//! generative-provider interface and the workflow controller that drives
//! background generation, scene ideas and iterative edits.

pub mod client;
pub mod codec;
pub mod error;
pub mod history;
pub mod settings;
pub mod types;
pub mod workflow;

pub use client::{GenerativeClient, IDEA_COUNT};
pub use error::{CodecError, GenerationError, ImageOperation, SettingsError};
pub use history::HistoryStore;
pub use settings::{SettingKey, SettingsModel};
pub use types::*;
pub use workflow::{Request, Snapshot, WorkflowController, WorkflowError};
