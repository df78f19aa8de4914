//! Generative provider interface
//!
//! The workflow talks to the image model only through this trait, so the
//! Gemini bridge can be swapped for a fake in tests.

use crate::error::GenerationError;
use crate::types::{ImageFile, Settings};
use async_trait::async_trait;

/// Number of scene ideas requested per call
pub const IDEA_COUNT: usize = 5;

/// Remote scene-idea and image operations
///
/// Every call either returns a complete result or a single [`GenerationError`].
#[async_trait]
pub trait GenerativeClient: Send + Sync {
    /// Scene ideas from a free-text description
    async fn ideas_from_text(&self, description: &str) -> Result<Vec<String>, GenerationError>;

    /// Scene ideas inspired by a style reference image
    async fn ideas_from_image(&self, style: &ImageFile) -> Result<Vec<String>, GenerationError>;

    /// Replace the background around the product
    async fn generate_background(
        &self,
        product: &ImageFile,
        prompt: &str,
        settings: &Settings,
    ) -> Result<ImageFile, GenerationError>;

    /// Apply a natural-language edit to an existing result
    async fn edit_image(
        &self,
        image: &ImageFile,
        edit_prompt: &str,
    ) -> Result<ImageFile, GenerationError>;
}
