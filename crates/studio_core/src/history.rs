//! Session history of generated images

use crate::types::{GeneratedImage, GeneratedImageId};

/// Append-only log of results, oldest first
///
/// Unbounded: entries live for the whole session.
#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    entries: Vec<GeneratedImage>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, image: GeneratedImage) {
        self.entries.push(image);
    }

    pub fn all(&self) -> &[GeneratedImage] {
        &self.entries
    }

    pub fn get(&self, id: GeneratedImageId) -> Option<&GeneratedImage> {
        self.entries.iter().find(|entry| entry.id == id)
    }
}
