//! LLM Bridge for Gemini integration
//!
//! Implements [`studio_core::GenerativeClient`] against Google's Gemini
//! `generateContent` API: scene ideas from text or a style image,
//! background replacement, and follow-up edits.

pub mod gemini;
pub mod prompts;

pub use gemini::{GeminiClient, GeminiConfig};
