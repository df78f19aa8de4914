//! Gemini integration for scene ideas, background replacement and edits
//!
//! Talks to the `generateContent` endpoint. Idea calls use a text model with
//! a JSON response schema; image calls use the image model and return the
//! first inline image part of the first candidate.

use crate::prompts;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use studio_core::{GenerationError, GenerativeClient, ImageFile, ImageOperation, Settings};
use tracing::{debug, info, warn};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image-preview";

/// Longest slice of an error body kept in [`GenerationError::Api`]
const MAX_ERROR_BODY: usize = 200;

/// Configuration for Gemini API client
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key for Google Gemini
    pub api_key: String,
    /// Scheme and host of the API
    pub base_url: String,
    /// Model used for scene ideas
    pub text_model: String,
    /// Model used for background generation and edits
    pub image_model: String,
    /// Request timeout; `None` waits for the provider indefinitely
    pub timeout_secs: Option<u64>,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            timeout_secs: None,
        }
    }

    /// Create config from environment variables
    ///
    /// `GEMINI_API_KEY` (or `API_KEY`) is required.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = get("GEMINI_API_KEY")
            .or_else(|| get("API_KEY"))
            .filter(|key| !key.trim().is_empty())
            .context("GEMINI_API_KEY environment variable not set")?;

        let mut config = Self::new(api_key);
        if let Some(base_url) = get("GEMINI_BASE_URL") {
            config.base_url = base_url;
        }
        if let Some(model) = get("OTTO_TEXT_MODEL") {
            config.text_model = model;
        }
        if let Some(model) = get("OTTO_IMAGE_MODEL") {
            config.image_model = model;
        }
        if let Some(secs) = get("OTTO_TIMEOUT_SECS") {
            let secs = secs
                .parse()
                .with_context(|| format!("OTTO_TIMEOUT_SECS is not a number: {}", secs))?;
            config.timeout_secs = Some(secs);
        }
        Ok(config)
    }
}

/// Gemini API client implementing [`GenerativeClient`]
pub struct GeminiClient {
    config: GeminiConfig,
    client: reqwest::Client,
}

impl GeminiClient {
    /// Create a new Gemini client
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().context("Failed to create HTTP client")?;

        Ok(Self { config, client })
    }

    /// Create client from environment variables
    pub fn from_env() -> Result<Self> {
        let config = GeminiConfig::from_env()?;
        Self::new(config)
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            model
        )
    }

    async fn generate_content(
        &self,
        model: &str,
        request: &GeminiRequest,
    ) -> Result<GeminiResponse, GenerationError> {
        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.config.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Api {
                status: status.as_u16(),
                message: body.chars().take(MAX_ERROR_BODY).collect(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))
    }

    async fn request_ideas(&self, request: GeminiRequest) -> Result<Vec<String>, GenerationError> {
        let response = self
            .generate_content(&self.config.text_model, &request)
            .await?;
        parse_ideas(&response.text())
    }

    async fn request_image(
        &self,
        request: GeminiRequest,
        operation: ImageOperation,
    ) -> Result<ImageFile, GenerationError> {
        let response = self
            .generate_content(&self.config.image_model, &request)
            .await?;

        match response.first_image() {
            Some(inline) => {
                let mime = if inline.mime_type.is_empty() {
                    studio_core::codec::DEFAULT_IMAGE_MIME
                } else {
                    inline.mime_type.as_str()
                };
                debug!("Gemini returned {} image ({} base64 chars)", mime, inline.data.len());
                Ok(ImageFile::from_base64(mime, &inline.data))
            }
            None => {
                if let Some(text) = response.text_opt() {
                    warn!("Gemini returned text instead of an image: {}", text);
                }
                Err(GenerationError::NoImageProduced(operation))
            }
        }
    }
}

#[async_trait]
impl GenerativeClient for GeminiClient {
    async fn ideas_from_text(&self, description: &str) -> Result<Vec<String>, GenerationError> {
        info!("Requesting scene ideas from text ({} chars)", description.len());
        self.request_ideas(text_ideas_request(description)).await
    }

    async fn ideas_from_image(&self, style: &ImageFile) -> Result<Vec<String>, GenerationError> {
        info!("Requesting scene ideas from {} style image", style.mime_type);
        self.request_ideas(image_ideas_request(style)).await
    }

    async fn generate_background(
        &self,
        product: &ImageFile,
        prompt: &str,
        settings: &Settings,
    ) -> Result<ImageFile, GenerationError> {
        info!("Gemini background generation: prompt={} chars", prompt.len());
        let request = image_request(product, prompts::background_directive(prompt, settings));
        self.request_image(request, ImageOperation::Generate).await
    }

    async fn edit_image(
        &self,
        image: &ImageFile,
        edit_prompt: &str,
    ) -> Result<ImageFile, GenerationError> {
        info!("Gemini image edit: prompt={} chars", edit_prompt.len());
        let request = image_request(image, prompts::edit_directive(edit_prompt));
        self.request_image(request, ImageOperation::Edit).await
    }
}

/// Inline payload with any data-URI prefix removed
fn inline_part(image: &ImageFile) -> GeminiPart {
    GeminiPart::InlineData {
        inline_data: InlineData {
            mime_type: image.mime_type.clone(),
            data: image.base64_payload().to_string(),
        },
    }
}

fn ideas_config(item_description: &str) -> GenerationConfig {
    GenerationConfig {
        response_mime_type: Some("application/json".to_string()),
        response_schema: Some(prompts::ideas_schema(item_description)),
        ..GenerationConfig::default()
    }
}

fn text_ideas_request(description: &str) -> GeminiRequest {
    GeminiRequest {
        contents: vec![GeminiContent {
            parts: vec![GeminiPart::Text {
                text: prompts::text_ideas_prompt(description),
            }],
        }],
        generation_config: Some(ideas_config("A creative scene description.")),
    }
}

fn image_ideas_request(style: &ImageFile) -> GeminiRequest {
    GeminiRequest {
        contents: vec![GeminiContent {
            parts: vec![
                inline_part(style),
                GeminiPart::Text {
                    text: prompts::image_ideas_prompt(),
                },
            ],
        }],
        generation_config: Some(ideas_config(
            "A creative scene description inspired by the image.",
        )),
    }
}

fn image_request(image: &ImageFile, directive: String) -> GeminiRequest {
    GeminiRequest {
        contents: vec![GeminiContent {
            parts: vec![inline_part(image), GeminiPart::Text { text: directive }],
        }],
        generation_config: Some(GenerationConfig {
            response_modalities: Some(vec!["IMAGE".to_string(), "TEXT".to_string()]),
            ..GenerationConfig::default()
        }),
    }
}

/// Parse the JSON idea list
///
/// Unparseable JSON or non-string items are errors; valid JSON that is not
/// an array yields no ideas.
fn parse_ideas(text: &str) -> Result<Vec<String>, GenerationError> {
    let value: Value = serde_json::from_str(text.trim()).map_err(|e| {
        GenerationError::MalformedResponse(format!("scene ideas are not valid JSON: {}", e))
    })?;

    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(idea) => Ok(idea),
                other => Err(GenerationError::MalformedResponse(format!(
                    "expected a scene description string, got {}",
                    other
                ))),
            })
            .collect(),
        other => {
            warn!("Scene ideas response was not an array: {}", other);
            Ok(Vec::new())
        }
    }
}

/// Gemini API request structure
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: String,
    data: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
}

/// Gemini API response structure
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponsePart {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

impl GeminiResponse {
    /// Parts of the first candidate
    fn parts(&self) -> &[GeminiResponsePart] {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| content.parts.as_slice())
            .unwrap_or_default()
    }

    fn text(&self) -> String {
        self.parts()
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect()
    }

    fn text_opt(&self) -> Option<String> {
        let text = self.text();
        (!text.trim().is_empty()).then_some(text)
    }

    fn first_image(&self) -> Option<&InlineData> {
        self.parts().iter().find_map(|part| part.inline_data.as_ref())
    }
}
