//! REST API over the workflow controller
//!
//! Every mutating endpoint returns the fresh [`Snapshot`]; the browser UI
//! renders from it and never holds state of its own.

use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use studio_core::codec::{decode_data_url, export_file_name};
use studio_core::{
    GeneratedImageId, ImageFile, SettingKey, Settings, Snapshot, WorkflowController, WorkflowError,
};
use uuid::Uuid;

/// Uploads travel as base64 data URLs; allow for large product photos
const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    controller: Arc<WorkflowController>,
}

impl AppState {
    pub fn new(controller: Arc<WorkflowController>) -> Self {
        Self { controller }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/options", get(get_options))
        .route("/api/state", get(get_state))
        .route("/api/upload", post(upload_image))
        .route("/api/settings", post(update_setting))
        .route("/api/prompt", post(update_prompt))
        .route("/api/ideas/text", post(ideas_from_text))
        .route("/api/ideas/image", post(ideas_from_image))
        .route("/api/ideas/:index/use", post(use_idea))
        .route("/api/generate", post(generate))
        .route("/api/edit", post(edit))
        .route("/api/history/:id/select", post(select_history))
        .route("/api/clear", post(clear_display))
        .route("/api/export", get(export_current))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

/// Controller failure rendered as `{ "error": <user message> }`
pub struct ApiError(WorkflowError);

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        Self(err)
    }
}

fn status_for(err: &WorkflowError) -> StatusCode {
    match err {
        WorkflowError::Busy => StatusCode::CONFLICT,
        WorkflowError::UnknownHistoryEntry(_) | WorkflowError::UnknownIdea(_) => {
            StatusCode::NOT_FOUND
        }
        WorkflowError::Generation { .. } if err.is_no_image() => StatusCode::UNPROCESSABLE_ENTITY,
        WorkflowError::Generation { .. } => StatusCode::BAD_GATEWAY,
        WorkflowError::NoProductImage
        | WorkflowError::NoCurrentImage
        | WorkflowError::EmptyPrompt
        | WorkflowError::InvalidOption(_) => StatusCode::BAD_REQUEST,
    }
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error_response(status_for(&self.0), self.0.user_message())
    }
}

type ApiResult = Result<Json<Snapshot>, ApiError>;

#[derive(Deserialize)]
pub struct SettingRequest {
    key: String,
    value: String,
}

#[derive(Deserialize)]
pub struct PromptRequest {
    prompt: String,
}

#[derive(Deserialize)]
pub struct IdeasTextRequest {
    description: String,
}

/// Without a prompt the custom prompt and current settings are used
#[derive(Deserialize, Default)]
pub struct GenerateRequest {
    prompt: Option<String>,
    settings: Option<Settings>,
}

#[derive(Deserialize)]
pub struct EditRequest {
    prompt: String,
}

async fn health_check() -> &'static str {
    "OK"
}

async fn get_options() -> Json<serde_json::Value> {
    let options: serde_json::Map<String, serde_json::Value> = SettingKey::ALL
        .iter()
        .map(|key| (key.as_str().to_string(), json!(key.options())))
        .collect();
    Json(serde_json::Value::Object(options))
}

async fn get_state(State(state): State<AppState>) -> Json<Snapshot> {
    Json(state.controller.snapshot())
}

async fn upload_image(State(state): State<AppState>, Json(file): Json<ImageFile>) -> ApiResult {
    state.controller.upload(file)?;
    Ok(Json(state.controller.snapshot()))
}

async fn update_setting(
    State(state): State<AppState>,
    Json(request): Json<SettingRequest>,
) -> ApiResult {
    state
        .controller
        .set_named_setting(&request.key, &request.value)?;
    Ok(Json(state.controller.snapshot()))
}

async fn update_prompt(
    State(state): State<AppState>,
    Json(request): Json<PromptRequest>,
) -> Json<Snapshot> {
    state.controller.set_custom_prompt(request.prompt);
    Json(state.controller.snapshot())
}

async fn ideas_from_text(
    State(state): State<AppState>,
    Json(request): Json<IdeasTextRequest>,
) -> ApiResult {
    state
        .controller
        .request_ideas_from_text(&request.description)
        .await?;
    Ok(Json(state.controller.snapshot()))
}

async fn ideas_from_image(State(state): State<AppState>, Json(style): Json<ImageFile>) -> ApiResult {
    state.controller.request_ideas_from_image(style).await?;
    Ok(Json(state.controller.snapshot()))
}

async fn use_idea(State(state): State<AppState>, Path(index): Path<usize>) -> ApiResult {
    state.controller.use_idea(index)?;
    Ok(Json(state.controller.snapshot()))
}

async fn generate(
    State(state): State<AppState>,
    request: Option<Json<GenerateRequest>>,
) -> ApiResult {
    let request = request.map(|Json(request)| request).unwrap_or_default();
    match request.prompt {
        Some(prompt) => {
            let settings = request
                .settings
                .unwrap_or_else(|| state.controller.settings());
            state.controller.generate(&prompt, settings).await?
        }
        None => state.controller.generate_from_settings().await?,
    };
    Ok(Json(state.controller.snapshot()))
}

async fn edit(State(state): State<AppState>, Json(request): Json<EditRequest>) -> ApiResult {
    state.controller.edit(&request.prompt).await?;
    Ok(Json(state.controller.snapshot()))
}

async fn select_history(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult {
    state.controller.select_history(GeneratedImageId(id))?;
    Ok(Json(state.controller.snapshot()))
}

async fn clear_display(State(state): State<AppState>) -> ApiResult {
    state.controller.clear_display()?;
    Ok(Json(state.controller.snapshot()))
}

async fn export_current(State(state): State<AppState>) -> Response {
    let Some(image) = state.controller.current() else {
        return error_response(StatusCode::NOT_FOUND, "There is no image to save yet.".to_string());
    };

    match decode_data_url(&image.data_url) {
        Ok(decoded) => {
            let disposition = format!(
                "attachment; filename=\"{}\"",
                export_file_name(chrono::Utc::now(), &decoded.mime_type)
            );
            (
                [
                    (header::CONTENT_TYPE, decoded.mime_type),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                decoded.bytes,
            )
                .into_response()
        }
        Err(err) => {
            tracing::error!("Failed to decode image {}: {}", image.id, err);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "The image could not be saved.".to_string())
        }
    }
}
