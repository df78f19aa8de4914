//! Calls to the Otto Studio server

use crate::types::{ErrorBody, ImageFileView, OptionsView, SnapshotView};
use gloo_net::http::{Request, Response};
use serde::de::DeserializeOwned;
use serde_json::json;

/// Error text shown when the server is unreachable or replies oddly
const CONNECTION_ERROR: &str = "Could not reach the Otto Studio server.";

pub const EXPORT_URL: &str = "/api/export";

pub type ApiResult<T> = Result<T, String>;

async fn read<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    if response.ok() {
        return response
            .json::<T>()
            .await
            .map_err(|_| CONNECTION_ERROR.to_string());
    }
    match response.json::<ErrorBody>().await {
        Ok(body) => Err(body.error),
        Err(_) => Err(format!("Request failed ({})", response.status())),
    }
}

async fn get<T: DeserializeOwned>(url: &str) -> ApiResult<T> {
    let response = Request::get(url)
        .send()
        .await
        .map_err(|_| CONNECTION_ERROR.to_string())?;
    read(response).await
}

async fn post(url: &str, body: Option<serde_json::Value>) -> ApiResult<SnapshotView> {
    let builder = Request::post(url);
    let sent = match body {
        Some(body) => builder
            .json(&body)
            .map_err(|_| CONNECTION_ERROR.to_string())?
            .send()
            .await,
        None => builder.send().await,
    };
    read(sent.map_err(|_| CONNECTION_ERROR.to_string())?).await
}

pub async fn fetch_state() -> ApiResult<SnapshotView> {
    get("/api/state").await
}

pub async fn fetch_options() -> ApiResult<OptionsView> {
    get("/api/options").await
}

pub async fn upload(file: ImageFileView) -> ApiResult<SnapshotView> {
    post("/api/upload", Some(json!(file))).await
}

pub async fn set_setting(key: &str, value: String) -> ApiResult<SnapshotView> {
    post("/api/settings", Some(json!({ "key": key, "value": value }))).await
}

pub async fn set_prompt(prompt: String) -> ApiResult<SnapshotView> {
    post("/api/prompt", Some(json!({ "prompt": prompt }))).await
}

pub async fn ideas_from_text(description: String) -> ApiResult<SnapshotView> {
    post("/api/ideas/text", Some(json!({ "description": description }))).await
}

pub async fn ideas_from_image(style: ImageFileView) -> ApiResult<SnapshotView> {
    post("/api/ideas/image", Some(json!(style))).await
}

pub async fn use_idea(index: usize) -> ApiResult<SnapshotView> {
    post(&format!("/api/ideas/{}/use", index), None).await
}

pub async fn generate() -> ApiResult<SnapshotView> {
    post("/api/generate", None).await
}

pub async fn edit(prompt: String) -> ApiResult<SnapshotView> {
    post("/api/edit", Some(json!({ "prompt": prompt }))).await
}

pub async fn select_history(id: String) -> ApiResult<SnapshotView> {
    post(&format!("/api/history/{}/select", id), None).await
}

pub async fn clear_display() -> ApiResult<SnapshotView> {
    post("/api/clear", None).await
}
