//! Workflow controller
//!
//! Owns the session state (product image, settings, display, ideas and
//! history) and sequences provider calls. At most one provider request is
//! in flight; anything issued meanwhile is rejected with
//! [`WorkflowError::Busy`] and leaves the state untouched.
//!
//! State sits behind a `std::sync::Mutex` that is only held between awaits,
//! so the controller can be shared across tasks (the HTTP server does).

use crate::client::GenerativeClient;
use crate::error::{GenerationError, SettingsError};
use crate::history::HistoryStore;
use crate::settings::{SettingKey, SettingsModel};
use crate::types::{DisplayState, GeneratedImage, GeneratedImageId, ImageFile, Phase, Settings};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Kind of provider request in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Request {
    IdeasFromText,
    IdeasFromImage,
    Generate,
    Edit,
}

impl Request {
    pub fn phase(&self) -> Phase {
        match self {
            Request::IdeasFromText => Phase::GeneratingIdeasText,
            Request::IdeasFromImage => Phase::GeneratingIdeasImage,
            Request::Generate => Phase::Generating,
            Request::Edit => Phase::Editing,
        }
    }

    /// Generate and edit replace the display with a loading state
    fn shows_loading(&self) -> bool {
        matches!(self, Request::Generate | Request::Edit)
    }

    pub fn failure_message(&self) -> &'static str {
        match self {
            Request::IdeasFromText => concat!(
                "Could not generate scene ideas from your description. ",
                "The AI might be busy. Please try again in a moment."
            ),
            Request::IdeasFromImage => {
                "Could not generate scene ideas from the image. Please try a different image or try again."
            }
            Request::Generate => "Failed to generate image. Please try again.",
            Request::Edit => "Failed to apply the edit. Please try again.",
        }
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Request::IdeasFromText => "scene ideas from text",
            Request::IdeasFromImage => "scene ideas from image",
            Request::Generate => "background generation",
            Request::Edit => "image edit",
        })
    }
}

/// Rejections and failures surfaced by the controller
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Another request is still in progress. Please wait for it to finish.")]
    Busy,

    #[error("Please upload a product image first.")]
    NoProductImage,

    #[error("There is no generated image to edit yet.")]
    NoCurrentImage,

    #[error("Please enter a prompt first.")]
    EmptyPrompt,

    #[error("No history entry with id {0}.")]
    UnknownHistoryEntry(GeneratedImageId),

    #[error("No scene idea at position {0}.")]
    UnknownIdea(usize),

    #[error(transparent)]
    InvalidOption(#[from] SettingsError),

    #[error("{request} failed: {source}")]
    Generation {
        request: Request,
        #[source]
        source: GenerationError,
    },
}

impl WorkflowError {
    /// Display-ready text for the presentation layer
    pub fn user_message(&self) -> String {
        match self {
            WorkflowError::Generation { source, .. } if source.is_no_image() => source.to_string(),
            WorkflowError::Generation { request, .. } => request.failure_message().to_string(),
            other => other.to_string(),
        }
    }

    pub fn is_no_image(&self) -> bool {
        matches!(self, WorkflowError::Generation { source, .. } if source.is_no_image())
    }
}

/// Read-only view of the controller for presentation layers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub phase: Phase,
    pub display: DisplayState,
    pub settings: Settings,
    pub custom_prompt: String,
    pub product: Option<ImageFile>,
    pub ideas: Vec<String>,
    pub history: Vec<GeneratedImage>,
    pub error: Option<String>,
}

struct InFlight {
    request: Request,
    previous_display: DisplayState,
}

#[derive(Default)]
struct SessionState {
    product: Option<ImageFile>,
    settings: SettingsModel,
    display: DisplayState,
    ideas: Vec<String>,
    history: HistoryStore,
    in_flight: Option<InFlight>,
    error: Option<String>,
}

impl SessionState {
    fn phase(&self) -> Phase {
        match (&self.in_flight, &self.product) {
            (Some(in_flight), _) => in_flight.request.phase(),
            (None, Some(_)) => Phase::Ready,
            (None, None) => Phase::Idle,
        }
    }

    fn ensure_not_busy(&self) -> Result<(), WorkflowError> {
        match &self.in_flight {
            Some(in_flight) => {
                debug!("Rejecting request while {} is in flight", in_flight.request);
                Err(WorkflowError::Busy)
            }
            None => Ok(()),
        }
    }

    /// Record a rejection for display and hand it back
    fn reject(&mut self, err: WorkflowError) -> WorkflowError {
        self.error = Some(err.user_message());
        err
    }

    fn begin(&mut self, request: Request) {
        let previous_display = if request.shows_loading() {
            std::mem::replace(&mut self.display, DisplayState::Loading)
        } else {
            self.display.clone()
        };
        self.error = None;
        self.in_flight = Some(InFlight {
            request,
            previous_display,
        });
        debug!("Phase -> {:?}", self.phase());
    }

    fn complete(&mut self) {
        self.in_flight = None;
        debug!("Phase -> {:?}", self.phase());
    }

    fn complete_with_image(&mut self, image: GeneratedImage) {
        self.history.append(image.clone());
        debug!("History holds {} images", self.history.all().len());
        self.display = DisplayState::Ready(image);
        self.complete();
    }

    /// Restore the pre-request display and surface the failure
    fn abort(&mut self, request: Request, source: GenerationError) -> WorkflowError {
        if let Some(in_flight) = self.in_flight.take() {
            self.display = in_flight.previous_display;
        }
        let err = WorkflowError::Generation { request, source };
        warn!("{}", err);
        self.error = Some(err.user_message());
        debug!("Phase -> {:?}", self.phase());
        err
    }

    /// Undo `begin` for a request whose future was dropped
    fn cancel(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            warn!("{} was dropped before it completed", in_flight.request);
            self.display = in_flight.previous_display;
            debug!("Phase -> {:?}", self.phase());
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase(),
            display: self.display.clone(),
            settings: self.settings.get(),
            custom_prompt: self.settings.custom_prompt().to_string(),
            product: self.product.clone(),
            ideas: self.ideas.clone(),
            history: self.history.all().to_vec(),
            error: self.error.clone(),
        }
    }
}

fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// Releases the in-flight marker when a request future is dropped mid-call
///
/// Completion paths call [`InFlightGuard::disarm`] while they still hold the
/// state lock; only an abandoned request reaches the cancelling `Drop`.
struct InFlightGuard<'a> {
    controller: &'a WorkflowController,
    armed: bool,
}

impl<'a> InFlightGuard<'a> {
    fn new(controller: &'a WorkflowController) -> Self {
        Self {
            controller,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.controller.lock().cancel();
        }
    }
}

/// Orchestrates uploads, idea requests, generation, edits and history reuse
pub struct WorkflowController {
    client: Arc<dyn GenerativeClient>,
    state: Mutex<SessionState>,
}

impl WorkflowController {
    pub fn new(client: Arc<dyn GenerativeClient>) -> Self {
        Self {
            client,
            state: Mutex::new(SessionState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> Snapshot {
        self.lock().snapshot()
    }

    pub fn phase(&self) -> Phase {
        self.lock().phase()
    }

    pub fn settings(&self) -> Settings {
        self.lock().settings.get()
    }

    pub fn current(&self) -> Option<GeneratedImage> {
        self.lock().display.current().cloned()
    }

    pub fn history(&self) -> Vec<GeneratedImage> {
        self.lock().history.all().to_vec()
    }

    pub fn ideas(&self) -> Vec<String> {
        self.lock().ideas.clone()
    }

    /// Store a new product image
    ///
    /// Files that are not `image/*` are ignored without error; the return
    /// value says whether the upload was taken. A new product clears the
    /// displayed result but keeps history.
    pub fn upload(&self, file: ImageFile) -> Result<bool, WorkflowError> {
        let mut state = self.lock();
        state.ensure_not_busy()?;

        if !file.is_image() {
            debug!("Ignoring upload with MIME type {}", file.mime_type);
            return Ok(false);
        }

        info!("Product image uploaded ({})", file.mime_type);
        state.product = Some(file);
        state.display = DisplayState::NoImage;
        state.error = None;
        Ok(true)
    }

    pub fn set_setting(&self, key: SettingKey, value: &str) -> Result<Settings, WorkflowError> {
        let mut state = self.lock();
        match state.settings.set(key, value) {
            Ok(()) => Ok(state.settings.get()),
            Err(err) => Err(state.reject(err.into())),
        }
    }

    /// Same as [`WorkflowController::set_setting`] with the key given by name
    pub fn set_named_setting(&self, key: &str, value: &str) -> Result<Settings, WorkflowError> {
        let mut state = self.lock();
        match state.settings.set_named(key, value) {
            Ok(()) => Ok(state.settings.get()),
            Err(err) => Err(state.reject(err.into())),
        }
    }

    pub fn set_custom_prompt(&self, prompt: impl Into<String>) {
        self.lock().settings.set_custom_prompt(prompt);
    }

    /// Copy a scene idea into the custom prompt
    pub fn use_idea(&self, index: usize) -> Result<String, WorkflowError> {
        let mut state = self.lock();
        match state.ideas.get(index).cloned() {
            Some(idea) => {
                state.settings.set_custom_prompt(idea.clone());
                Ok(idea)
            }
            None => Err(state.reject(WorkflowError::UnknownIdea(index))),
        }
    }

    pub async fn request_ideas_from_text(
        &self,
        description: &str,
    ) -> Result<Vec<String>, WorkflowError> {
        {
            let mut state = self.lock();
            state.ensure_not_busy()?;
            if is_blank(description) {
                return Err(state.reject(WorkflowError::EmptyPrompt));
            }
            state.begin(Request::IdeasFromText);
        }
        let guard = InFlightGuard::new(self);

        let outcome = self.client.ideas_from_text(description).await;
        self.finish_ideas(guard, Request::IdeasFromText, outcome)
    }

    pub async fn request_ideas_from_image(
        &self,
        style: ImageFile,
    ) -> Result<Vec<String>, WorkflowError> {
        {
            let mut state = self.lock();
            state.ensure_not_busy()?;
            state.begin(Request::IdeasFromImage);
        }
        let guard = InFlightGuard::new(self);

        let outcome = self.client.ideas_from_image(&style).await;
        self.finish_ideas(guard, Request::IdeasFromImage, outcome)
    }

    fn finish_ideas(
        &self,
        guard: InFlightGuard<'_>,
        request: Request,
        outcome: Result<Vec<String>, GenerationError>,
    ) -> Result<Vec<String>, WorkflowError> {
        let mut state = self.lock();
        guard.disarm();
        match outcome {
            Ok(ideas) => {
                info!("Received {} scene ideas", ideas.len());
                state.ideas = ideas.clone();
                state.complete();
                Ok(ideas)
            }
            Err(source) => Err(state.abort(request, source)),
        }
    }

    /// Generate a new background for the product image
    ///
    /// `settings` is captured as the snapshot stored with the result.
    pub async fn generate(
        &self,
        prompt: &str,
        settings: Settings,
    ) -> Result<GeneratedImage, WorkflowError> {
        let product = {
            let mut state = self.lock();
            state.ensure_not_busy()?;
            let Some(product) = state.product.clone() else {
                return Err(state.reject(WorkflowError::NoProductImage));
            };
            if is_blank(prompt) {
                return Err(state.reject(WorkflowError::EmptyPrompt));
            }
            state.begin(Request::Generate);
            product
        };
        let guard = InFlightGuard::new(self);

        info!(
            "Generating background ({}, {}, {})",
            settings.aspect_ratio, settings.lighting, settings.camera_perspective
        );
        let outcome = self
            .client
            .generate_background(&product, prompt, &settings)
            .await;

        let mut state = self.lock();
        guard.disarm();
        match outcome {
            Ok(image) => {
                let generated = GeneratedImage::new(image, prompt, settings);
                state.complete_with_image(generated.clone());
                Ok(generated)
            }
            Err(source) => Err(state.abort(Request::Generate, source)),
        }
    }

    /// Generate using the custom prompt and the current settings
    pub async fn generate_from_settings(&self) -> Result<GeneratedImage, WorkflowError> {
        let (prompt, settings) = {
            let state = self.lock();
            (
                state.settings.custom_prompt().to_string(),
                state.settings.get(),
            )
        };
        self.generate(&prompt, settings).await
    }

    /// Apply an edit to the current result
    ///
    /// The edited image is the current result, not the original upload;
    /// the new entry keeps the settings of the image it was derived from.
    pub async fn edit(&self, edit_prompt: &str) -> Result<GeneratedImage, WorkflowError> {
        let (source, settings) = {
            let mut state = self.lock();
            state.ensure_not_busy()?;
            let Some(current) = state.display.current().cloned() else {
                return Err(state.reject(WorkflowError::NoCurrentImage));
            };
            if is_blank(edit_prompt) {
                return Err(state.reject(WorkflowError::EmptyPrompt));
            }
            state.begin(Request::Edit);
            (current.image_file(), current.settings)
        };
        let guard = InFlightGuard::new(self);

        info!("Editing current image");
        let outcome = self.client.edit_image(&source, edit_prompt).await;

        let mut state = self.lock();
        guard.disarm();
        match outcome {
            Ok(image) => {
                let edited = GeneratedImage::new(image, edit_prompt, settings);
                state.complete_with_image(edited.clone());
                Ok(edited)
            }
            Err(source) => Err(state.abort(Request::Edit, source)),
        }
    }

    /// Show a history entry again and adopt its settings
    pub fn select_history(&self, id: GeneratedImageId) -> Result<GeneratedImage, WorkflowError> {
        let mut state = self.lock();
        state.ensure_not_busy()?;
        let Some(entry) = state.history.get(id).cloned() else {
            return Err(state.reject(WorkflowError::UnknownHistoryEntry(id)));
        };

        state.settings.adopt(entry.settings);
        state.display = DisplayState::Ready(entry.clone());
        state.error = None;
        Ok(entry)
    }

    /// Return to the setup view, keeping product, settings and history
    pub fn clear_display(&self) -> Result<(), WorkflowError> {
        let mut state = self.lock();
        state.ensure_not_busy()?;
        state.display = DisplayState::NoImage;
        state.error = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ImageOperation;
    use crate::types::{AspectRatio, CameraPerspective, Lighting};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::time::Duration;
    use tokio::sync::Semaphore;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        IdeasFromText(String),
        IdeasFromImage(String),
        Generate { payload: String, prompt: String, settings: Settings },
        Edit { payload: String, prompt: String },
    }

    #[derive(Default)]
    struct FakeClient {
        ideas: Mutex<VecDeque<Result<Vec<String>, GenerationError>>>,
        images: Mutex<VecDeque<Result<ImageFile, GenerationError>>>,
        calls: Mutex<Vec<Call>>,
        gate: Option<Semaphore>,
    }

    impl FakeClient {
        fn gated() -> Self {
            Self {
                gate: Some(Semaphore::new(0)),
                ..Self::default()
            }
        }

        fn push_ideas(&self, ideas: Result<Vec<String>, GenerationError>) {
            self.ideas.lock().unwrap().push_back(ideas);
        }

        fn push_image(&self, image: Result<ImageFile, GenerationError>) {
            self.images.lock().unwrap().push_back(image);
        }

        fn release(&self) {
            if let Some(gate) = &self.gate {
                gate.add_permits(1);
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        async fn wait(&self) {
            if let Some(gate) = &self.gate {
                // One release lets exactly one call through
                gate.acquire().await.unwrap().forget();
            }
        }

        fn next_ideas(&self) -> Result<Vec<String>, GenerationError> {
            self.ideas.lock().unwrap().pop_front().expect("no scripted ideas")
        }

        fn next_image(&self) -> Result<ImageFile, GenerationError> {
            self.images.lock().unwrap().pop_front().expect("no scripted image")
        }
    }

    #[async_trait]
    impl GenerativeClient for FakeClient {
        async fn ideas_from_text(&self, description: &str) -> Result<Vec<String>, GenerationError> {
            self.calls.lock().unwrap().push(Call::IdeasFromText(description.to_string()));
            self.wait().await;
            self.next_ideas()
        }

        async fn ideas_from_image(&self, style: &ImageFile) -> Result<Vec<String>, GenerationError> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::IdeasFromImage(style.base64_payload().to_string()));
            self.wait().await;
            self.next_ideas()
        }

        async fn generate_background(
            &self,
            product: &ImageFile,
            prompt: &str,
            settings: &Settings,
        ) -> Result<ImageFile, GenerationError> {
            self.calls.lock().unwrap().push(Call::Generate {
                payload: product.base64_payload().to_string(),
                prompt: prompt.to_string(),
                settings: *settings,
            });
            self.wait().await;
            self.next_image()
        }

        async fn edit_image(
            &self,
            image: &ImageFile,
            edit_prompt: &str,
        ) -> Result<ImageFile, GenerationError> {
            self.calls.lock().unwrap().push(Call::Edit {
                payload: image.base64_payload().to_string(),
                prompt: edit_prompt.to_string(),
            });
            self.wait().await;
            self.next_image()
        }
    }

    fn product() -> ImageFile {
        ImageFile::from_base64("image/png", "UFJPRFVDVA==")
    }

    fn marble_settings() -> Settings {
        Settings {
            lighting: Lighting::Soft,
            aspect_ratio: AspectRatio::Square,
            camera_perspective: CameraPerspective::EyeLevel,
        }
    }

    fn setup() -> (Arc<FakeClient>, WorkflowController) {
        let client = Arc::new(FakeClient::default());
        let controller = WorkflowController::new(client.clone());
        (client, controller)
    }

    #[test]
    fn test_upload_moves_idle_to_ready() {
        let (_, controller) = setup();
        assert_eq!(controller.phase(), Phase::Idle);

        assert!(controller.upload(product()).unwrap());
        assert_eq!(controller.phase(), Phase::Ready);
        assert_eq!(controller.snapshot().product, Some(product()));
    }

    #[test]
    fn test_non_image_upload_is_ignored_silently() {
        let (_, controller) = setup();
        let accepted = controller
            .upload(ImageFile::new("data:text/plain;base64,aGk=", "text/plain"))
            .unwrap();

        assert!(!accepted);
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.phase, Phase::Idle);
        assert!(snapshot.product.is_none());
        assert!(snapshot.error.is_none());
    }

    #[tokio::test]
    async fn test_ideas_from_text_replace_list() {
        let (client, controller) = setup();
        let ideas: Vec<String> = ["Idea1", "Idea2", "Idea3", "Idea4", "Idea5"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        client.push_ideas(Ok(ideas.clone()));

        let result = controller
            .request_ideas_from_text("a serene zen garden")
            .await
            .unwrap();

        assert_eq!(result, ideas);
        assert_eq!(controller.ideas(), ideas);
        assert_eq!(controller.phase(), Phase::Idle);
        assert_eq!(
            client.calls(),
            vec![Call::IdeasFromText("a serene zen garden".to_string())]
        );
    }

    #[tokio::test]
    async fn test_failed_ideas_keep_previous_list() {
        let (client, controller) = setup();
        controller.upload(product()).unwrap();
        client.push_ideas(Ok(vec!["Rooftop at dusk".to_string()]));
        controller.request_ideas_from_text("city").await.unwrap();

        client.push_ideas(Err(GenerationError::Transport("connection reset".into())));
        let err = controller
            .request_ideas_from_image(ImageFile::from_base64("image/jpeg", "U1RZTEU="))
            .await
            .unwrap_err();

        assert_eq!(
            err.user_message(),
            Request::IdeasFromImage.failure_message().to_string()
        );
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.phase, Phase::Ready);
        assert_eq!(snapshot.ideas, vec!["Rooftop at dusk".to_string()]);
        assert_eq!(snapshot.error, Some(err.user_message()));
        assert_eq!(client.calls()[1], Call::IdeasFromImage("U1RZTEU=".to_string()));
    }

    #[tokio::test]
    async fn test_generate_success_appends_history() {
        let (client, controller) = setup();
        controller.upload(product()).unwrap();
        client.push_image(Ok(ImageFile::new("X", "image/png")));

        let generated = controller
            .generate("marble pedestal", marble_settings())
            .await
            .unwrap();

        assert_eq!(generated.data_url, "X");
        assert_eq!(generated.prompt, "marble pedestal");
        assert_eq!(generated.settings, marble_settings());
        assert_eq!(controller.current(), Some(generated.clone()));
        assert_eq!(controller.history(), vec![generated]);
        assert_eq!(controller.phase(), Phase::Ready);
        assert!(matches!(
            &client.calls()[0],
            Call::Generate { payload, .. } if payload == "UFJPRFVDVA=="
        ));
    }

    #[tokio::test]
    async fn test_history_snapshot_ignores_later_settings_changes() {
        let (client, controller) = setup();
        controller.upload(product()).unwrap();
        client.push_image(Ok(ImageFile::from_base64("image/png", "QQ==")));

        controller.set_setting(SettingKey::Lighting, "Dramatic").unwrap();
        let at_call_time = controller.settings();
        controller.set_custom_prompt("a beach");
        let generated = controller.generate_from_settings().await.unwrap();

        controller.set_setting(SettingKey::Lighting, "Neon").unwrap();
        controller.set_setting(SettingKey::AspectRatio, "16:9").unwrap();

        let history = controller.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, generated.id);
        assert_eq!(history[0].settings, at_call_time);
        assert_eq!(history[0].settings.lighting, Lighting::Dramatic);
    }

    #[tokio::test]
    async fn test_generate_without_image_part_reverts() {
        let (client, controller) = setup();
        controller.upload(product()).unwrap();
        client.push_image(Ok(ImageFile::new("FIRST", "image/png")));
        let first = controller.generate("first", marble_settings()).await.unwrap();

        client.push_image(Err(GenerationError::NoImageProduced(ImageOperation::Generate)));
        let err = controller
            .generate("second", marble_settings())
            .await
            .unwrap_err();

        assert!(err.is_no_image());
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.phase, Phase::Ready);
        assert_eq!(snapshot.history.len(), 1);
        assert_eq!(snapshot.display, DisplayState::Ready(first));
        assert_eq!(
            snapshot.error.as_deref(),
            Some(ImageOperation::Generate.no_image_message())
        );
    }

    #[tokio::test]
    async fn test_first_generate_failure_returns_to_no_image() {
        let (client, controller) = setup();
        controller.upload(product()).unwrap();
        client.push_image(Err(GenerationError::Api {
            status: 429,
            message: "rate limited".into(),
        }));

        let err = controller.generate("p", marble_settings()).await.unwrap_err();

        assert_eq!(err.user_message(), Request::Generate.failure_message());
        assert_eq!(controller.snapshot().display, DisplayState::NoImage);
        assert_eq!(controller.phase(), Phase::Ready);
    }

    #[tokio::test]
    async fn test_edit_uses_current_result_and_keeps_settings() {
        let (client, controller) = setup();
        controller.upload(product()).unwrap();
        let settings = Settings {
            lighting: Lighting::Backlit,
            ..marble_settings()
        };
        client.push_image(Ok(ImageFile::from_base64("image/png", "R0VO")));
        let generated = controller.generate("studio", settings).await.unwrap();

        controller.set_setting(SettingKey::Lighting, "Neon").unwrap();
        client.push_image(Ok(ImageFile::from_base64("image/png", "RURJVA==")));
        let edited = controller.edit("add a shadow").await.unwrap();

        assert_ne!(edited.id, generated.id);
        assert_eq!(edited.prompt, "add a shadow");
        assert_eq!(edited.settings, settings);
        assert_eq!(controller.current(), Some(edited.clone()));
        assert_eq!(controller.history(), vec![generated, edited]);
        assert_eq!(
            client.calls()[1],
            Call::Edit {
                payload: "R0VO".to_string(),
                prompt: "add a shadow".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_edit_without_current_image_makes_no_call() {
        let (client, controller) = setup();

        let err = controller.edit("add a shadow").await.unwrap_err();

        assert!(matches!(err, WorkflowError::NoCurrentImage));
        assert!(client.calls().is_empty());
        assert_eq!(controller.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn test_generate_requires_product_and_prompt() {
        let (client, controller) = setup();
        assert!(matches!(
            controller.generate("p", marble_settings()).await,
            Err(WorkflowError::NoProductImage)
        ));

        controller.upload(product()).unwrap();
        assert!(matches!(
            controller.generate("   ", marble_settings()).await,
            Err(WorkflowError::EmptyPrompt)
        ));
        assert!(client.calls().is_empty());
        assert_eq!(
            controller.snapshot().error.as_deref(),
            Some("Please enter a prompt first.")
        );
    }

    #[tokio::test]
    async fn test_busy_guard_rejects_edit_while_generating() {
        let client = Arc::new(FakeClient::gated());
        let controller = Arc::new(WorkflowController::new(client.clone()));
        controller.upload(product()).unwrap();
        client.push_image(Ok(ImageFile::new("X", "image/png")));

        let task = tokio::spawn({
            let controller = controller.clone();
            async move { controller.generate("marble pedestal", marble_settings()).await }
        });
        while controller.phase() != Phase::Generating {
            tokio::task::yield_now().await;
        }
        assert!(controller.snapshot().display.is_loading());

        let err = controller.edit("add a shadow").await.unwrap_err();
        assert!(matches!(err, WorkflowError::Busy));
        assert!(matches!(
            controller.request_ideas_from_text("zen").await,
            Err(WorkflowError::Busy)
        ));
        assert!(matches!(
            controller.request_ideas_from_image(product()).await,
            Err(WorkflowError::Busy)
        ));
        assert!(matches!(
            controller.select_history(GeneratedImageId::new()),
            Err(WorkflowError::Busy)
        ));
        assert!(matches!(controller.upload(product()), Err(WorkflowError::Busy)));
        assert!(matches!(controller.clear_display(), Err(WorkflowError::Busy)));
        assert_eq!(controller.phase(), Phase::Generating);
        assert_eq!(client.calls().len(), 1);

        client.release();
        let generated = task.await.unwrap().unwrap();
        assert_eq!(controller.phase(), Phase::Ready);
        assert_eq!(controller.current(), Some(generated));
        assert!(controller.snapshot().error.is_none());
    }

    #[tokio::test]
    async fn test_dropped_generate_restores_previous_display() {
        let client = Arc::new(FakeClient::gated());
        let controller = WorkflowController::new(client.clone());
        controller.upload(product()).unwrap();
        client.push_image(Ok(ImageFile::new("FIRST", "image/png")));
        client.release();
        let first = controller.generate("first", marble_settings()).await.unwrap();

        let abandoned = tokio::time::timeout(
            Duration::from_millis(20),
            controller.generate("second", marble_settings()),
        )
        .await;
        assert!(abandoned.is_err());

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.phase, Phase::Ready);
        assert_eq!(snapshot.display, DisplayState::Ready(first));
        assert_eq!(snapshot.history.len(), 1);
        assert!(controller.clear_display().is_ok());
    }

    #[tokio::test]
    async fn test_dropped_edit_and_idea_requests_release_the_guard() {
        let client = Arc::new(FakeClient::gated());
        let controller = WorkflowController::new(client.clone());

        let abandoned = tokio::time::timeout(
            Duration::from_millis(20),
            controller.request_ideas_from_text("zen"),
        )
        .await;
        assert!(abandoned.is_err());
        assert_eq!(controller.phase(), Phase::Idle);

        controller.upload(product()).unwrap();
        client.push_image(Ok(ImageFile::new("BASE", "image/png")));
        client.release();
        let base = controller.generate("base", marble_settings()).await.unwrap();

        let abandoned =
            tokio::time::timeout(Duration::from_millis(20), controller.edit("add a shadow")).await;
        assert!(abandoned.is_err());
        assert_eq!(controller.phase(), Phase::Ready);
        assert_eq!(controller.current(), Some(base));
    }

    #[tokio::test]
    async fn test_select_history_is_idempotent() {
        let (client, controller) = setup();
        controller.upload(product()).unwrap();
        let first_settings = Settings {
            lighting: Lighting::GoldenHour,
            aspect_ratio: AspectRatio::Portrait,
            camera_perspective: CameraPerspective::TopDown,
        };
        client.push_image(Ok(ImageFile::new("ONE", "image/png")));
        client.push_image(Ok(ImageFile::new("TWO", "image/png")));
        let first = controller.generate("one", first_settings).await.unwrap();
        controller.generate("two", marble_settings()).await.unwrap();

        let selected = controller.select_history(first.id).unwrap();
        let after_first = controller.snapshot();
        controller.select_history(first.id).unwrap();
        let after_second = controller.snapshot();

        assert_eq!(selected, first);
        assert_eq!(after_first, after_second);
        assert_eq!(after_second.display, DisplayState::Ready(first));
        assert_eq!(after_second.settings, first_settings);
        assert_eq!(after_second.history.len(), 2);
    }

    #[test]
    fn test_select_unknown_history_entry() {
        let (_, controller) = setup();
        let id = GeneratedImageId::new();
        assert!(matches!(
            controller.select_history(id),
            Err(WorkflowError::UnknownHistoryEntry(missing)) if missing == id
        ));
    }

    #[tokio::test]
    async fn test_use_idea_sets_custom_prompt() {
        let (client, controller) = setup();
        client.push_ideas(Ok(vec!["Misty forest".into(), "Marble counter".into()]));
        controller.request_ideas_from_text("nature").await.unwrap();

        assert_eq!(controller.use_idea(1).unwrap(), "Marble counter");
        assert_eq!(controller.snapshot().custom_prompt, "Marble counter");
        assert!(matches!(controller.use_idea(5), Err(WorkflowError::UnknownIdea(5))));
    }

    #[tokio::test]
    async fn test_clear_display_keeps_history() {
        let (client, controller) = setup();
        controller.upload(product()).unwrap();
        client.push_image(Ok(ImageFile::new("X", "image/png")));
        controller.generate("p", marble_settings()).await.unwrap();

        controller.clear_display().unwrap();

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.display, DisplayState::NoImage);
        assert_eq!(snapshot.history.len(), 1);
        assert_eq!(snapshot.phase, Phase::Ready);
    }

    #[test]
    fn test_invalid_setting_is_surfaced() {
        let (_, controller) = setup();
        let err = controller
            .set_setting(SettingKey::CameraPerspective, "Drone")
            .unwrap_err();

        assert!(matches!(err, WorkflowError::InvalidOption(_)));
        assert_eq!(
            controller.snapshot().error.as_deref(),
            Some("'Drone' is not a valid option for cameraPerspective")
        );
        assert_eq!(controller.settings(), Settings::default());
    }

    #[test]
    fn test_named_setting_accepts_wire_keys() {
        let (_, controller) = setup();
        let settings = controller.set_named_setting("aspectRatio", "9:16").unwrap();
        assert_eq!(settings.aspect_ratio, AspectRatio::Vertical);

        let err = controller.set_named_setting("shutter", "fast").unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidOption(_)));
        assert_eq!(
            controller.snapshot().error.as_deref(),
            Some("'shutter' is not a valid option for setting")
        );
        assert_eq!(controller.settings().aspect_ratio, AspectRatio::Vertical);
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let (_, controller) = setup();
        let json = serde_json::to_value(controller.snapshot()).unwrap();
        assert_eq!(json["phase"], "idle");
        assert_eq!(json["display"]["state"], "no_image");
        assert_eq!(json["customPrompt"], "");
        assert!(json["history"].as_array().unwrap().is_empty());
    }
}
