//! Main application component

use crate::api::{self, use_idea as apply_idea, ApiResult};
use crate::components::controls::ControlPanel;
use crate::components::display::ResultDisplay;
use crate::components::history::HistoryPanel;
use crate::components::upload::UploadComponent;
use crate::types::{ImageFileView, OptionsView, Pending, SnapshotView};
use gloo::timers::callback::Interval;
use std::future::Future;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

/// Poll period while the server finishes a request this page did not start
const POLL_MILLIS: u32 = 1_000;

/// Handles shared by every server call
#[derive(Clone)]
struct Session {
    snapshot: UseStateHandle<Option<SnapshotView>>,
    notice: UseStateHandle<Option<String>>,
    pending: UseStateHandle<Option<Pending>>,
}

impl Session {
    /// Send one request and render whatever state the server reports back
    fn run<F>(&self, kind: Pending, request: F)
    where
        F: Future<Output = ApiResult<SnapshotView>> + 'static,
    {
        let session = self.clone();
        session.notice.set(None);
        session.pending.set(Some(kind));
        spawn_local(async move {
            match request.await {
                Ok(snapshot) => session.snapshot.set(Some(snapshot)),
                Err(message) => {
                    session.notice.set(Some(message));
                    if let Ok(snapshot) = api::fetch_state().await {
                        session.snapshot.set(Some(snapshot));
                    }
                }
            }
            session.pending.set(None);
        });
    }
}

#[function_component(App)]
pub fn app() -> Html {
    let session = Session {
        snapshot: use_state(|| None::<SnapshotView>),
        notice: use_state(|| None::<String>),
        pending: use_state(|| None::<Pending>),
    };
    let options = use_state(OptionsView::default);

    {
        let session = session.clone();
        let options = options.clone();
        use_effect_with((), move |_| {
            let notice = session.notice.clone();
            spawn_local(async move {
                match api::fetch_options().await {
                    Ok(fetched) => options.set(fetched),
                    Err(message) => notice.set(Some(message)),
                }
            });
            session.run(Pending::Other, api::fetch_state());
        });
    }

    // A request started before a reload finishes on the server without us
    let waiting_on_server = session.pending.is_none()
        && session
            .snapshot
            .as_ref()
            .is_some_and(|snapshot| snapshot.phase.is_busy());
    {
        let snapshot = session.snapshot.clone();
        use_effect_with(waiting_on_server, move |waiting| {
            let poll = waiting.then(|| {
                Interval::new(POLL_MILLIS, move || {
                    let snapshot = snapshot.clone();
                    spawn_local(async move {
                        if let Ok(fresh) = api::fetch_state().await {
                            snapshot.set(Some(fresh));
                        }
                    });
                })
            });
            move || drop(poll)
        });
    }

    let on_upload = {
        let session = session.clone();
        Callback::from(move |file: ImageFileView| session.run(Pending::Other, api::upload(file)))
    };
    let on_setting = {
        let session = session.clone();
        Callback::from(move |(key, value): (&'static str, String)| {
            session.run(Pending::Other, api::set_setting(key, value))
        })
    };
    let on_ideas_text = {
        let session = session.clone();
        Callback::from(move |description: String| {
            session.run(Pending::IdeasFromText, api::ideas_from_text(description))
        })
    };
    let on_ideas_image = {
        let session = session.clone();
        Callback::from(move |style: ImageFileView| {
            session.run(Pending::IdeasFromImage, api::ideas_from_image(style))
        })
    };
    let on_use_idea = {
        let session = session.clone();
        Callback::from(move |index: usize| session.run(Pending::Other, apply_idea(index)))
    };
    let on_generate = {
        let session = session.clone();
        Callback::from(move |prompt: String| {
            session.run(Pending::Generate, async move {
                api::set_prompt(prompt).await?;
                api::generate().await
            })
        })
    };
    let on_edit = {
        let session = session.clone();
        Callback::from(move |prompt: String| session.run(Pending::Edit, api::edit(prompt)))
    };
    let on_select = {
        let session = session.clone();
        Callback::from(move |id: String| session.run(Pending::Other, api::select_history(id)))
    };
    let on_generate_new = {
        let session = session.clone();
        Callback::from(move |_: ()| session.run(Pending::Other, api::clear_display()))
    };

    let pending = *session.pending;
    let busy = pending.is_some()
        || session
            .snapshot
            .as_ref()
            .is_some_and(|snapshot| snapshot.phase.is_busy());
    let message = (*session.notice)
        .clone()
        .or_else(|| session.snapshot.as_ref().and_then(|s| s.error.clone()));

    html! {
        <div class="app">
            <header class="app-header">
                <h1>{ "Otto Studio" }</h1>
                <p>{ "AI-powered backgrounds for your product photos" }</p>
            </header>
            if let Some(message) = message {
                <div class="error-banner">{ message }</div>
            }
            if let Some(snapshot) = session.snapshot.as_ref() {
                <main class="app-main">
                    <aside class="sidebar">
                        <UploadComponent
                            label="Product Image"
                            preview={snapshot.product.clone()}
                            disabled={busy}
                            on_file={on_upload}
                        />
                        <ControlPanel
                            settings={snapshot.settings.clone()}
                            options={(*options).clone()}
                            custom_prompt={snapshot.custom_prompt.clone()}
                            ideas={snapshot.ideas.clone()}
                            has_product={snapshot.product.is_some()}
                            {busy}
                            {pending}
                            {on_setting}
                            {on_ideas_text}
                            {on_ideas_image}
                            {on_use_idea}
                            {on_generate}
                        />
                    </aside>
                    <section class="workspace">
                        <ResultDisplay
                            current={snapshot.current().cloned()}
                            loading={pending
                                .and_then(|p| p.display_message())
                                .or_else(|| snapshot.loading_message())
                                .map(AttrValue::from)}
                            {busy}
                            {on_edit}
                            {on_generate_new}
                        />
                        <HistoryPanel
                            history={snapshot.history.clone()}
                            current_id={snapshot.current().map(|image| image.id.clone())}
                            {busy}
                            {on_select}
                        />
                    </section>
                </main>
            } else {
                <div class="loader">{ "Loading..." }</div>
            }
        </div>
    }
}
