//! Result pane: loader, current image and its actions

use crate::api::EXPORT_URL;
use crate::types::GeneratedImageView;
use web_sys::HtmlInputElement;
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct DisplayProps {
    #[prop_or_default]
    pub current: Option<GeneratedImageView>,
    /// Set while a generate or edit request is outstanding
    #[prop_or_default]
    pub loading: Option<AttrValue>,
    pub busy: bool,
    pub on_edit: Callback<String>,
    pub on_generate_new: Callback<()>,
}

#[derive(Properties, PartialEq)]
struct LightboxProps {
    src: String,
    on_close: Callback<()>,
}

/// Full-window view of the result; any click closes it
#[function_component(Lightbox)]
fn lightbox(props: &LightboxProps) -> Html {
    html! {
        <div class="lightbox" onclick={props.on_close.reform(|_| ())}>
            <img src={props.src.clone()} alt="Generated result" />
            <button class="lightbox-close" aria-label="Close lightbox">{ "×" }</button>
        </div>
    }
}

#[function_component(ResultDisplay)]
pub fn result_display(props: &DisplayProps) -> Html {
    let editing = use_state(|| false);
    let enlarged = use_state(|| false);
    let edit_prompt = use_state(String::new);

    let on_edit_input = {
        let edit_prompt = edit_prompt.clone();
        Callback::from(move |e: InputEvent| {
            edit_prompt.set(e.target_unchecked_into::<HtmlInputElement>().value());
        })
    };
    let on_enlarge = {
        let enlarged = enlarged.clone();
        Callback::from(move |_: MouseEvent| enlarged.set(true))
    };
    let on_close_lightbox = {
        let enlarged = enlarged.clone();
        Callback::from(move |_: ()| enlarged.set(false))
    };
    let on_start_edit = {
        let editing = editing.clone();
        Callback::from(move |_: MouseEvent| editing.set(true))
    };
    let on_cancel = {
        let editing = editing.clone();
        let edit_prompt = edit_prompt.clone();
        Callback::from(move |_: MouseEvent| {
            editing.set(false);
            edit_prompt.set(String::new());
        })
    };
    let on_apply = {
        let editing = editing.clone();
        let edit_prompt = edit_prompt.clone();
        let on_edit = props.on_edit.clone();
        Callback::from(move |_: MouseEvent| {
            on_edit.emit((*edit_prompt).clone());
            editing.set(false);
            edit_prompt.set(String::new());
        })
    };

    html! {
        <div class="result-display">
            if let Some(message) = &props.loading {
                <div class="loader">{ message.clone() }</div>
            } else if let Some(image) = &props.current {
                <img
                    class="result-image"
                    src={image.data_url.clone()}
                    alt="Generated result"
                    aria-label="Enlarge generated image"
                    onclick={on_enlarge}
                />
                if *enlarged {
                    <Lightbox src={image.data_url.clone()} on_close={on_close_lightbox} />
                }
                <p class="result-prompt">{ &image.prompt }</p>
                if *editing {
                    <div class="edit-toolbar">
                        <input
                            type="text"
                            placeholder="e.g. add a soft shadow under the product"
                            value={(*edit_prompt).clone()}
                            oninput={on_edit_input}
                        />
                        <button onclick={on_cancel}>{ "Cancel" }</button>
                        <button
                            disabled={props.busy || edit_prompt.trim().is_empty()}
                            onclick={on_apply}
                        >
                            { "Apply Edit" }
                        </button>
                    </div>
                } else {
                    <div class="result-actions">
                        <a href={EXPORT_URL} download="">{ "Save" }</a>
                        <button disabled={props.busy} onclick={on_start_edit}>{ "Edit Image" }</button>
                        <button
                            disabled={props.busy}
                            onclick={props.on_generate_new.reform(|_| ())}
                        >
                            { "Generate New" }
                        </button>
                    </div>
                }
            } else {
                <div class="placeholder">
                    <p>{ "Your generated image will appear here" }</p>
                </div>
            }
        </div>
    }
}
