//! Settings, custom prompt and scene ideas

use crate::components::upload::UploadComponent;
use crate::types::{ImageFileView, OptionsView, Pending, SettingsView};
use web_sys::{HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement};
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct ControlProps {
    pub settings: SettingsView,
    pub options: OptionsView,
    pub custom_prompt: String,
    pub ideas: Vec<String>,
    pub has_product: bool,
    pub busy: bool,
    #[prop_or_default]
    pub pending: Option<Pending>,
    pub on_setting: Callback<(&'static str, String)>,
    pub on_ideas_text: Callback<String>,
    pub on_ideas_image: Callback<ImageFileView>,
    pub on_use_idea: Callback<usize>,
    /// Carries the prompt text as typed
    pub on_generate: Callback<String>,
}

#[derive(Properties, PartialEq)]
struct SelectProps {
    label: AttrValue,
    key_name: &'static str,
    value: String,
    options: Vec<String>,
    disabled: bool,
    on_change: Callback<(&'static str, String)>,
}

#[function_component(SettingSelect)]
fn setting_select(props: &SelectProps) -> Html {
    let key_name = props.key_name;
    let onchange = props.on_change.reform(move |e: Event| {
        let select: HtmlSelectElement = e.target_unchecked_into();
        (key_name, select.value())
    });

    html! {
        <label class="setting">
            { props.label.clone() }
            <select disabled={props.disabled} {onchange}>
                { for props.options.iter().map(|option| html! {
                    <option value={option.clone()} selected={*option == props.value}>
                        { option }
                    </option>
                })}
            </select>
        </label>
    }
}

/// Whether the Generate button is enabled
pub fn can_generate(has_product: bool, busy: bool, prompt: &str) -> bool {
    has_product && !busy && !prompt.trim().is_empty()
}

#[function_component(ControlPanel)]
pub fn control_panel(props: &ControlProps) -> Html {
    let prompt = use_state(|| props.custom_prompt.clone());
    let description = use_state(String::new);
    let chosen_idea = use_state(|| None::<usize>);

    {
        // Adopt prompts set elsewhere, e.g. by choosing an idea
        let prompt = prompt.clone();
        use_effect_with(props.custom_prompt.clone(), move |custom_prompt| {
            prompt.set(custom_prompt.clone());
        });
    }
    {
        let chosen_idea = chosen_idea.clone();
        use_effect_with(props.ideas.clone(), move |_| chosen_idea.set(None));
    }

    let on_prompt_input = {
        let prompt = prompt.clone();
        Callback::from(move |e: InputEvent| {
            prompt.set(e.target_unchecked_into::<HtmlTextAreaElement>().value());
        })
    };
    let on_description_input = {
        let description = description.clone();
        Callback::from(move |e: InputEvent| {
            description.set(e.target_unchecked_into::<HtmlInputElement>().value());
        })
    };
    let on_get_ideas = {
        let description = description.clone();
        props
            .on_ideas_text
            .reform(move |_: MouseEvent| (*description).clone())
    };
    let on_use_idea = {
        let chosen_idea = chosen_idea.clone();
        let on_use_idea = props.on_use_idea.clone();
        Callback::from(move |_: MouseEvent| {
            if let Some(index) = *chosen_idea {
                on_use_idea.emit(index);
            }
        })
    };
    let on_generate = {
        let prompt = prompt.clone();
        props.on_generate.reform(move |_: MouseEvent| (*prompt).clone())
    };

    let text_loading = props.pending == Some(Pending::IdeasFromText);
    let image_loading = props.pending == Some(Pending::IdeasFromImage);

    html! {
        <div class="control-panel">
            <section class="settings">
                <SettingSelect
                    label="Lighting"
                    key_name="lighting"
                    value={props.settings.lighting.clone()}
                    options={props.options.lighting.clone()}
                    disabled={props.busy}
                    on_change={props.on_setting.clone()}
                />
                <SettingSelect
                    label="Aspect Ratio"
                    key_name="aspectRatio"
                    value={props.settings.aspect_ratio.clone()}
                    options={props.options.aspect_ratio.clone()}
                    disabled={props.busy}
                    on_change={props.on_setting.clone()}
                />
                <SettingSelect
                    label="Camera Perspective"
                    key_name="cameraPerspective"
                    value={props.settings.camera_perspective.clone()}
                    options={props.options.camera_perspective.clone()}
                    disabled={props.busy}
                    on_change={props.on_setting.clone()}
                />
            </section>

            <section class="custom-scene">
                <h3>{ "Create Your Own Prompt" }</h3>
                <textarea
                    value={(*prompt).clone()}
                    placeholder="e.g. on a marble pedestal in a sunlit atrium"
                    oninput={on_prompt_input}
                />
            </section>

            <section class="scene-ideas">
                <h3>{ "Or Get Scene Ideas" }</h3>
                <div class="ideas-from-text">
                    <input
                        type="text"
                        placeholder="Describe the mood you want"
                        value={(*description).clone()}
                        oninput={on_description_input}
                    />
                    <button
                        disabled={props.busy || description.trim().is_empty()}
                        onclick={on_get_ideas}
                    >
                        { if text_loading { "Getting..." } else { "Get Ideas" } }
                    </button>
                </div>
                <UploadComponent
                    label={if image_loading { "Getting Idea..." } else { "Get Ideas from a Style Image" }}
                    disabled={props.busy}
                    on_file={props.on_ideas_image.clone()}
                />
                if !props.ideas.is_empty() {
                    <div class="idea-list">
                        <h3>{ "Choose an Environment" }</h3>
                        { for props.ideas.iter().enumerate().map(|(index, idea)| {
                            let checked = *chosen_idea == Some(index);
                            let chosen_idea = chosen_idea.clone();
                            html! {
                                <label class="idea">
                                    <input
                                        type="radio"
                                        name="idea"
                                        checked={checked}
                                        onchange={Callback::from(move |_: Event| chosen_idea.set(Some(index)))}
                                    />
                                    { idea }
                                </label>
                            }
                        })}
                        <button
                            disabled={props.busy || chosen_idea.is_none()}
                            onclick={on_use_idea}
                        >
                            { "Use this Prompt" }
                        </button>
                    </div>
                }
            </section>

            <button
                class="generate"
                disabled={!can_generate(props.has_product, props.busy, &prompt)}
                onclick={on_generate}
            >
                { if props.pending == Some(Pending::Generate) { "Generating..." } else { "Generate" } }
            </button>
        </div>
    }
}
