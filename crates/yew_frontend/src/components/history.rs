//! History grid; clicking an entry shows it again and reuses its settings

use crate::types::GeneratedImageView;
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct HistoryProps {
    pub history: Vec<GeneratedImageView>,
    #[prop_or_default]
    pub current_id: Option<String>,
    pub busy: bool,
    pub on_select: Callback<String>,
}

/// Newest first, the way the grid shows them
pub fn newest_first(history: &[GeneratedImageView]) -> Vec<&GeneratedImageView> {
    history.iter().rev().collect()
}

#[function_component(HistoryPanel)]
pub fn history_panel(props: &HistoryProps) -> Html {
    if props.history.is_empty() {
        return html! {};
    }

    html! {
        <div class="history-panel">
            <h2>{ "History" }</h2>
            <div class="history-grid">
                { for newest_first(&props.history).into_iter().map(|entry| {
                    let id = entry.id.clone();
                    let selected = props.current_id.as_deref() == Some(entry.id.as_str());
                    let on_select = props.on_select.clone();
                    let busy = props.busy;
                    html! {
                        <button
                            class={classes!("history-entry", selected.then_some("selected"))}
                            title={format!(
                                "{} | {}, {}, {}",
                                entry.prompt,
                                entry.settings.lighting,
                                entry.settings.aspect_ratio,
                                entry.settings.camera_perspective
                            )}
                            disabled={busy}
                            onclick={Callback::from(move |_: MouseEvent| on_select.emit(id.clone()))}
                        >
                            <img src={entry.data_url.clone()} alt={entry.prompt.clone()} />
                            <span class="reuse">{ "Reuse Settings" }</span>
                        </button>
                    }
                })}
            </div>
        </div>
    }
}
