//! Image picker that reads the chosen or dropped file into a data URL

use crate::types::ImageFileView;
use gloo::file::{callbacks::FileReader, File};
use std::cell::RefCell;
use std::rc::Rc;
use web_sys::{DragEvent, Event, HtmlInputElement};
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct UploadProps {
    pub label: AttrValue,
    #[prop_or_default]
    pub preview: Option<ImageFileView>,
    #[prop_or_default]
    pub disabled: bool,
    pub on_file: Callback<ImageFileView>,
}

/// Non-image files are ignored without a message
pub fn is_image_mime(mime_type: &str) -> bool {
    mime_type.starts_with("image/")
}

/// CSS classes for the drop zone
pub fn drop_zone_classes(dragging: bool, disabled: bool) -> Classes {
    classes!(
        "upload-component",
        dragging.then_some("dragging"),
        disabled.then_some("disabled")
    )
}

/// Start reading `file`; the handle stays in `reader` until the callback fires
fn read_image(
    file: web_sys::File,
    reader: &Rc<RefCell<Option<FileReader>>>,
    on_file: Callback<ImageFileView>,
) {
    let file = File::from(file);
    let mime_type = file.raw_mime_type();
    if !is_image_mime(&mime_type) {
        return;
    }

    let task = gloo::file::callbacks::read_as_data_url(&file, move |result| {
        if let Ok(data_url) = result {
            on_file.emit(ImageFileView {
                data_url,
                mime_type,
            });
        }
    });
    *reader.borrow_mut() = Some(task);
}

#[function_component(UploadComponent)]
pub fn upload_component(props: &UploadProps) -> Html {
    let reader = use_mut_ref(|| None::<FileReader>);
    let dragging = use_state(|| false);

    let on_file_change = {
        let reader = reader.clone();
        let on_file = props.on_file.clone();
        Callback::from(move |e: Event| {
            let input: HtmlInputElement = e.target_unchecked_into();
            let Some(file) = input.files().and_then(|files| files.get(0)) else {
                return;
            };
            input.set_value("");
            read_image(file, &reader, on_file.clone());
        })
    };

    let on_drag_over = {
        let dragging = dragging.clone();
        let disabled = props.disabled;
        Callback::from(move |e: DragEvent| {
            e.prevent_default();
            if !disabled && !*dragging {
                dragging.set(true);
            }
        })
    };
    let on_drag_leave = {
        let dragging = dragging.clone();
        Callback::from(move |e: DragEvent| {
            e.prevent_default();
            dragging.set(false);
        })
    };
    let on_drop = {
        let dragging = dragging.clone();
        let reader = reader.clone();
        let on_file = props.on_file.clone();
        let disabled = props.disabled;
        Callback::from(move |e: DragEvent| {
            e.prevent_default();
            dragging.set(false);
            if disabled {
                return;
            }
            let file = e
                .data_transfer()
                .and_then(|transfer| transfer.files())
                .and_then(|files| files.get(0));
            if let Some(file) = file {
                read_image(file, &reader, on_file.clone());
            }
        })
    };

    html! {
        <div
            class={drop_zone_classes(*dragging, props.disabled)}
            ondragover={on_drag_over}
            ondragleave={on_drag_leave}
            ondrop={on_drop}
        >
            <label class="upload-label">
                { props.label.clone() }
                <input
                    type="file"
                    accept="image/*"
                    disabled={props.disabled}
                    onchange={on_file_change}
                />
            </label>
            if let Some(preview) = &props.preview {
                <img class="upload-preview" src={preview.data_url.clone()} alt="Uploaded image" />
            } else {
                <p class="upload-hint">{ "Drag & drop or click to browse" }</p>
            }
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_images_are_accepted() {
        assert!(is_image_mime("image/png"));
        assert!(is_image_mime("image/webp"));
        assert!(!is_image_mime("application/pdf"));
        assert!(!is_image_mime(""));
    }

    #[test]
    fn test_drop_zone_classes() {
        let idle = drop_zone_classes(false, false);
        assert!(idle.contains("upload-component"));
        assert!(!idle.contains("dragging"));

        assert!(drop_zone_classes(true, false).contains("dragging"));
        assert!(drop_zone_classes(false, true).contains("disabled"));
    }
}
