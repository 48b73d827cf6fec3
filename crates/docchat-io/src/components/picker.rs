//! File picker button backed by a hidden `<input type="file">`.

use dioxus::prelude::*;
use dioxus_free_icons::Icon;
use dioxus_free_icons::icons::ld_icons::LdUpload;
use docchat_intake::size::format_compact;
use docchat_intake::validate::MAX_FILE_SIZE;
use docchat_intake::{DocumentKind, IncomingFile};
use tracing::warn;
use wasm_bindgen::JsCast;
use web_sys::{File, HtmlInputElement};

use crate::error::{BrowserError, document};
use crate::file::from_file_list;

/// DOM id of the hidden file input.
pub const PICKER_INPUT_ID: &str = "docchat-file-input";

/// Props for the [`FilePicker`] component.
#[derive(Props, Clone, PartialEq)]
pub struct FilePickerProps {
    /// Called with every selected file, in selection order.
    on_files: EventHandler<Vec<IncomingFile<File>>>,
    /// Disable the button while an upload is in flight.
    #[props(default)]
    disabled: bool,
    /// Size ceiling quoted in the hint.
    #[props(default = MAX_FILE_SIZE)]
    max_file_size: u64,
}

/// A button that opens the browser's file chooser.
///
/// Multiple files may be chosen. The `accept` filter only narrows the
/// chooser; every selected file is still validated by the registry.
#[component]
pub fn FilePicker(props: FilePickerProps) -> Element {
    let accept = DocumentKind::accept_attribute();
    let limit = format_compact(props.max_file_size);
    let on_files = props.on_files;

    let open_chooser = move |_| {
        if let Err(e) = picker_input().map(|input| input.click()) {
            warn!(error = %e, "could not open file chooser");
        }
    };

    let handle_change = move |_| match take_selection() {
        Ok(files) if !files.is_empty() => on_files.call(files),
        Ok(_) => {}
        Err(e) => warn!(error = %e, "could not read selected files"),
    };

    rsx! {
        input {
            id: PICKER_INPUT_ID,
            r#type: "file",
            multiple: true,
            accept: "{accept}",
            class: "hidden",
            onchange: handle_change,
        }
        button {
            class: "picker-button",
            disabled: props.disabled,
            onclick: open_chooser,
            Icon { width: 16, height: 16, icon: LdUpload }
            span { "Choose files" }
        }
        p { class: "picker-hint", "PDF, TXT, DOCX up to {limit}" }
    }
}

fn picker_input() -> Result<HtmlInputElement, BrowserError> {
    document()?
        .get_element_by_id(PICKER_INPUT_ID)
        .ok_or_else(|| BrowserError::MissingElement(PICKER_INPUT_ID.to_owned()))?
        .dyn_into::<HtmlInputElement>()
        .map_err(|el| BrowserError::from(wasm_bindgen::JsValue::from(el)))
}

/// Read the selected files and reset the input, so choosing the same
/// file again still fires `change`.
fn take_selection() -> Result<Vec<IncomingFile<File>>, BrowserError> {
    let input = picker_input()?;
    let files = input.files().map(|list| from_file_list(&list)).unwrap_or_default();
    input.set_value("");
    Ok(files)
}
