//! Preview list of registered files with per-file status.

use dioxus::prelude::*;
use dioxus_free_icons::Icon;
use dioxus_free_icons::icons::ld_icons::{LdFileText, LdX};
use docchat_intake::{CandidateId, CandidateStatus, CandidateView};

/// Props for the [`FilePreviewList`] component.
#[derive(Props, Clone, PartialEq)]
pub struct FilePreviewListProps {
    /// Snapshot of the registry, in insertion order.
    candidates: Vec<CandidateView>,
    /// Whether a batch is in flight.
    busy: bool,
    /// Remove one file.
    on_remove: EventHandler<CandidateId>,
    /// Remove every file.
    on_clear: EventHandler<()>,
    /// Upload every eligible file.
    on_upload: EventHandler<()>,
}

/// Lists registered files with their size, status and any error.
///
/// Uploading rows show a progress bar. Invalid and failed rows keep
/// their reason until removed. The upload button is enabled only when
/// something is eligible and nothing is in flight.
#[component]
pub fn FilePreviewList(props: FilePreviewListProps) -> Element {
    if props.candidates.is_empty() {
        return rsx! {};
    }

    let eligible = props
        .candidates
        .iter()
        .filter(|c| c.status.is_submit_eligible())
        .count();
    let upload_disabled = props.busy || eligible == 0;
    let upload_label = if props.busy {
        "Uploading...".to_owned()
    } else {
        format!("Upload {eligible} file(s)")
    };
    let on_remove = props.on_remove;
    let on_clear = props.on_clear;
    let on_upload = props.on_upload;

    rsx! {
        div { class: "preview-list",
            div { class: "preview-header",
                h2 { "Files ({props.candidates.len()})" }
                button {
                    class: "link-button",
                    disabled: props.busy,
                    onclick: move |_| on_clear.call(()),
                    "Clear all"
                }
            }
            ul {
                for candidate in props.candidates.iter().cloned() {
                    PreviewRow {
                        key: "{candidate.id}",
                        candidate,
                        on_remove,
                    }
                }
            }
            button {
                class: "upload-button",
                disabled: upload_disabled,
                onclick: move |_| on_upload.call(()),
                "{upload_label}"
            }
        }
    }
}

#[component]
fn PreviewRow(candidate: CandidateView, on_remove: EventHandler<CandidateId>) -> Element {
    let status_class = status_class(candidate.status);
    let kind = candidate.kind.map_or("Unknown", |k| k.label());
    let id = candidate.id.clone();

    rsx! {
        li { class: "preview-row {status_class}",
            Icon { width: 20, height: 20, icon: LdFileText }
            div { class: "preview-body",
                p { class: "preview-name", "{candidate.name}" }
                p { class: "preview-meta",
                    "{candidate.size_label} · {kind} · {candidate.status}"
                }
                if candidate.status == CandidateStatus::Uploading {
                    div { class: "progress-track",
                        div {
                            class: "progress-bar",
                            style: "width: {candidate.progress}%",
                        }
                    }
                }
                if let Some(ref message) = candidate.error_message {
                    p { class: "preview-error", "{message}" }
                }
            }
            if candidate.status != CandidateStatus::Uploading {
                button {
                    class: "icon-button",
                    aria_label: "Remove {candidate.name}",
                    onclick: move |_| on_remove.call(id.clone()),
                    Icon { width: 16, height: 16, icon: LdX }
                }
            }
        }
    }
}

const fn status_class(status: CandidateStatus) -> &'static str {
    match status {
        CandidateStatus::Pending | CandidateStatus::Valid => "status-ready",
        CandidateStatus::Invalid | CandidateStatus::Error => "status-failed",
        CandidateStatus::Uploading => "status-uploading",
        CandidateStatus::Success => "status-done",
    }
}
