//! Full-window drop overlay.

use dioxus::prelude::*;
use dioxus_free_icons::Icon;
use dioxus_free_icons::icons::ld_icons::{LdCheck, LdUpload, LdX};
use docchat_intake::DragPhase;
use docchat_intake::size::format_compact;
use docchat_intake::validate::MAX_FILE_SIZE;

/// Props for the [`DropOverlay`] component.
#[derive(Props, Clone, PartialEq)]
pub struct DropOverlayProps {
    /// Current drag session phase.
    phase: DragPhase,
    /// Message for [`DragPhase::ErrorFlash`].
    #[props(default)]
    error: Option<String>,
    /// Size ceiling quoted in the hint.
    #[props(default = MAX_FILE_SIZE)]
    max_file_size: u64,
}

/// Covers the window while files are dragged over it, and briefly after
/// a drop to confirm or explain the outcome.
///
/// Renders nothing while idle. The overlay never intercepts pointer
/// events; drag events are handled at the document level.
#[component]
pub fn DropOverlay(props: DropOverlayProps) -> Element {
    let class = overlay_class(props.phase);
    let limit = format_compact(props.max_file_size);
    match props.phase {
        DragPhase::Idle => rsx! {},
        DragPhase::Dragging => rsx! {
            div { class: "{class}",
                Icon { width: 48, height: 48, icon: LdUpload }
                p { class: "overlay-title", "Drop files to upload" }
                p { class: "overlay-hint", "PDF, TXT, DOCX up to {limit}" }
            }
        },
        DragPhase::SuccessFlash => rsx! {
            div { class: "{class}",
                Icon { width: 48, height: 48, icon: LdCheck }
                p { class: "overlay-title", "Files added" }
            }
        },
        DragPhase::ErrorFlash => {
            let message = props.error.unwrap_or_default();
            rsx! {
                div { class: "{class}", role: "alert",
                    Icon { width: 48, height: 48, icon: LdX }
                    p { class: "overlay-title", "{message}" }
                }
            }
        }
    }
}

const fn overlay_class(phase: DragPhase) -> &'static str {
    match phase {
        DragPhase::Idle => "drop-overlay hidden",
        DragPhase::Dragging => "drop-overlay drop-overlay-dragging",
        DragPhase::SuccessFlash => "drop-overlay drop-overlay-success",
        DragPhase::ErrorFlash => "drop-overlay drop-overlay-error",
    }
}
