//! Stack of transient notices (toasts).

use dioxus::prelude::*;
use dioxus_free_icons::Icon;
use dioxus_free_icons::icons::ld_icons::LdX;
use docchat_intake::{Notice, NoticeLevel};

/// A notice currently on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveNotice {
    /// Unique per notice, used to dismiss it.
    pub id: u64,
    /// The notice.
    pub notice: Notice,
}

/// Props for the [`NoticeStack`] component.
#[derive(Props, Clone, PartialEq)]
pub struct NoticeStackProps {
    /// Notices to show, oldest first.
    notices: Vec<ActiveNotice>,
    /// Dismiss a notice before its timer runs out.
    on_dismiss: EventHandler<u64>,
}

/// Renders notices in the corner of the window.
///
/// Expiry is driven by the owner; this component only renders and
/// reports manual dismissal.
#[component]
pub fn NoticeStack(props: NoticeStackProps) -> Element {
    let on_dismiss = props.on_dismiss;
    rsx! {
        div { class: "notice-stack", aria_live: "polite",
            {props.notices.into_iter().map(|active| {
                let class = level_class(active.notice.level);
                let id = active.id;
                rsx! {
                    div { key: "{id}", class: "notice {class}", role: "status",
                        span { "{active.notice.message}" }
                        button {
                            class: "icon-button",
                            aria_label: "Dismiss",
                            onclick: move |_| on_dismiss.call(id),
                            Icon { width: 14, height: 14, icon: LdX }
                        }
                    }
                }
            })}
        }
    }
}

const fn level_class(level: NoticeLevel) -> &'static str {
    match level {
        NoticeLevel::Success => "notice-success",
        NoticeLevel::Warning => "notice-warning",
        NoticeLevel::Error => "notice-error",
    }
}
