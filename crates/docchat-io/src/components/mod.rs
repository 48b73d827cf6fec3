//! Dioxus UI components for the docchat file intake.
//!
//! Provides the file picker button, the full-window drop overlay, the
//! preview list with per-file status, and the notice (toast) stack.

mod notices;
mod overlay;
mod picker;
mod preview_list;

pub use notices::{ActiveNotice, NoticeStack};
pub use overlay::DropOverlay;
pub use picker::{FilePicker, PICKER_INPUT_ID};
pub use preview_list::FilePreviewList;
