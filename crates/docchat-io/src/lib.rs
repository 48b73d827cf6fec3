//! docchat-io: Browser I/O and Dioxus component library.
//!
//! Converts browser `File` objects into intake metadata, listens for
//! window-wide drag-and-drop, uploads batches with `fetch`, and provides
//! the UI components for the docchat intake.

pub mod components;
pub mod drag;
pub mod error;
pub mod file;
pub mod registry_signal;
pub mod transport;

pub use components::{ActiveNotice, DropOverlay, FilePicker, FilePreviewList, NoticeStack};
pub use drag::{DocumentDragListeners, DragHandler, DragSignal};
pub use error::BrowserError;
pub use registry_signal::SignalRegistry;
pub use transport::{FetchTransport, TransportConfig};
