//! Document-level drag-and-drop listeners.
//!
//! Dioxus only delivers drag events for elements it renders, and its
//! file events do not expose the underlying `web_sys::File`. The intake
//! overlay must react to a drag anywhere in the window, so the listeners
//! are attached to `document` directly and every event is converted into
//! a typed [`DragSignal`] before it reaches application code.
//!
//! Listeners are removed when [`DocumentDragListeners`] is dropped.

use std::rc::Rc;

use docchat_intake::{DropEffect, IncomingFile};
use tracing::debug;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{DataTransfer, DragEvent, EventTarget, File};

use crate::error::{BrowserError, document};
use crate::file::from_file_list;

/// MIME-like type the browser lists in `DataTransfer.types` for files.
const FILES_TYPE: &str = "Files";

/// A drag event, reduced to what the drag session needs.
#[derive(Debug)]
pub enum DragSignal {
    /// `dragenter` reached the document.
    Enter {
        /// Whether the payload contains files.
        carries_files: bool,
    },
    /// `dragleave` reached the document.
    Leave,
    /// `dragover` reached the document.
    Over {
        /// Whether the payload contains files.
        carries_files: bool,
    },
    /// `drop` reached the document, with the dropped files in order.
    Drop(Vec<IncomingFile<File>>),
}

/// Handler for [`DragSignal`]s.
///
/// The returned effect is applied to `dragover` events and ignored for
/// the others.
pub type DragHandler = Rc<dyn Fn(DragSignal) -> DropEffect>;

type Listener = Closure<dyn FnMut(DragEvent)>;

/// Drag listeners attached to `document`.
pub struct DocumentDragListeners {
    target: EventTarget,
    listeners: Vec<(&'static str, Listener)>,
}

impl DocumentDragListeners {
    /// Attach `dragenter`, `dragleave`, `dragover` and `drop` listeners.
    ///
    /// All four call `prevent_default`, so the browser never navigates to
    /// a dropped file.
    ///
    /// # Errors
    ///
    /// Returns a [`BrowserError`] if there is no document or a listener
    /// cannot be added.
    pub fn attach(handler: DragHandler) -> Result<Self, BrowserError> {
        let target: EventTarget = document()?.into();
        let mut this = Self {
            target,
            listeners: Vec::with_capacity(4),
        };

        this.listen("dragenter", Rc::clone(&handler), |event| DragSignal::Enter {
            carries_files: carries_files(event.data_transfer().as_ref()),
        })?;
        this.listen("dragleave", Rc::clone(&handler), |_| DragSignal::Leave)?;
        this.listen("dragover", Rc::clone(&handler), |event| DragSignal::Over {
            carries_files: carries_files(event.data_transfer().as_ref()),
        })?;
        this.listen("drop", handler, |event| {
            DragSignal::Drop(
                event
                    .data_transfer()
                    .and_then(|dt| dt.files())
                    .map(|list| from_file_list(&list))
                    .unwrap_or_default(),
            )
        })?;

        debug!("document drag listeners attached");
        Ok(this)
    }

    fn listen(
        &mut self,
        event_type: &'static str,
        handler: DragHandler,
        convert: fn(&DragEvent) -> DragSignal,
    ) -> Result<(), BrowserError> {
        let listener = Closure::<dyn FnMut(DragEvent)>::new(move |event: DragEvent| {
            event.prevent_default();
            let signal = convert(&event);
            let is_over = matches!(signal, DragSignal::Over { .. });
            let effect = handler(signal);
            if is_over && let Some(dt) = event.data_transfer() {
                dt.set_drop_effect(effect.as_str());
            }
        });
        self.target
            .add_event_listener_with_callback(event_type, listener.as_ref().unchecked_ref())?;
        self.listeners.push((event_type, listener));
        Ok(())
    }
}

impl Drop for DocumentDragListeners {
    fn drop(&mut self) {
        for (event_type, listener) in &self.listeners {
            // The document may already be gone during teardown.
            let _ = self
                .target
                .remove_event_listener_with_callback(event_type, listener.as_ref().unchecked_ref());
        }
        debug!("document drag listeners removed");
    }
}

/// Whether a drag payload contains files rather than text or links.
fn carries_files(data_transfer: Option<&DataTransfer>) -> bool {
    data_transfer.is_some_and(|dt| dt.types().includes(&JsValue::from_str(FILES_TYPE), 0))
}
