//! Errors from browser API calls.

use wasm_bindgen::{JsCast, JsValue};

/// A browser API call failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BrowserError {
    /// `window` is not available (not running in a browser).
    #[error("no global window")]
    NoWindow,

    /// `window.document` is not available.
    #[error("no document")]
    NoDocument,

    /// An element expected in the page is missing.
    #[error("element #{0} not found")]
    MissingElement(String),

    /// A browser API returned an error.
    #[error("browser API error: {0}")]
    Js(String),
}

impl From<JsValue> for BrowserError {
    fn from(value: JsValue) -> Self {
        Self::Js(js_message(&value))
    }
}

/// Best-effort human-readable text of a thrown JS value.
#[must_use]
pub fn js_message(value: &JsValue) -> String {
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

/// The global `window`.
///
/// # Errors
///
/// Returns [`BrowserError::NoWindow`] outside a browser.
pub fn window() -> Result<web_sys::Window, BrowserError> {
    web_sys::window().ok_or(BrowserError::NoWindow)
}

/// The global `document`.
///
/// # Errors
///
/// Returns [`BrowserError::NoWindow`] or [`BrowserError::NoDocument`].
pub fn document() -> Result<web_sys::Document, BrowserError> {
    window()?.document().ok_or(BrowserError::NoDocument)
}
