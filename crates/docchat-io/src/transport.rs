//! `fetch`-based upload transport.
//!
//! [`FetchTransport`] posts `multipart/form-data` bodies built with
//! `FormData`, so file contents stream from the browser's blob store
//! without being copied into WASM memory. A timer aborts the request
//! through an `AbortController` once [`TransportConfig::timeout`] has
//! elapsed.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use docchat_intake::{BatchUploadResponse, SingleUploadResponse, TransportError, UploadPart, UploadTransport};
use gloo_timers::callback::Timeout;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{AbortController, File, FormData, RequestCredentials, RequestInit, Response};

use crate::error::js_message;

/// Form field carrying each file of a batch request.
pub const BATCH_FIELD: &str = "files";
/// Form field carrying the file of a single-file request.
pub const SINGLE_FIELD: &str = "file";

/// Where and how uploads are sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// API origin, e.g. `http://localhost:8000`.
    pub base_url: String,
    /// Path of the multi-file endpoint.
    pub batch_path: String,
    /// Path of the single-file endpoint.
    pub single_path: String,
    /// Requests are aborted after this long.
    pub timeout: Duration,
    /// Send cookies with cross-origin requests.
    pub with_credentials: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_owned(),
            batch_path: "/upload/multiple".to_owned(),
            single_path: "/upload".to_owned(),
            timeout: Duration::from_secs(60),
            with_credentials: true,
        }
    }
}

impl TransportConfig {
    /// Full URL of the multi-file endpoint.
    #[must_use]
    pub fn batch_url(&self) -> String {
        join_url(&self.base_url, &self.batch_path)
    }

    /// Full URL of the single-file endpoint.
    #[must_use]
    pub fn single_url(&self) -> String {
        join_url(&self.base_url, &self.single_path)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Pull the `detail` field out of an error body, as FastAPI-style
/// backends report it. Returns an empty string when absent.
fn error_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_owned))
        .unwrap_or_default()
}

/// Uploads files with `window.fetch`.
#[derive(Debug, Clone, Default)]
pub struct FetchTransport {
    config: TransportConfig,
}

impl FetchTransport {
    /// Create a transport.
    #[must_use]
    pub const fn new(config: TransportConfig) -> Self {
        Self { config }
    }

    /// Transport configuration.
    #[must_use]
    pub const fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// POST `form` to `url` and return the response body text.
    #[allow(clippy::future_not_send)]
    async fn post_form(&self, url: &str, form: &FormData) -> Result<String, TransportError> {
        let window = web_sys::window().ok_or_else(|| TransportError::Other("no global window".into()))?;
        let controller = AbortController::new().map_err(|e| TransportError::Other(js_message(&e)))?;

        let init = RequestInit::new();
        init.set_method("POST");
        init.set_body(form);
        init.set_signal(Some(&controller.signal()));
        if self.config.with_credentials {
            init.set_credentials(RequestCredentials::Include);
        }

        let timed_out = Rc::new(Cell::new(false));
        let _timer = {
            let timed_out = Rc::clone(&timed_out);
            let controller = controller.clone();
            let millis = u32::try_from(self.config.timeout.as_millis()).unwrap_or(u32::MAX);
            Timeout::new(millis, move || {
                timed_out.set(true);
                controller.abort();
            })
        };
        let classify = |err: &wasm_bindgen::JsValue| {
            if timed_out.get() {
                TransportError::Timeout
            } else {
                TransportError::Network(js_message(err))
            }
        };

        debug!(url, "sending upload request");
        let response: Response = JsFuture::from(window.fetch_with_str_and_init(url, &init))
            .await
            .map_err(|e| classify(&e))?
            .dyn_into()
            .map_err(|_| TransportError::Other("fetch did not return a Response".into()))?;

        let text_promise = response
            .text()
            .map_err(|e| TransportError::Other(js_message(&e)))?;
        let body = JsFuture::from(text_promise)
            .await
            .map_err(|e| classify(&e))?
            .as_string()
            .unwrap_or_default();

        if !response.ok() {
            warn!(status = response.status(), "upload request rejected");
            return Err(TransportError::Http {
                status: response.status(),
                body: error_detail(&body),
            });
        }
        Ok(body)
    }
}

fn append_file(form: &FormData, field: &str, part: &UploadPart<File>) -> Result<(), TransportError> {
    form.append_with_blob_and_filename(field, &part.handle, &part.filename)
        .map_err(|e| TransportError::Other(js_message(&e)))
}

fn new_form() -> Result<FormData, TransportError> {
    FormData::new().map_err(|e| TransportError::Other(js_message(&e)))
}

#[async_trait(?Send)]
impl UploadTransport<File> for FetchTransport {
    async fn upload_batch(&self, parts: Vec<UploadPart<File>>) -> Result<BatchUploadResponse, TransportError> {
        let form = new_form()?;
        for part in &parts {
            append_file(&form, BATCH_FIELD, part)?;
        }
        let body = self.post_form(&self.config.batch_url(), &form).await?;
        serde_json::from_str(&body).map_err(|e| TransportError::Decode(e.to_string()))
    }

    async fn upload_single(&self, part: UploadPart<File>) -> Result<SingleUploadResponse, TransportError> {
        let form = new_form()?;
        append_file(&form, SINGLE_FIELD, &part)?;
        let body = self.post_form(&self.config.single_url(), &form).await?;
        serde_json::from_str(&body).map_err(|e| TransportError::Decode(e.to_string()))
    }
}
