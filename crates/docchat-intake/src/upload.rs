//! Batch upload orchestration.
//!
//! [`UploadOrchestrator`] owns the single in-flight guard. A submission is
//! split into three steps so the registry is never borrowed across an
//! await point:
//!
//! 1. [`begin`](UploadOrchestrator::begin) checks the guard, moves the
//!    targeted candidates to `uploading` and returns a [`BatchTicket`]
//!    carrying the parts to send.
//! 2. The caller hands the parts to an [`UploadTransport`].
//! 3. [`finish`](UploadOrchestrator::finish) reconciles the registry with
//!    the response (or the transport failure) and produces a
//!    [`BatchReport`].
//!
//! The guard is released when the ticket is dropped, so a batch that
//! fails, or a future that is abandoned mid-flight, never blocks later
//! submissions. [`send`](UploadOrchestrator::send) runs steps 2 and 3 for
//! callers that keep the registry in a [`RegistryCell`]; callers that
//! spawn the upload should call `begin` before spawning, so the guard is
//! held from the moment the submission is accepted.
//! [`submit`](UploadOrchestrator::submit) runs all three steps.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::notice::Notice;
use crate::registry::PreviewRegistry;
use crate::types::{CandidateId, IntakeConfig};
use crate::wire::{
    BatchUploadResponse, OutcomeStatus, ResponseError, SingleUploadResponse, UploadBatchResult,
};

/// Shown when the network could not be reached.
pub const NETWORK_MESSAGE: &str = "Network error. Please check your connection and try again.";
/// Shown when the request timed out.
pub const TIMEOUT_MESSAGE: &str = "Upload timed out. Please try again with smaller files.";
/// Shown when a transport failure carries no usable text.
pub const GENERIC_UPLOAD_MESSAGE: &str = "Failed to upload files. Please try again.";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Coarse classification of a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    /// The server could not be reached.
    Network,
    /// The request exceeded its time limit.
    Timeout,
    /// Anything else.
    Generic,
}

/// The batch request produced no usable response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The request never reached the server.
    #[error("network error: {0}")]
    Network(String),

    /// The request was aborted after the configured timeout.
    #[error("upload request timed out")]
    Timeout,

    /// The server answered with a non-success status.
    #[error("server returned HTTP {status}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Error detail from the response body, possibly empty.
        body: String,
    },

    /// The response body was not a valid upload response.
    #[error("invalid upload response: {0}")]
    Decode(String),

    /// Any other failure, with its message.
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Coarse classification.
    #[must_use]
    pub const fn kind(&self) -> TransportErrorKind {
        match self {
            Self::Network(_) => TransportErrorKind::Network,
            Self::Timeout => TransportErrorKind::Timeout,
            Self::Http { .. } | Self::Decode(_) | Self::Other(_) => TransportErrorKind::Generic,
        }
    }

    /// Text shown to the user and attached to each failed candidate.
    #[must_use]
    pub fn user_message(&self) -> String {
        if let Self::Http { body, .. } = self
            && !body.trim().is_empty()
        {
            return body.clone();
        }
        match self.kind() {
            TransportErrorKind::Network => NETWORK_MESSAGE.to_owned(),
            TransportErrorKind::Timeout => TIMEOUT_MESSAGE.to_owned(),
            TransportErrorKind::Generic => {
                let text = self.to_string();
                if text.trim().is_empty() {
                    GENERIC_UPLOAD_MESSAGE.to_owned()
                } else {
                    text
                }
            }
        }
    }
}

impl From<ResponseError> for TransportError {
    fn from(err: ResponseError) -> Self {
        Self::Decode(err.to_string())
    }
}

/// A submission that could not proceed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    /// Another batch is in flight. Submissions are not queued.
    #[error("Upload already in progress. Please wait.")]
    Conflict,

    /// None of the targeted candidates is submit-eligible.
    #[error("No valid files to upload.")]
    NothingToUpload,

    /// The batch was sent but the transport failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl UploadError {
    /// The transient notice for this error.
    #[must_use]
    pub fn notice(&self, config: &IntakeConfig) -> Notice {
        match self {
            Self::Conflict => Notice::error(self.to_string(), config.conflict_flash),
            Self::NothingToUpload => Notice::warning(self.to_string(), config.skipped_warning),
            Self::Transport(err) => Notice::error(err.user_message(), config.transport_notice),
        }
    }
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// One named file part of an upload request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPart<H> {
    /// Part file name.
    pub filename: String,
    /// Content handle (a reference, not a copy of the bytes).
    pub handle: H,
}

/// Sends upload requests.
///
/// Futures are not required to be `Send`: the browser implementation
/// holds JS values across awaits.
#[async_trait(?Send)]
pub trait UploadTransport<H> {
    /// Send every part in one multi-file request.
    async fn upload_batch(&self, parts: Vec<UploadPart<H>>) -> Result<BatchUploadResponse, TransportError>;

    /// Send one part to the single-file endpoint.
    async fn upload_single(&self, part: UploadPart<H>) -> Result<SingleUploadResponse, TransportError>;
}

/// Shared mutable access to a registry.
///
/// Implemented for `RefCell` here and for reactive signals in the UI.
/// The closure must not call back into the same cell.
pub trait RegistryCell<H> {
    /// Run `f` with exclusive access to the registry.
    fn with_mut<T>(&self, f: impl FnOnce(&mut PreviewRegistry<H>) -> T) -> T;
}

impl<H> RegistryCell<H> for RefCell<PreviewRegistry<H>> {
    fn with_mut<T>(&self, f: impl FnOnce(&mut PreviewRegistry<H>) -> T) -> T {
        f(&mut self.borrow_mut())
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// How a batch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// The server answered; per-file outcomes are authoritative.
    Completed(UploadBatchResult),
    /// The server could not be consulted; every file failed locally.
    TransportFailed(TransportError),
}

/// Aggregate counts of a finished batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchCounts {
    /// Files in the batch.
    pub total: u32,
    /// Files stored.
    pub succeeded: u32,
    /// Files that failed.
    pub failed: u32,
}

/// Everything a consumer needs after a batch finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    ids: Vec<CandidateId>,
    outcome: BatchOutcome,
    notices: Vec<Notice>,
}

impl BatchReport {
    /// Candidates that were part of the batch.
    #[must_use]
    pub fn ids(&self) -> &[CandidateId] {
        &self.ids
    }

    /// How the batch ended.
    #[must_use]
    pub const fn outcome(&self) -> &BatchOutcome {
        &self.outcome
    }

    /// Toasts to show, in order.
    #[must_use]
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Aggregate counts. Taken from the server when it answered;
    /// otherwise every file of the batch counts as failed.
    #[must_use]
    pub fn counts(&self) -> BatchCounts {
        match &self.outcome {
            BatchOutcome::Completed(result) => BatchCounts {
                total: result.total(),
                succeeded: result.succeeded(),
                failed: result.failed(),
            },
            BatchOutcome::TransportFailed(_) => {
                let total = u32::try_from(self.ids.len()).unwrap_or(u32::MAX);
                BatchCounts {
                    total,
                    succeeded: 0,
                    failed: total,
                }
            }
        }
    }

    /// Document id of the first stored file, for the chat to focus.
    #[must_use]
    pub fn first_document_id(&self) -> Option<&str> {
        match &self.outcome {
            BatchOutcome::Completed(result) => result.first_document_id(),
            BatchOutcome::TransportFailed(_) => None,
        }
    }

    /// One-paragraph summary for the chat transcript.
    #[must_use]
    pub fn summary_line(&self) -> String {
        let result = match &self.outcome {
            BatchOutcome::Completed(result) => result,
            BatchOutcome::TransportFailed(err) => {
                return format!("Failed to upload files. {}", err.user_message());
            }
        };

        let mut line = String::new();
        let stored = result.filenames_with(OutcomeStatus::Success);
        if !stored.is_empty() {
            line.push_str(&format!(
                "Successfully uploaded {} file(s): {}. ",
                stored.len(),
                stored.join(", ")
            ));
        }
        let rejected = result.filenames_with(OutcomeStatus::Error);
        if !rejected.is_empty() {
            line.push_str(&format!(
                "Failed to upload {} file(s): {}. ",
                rejected.len(),
                rejected.join(", ")
            ));
        }
        line.push_str("You can now ask questions about the uploaded documents!");
        line
    }

    /// The server result, or the transport failure as an error.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::Transport`] if the server was not reached.
    pub fn into_result(self) -> Result<UploadBatchResult, UploadError> {
        match self.outcome {
            BatchOutcome::Completed(result) => Ok(result),
            BatchOutcome::TransportFailed(err) => Err(UploadError::Transport(err)),
        }
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct InFlightGuard(Rc<Cell<bool>>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// A batch that has been started but not finished.
///
/// Holds the in-flight guard; dropping the ticket releases it.
#[derive(Debug)]
pub struct BatchTicket<H> {
    ids: Vec<CandidateId>,
    parts: Vec<UploadPart<H>>,
    single: bool,
    _guard: InFlightGuard,
}

impl<H> BatchTicket<H> {
    /// Candidates moved to `uploading` for this batch.
    #[must_use]
    pub fn ids(&self) -> &[CandidateId] {
        &self.ids
    }

    /// Number of files in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Always `false`: a ticket is only issued for a non-empty batch.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Whether the ticket targets the single-file endpoint.
    #[must_use]
    pub const fn is_single(&self) -> bool {
        self.single
    }

    /// Take the parts to send, leaving the ticket (and guard) in place.
    pub fn take_parts(&mut self) -> Vec<UploadPart<H>> {
        std::mem::take(&mut self.parts)
    }
}

/// Runs batch uploads one at a time.
///
/// Clones share the in-flight guard.
#[derive(Debug, Clone, Default)]
pub struct UploadOrchestrator {
    in_flight: Rc<Cell<bool>>,
    config: IntakeConfig,
}

impl UploadOrchestrator {
    /// Create an idle orchestrator.
    #[must_use]
    pub fn new(config: IntakeConfig) -> Self {
        Self {
            in_flight: Rc::new(Cell::new(false)),
            config,
        }
    }

    /// Pipeline configuration.
    #[must_use]
    pub const fn config(&self) -> &IntakeConfig {
        &self.config
    }

    /// Whether a batch is in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.in_flight.get()
    }

    /// Start a batch for the submit-eligible candidates among `ids`.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::Conflict`] if a batch is already in flight,
    /// or [`UploadError::NothingToUpload`] if no targeted candidate is
    /// eligible. The registry is untouched in both cases.
    pub fn begin<H: Clone>(
        &self,
        registry: &mut PreviewRegistry<H>,
        ids: &[CandidateId],
    ) -> Result<BatchTicket<H>, UploadError> {
        if self.is_busy() {
            warn!("rejected submission while a batch is in flight");
            return Err(UploadError::Conflict);
        }

        let moved = registry.mark_uploading(ids);
        if moved.is_empty() {
            return Err(UploadError::NothingToUpload);
        }

        let parts = registry
            .iter()
            .filter(|c| moved.contains(c.id()))
            .map(|c| UploadPart {
                filename: c.name().to_owned(),
                handle: c.handle().clone(),
            })
            .collect();

        self.in_flight.set(true);
        info!(files = moved.len(), "upload batch started");
        Ok(BatchTicket {
            ids: moved,
            parts,
            single: false,
            _guard: InFlightGuard(Rc::clone(&self.in_flight)),
        })
    }

    /// Start a single-file upload of `id`.
    ///
    /// # Errors
    ///
    /// Same as [`begin`](Self::begin).
    pub fn begin_single<H: Clone>(
        &self,
        registry: &mut PreviewRegistry<H>,
        id: &CandidateId,
    ) -> Result<BatchTicket<H>, UploadError> {
        let mut ticket = self.begin(registry, std::slice::from_ref(id))?;
        ticket.single = true;
        Ok(ticket)
    }

    /// Finish a multi-file batch with the transport's answer.
    pub fn finish<H>(
        &self,
        registry: &mut PreviewRegistry<H>,
        ticket: BatchTicket<H>,
        response: Result<BatchUploadResponse, TransportError>,
    ) -> BatchReport {
        let result = response.and_then(|r| UploadBatchResult::try_from(r).map_err(TransportError::from));
        self.settle(registry, ticket, result, |registry, _, result| {
            registry.apply_batch_result(result);
        })
    }

    /// Finish a single-file batch with the transport's answer.
    ///
    /// The ticket's candidate is settled directly; the file name the
    /// server echoes back is not used for matching.
    pub fn finish_single<H>(
        &self,
        registry: &mut PreviewRegistry<H>,
        ticket: BatchTicket<H>,
        response: Result<SingleUploadResponse, TransportError>,
    ) -> BatchReport {
        let result = response.map(UploadBatchResult::from);
        self.settle(registry, ticket, result, |registry, ids, result| {
            for (id, outcome) in ids.iter().zip(result.per_file()) {
                registry.apply_result(id, outcome);
            }
        })
    }

    fn settle<H>(
        &self,
        registry: &mut PreviewRegistry<H>,
        ticket: BatchTicket<H>,
        result: Result<UploadBatchResult, TransportError>,
        reconcile: impl FnOnce(&mut PreviewRegistry<H>, &[CandidateId], &UploadBatchResult),
    ) -> BatchReport {
        let mut notices = Vec::new();
        let outcome = match result {
            Ok(result) => {
                reconcile(registry, &ticket.ids, &result);
                info!(
                    total = result.total(),
                    succeeded = result.succeeded(),
                    failed = result.failed(),
                    "upload batch finished"
                );
                if result.succeeded() > 0 {
                    notices.push(Notice::success(
                        format!(
                            "Successfully uploaded {} of {} files",
                            result.succeeded(),
                            result.total()
                        ),
                        self.config.success_notice,
                    ));
                }
                if result.failed() > 0 {
                    notices.push(Notice::error(
                        format!(
                            "Failed to upload {} files. Check the upload status for details.",
                            result.failed()
                        ),
                        self.config.failure_notice,
                    ));
                }
                BatchOutcome::Completed(result)
            }
            Err(err) => {
                warn!(error = %err, files = ticket.len(), "upload batch failed");
                let message = err.user_message();
                registry.fail_uploading(&ticket.ids, &message);
                notices.push(Notice::error(message, self.config.transport_notice));
                BatchOutcome::TransportFailed(err)
            }
        };

        let BatchTicket { ids, .. } = ticket;
        BatchReport {
            ids,
            outcome,
            notices,
        }
    }

    /// Submit the targeted candidates as one batch and wait for the result.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::Conflict`] or [`UploadError::NothingToUpload`]
    /// without sending anything. Transport failures are not errors here:
    /// they are reported through [`BatchOutcome::TransportFailed`].
    #[allow(clippy::future_not_send)]
    pub async fn submit<H, R, T>(
        &self,
        registry: &R,
        transport: &T,
        ids: &[CandidateId],
    ) -> Result<BatchReport, UploadError>
    where
        H: Clone,
        R: RegistryCell<H> + ?Sized,
        T: UploadTransport<H> + ?Sized,
    {
        let ticket = registry.with_mut(|r| self.begin(r, ids))?;
        Ok(self.send(registry, transport, ticket).await)
    }

    /// Submit one candidate to the single-file endpoint.
    ///
    /// # Errors
    ///
    /// Same as [`submit`](Self::submit).
    #[allow(clippy::future_not_send)]
    pub async fn submit_single<H, R, T>(
        &self,
        registry: &R,
        transport: &T,
        id: &CandidateId,
    ) -> Result<BatchReport, UploadError>
    where
        H: Clone,
        R: RegistryCell<H> + ?Sized,
        T: UploadTransport<H> + ?Sized,
    {
        let ticket = registry.with_mut(|r| self.begin_single(r, id))?;
        Ok(self.send(registry, transport, ticket).await)
    }

    /// Send a started batch and reconcile the registry with the answer.
    ///
    /// Single-file tickets go to the single-file endpoint, everything
    /// else to the batch endpoint. The guard is released when this
    /// returns.
    #[allow(clippy::future_not_send)]
    pub async fn send<H, R, T>(&self, registry: &R, transport: &T, mut ticket: BatchTicket<H>) -> BatchReport
    where
        R: RegistryCell<H> + ?Sized,
        T: UploadTransport<H> + ?Sized,
    {
        let mut parts = ticket.take_parts();
        if ticket.single
            && let Some(part) = parts.pop()
        {
            let response = transport.upload_single(part).await;
            registry.with_mut(|r| self.finish_single(r, ticket, response))
        } else {
            let response = transport.upload_batch(parts).await;
            registry.with_mut(|r| self.finish(r, ticket, response))
        }
    }

    /// Advance simulated progress by one tick.
    pub fn tick<H>(&self, registry: &mut PreviewRegistry<H>) -> bool {
        registry.tick_progress(
            self.config.progress_start,
            self.config.progress_step,
            self.config.progress_cap,
        )
    }

    /// Remove the settled candidates of a finished batch.
    ///
    /// Call after [`IntakeConfig::settled_display`] has elapsed.
    pub fn expire_settled<H>(&self, registry: &mut PreviewRegistry<H>, report: &BatchReport) -> usize {
        registry.expire(report.ids(), self.config.expire_errors)
    }
}
