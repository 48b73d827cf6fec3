//! docchat-intake: Client-side file intake pipeline (sans-IO).
//!
//! Takes files the user selects or drops on the window and carries them
//! through validation, preview and a batch upload:
//!
//! - [`Validator`] accepts PDF, plain text and DOCX files up to a size
//!   ceiling.
//! - [`PreviewRegistry`] holds the ordered, deduplicated candidates and
//!   their forward-only status.
//! - [`DragSession`] turns nested enter/leave events into one steady
//!   "dragging" signal and classifies drops.
//! - [`UploadOrchestrator`] sends one batch at a time and reconciles the
//!   registry with the server's per-file outcome.
//!
//! This crate has **no I/O dependencies**. File contents travel as an
//! opaque handle type `H`, and the network is reached through the
//! [`UploadTransport`] trait. All browser interaction lives in
//! `docchat-io`.

pub mod drag;
pub mod notice;
pub mod registry;
pub mod size;
pub mod types;
pub mod upload;
pub mod validate;
pub mod wire;

pub use drag::{DragPhase, DragSession, DropEffect, DropOutcome, DropRejection, DroppedFiles, Flash, FlashToken};
pub use notice::{Notice, NoticeLevel};
pub use registry::{AddSummary, Candidate, CandidateView, PreviewRegistry, StatusCounts};
pub use size::format_file_size;
pub use types::{CandidateId, CandidateStatus, DocumentKind, FileMeta, IncomingFile, IntakeConfig};
pub use upload::{
    BatchCounts, BatchOutcome, BatchReport, BatchTicket, RegistryCell, TransportError, TransportErrorKind,
    UploadError, UploadOrchestrator, UploadPart, UploadTransport,
};
pub use validate::{Partition, RejectReason, Validator};
pub use wire::{
    BatchUploadResponse, FileUploadResult, OutcomeStatus, ResponseError, SingleUploadResponse, UploadBatchResult,
};
