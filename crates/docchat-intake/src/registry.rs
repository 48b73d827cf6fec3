//! Ordered, deduplicated collection of file candidates.
//!
//! The [`PreviewRegistry`] is the single source of truth for what the
//! user has queued. Every candidate carries a [`CandidateStatus`] that
//! only moves forward; every mutation goes through a method here so the
//! state machine and the "no duplicate ids" invariant hold at all times.
//!
//! Validation happens when a file is added, not when it is submitted, so
//! the preview list can show rejected files with their reason right away.

use serde::Serialize;
use tracing::{debug, warn};

use crate::size::format_file_size;
use crate::types::{CandidateId, CandidateStatus, DocumentKind, FileMeta, IncomingFile};
use crate::validate::{Validator, detect_kind};
use crate::wire::{FileUploadResult, OutcomeStatus, UploadBatchResult};

/// Message for a candidate that was uploading but missing from the
/// server's result list.
pub const MISSING_RESULT_MESSAGE: &str = "Upload failed: the server returned no result for this file.";

/// Fallback message for a server-side error without a reason.
pub const UNSPECIFIED_ERROR_MESSAGE: &str = "Upload failed";

/// A file tracked by the registry.
#[derive(Debug, Clone)]
pub struct Candidate<H> {
    id: CandidateId,
    meta: FileMeta,
    kind: Option<DocumentKind>,
    handle: H,
    status: CandidateStatus,
    error_message: Option<String>,
    progress: u8,
    document_id: Option<String>,
}

impl<H> Candidate<H> {
    fn new(file: IncomingFile<H>) -> Self {
        Self {
            id: file.meta.candidate_id(),
            kind: detect_kind(&file.meta),
            meta: file.meta,
            handle: file.handle,
            status: CandidateStatus::Pending,
            error_message: None,
            progress: 0,
            document_id: None,
        }
    }

    /// Deduplication key.
    #[must_use]
    pub const fn id(&self) -> &CandidateId {
        &self.id
    }

    /// File metadata.
    #[must_use]
    pub const fn meta(&self) -> &FileMeta {
        &self.meta
    }

    /// File name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.meta.name
    }

    /// Detected document kind, if the type is recognized.
    #[must_use]
    pub const fn kind(&self) -> Option<DocumentKind> {
        self.kind
    }

    /// The content handle.
    #[must_use]
    pub const fn handle(&self) -> &H {
        &self.handle
    }

    /// Current lifecycle status.
    #[must_use]
    pub const fn status(&self) -> CandidateStatus {
        self.status
    }

    /// Reason for `Invalid` or `Error`; `None` in every other status.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Upload progress, 0-100. Only meaningful while uploading.
    #[must_use]
    pub const fn progress(&self) -> u8 {
        self.progress
    }

    /// Server document id after a successful upload.
    #[must_use]
    pub fn document_id(&self) -> Option<&str> {
        self.document_id.as_deref()
    }

    /// A handle-free snapshot for rendering.
    #[must_use]
    pub fn view(&self) -> CandidateView {
        CandidateView {
            id: self.id.clone(),
            name: self.meta.name.clone(),
            size: self.meta.size,
            size_label: format_file_size(self.meta.size),
            kind: self.kind,
            status: self.status,
            error_message: self.error_message.clone(),
            progress: self.progress,
            document_id: self.document_id.clone(),
        }
    }

    /// Move to `next` if the step is legal. Returns whether it moved.
    fn advance(&mut self, next: CandidateStatus) -> bool {
        if !self.status.can_transition_to(next) {
            warn!(id = %self.id, from = ?self.status, to = ?next, "ignored illegal candidate transition");
            return false;
        }
        self.status = next;
        if !next.is_failure() {
            self.error_message = None;
        }
        true
    }

    fn fail(&mut self, message: impl Into<String>) -> bool {
        if !self.advance(CandidateStatus::Error) {
            return false;
        }
        self.error_message = Some(message.into());
        self.progress = 0;
        true
    }

    fn settle(&mut self, result: &FileUploadResult) -> bool {
        match result.status {
            OutcomeStatus::Success => {
                if !self.advance(CandidateStatus::Success) {
                    return false;
                }
                self.document_id.clone_from(&result.document_id);
                self.progress = 100;
                true
            }
            OutcomeStatus::Error => self.fail(
                result
                    .error_message
                    .as_deref()
                    .filter(|m| !m.is_empty())
                    .unwrap_or(UNSPECIFIED_ERROR_MESSAGE),
            ),
        }
    }
}

/// Render-ready copy of a candidate without its content handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateView {
    /// Deduplication key.
    pub id: CandidateId,
    /// File name.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Human-readable size.
    pub size_label: String,
    /// Detected kind, if recognized.
    pub kind: Option<DocumentKind>,
    /// Lifecycle status.
    pub status: CandidateStatus,
    /// Reason for `Invalid` or `Error`.
    pub error_message: Option<String>,
    /// Upload progress, 0-100.
    pub progress: u8,
    /// Server document id after success.
    pub document_id: Option<String>,
}

/// What happened to each file passed to [`PreviewRegistry::add`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddSummary {
    /// Ids of newly inserted candidates, in input order.
    pub added: Vec<CandidateId>,
    /// Ids skipped because they were already registered.
    pub duplicates: Vec<CandidateId>,
    /// How many of the inserted candidates failed validation.
    pub invalid: usize,
}

/// Number of candidates in each status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    /// `Pending` candidates.
    pub pending: usize,
    /// `Valid` candidates.
    pub valid: usize,
    /// `Invalid` candidates.
    pub invalid: usize,
    /// `Uploading` candidates.
    pub uploading: usize,
    /// `Success` candidates.
    pub success: usize,
    /// `Error` candidates.
    pub error: usize,
}

/// In-memory ordered registry of file candidates.
///
/// `H` is the content handle type: a browser `File` in the web client,
/// a path in the CLI, bytes in tests.
#[derive(Debug, Clone)]
pub struct PreviewRegistry<H> {
    entries: Vec<Candidate<H>>,
    validator: Validator,
}

impl<H> Default for PreviewRegistry<H> {
    fn default() -> Self {
        Self::new(Validator::default())
    }
}

impl<H> PreviewRegistry<H> {
    /// Create an empty registry validating with `validator`.
    #[must_use]
    pub const fn new(validator: Validator) -> Self {
        Self {
            entries: Vec::new(),
            validator,
        }
    }

    /// Register files, validating each one immediately.
    ///
    /// Files whose id is already present (including earlier files of the
    /// same call) are skipped silently. Accepted files become `Valid`,
    /// rejected ones `Invalid` with the rejection reason.
    pub fn add(&mut self, files: impl IntoIterator<Item = IncomingFile<H>>) -> AddSummary {
        let mut summary = AddSummary::default();
        for file in files {
            let mut candidate = Candidate::new(file);
            if self.contains(&candidate.id) {
                debug!(id = %candidate.id, "skipped duplicate candidate");
                summary.duplicates.push(candidate.id);
                continue;
            }

            match self.validator.validate(&candidate.meta) {
                Ok(kind) => {
                    candidate.kind = Some(kind);
                    candidate.advance(CandidateStatus::Valid);
                }
                Err(reason) => {
                    candidate.advance(CandidateStatus::Invalid);
                    candidate.error_message = Some(reason.to_string());
                    summary.invalid += 1;
                }
            }

            debug!(id = %candidate.id, status = ?candidate.status, "registered candidate");
            summary.added.push(candidate.id.clone());
            self.entries.push(candidate);
        }
        summary
    }

    /// Remove a candidate regardless of its status.
    ///
    /// Returns the removed candidate, or `None` if the id was absent.
    pub fn remove(&mut self, id: &CandidateId) -> Option<Candidate<H>> {
        let index = self.entries.iter().position(|c| &c.id == id)?;
        debug!(%id, "removed candidate");
        Some(self.entries.remove(index))
    }

    /// Remove every candidate.
    pub fn clear(&mut self) {
        debug!(count = self.entries.len(), "cleared registry");
        self.entries.clear();
    }

    /// Move the submit-eligible candidates among `ids` to `Uploading`.
    ///
    /// `Pending` and `Valid` candidates move and have their progress
    /// reset to 0; all others are left untouched. Returns the ids that
    /// moved, in registry order.
    pub fn mark_uploading(&mut self, ids: &[CandidateId]) -> Vec<CandidateId> {
        let mut moved = Vec::new();
        for candidate in self.entries.iter_mut().filter(|c| ids.contains(&c.id)) {
            if !candidate.status.is_submit_eligible() {
                debug!(id = %candidate.id, status = ?candidate.status, "not submit-eligible");
                continue;
            }
            if candidate.advance(CandidateStatus::Uploading) {
                candidate.progress = 0;
                moved.push(candidate.id.clone());
            }
        }
        moved
    }

    /// Reconcile every `Uploading` candidate with a batch result.
    ///
    /// Candidates are matched to results by file name. Each result entry
    /// is used at most once, in server order, so two uploading files with
    /// the same name receive distinct results. An uploading candidate
    /// with no matching entry fails with [`MISSING_RESULT_MESSAGE`].
    ///
    /// Returns the ids that changed status.
    pub fn apply_batch_result(&mut self, result: &UploadBatchResult) -> Vec<CandidateId> {
        let per_file = result.per_file();
        let mut consumed = vec![false; per_file.len()];
        let mut changed = Vec::new();

        for candidate in self
            .entries
            .iter_mut()
            .filter(|c| c.status == CandidateStatus::Uploading)
        {
            let slot = per_file
                .iter()
                .enumerate()
                .position(|(i, r)| !consumed[i] && r.filename == candidate.meta.name);

            let moved = if let Some(i) = slot {
                consumed[i] = true;
                candidate.settle(&per_file[i])
            } else {
                warn!(id = %candidate.id, "batch result has no entry for uploading file");
                candidate.fail(MISSING_RESULT_MESSAGE)
            };
            if moved {
                changed.push(candidate.id.clone());
            }
        }
        changed
    }

    /// Reconcile the `Uploading` candidate `id` with `outcome`.
    ///
    /// The outcome's file name is not compared, so a server that renames
    /// the file still settles the right candidate. Returns whether the
    /// candidate moved.
    pub fn apply_result(&mut self, id: &CandidateId, outcome: &FileUploadResult) -> bool {
        self.entries
            .iter_mut()
            .find(|c| &c.id == id && c.status == CandidateStatus::Uploading)
            .is_some_and(|c| c.settle(outcome))
    }

    /// Fail the `Uploading` candidates among `ids` with `message`.
    ///
    /// Used when the server could not be consulted at all. Returns how
    /// many candidates moved.
    pub fn fail_uploading(&mut self, ids: &[CandidateId], message: &str) -> usize {
        self.entries
            .iter_mut()
            .filter(|c| c.status == CandidateStatus::Uploading && ids.contains(&c.id))
            .map(|c| c.fail(message))
            .filter(|moved| *moved)
            .count()
    }

    /// Advance simulated progress on every `Uploading` candidate.
    ///
    /// A candidate below `start` jumps to `start`; otherwise it gains
    /// `step`, never exceeding `cap`. Returns whether anything changed.
    pub fn tick_progress(&mut self, start: u8, step: u8, cap: u8) -> bool {
        let mut changed = false;
        for candidate in self
            .entries
            .iter_mut()
            .filter(|c| c.status == CandidateStatus::Uploading)
        {
            let next = if candidate.progress < start {
                start.min(cap)
            } else {
                candidate.progress.saturating_add(step).min(cap)
            };
            if next > candidate.progress {
                candidate.progress = next;
                changed = true;
            }
        }
        changed
    }

    /// Remove settled candidates of a finished batch.
    ///
    /// Only candidates among `ids` that are `Success` (or `Error` when
    /// `include_errors` is set) are removed. Returns how many were removed.
    pub fn expire(&mut self, ids: &[CandidateId], include_errors: bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|c| {
            let expirable = c.status == CandidateStatus::Success
                || (include_errors && c.status == CandidateStatus::Error);
            !(expirable && ids.contains(&c.id))
        });
        let removed = before - self.entries.len();
        if removed > 0 {
            debug!(removed, "expired settled candidates");
        }
        removed
    }

    /// Whether a candidate with this id is registered.
    #[must_use]
    pub fn contains(&self, id: &CandidateId) -> bool {
        self.entries.iter().any(|c| &c.id == id)
    }

    /// Look up a candidate by id.
    #[must_use]
    pub fn get(&self, id: &CandidateId) -> Option<&Candidate<H>> {
        self.entries.iter().find(|c| &c.id == id)
    }

    /// Iterate candidates in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Candidate<H>> {
        self.entries.iter()
    }

    /// Number of candidates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no candidates are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ids of candidates that may be submitted, in insertion order.
    #[must_use]
    pub fn submit_eligible_ids(&self) -> Vec<CandidateId> {
        self.entries
            .iter()
            .filter(|c| c.status.is_submit_eligible())
            .map(|c| c.id.clone())
            .collect()
    }

    /// Number of candidates per status.
    #[must_use]
    pub fn counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for candidate in &self.entries {
            let slot = match candidate.status {
                CandidateStatus::Pending => &mut counts.pending,
                CandidateStatus::Valid => &mut counts.valid,
                CandidateStatus::Invalid => &mut counts.invalid,
                CandidateStatus::Uploading => &mut counts.uploading,
                CandidateStatus::Success => &mut counts.success,
                CandidateStatus::Error => &mut counts.error,
            };
            *slot += 1;
        }
        counts
    }

    /// Render-ready snapshot of every candidate, in insertion order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<CandidateView> {
        self.entries.iter().map(Candidate::view).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::wire::BatchUploadResponse;

    fn pdf(name: &str, size: u64) -> IncomingFile<u32> {
        IncomingFile::new(FileMeta::new(name, "application/pdf", size, 1), 0)
    }

    fn png(name: &str) -> IncomingFile<u32> {
        IncomingFile::new(FileMeta::new(name, "image/png", 10, 1), 0)
    }

    fn id(file: &IncomingFile<u32>) -> CandidateId {
        file.meta.candidate_id()
    }

    fn ok(name: &str, doc: &str) -> FileUploadResult {
        FileUploadResult {
            filename: name.into(),
            status: OutcomeStatus::Success,
            document_id: Some(doc.into()),
            error_message: None,
        }
    }

    fn err(name: &str, message: &str) -> FileUploadResult {
        FileUploadResult {
            filename: name.into(),
            status: OutcomeStatus::Error,
            document_id: None,
            error_message: Some(message.into()),
        }
    }

    fn batch(results: Vec<FileUploadResult>) -> UploadBatchResult {
        let total = u32::try_from(results.len()).unwrap();
        let succeeded = u32::try_from(
            results
                .iter()
                .filter(|r| r.status == OutcomeStatus::Success)
                .count(),
        )
        .unwrap();
        UploadBatchResult::try_from(BatchUploadResponse {
            message: String::new(),
            total_files: total,
            successful_uploads: succeeded,
            failed_uploads: total - succeeded,
            results,
        })
        .unwrap()
    }

    // --- add / dedup ---

    #[test]
    fn add_validates_eagerly() {
        let mut registry = PreviewRegistry::default();
        let summary = registry.add([pdf("a.pdf", 5_000_000), png("b.png")]);
        assert_eq!(summary.added.len(), 2);
        assert_eq!(summary.invalid, 1);

        let views = registry.snapshot();
        assert_eq!(views[0].status, CandidateStatus::Valid);
        assert_eq!(views[0].kind, Some(DocumentKind::Pdf));
        assert_eq!(views[0].error_message, None);
        assert_eq!(views[1].status, CandidateStatus::Invalid);
        assert_eq!(
            views[1].error_message.as_deref(),
            Some("File type not supported. Please use PDF, TXT, or DOCX files.")
        );
    }

    #[test]
    fn oversized_pdf_is_invalid_with_sizes_in_reason() {
        let mut registry = PreviewRegistry::default();
        let file = pdf("big.pdf", 15_000_000);
        let key = id(&file);
        registry.add([file]);
        let candidate = registry.get(&key).unwrap();
        assert_eq!(candidate.status(), CandidateStatus::Invalid);
        assert_eq!(candidate.kind(), Some(DocumentKind::Pdf));
        let reason = candidate.error_message().unwrap();
        assert!(reason.contains("10MB") && reason.contains("14.31 MB"), "{reason}");
    }

    #[test]
    fn duplicate_ids_are_skipped_across_calls() {
        let mut registry = PreviewRegistry::default();
        registry.add([pdf("a.pdf", 10)]);
        let summary = registry.add([pdf("a.pdf", 10), pdf("b.pdf", 10)]);
        assert_eq!(summary.added.len(), 1);
        assert_eq!(summary.duplicates, vec![id(&pdf("a.pdf", 10))]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn duplicate_ids_are_skipped_within_one_call() {
        let mut registry = PreviewRegistry::default();
        let summary = registry.add([pdf("a.pdf", 10), pdf("a.pdf", 10)]);
        assert_eq!(summary.added.len(), 1);
        assert_eq!(summary.duplicates.len(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn same_name_different_size_is_a_different_candidate() {
        let mut registry = PreviewRegistry::default();
        registry.add([pdf("a.pdf", 10), pdf("a.pdf", 11)]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn registry_never_holds_equal_ids() {
        let mut registry = PreviewRegistry::default();
        let names = ["a.pdf", "b.pdf", "a.pdf", "c.pdf", "b.pdf", "a.pdf"];
        for (round, name) in names.iter().enumerate() {
            registry.add([pdf(name, 10), pdf(name, 10 + (round as u64 % 2))]);
            let mut ids: Vec<_> = registry.iter().map(|c| c.id().clone()).collect();
            let total = ids.len();
            ids.sort();
            ids.dedup();
            assert_eq!(ids.len(), total);
        }
    }

    // --- remove / clear ---

    #[test]
    fn remove_any_status_and_absent_is_noop() {
        let mut registry = PreviewRegistry::default();
        let good = pdf("a.pdf", 10);
        let bad = png("b.png");
        let (good_id, bad_id) = (id(&good), id(&bad));
        registry.add([good, bad]);

        assert!(registry.remove(&bad_id).is_some());
        assert!(registry.remove(&bad_id).is_none());
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(&good_id));
    }

    #[test]
    fn clear_empties_everything() {
        let mut registry = PreviewRegistry::default();
        let file = pdf("a.pdf", 10);
        let key = id(&file);
        registry.add([file, png("b.png")]);
        registry.mark_uploading(&[key]);
        registry.clear();
        assert!(registry.is_empty());
    }

    // --- mark_uploading ---

    #[test]
    fn mark_uploading_skips_invalid() {
        let mut registry = PreviewRegistry::default();
        let good = pdf("a.pdf", 10);
        let bad = png("b.png");
        let ids = vec![id(&good), id(&bad)];
        registry.add([good, bad]);

        let moved = registry.mark_uploading(&ids);
        assert_eq!(moved, vec![ids[0].clone()]);
        assert_eq!(registry.get(&ids[0]).unwrap().status(), CandidateStatus::Uploading);
        assert_eq!(registry.get(&ids[0]).unwrap().progress(), 0);
        assert_eq!(registry.get(&ids[1]).unwrap().status(), CandidateStatus::Invalid);
    }

    #[test]
    fn mark_uploading_ignores_unknown_and_untargeted() {
        let mut registry = PreviewRegistry::default();
        let a = pdf("a.pdf", 10);
        let b = pdf("b.pdf", 10);
        let a_id = id(&a);
        registry.add([a, b]);
        let moved = registry.mark_uploading(&[a_id.clone(), CandidateId::from_meta(&FileMeta::new("x", "", 0, 0))]);
        assert_eq!(moved, vec![a_id]);
        assert_eq!(registry.counts().valid, 1);
    }

    // --- apply_batch_result ---

    #[test]
    fn partial_failure_is_reconciled_per_file() {
        let mut registry = PreviewRegistry::default();
        registry.add([pdf("a.pdf", 10), pdf("b.pdf", 10), pdf("c.pdf", 10)]);
        let ids = registry.submit_eligible_ids();
        registry.mark_uploading(&ids);

        let changed = registry.apply_batch_result(&batch(vec![
            ok("a.pdf", "doc1"),
            err("b.pdf", "Could not extract text"),
            ok("c.pdf", "doc3"),
        ]));
        assert_eq!(changed.len(), 3);

        let views = registry.snapshot();
        assert_eq!(views[0].status, CandidateStatus::Success);
        assert_eq!(views[0].document_id.as_deref(), Some("doc1"));
        assert_eq!(views[0].progress, 100);
        assert_eq!(views[1].status, CandidateStatus::Error);
        assert_eq!(views[1].error_message.as_deref(), Some("Could not extract text"));
        assert_eq!(views[1].progress, 0);
        assert_eq!(views[2].document_id.as_deref(), Some("doc3"));
    }

    #[test]
    fn uploading_candidate_missing_from_result_fails_generically() {
        let mut registry = PreviewRegistry::default();
        registry.add([pdf("a.pdf", 10), pdf("b.pdf", 10)]);
        let ids = registry.submit_eligible_ids();
        registry.mark_uploading(&ids);

        registry.apply_batch_result(&batch(vec![ok("a.pdf", "doc1")]));
        let b = registry.get(&ids[1]).unwrap();
        assert_eq!(b.status(), CandidateStatus::Error);
        assert_eq!(b.error_message(), Some(MISSING_RESULT_MESSAGE));
    }

    #[test]
    fn direct_result_ignores_renamed_file() {
        let mut registry = PreviewRegistry::default();
        registry.add([pdf("My Report.pdf", 10), pdf("other.pdf", 10)]);
        let ids = registry.submit_eligible_ids();
        registry.mark_uploading(&ids[..1]);

        assert!(registry.apply_result(&ids[0], &ok("My_Report.pdf", "doc1")));
        let report = registry.get(&ids[0]).unwrap();
        assert_eq!(report.status(), CandidateStatus::Success);
        assert_eq!(report.document_id(), Some("doc1"));

        // Not uploading: left alone.
        assert!(!registry.apply_result(&ids[1], &ok("other.pdf", "doc2")));
        assert_eq!(registry.get(&ids[1]).unwrap().status(), CandidateStatus::Valid);
    }

    #[test]
    fn same_named_files_consume_results_in_order() {
        let mut registry = PreviewRegistry::default();
        registry.add([pdf("dup.pdf", 10), pdf("dup.pdf", 20)]);
        let ids = registry.submit_eligible_ids();
        registry.mark_uploading(&ids);

        registry.apply_batch_result(&batch(vec![ok("dup.pdf", "first"), err("dup.pdf", "second failed")]));
        assert_eq!(registry.get(&ids[0]).unwrap().document_id(), Some("first"));
        assert_eq!(
            registry.get(&ids[1]).unwrap().error_message(),
            Some("second failed")
        );
    }

    #[test]
    fn empty_server_error_message_gets_fallback() {
        let mut registry = PreviewRegistry::default();
        registry.add([pdf("a.pdf", 10)]);
        let ids = registry.submit_eligible_ids();
        registry.mark_uploading(&ids);
        registry.apply_batch_result(&batch(vec![err("a.pdf", "")]));
        assert_eq!(
            registry.get(&ids[0]).unwrap().error_message(),
            Some(UNSPECIFIED_ERROR_MESSAGE)
        );
    }

    #[test]
    fn results_only_touch_uploading_candidates() {
        let mut registry = PreviewRegistry::default();
        registry.add([pdf("a.pdf", 10), pdf("b.pdf", 10)]);
        let ids = registry.submit_eligible_ids();
        registry.mark_uploading(&ids[..1]);

        registry.apply_batch_result(&batch(vec![ok("a.pdf", "doc1"), ok("b.pdf", "doc2")]));
        assert_eq!(registry.get(&ids[1]).unwrap().status(), CandidateStatus::Valid);
        assert_eq!(registry.get(&ids[1]).unwrap().document_id(), None);
    }

    // --- no backward transitions ---

    #[test]
    fn settled_candidates_cannot_be_resubmitted() {
        let mut registry = PreviewRegistry::default();
        registry.add([pdf("a.pdf", 10), pdf("b.pdf", 10)]);
        let ids = registry.submit_eligible_ids();
        registry.mark_uploading(&ids);
        registry.apply_batch_result(&batch(vec![ok("a.pdf", "doc1"), err("b.pdf", "nope")]));

        assert!(registry.mark_uploading(&ids).is_empty());
        assert_eq!(registry.fail_uploading(&ids, "late"), 0);
        assert_eq!(registry.get(&ids[0]).unwrap().status(), CandidateStatus::Success);
        assert_eq!(registry.get(&ids[1]).unwrap().status(), CandidateStatus::Error);
        assert!(registry.submit_eligible_ids().is_empty());
    }

    // --- fail_uploading ---

    #[test]
    fn transport_failure_marks_targeted_uploading() {
        let mut registry = PreviewRegistry::default();
        registry.add([pdf("a.pdf", 10), pdf("b.pdf", 10), png("c.png")]);
        let ids: Vec<_> = registry.iter().map(|c| c.id().clone()).collect();
        registry.mark_uploading(&ids);

        assert_eq!(registry.fail_uploading(&ids, "Upload timed out."), 2);
        let counts = registry.counts();
        assert_eq!((counts.error, counts.invalid), (2, 1));
        assert_eq!(registry.get(&ids[0]).unwrap().error_message(), Some("Upload timed out."));
    }

    // --- tick_progress ---

    #[test]
    fn progress_jumps_to_start_then_steps_to_cap() {
        let mut registry = PreviewRegistry::default();
        registry.add([pdf("a.pdf", 10), pdf("b.pdf", 10)]);
        let ids = registry.submit_eligible_ids();
        registry.mark_uploading(&ids[..1]);

        let mut seen = Vec::new();
        while registry.tick_progress(10, 10, 90) {
            seen.push(registry.get(&ids[0]).unwrap().progress());
        }
        assert_eq!(seen, vec![10, 20, 30, 40, 50, 60, 70, 80, 90]);
        assert_eq!(registry.get(&ids[1]).unwrap().progress(), 0);
    }

    #[test]
    fn progress_step_never_overshoots_cap() {
        let mut registry = PreviewRegistry::default();
        registry.add([pdf("a.pdf", 10)]);
        let ids = registry.submit_eligible_ids();
        registry.mark_uploading(&ids);
        registry.tick_progress(10, 50, 75);
        registry.tick_progress(10, 50, 75);
        registry.tick_progress(10, 50, 75);
        assert_eq!(registry.get(&ids[0]).unwrap().progress(), 75);
    }

    // --- expire ---

    #[test]
    fn expire_removes_batch_successes_only_by_default() {
        let mut registry = PreviewRegistry::default();
        registry.add([pdf("a.pdf", 10), pdf("b.pdf", 10), pdf("c.pdf", 10)]);
        let ids = registry.submit_eligible_ids();
        registry.mark_uploading(&ids[..2]);
        registry.apply_batch_result(&batch(vec![ok("a.pdf", "doc1"), err("b.pdf", "bad")]));

        assert_eq!(registry.expire(&ids[..2], false), 1);
        assert!(!registry.contains(&ids[0]));
        assert!(registry.contains(&ids[1]));
        assert!(registry.contains(&ids[2]));

        assert_eq!(registry.expire(&ids, true), 1);
        assert!(!registry.contains(&ids[1]));
        assert!(registry.contains(&ids[2]));
    }

    #[test]
    fn expire_ignores_successes_outside_the_batch() {
        let mut registry = PreviewRegistry::default();
        registry.add([pdf("a.pdf", 10)]);
        let ids = registry.submit_eligible_ids();
        registry.mark_uploading(&ids);
        registry.apply_batch_result(&batch(vec![ok("a.pdf", "doc1")]));
        assert_eq!(registry.expire(&[], true), 0);
        assert_eq!(registry.len(), 1);
    }
}
