//! Shared types for the docchat file intake pipeline.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Metadata describing a file offered to the intake pipeline.
///
/// This is the narrow, typed view of a platform file object (a browser
/// `File`, a path on disk). Everything the validator and registry need
/// is here; the file content itself travels separately as a handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileMeta {
    /// File name including extension, without any directory part.
    pub name: String,
    /// MIME type as reported by the platform. Empty when unknown.
    pub mime: String,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time in milliseconds since the Unix epoch.
    pub last_modified: i64,
}

impl FileMeta {
    /// Create file metadata.
    #[must_use]
    pub fn new(name: impl Into<String>, mime: impl Into<String>, size: u64, last_modified: i64) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            size,
            last_modified,
        }
    }

    /// The extension after the last `.` in the name, if any.
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        self.name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty())
    }

    /// The stable deduplication key for this file.
    #[must_use]
    pub fn candidate_id(&self) -> CandidateId {
        CandidateId::from_meta(self)
    }
}

/// A file entering the pipeline: metadata plus an opaque content handle.
///
/// The handle is owned by whoever holds the `IncomingFile`, and later by
/// the registry candidate built from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingFile<H> {
    /// Metadata used for validation and identity.
    pub meta: FileMeta,
    /// Reference to the file content (browser `File`, path, bytes).
    pub handle: H,
}

impl<H> IncomingFile<H> {
    /// Pair metadata with its content handle.
    #[must_use]
    pub const fn new(meta: FileMeta, handle: H) -> Self {
        Self { meta, handle }
    }
}

/// Identity of a candidate in the preview registry.
///
/// Composed as `name-size-lastModified`, so selecting or dropping the
/// same underlying file twice yields the same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CandidateId(String);

impl CandidateId {
    /// Derive the id for a file.
    #[must_use]
    pub fn from_meta(meta: &FileMeta) -> Self {
        Self(format!("{}-{}-{}", meta.name, meta.size, meta.last_modified))
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Document formats accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentKind {
    /// Portable Document Format.
    Pdf,
    /// Plain UTF-8 text.
    PlainText,
    /// Office Open XML word-processing document.
    Docx,
}

impl DocumentKind {
    /// Every accepted kind, in display order.
    pub const ALL: [Self; 3] = [Self::Pdf, Self::PlainText, Self::Docx];

    /// The MIME type browsers report for this kind.
    #[must_use]
    pub const fn mime(self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::PlainText => "text/plain",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }

    /// The canonical file extension, without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::PlainText => "txt",
            Self::Docx => "docx",
        }
    }

    /// Short uppercase label (`PDF`, `TXT`, `DOCX`).
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::PlainText => "TXT",
            Self::Docx => "DOCX",
        }
    }

    /// Look up a kind by exact MIME type.
    #[must_use]
    pub fn from_mime(mime: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.mime() == mime)
    }

    /// Look up a kind by extension, ignoring ASCII case.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.extension().eq_ignore_ascii_case(ext))
    }

    /// Comma-separated `accept` attribute value for file inputs.
    #[must_use]
    pub fn accept_attribute() -> String {
        Self::ALL
            .iter()
            .map(|kind| format!(".{}", kind.extension()))
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle status of a registry candidate.
///
/// ```text
/// pending --> valid --> uploading --> success
///    |                     |
///    +--> invalid          +--> error
/// pending ------------> uploading
/// ```
///
/// Transitions only move forward; see [`can_transition_to`](Self::can_transition_to).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateStatus {
    /// Registered, not yet classified.
    Pending,
    /// Passed validation; eligible for submission.
    Valid,
    /// Failed validation. Terminal.
    Invalid,
    /// Part of the in-flight batch.
    Uploading,
    /// Server accepted the file. Terminal.
    Success,
    /// Server or transport rejected the file. Terminal.
    Error,
}

impl CandidateStatus {
    /// Display label for the preview list.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Valid => "Valid",
            Self::Invalid => "Invalid",
            Self::Uploading => "Uploading...",
            Self::Success => "Uploaded",
            Self::Error => "Failed",
        }
    }

    /// Whether no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Invalid | Self::Success | Self::Error)
    }

    /// Whether a candidate in this status may be submitted.
    #[must_use]
    pub const fn is_submit_eligible(self) -> bool {
        matches!(self, Self::Pending | Self::Valid)
    }

    /// Whether the candidate carries an error message in this status.
    #[must_use]
    pub const fn is_failure(self) -> bool {
        matches!(self, Self::Invalid | Self::Error)
    }

    /// Whether moving from `self` to `next` is a legal forward step.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Valid | Self::Invalid | Self::Uploading)
                | (Self::Valid, Self::Uploading)
                | (Self::Uploading, Self::Success | Self::Error)
        )
    }
}

impl fmt::Display for CandidateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Tunable constants for the intake pipeline.
///
/// Defaults match the behavior users see in the chat client: a 10 MiB
/// ceiling, short overlay flashes after a drop, simulated progress in
/// steps of 10% every 200 ms, and settled rows cleared after 5 s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeConfig {
    /// Largest accepted file, in bytes.
    pub max_file_size: u64,

    /// Error flash after a drop that carried no files.
    pub no_files_flash: Duration,
    /// Error flash after a drop during an in-flight upload.
    pub conflict_flash: Duration,
    /// Error flash after a drop where every file failed validation.
    pub all_invalid_flash: Duration,
    /// Success flash after a drop with at least one valid file.
    pub success_flash: Duration,
    /// How long the "files skipped" warning stays up.
    pub skipped_warning: Duration,

    /// Progress shown on the first simulation tick.
    pub progress_start: u8,
    /// Progress added on each later tick.
    pub progress_step: u8,
    /// Simulated progress never exceeds this until the response arrives.
    pub progress_cap: u8,
    /// Interval between simulation ticks.
    pub progress_tick: Duration,

    /// How long settled rows of a finished batch stay visible.
    pub settled_display: Duration,
    /// Whether server/transport errors also expire, or stay until removed.
    pub expire_errors: bool,

    /// Toast duration when a batch had successes.
    pub success_notice: Duration,
    /// Toast duration when a batch had per-file failures.
    pub failure_notice: Duration,
    /// Toast duration for transport failures.
    pub transport_notice: Duration,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024,
            no_files_flash: Duration::from_secs(3),
            conflict_flash: Duration::from_secs(3),
            all_invalid_flash: Duration::from_secs(4),
            success_flash: Duration::from_secs(2),
            skipped_warning: Duration::from_secs(4),
            progress_start: 10,
            progress_step: 10,
            progress_cap: 90,
            progress_tick: Duration::from_millis(200),
            settled_display: Duration::from_secs(5),
            expire_errors: false,
            success_notice: Duration::from_secs(5),
            failure_notice: Duration::from_secs(7),
            transport_notice: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- FileMeta / CandidateId tests ---

    #[test]
    fn candidate_id_joins_name_size_and_mtime() {
        let meta = FileMeta::new("report.pdf", "application/pdf", 1234, 1_700_000_000_000);
        assert_eq!(meta.candidate_id().as_str(), "report.pdf-1234-1700000000000");
    }

    #[test]
    fn candidate_id_is_stable_for_same_file() {
        let a = FileMeta::new("a.txt", "text/plain", 10, 5);
        let b = FileMeta::new("a.txt", "text/plain", 10, 5);
        assert_eq!(a.candidate_id(), b.candidate_id());
    }

    #[test]
    fn candidate_id_differs_when_modified() {
        let a = FileMeta::new("a.txt", "text/plain", 10, 5);
        let b = FileMeta::new("a.txt", "text/plain", 10, 6);
        assert_ne!(a.candidate_id(), b.candidate_id());
    }

    #[test]
    fn extension_of_dotted_name() {
        assert_eq!(FileMeta::new("x.tar.gz", "", 0, 0).extension(), Some("gz"));
        assert_eq!(FileMeta::new("README", "", 0, 0).extension(), None);
        assert_eq!(FileMeta::new("trailing.", "", 0, 0).extension(), None);
    }

    // --- DocumentKind tests ---

    #[test]
    fn kind_from_mime_exact_only() {
        assert_eq!(DocumentKind::from_mime("application/pdf"), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::from_mime("text/plain"), Some(DocumentKind::PlainText));
        assert_eq!(DocumentKind::from_mime("text/html"), None);
        assert_eq!(DocumentKind::from_mime(""), None);
    }

    #[test]
    fn kind_from_extension_ignores_case() {
        assert_eq!(DocumentKind::from_extension("DOCX"), Some(DocumentKind::Docx));
        assert_eq!(DocumentKind::from_extension("Pdf"), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::from_extension("doc"), None);
    }

    #[test]
    fn accept_attribute_lists_all_extensions() {
        assert_eq!(DocumentKind::accept_attribute(), ".pdf,.txt,.docx");
    }

    // --- CandidateStatus tests ---

    #[test]
    fn forward_transitions_allowed() {
        use CandidateStatus::*;
        assert!(Pending.can_transition_to(Valid));
        assert!(Pending.can_transition_to(Invalid));
        assert!(Pending.can_transition_to(Uploading));
        assert!(Valid.can_transition_to(Uploading));
        assert!(Uploading.can_transition_to(Success));
        assert!(Uploading.can_transition_to(Error));
    }

    #[test]
    fn backward_and_terminal_transitions_rejected() {
        use CandidateStatus::*;
        assert!(!Success.can_transition_to(Pending));
        assert!(!Error.can_transition_to(Uploading));
        assert!(!Invalid.can_transition_to(Uploading));
        assert!(!Valid.can_transition_to(Success));
        assert!(!Uploading.can_transition_to(Valid));
        assert!(!Valid.can_transition_to(Valid));
    }

    #[test]
    fn terminal_statuses() {
        use CandidateStatus::*;
        for status in [Invalid, Success, Error] {
            assert!(status.is_terminal(), "{status:?} should be terminal");
            for next in [Pending, Valid, Invalid, Uploading, Success, Error] {
                assert!(!status.can_transition_to(next));
            }
        }
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&CandidateStatus::Uploading).unwrap_or_default();
        assert_eq!(json, "\"uploading\"");
    }

    // --- IntakeConfig tests ---

    #[test]
    fn config_defaults() {
        let config = IntakeConfig::default();
        assert_eq!(config.max_file_size, 10_485_760);
        assert_eq!(config.no_files_flash, Duration::from_secs(3));
        assert_eq!(config.conflict_flash, Duration::from_secs(3));
        assert_eq!(config.all_invalid_flash, Duration::from_secs(4));
        assert_eq!(config.success_flash, Duration::from_secs(2));
        assert_eq!(config.progress_tick, Duration::from_millis(200));
        assert_eq!(config.progress_cap, 90);
        assert!(!config.expire_errors);
    }
}
