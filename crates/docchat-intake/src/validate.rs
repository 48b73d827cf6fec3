//! File validation: allow-listed document types and a size ceiling.
//!
//! Validation is a pure function of [`FileMeta`] and the configured
//! ceiling. Rules apply in order, so an oversized file of an unsupported
//! type is reported as unsupported.

use serde::{Deserialize, Serialize};

use crate::size::{format_compact, format_file_size};
use crate::types::{DocumentKind, FileMeta, IncomingFile, IntakeConfig};

/// Default size ceiling: 10 MiB.
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Why a file was rejected.
///
/// The `Display` text is shown to users verbatim next to the file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum RejectReason {
    /// Neither the MIME type nor the extension is allow-listed.
    #[error("File type not supported. Please use PDF, TXT, or DOCX files.")]
    UnsupportedType,

    /// The file exceeds the size ceiling.
    #[error(
        "File too large. Maximum size is {} (your file is {}).",
        format_compact(*.limit),
        format_file_size(*.size)
    )]
    TooLarge {
        /// Actual file size in bytes.
        size: u64,
        /// Configured ceiling in bytes.
        limit: u64,
    },
}

/// Files split by validation outcome, each side in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition<H> {
    /// Files that passed, paired with their detected kind.
    pub valid: Vec<(IncomingFile<H>, DocumentKind)>,
    /// Files that failed, paired with the reason.
    pub invalid: Vec<(IncomingFile<H>, RejectReason)>,
}

impl<H> Partition<H> {
    /// Total number of files classified.
    #[must_use]
    pub fn len(&self) -> usize {
        self.valid.len() + self.invalid.len()
    }

    /// Returns `true` if no files were classified.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.valid.is_empty() && self.invalid.is_empty()
    }
}

/// Stateless validator parameterized by the size ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    max_file_size: u64,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(MAX_FILE_SIZE)
    }
}

impl Validator {
    /// Create a validator with the given size ceiling in bytes.
    #[must_use]
    pub const fn new(max_file_size: u64) -> Self {
        Self { max_file_size }
    }

    /// Create a validator from pipeline configuration.
    #[must_use]
    pub const fn from_config(config: &IntakeConfig) -> Self {
        Self::new(config.max_file_size)
    }

    /// The size ceiling in bytes.
    #[must_use]
    pub const fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Validate a single file.
    ///
    /// Returns the detected [`DocumentKind`] when accepted.
    ///
    /// # Errors
    ///
    /// Returns [`RejectReason::UnsupportedType`] if the type is not
    /// allow-listed, otherwise [`RejectReason::TooLarge`] if the file
    /// exceeds the ceiling.
    pub fn validate(&self, meta: &FileMeta) -> Result<DocumentKind, RejectReason> {
        let kind = detect_kind(meta).ok_or(RejectReason::UnsupportedType)?;
        if meta.size > self.max_file_size {
            return Err(RejectReason::TooLarge {
                size: meta.size,
                limit: self.max_file_size,
            });
        }
        Ok(kind)
    }

    /// Validate a batch of files, partitioning them by outcome.
    pub fn partition<H>(&self, files: impl IntoIterator<Item = IncomingFile<H>>) -> Partition<H> {
        let mut partition = Partition {
            valid: Vec::new(),
            invalid: Vec::new(),
        };
        for file in files {
            match self.validate(&file.meta) {
                Ok(kind) => partition.valid.push((file, kind)),
                Err(reason) => partition.invalid.push((file, reason)),
            }
        }
        partition
    }
}

/// Determine the document kind of a file.
///
/// A non-empty MIME type is authoritative. When the platform reports no
/// MIME type the extension is consulted instead.
#[must_use]
pub fn detect_kind(meta: &FileMeta) -> Option<DocumentKind> {
    if meta.mime.is_empty() {
        meta.extension().and_then(DocumentKind::from_extension)
    } else {
        DocumentKind::from_mime(&meta.mime)
    }
}
