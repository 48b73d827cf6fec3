//! Window-wide drag session tracking and drop classification.
//!
//! Browsers fire `dragenter`/`dragleave` for every element the pointer
//! crosses, so a drag over nested children produces leave events for the
//! parent while the pointer is still inside the window. [`DragSession`]
//! counts enters against leaves and reports "dragging" only while the
//! count is positive, which keeps the overlay steady.
//!
//! A drop ends the gesture unconditionally and is classified into a
//! [`DropOutcome`]: rejected with a flash message, or accepted with the
//! valid files as a [`DroppedFiles`] value for the caller to register.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::notice::Notice;
use crate::types::{IncomingFile, IntakeConfig};
use crate::validate::{RejectReason, Validator};

/// What the overlay shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DragPhase {
    /// Nothing is being dragged.
    #[default]
    Idle,
    /// File data is hovering over the window.
    Dragging,
    /// A drop was rejected; `last_error` holds the reason.
    ErrorFlash,
    /// A drop was accepted.
    SuccessFlash,
}

/// Drop effect to advertise on `dragover`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropEffect {
    /// Show the copy cursor.
    Copy,
    /// Leave the platform default.
    None,
}

impl DropEffect {
    /// The `DataTransfer.dropEffect` string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Copy => "copy",
            Self::None => "none",
        }
    }
}

/// Identifies one flash so a late timer cannot clear a newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlashToken(u64);

/// A transient phase that should be cleared after a delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flash {
    /// Pass back to [`DragSession::clear_flash`].
    pub token: FlashToken,
    /// How long the flash stays up.
    pub clear_after: Duration,
}

/// Why a drop registered nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DropRejection {
    /// The drop carried no files (e.g. dragged text).
    #[error("No files were dropped.")]
    NoFiles,

    /// A batch upload is in flight; drops are not queued.
    #[error("Upload already in progress. Please wait.")]
    Busy,

    /// The only dropped file failed validation.
    #[error("{0}")]
    Invalid(RejectReason),

    /// Several files were dropped and none passed validation.
    #[error("All dropped files are invalid.")]
    AllInvalid {
        /// Number of files dropped.
        count: usize,
    },
}

/// Valid files from an accepted drop.
///
/// A single file and several files are consumed by one code path; the
/// caller decides whether a lone file goes to the single-file endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DroppedFiles<H> {
    /// Exactly one file passed validation.
    SingleFile(IncomingFile<H>),
    /// Two or more files passed validation, in drop order.
    MultiFile(Vec<IncomingFile<H>>),
}

impl<H> DroppedFiles<H> {
    fn from_valid(mut files: Vec<IncomingFile<H>>) -> Self {
        if files.len() == 1
            && let Some(file) = files.pop()
        {
            return Self::SingleFile(file);
        }
        Self::MultiFile(files)
    }

    /// Number of files.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::SingleFile(_) => 1,
            Self::MultiFile(files) => files.len(),
        }
    }

    /// Always `false` for a value produced by a drop.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The files as a list, in drop order.
    #[must_use]
    pub fn into_vec(self) -> Vec<IncomingFile<H>> {
        match self {
            Self::SingleFile(file) => vec![file],
            Self::MultiFile(files) => files,
        }
    }
}

/// Result of [`DragSession::drop`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome<H> {
    /// Nothing is registered; the overlay shows the reason.
    Rejected {
        /// Why.
        reason: DropRejection,
        /// When to clear the error flash.
        flash: Flash,
    },
    /// At least one file passed validation.
    Accepted {
        /// Files to register.
        files: DroppedFiles<H>,
        /// Files dropped alongside that failed validation.
        skipped: Vec<(IncomingFile<H>, RejectReason)>,
        /// "Files skipped" warning, present when `skipped` is non-empty.
        warning: Option<Notice>,
        /// When to clear the success flash.
        flash: Flash,
    },
}

impl<H> DropOutcome<H> {
    /// The flash to schedule a clear for.
    #[must_use]
    pub const fn flash(&self) -> Flash {
        match self {
            Self::Rejected { flash, .. } | Self::Accepted { flash, .. } => *flash,
        }
    }
}

/// The process-wide drag state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DragSession {
    enter_counter: u32,
    phase: DragPhase,
    last_error: Option<String>,
    flash_generation: u64,
}

impl DragSession {
    /// A session with nothing dragged.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of unmatched enter events.
    #[must_use]
    pub const fn enter_counter(&self) -> u32 {
        self.enter_counter
    }

    /// Current overlay phase.
    #[must_use]
    pub const fn phase(&self) -> DragPhase {
        self.phase
    }

    /// Message shown during [`DragPhase::ErrorFlash`].
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Handle an enter event that reached the document root.
    ///
    /// Drags that carry no file data (text, links) are ignored. Returns
    /// whether the phase changed.
    pub fn enter(&mut self, carries_files: bool) -> bool {
        if !carries_files {
            return false;
        }
        self.enter_counter = self.enter_counter.saturating_add(1);
        if self.enter_counter == 1 {
            let changed = self.phase != DragPhase::Dragging;
            self.phase = DragPhase::Dragging;
            self.last_error = None;
            debug!("drag session started");
            return changed;
        }
        false
    }

    /// Handle a leave event. Returns whether the phase changed.
    ///
    /// The counter never goes below zero. Only the step that brings it to
    /// zero ends the session.
    pub fn leave(&mut self) -> bool {
        if self.enter_counter == 0 {
            return false;
        }
        self.enter_counter -= 1;
        if self.enter_counter == 0 {
            let changed = self.phase != DragPhase::Idle;
            self.phase = DragPhase::Idle;
            self.last_error = None;
            debug!("drag session ended");
            return changed;
        }
        false
    }

    /// Handle an over event. Never touches the counter.
    #[must_use]
    pub const fn over(&self, carries_files: bool) -> DropEffect {
        if carries_files {
            DropEffect::Copy
        } else {
            DropEffect::None
        }
    }

    /// Handle a drop.
    ///
    /// The session is reset before anything else. Then, in order: no
    /// files, an upload in flight, and no valid files each reject the drop
    /// with an error flash; otherwise the valid files are returned with a
    /// success flash and a warning for any that were skipped.
    pub fn drop<H>(
        &mut self,
        files: Vec<IncomingFile<H>>,
        upload_busy: bool,
        validator: &Validator,
        config: &IntakeConfig,
    ) -> DropOutcome<H> {
        self.enter_counter = 0;
        self.phase = DragPhase::Idle;
        self.last_error = None;

        if files.is_empty() {
            return self.reject(DropRejection::NoFiles, config.no_files_flash);
        }
        if upload_busy {
            return self.reject(DropRejection::Busy, config.conflict_flash);
        }

        let count = files.len();
        let partition = validator.partition(files);
        if partition.valid.is_empty() {
            let reason = match <[_; 1]>::try_from(partition.invalid) {
                Ok([(_, reason)]) => DropRejection::Invalid(reason),
                Err(_) => DropRejection::AllInvalid { count },
            };
            return self.reject(reason, config.all_invalid_flash);
        }

        let skipped = partition.invalid;
        let warning = (!skipped.is_empty()).then(|| {
            Notice::warning(
                format!(
                    "{} file(s) were skipped due to validation errors.",
                    skipped.len()
                ),
                config.skipped_warning,
            )
        });
        let valid: Vec<_> = partition.valid.into_iter().map(|(file, _)| file).collect();
        info!(accepted = valid.len(), skipped = skipped.len(), "drop accepted");

        let flash = self.start_flash(DragPhase::SuccessFlash, None, config.success_flash);
        DropOutcome::Accepted {
            files: DroppedFiles::from_valid(valid),
            skipped,
            warning,
            flash,
        }
    }

    /// Clear a flash once its delay has elapsed.
    ///
    /// Does nothing if a newer flash or a new drag has replaced it.
    /// Returns whether the phase changed.
    pub fn clear_flash(&mut self, token: FlashToken) -> bool {
        let flashing = matches!(self.phase, DragPhase::ErrorFlash | DragPhase::SuccessFlash);
        if !flashing || token.0 != self.flash_generation {
            return false;
        }
        self.phase = DragPhase::Idle;
        self.last_error = None;
        true
    }

    fn reject<H>(&mut self, reason: DropRejection, clear_after: Duration) -> DropOutcome<H> {
        info!(%reason, "drop rejected");
        let flash = self.start_flash(DragPhase::ErrorFlash, Some(reason.to_string()), clear_after);
        DropOutcome::Rejected { reason, flash }
    }

    fn start_flash(&mut self, phase: DragPhase, error: Option<String>, clear_after: Duration) -> Flash {
        self.flash_generation = self.flash_generation.wrapping_add(1);
        self.phase = phase;
        self.last_error = error;
        Flash {
            token: FlashToken(self.flash_generation),
            clear_after,
        }
    }
}
