//! Upload endpoint wire formats and the validated batch result.
//!
//! [`BatchUploadResponse`] and [`SingleUploadResponse`] mirror the JSON
//! bodies returned by the server. [`UploadBatchResult`] is the checked
//! domain form the registry consumes: it can only be built from a
//! response whose aggregate counts agree with each other.

use serde::{Deserialize, Serialize};

/// Per-file outcome reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    /// The file was stored.
    Success,
    /// The file was rejected.
    Error,
}

/// One entry of the `results` array of a batch response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileUploadResult {
    /// Name of the uploaded file part.
    pub filename: String,
    /// Outcome for this file.
    pub status: OutcomeStatus,
    /// Server-assigned document id on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    /// Server-reported reason on error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Response body of the multi-file upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchUploadResponse {
    /// Human-readable summary from the server.
    #[serde(default)]
    pub message: String,
    /// Number of file parts the server received.
    pub total_files: u32,
    /// Number of files stored.
    pub successful_uploads: u32,
    /// Number of files rejected.
    pub failed_uploads: u32,
    /// One entry per file, in request order.
    pub results: Vec<FileUploadResult>,
}

/// Response body of the legacy single-file upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleUploadResponse {
    /// Name of the uploaded file.
    pub filename: String,
    /// Only `"error"` marks a failure. A decoded 2xx body with any other
    /// status (`"success"`, `"uploaded"`) means the file was stored.
    pub status: String,
    /// Human-readable message from the server.
    #[serde(default)]
    pub message: String,
    /// Server-assigned document id.
    #[serde(default)]
    pub document_id: Option<String>,
}

/// A batch response that violates its own aggregate invariants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResponseError {
    /// `successful_uploads + failed_uploads != total_files`.
    #[error("upload response counts disagree: {succeeded} succeeded + {failed} failed != {total} total")]
    CountMismatch {
        /// Reported total.
        total: u32,
        /// Reported successes.
        succeeded: u32,
        /// Reported failures.
        failed: u32,
    },

    /// `results.len() != total_files`.
    #[error("upload response lists {listed} results for {total} files")]
    ResultsMismatch {
        /// Reported total.
        total: u32,
        /// Length of the `results` array.
        listed: usize,
    },
}

/// Authoritative outcome of one upload batch.
///
/// Invariant: `succeeded + failed == total` and `per_file.len() == total`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadBatchResult {
    total: u32,
    succeeded: u32,
    failed: u32,
    per_file: Vec<FileUploadResult>,
}

impl UploadBatchResult {
    /// Total number of files in the batch.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.total
    }

    /// Number of files the server stored.
    #[must_use]
    pub const fn succeeded(&self) -> u32 {
        self.succeeded
    }

    /// Number of files the server rejected.
    #[must_use]
    pub const fn failed(&self) -> u32 {
        self.failed
    }

    /// Per-file outcomes in server order.
    #[must_use]
    pub fn per_file(&self) -> &[FileUploadResult] {
        &self.per_file
    }

    /// The document id of the first successful file, in server order.
    #[must_use]
    pub fn first_document_id(&self) -> Option<&str> {
        self.per_file
            .iter()
            .filter(|r| r.status == OutcomeStatus::Success)
            .find_map(|r| r.document_id.as_deref())
    }

    /// Names of files with the given outcome, in server order.
    #[must_use]
    pub fn filenames_with(&self, status: OutcomeStatus) -> Vec<&str> {
        self.per_file
            .iter()
            .filter(|r| r.status == status)
            .map(|r| r.filename.as_str())
            .collect()
    }
}

impl TryFrom<BatchUploadResponse> for UploadBatchResult {
    type Error = ResponseError;

    fn try_from(response: BatchUploadResponse) -> Result<Self, Self::Error> {
        let total = response.total_files;
        let succeeded = response.successful_uploads;
        let failed = response.failed_uploads;

        if succeeded.checked_add(failed) != Some(total) {
            return Err(ResponseError::CountMismatch {
                total,
                succeeded,
                failed,
            });
        }
        if usize::try_from(total).ok() != Some(response.results.len()) {
            return Err(ResponseError::ResultsMismatch {
                total,
                listed: response.results.len(),
            });
        }

        Ok(Self {
            total,
            succeeded,
            failed,
            per_file: response.results,
        })
    }
}

impl SingleUploadResponse {
    /// Whether the server stored the file.
    #[must_use]
    pub fn is_success(&self) -> bool {
        !self.status.trim().eq_ignore_ascii_case("error")
    }
}

impl From<SingleUploadResponse> for UploadBatchResult {
    fn from(response: SingleUploadResponse) -> Self {
        let success = response.is_success();
        let result = FileUploadResult {
            filename: response.filename,
            status: if success {
                OutcomeStatus::Success
            } else {
                OutcomeStatus::Error
            },
            document_id: response.document_id.filter(|_| success),
            error_message: (!success).then(|| {
                if response.message.is_empty() {
                    "Upload failed".to_owned()
                } else {
                    response.message
                }
            }),
        };
        Self {
            total: 1,
            succeeded: u32::from(success),
            failed: u32::from(!success),
            per_file: vec![result],
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const PARTIAL: &str = r#"{
        "message": "Processed 3 files",
        "total_files": 3,
        "successful_uploads": 2,
        "failed_uploads": 1,
        "results": [
            {"filename": "a.pdf", "status": "success", "document_id": "doc1"},
            {"filename": "b.txt", "status": "error", "error_message": "Could not extract text"},
            {"filename": "c.docx", "status": "success", "document_id": "doc3"}
        ]
    }"#;

    #[test]
    fn decodes_batch_response() {
        let response: BatchUploadResponse = serde_json::from_str(PARTIAL).unwrap();
        assert_eq!(response.total_files, 3);
        assert_eq!(response.results[1].status, OutcomeStatus::Error);
        assert_eq!(
            response.results[1].error_message.as_deref(),
            Some("Could not extract text")
        );
        assert_eq!(response.results[1].document_id, None);
    }

    #[test]
    fn consistent_response_converts() {
        let response: BatchUploadResponse = serde_json::from_str(PARTIAL).unwrap();
        let result = UploadBatchResult::try_from(response).unwrap();
        assert_eq!((result.total(), result.succeeded(), result.failed()), (3, 2, 1));
        assert_eq!(result.first_document_id(), Some("doc1"));
        assert_eq!(result.filenames_with(OutcomeStatus::Success), vec!["a.pdf", "c.docx"]);
        assert_eq!(result.filenames_with(OutcomeStatus::Error), vec!["b.txt"]);
    }

    #[test]
    fn count_mismatch_is_rejected() {
        let mut response: BatchUploadResponse = serde_json::from_str(PARTIAL).unwrap();
        response.failed_uploads = 0;
        assert_eq!(
            UploadBatchResult::try_from(response),
            Err(ResponseError::CountMismatch {
                total: 3,
                succeeded: 2,
                failed: 0
            })
        );
    }

    #[test]
    fn results_length_mismatch_is_rejected() {
        let mut response: BatchUploadResponse = serde_json::from_str(PARTIAL).unwrap();
        response.results.pop();
        assert_eq!(
            UploadBatchResult::try_from(response),
            Err(ResponseError::ResultsMismatch { total: 3, listed: 2 })
        );
    }

    #[test]
    fn overflowing_counts_are_rejected() {
        let response = BatchUploadResponse {
            message: String::new(),
            total_files: 0,
            successful_uploads: u32::MAX,
            failed_uploads: 1,
            results: vec![],
        };
        assert!(matches!(
            UploadBatchResult::try_from(response),
            Err(ResponseError::CountMismatch { .. })
        ));
    }

    #[test]
    fn single_success_becomes_one_file_batch() {
        let response: SingleUploadResponse = serde_json::from_str(
            r#"{"filename": "a.pdf", "status": "success", "message": "ok", "document_id": "doc9"}"#,
        )
        .unwrap();
        let result = UploadBatchResult::from(response);
        assert_eq!((result.total(), result.succeeded(), result.failed()), (1, 1, 0));
        assert_eq!(result.first_document_id(), Some("doc9"));
    }

    #[test]
    fn single_failure_keeps_server_message() {
        let response = SingleUploadResponse {
            filename: "a.pdf".into(),
            status: "error".into(),
            message: "Encrypted PDF".into(),
            document_id: None,
        };
        let result = UploadBatchResult::from(response);
        assert_eq!((result.succeeded(), result.failed()), (0, 1));
        assert_eq!(
            result.per_file()[0].error_message.as_deref(),
            Some("Encrypted PDF")
        );
    }

    #[test]
    fn single_status_other_than_error_is_success() {
        for status in ["uploaded", "processing", "Success"] {
            let response = SingleUploadResponse {
                filename: "a.pdf".into(),
                status: status.into(),
                message: "File uploaded and processing".into(),
                document_id: Some("doc1".into()),
            };
            assert!(response.is_success(), "{status}");
            let result = UploadBatchResult::from(response);
            assert_eq!((result.succeeded(), result.failed()), (1, 0));
            assert_eq!(result.per_file()[0].error_message, None);
            assert_eq!(result.first_document_id(), Some("doc1"));
        }
    }

    #[test]
    fn single_error_status_ignores_case() {
        let response = SingleUploadResponse {
            filename: "a.pdf".into(),
            status: "ERROR".into(),
            message: String::new(),
            document_id: Some("ignored".into()),
        };
        let result = UploadBatchResult::from(response);
        assert_eq!((result.succeeded(), result.failed()), (0, 1));
        assert_eq!(result.first_document_id(), None);
        assert_eq!(result.per_file()[0].error_message.as_deref(), Some("Upload failed"));
    }
}
