//! docchat-check: Check local files against the docchat upload rules.
//!
//! Runs the same validator the browser client uses over files on disk and
//! reports which would be accepted for upload. Useful for:
//!
//! - Checking a folder of documents before dragging it into the client
//! - Scripting pre-flight checks (`--json`, non-zero exit on rejection)
//! - Trying out a different size ceiling with `--max-size`
//!
//! # Usage
//!
//! ```text
//! cargo run --bin docchat-check -- [OPTIONS] <PATH>...
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::UNIX_EPOCH;

use clap::Parser;
use docchat_intake::validate::MAX_FILE_SIZE;
use docchat_intake::{DocumentKind, FileMeta, IncomingFile, RejectReason, Validator, format_file_size};
use serde::Serialize;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// Check documents against the docchat upload rules.
///
/// Accepts PDF, plain text and DOCX files up to the size ceiling. The file
/// type is taken from the extension. Exits with status 1 if any file is
/// rejected or cannot be read.
#[derive(Parser)]
#[command(name = "docchat-check", version)]
struct Cli {
    /// Files to check.
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Size ceiling in bytes.
    #[arg(long, value_name = "BYTES", default_value_t = MAX_FILE_SIZE)]
    max_size: u64,

    /// Print a JSON report instead of one line per file.
    #[arg(long)]
    json: bool,
}

/// Why a path could not be checked.
#[derive(Debug, thiserror::Error)]
enum ReadError {
    #[error("not a regular file")]
    NotAFile,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct Accepted {
    path: PathBuf,
    size: u64,
    size_label: String,
    kind: DocumentKind,
}

#[derive(Debug, Serialize)]
struct Rejected {
    path: PathBuf,
    size: u64,
    reason: RejectReason,
    message: String,
}

#[derive(Debug, Serialize)]
struct Unreadable {
    path: PathBuf,
    error: String,
}

#[derive(Debug, Serialize)]
struct Report {
    max_file_size: u64,
    accepted: Vec<Accepted>,
    rejected: Vec<Rejected>,
    unreadable: Vec<Unreadable>,
}

impl Report {
    const fn passed(&self) -> bool {
        self.rejected.is_empty() && self.unreadable.is_empty()
    }

    fn print_text(&self) {
        for a in &self.accepted {
            println!("ok        {} ({}, {})", a.path.display(), a.kind.label(), a.size_label);
        }
        for r in &self.rejected {
            println!("rejected  {}: {}", r.path.display(), r.message);
        }
        for u in &self.unreadable {
            println!("error     {}: {}", u.path.display(), u.error);
        }
        println!(
            "{} accepted, {} rejected, {} unreadable",
            self.accepted.len(),
            self.rejected.len(),
            self.unreadable.len(),
        );
    }
}

/// Metadata for `path` as the validator sees it.
///
/// The MIME type is left empty so the extension decides the kind.
fn read_meta(path: &Path) -> Result<FileMeta, ReadError> {
    let metadata = std::fs::metadata(path)?;
    if !metadata.is_file() {
        return Err(ReadError::NotAFile);
    }
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let last_modified = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX));
    Ok(FileMeta::new(name, "", metadata.len(), last_modified))
}

fn check(paths: &[PathBuf], validator: &Validator) -> Report {
    let mut files = Vec::with_capacity(paths.len());
    let mut unreadable = Vec::new();
    for path in paths {
        match read_meta(path) {
            Ok(meta) => {
                debug!(path = %path.display(), size = meta.size, "read metadata");
                files.push(IncomingFile::new(meta, path.clone()));
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read file");
                unreadable.push(Unreadable {
                    path: path.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    let partition = validator.partition(files);
    let accepted = partition
        .valid
        .into_iter()
        .map(|(file, kind)| Accepted {
            size_label: format_file_size(file.meta.size),
            size: file.meta.size,
            path: file.handle,
            kind,
        })
        .collect();
    let rejected = partition
        .invalid
        .into_iter()
        .map(|(file, reason)| Rejected {
            size: file.meta.size,
            path: file.handle,
            message: reason.to_string(),
            reason,
        })
        .collect();

    Report {
        max_file_size: validator.max_file_size(),
        accepted,
        rejected,
        unreadable,
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let report = check(&cli.paths, &Validator::new(cli.max_size));

    if cli.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing report: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        report.print_text();
    }

    if report.passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Scratch directory unique to this test process.
    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("docchat-check-{}-{name}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn cli_parses_flags_and_paths() {
        let cli = Cli::try_parse_from(["docchat-check", "--json", "--max-size", "2048", "a.pdf", "b.txt"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.max_size, 2048);
        assert_eq!(cli.paths, [PathBuf::from("a.pdf"), PathBuf::from("b.txt")]);
    }

    #[test]
    fn cli_requires_a_path() {
        assert!(Cli::try_parse_from(["docchat-check"]).is_err());
    }

    #[test]
    fn cli_defaults_to_ten_mib() {
        let cli = Cli::try_parse_from(["docchat-check", "a.pdf"]).unwrap();
        assert_eq!(cli.max_size, 10 * 1024 * 1024);
        assert!(!cli.json);
    }

    #[test]
    fn kind_comes_from_extension() {
        let dir = scratch("kind");
        let path = dir.join("notes.TXT");
        std::fs::write(&path, b"hello").unwrap();

        let meta = read_meta(&path).unwrap();
        assert_eq!(meta.name, "notes.TXT");
        assert_eq!(meta.size, 5);
        assert!(meta.mime.is_empty());
        assert_eq!(Validator::default().validate(&meta), Ok(DocumentKind::PlainText));
    }

    #[test]
    fn directories_are_unreadable() {
        let dir = scratch("dir");
        assert!(matches!(read_meta(&dir), Err(ReadError::NotAFile)));
    }

    #[test]
    fn report_splits_accepted_rejected_and_unreadable() {
        let dir = scratch("report");
        let pdf = dir.join("paper.pdf");
        let png = dir.join("photo.png");
        let big = dir.join("big.txt");
        std::fs::write(&pdf, b"%PDF-1.7").unwrap();
        std::fs::write(&png, b"\x89PNG").unwrap();
        std::fs::write(&big, vec![b'x'; 64]).unwrap();
        let missing = dir.join("missing.pdf");

        let report = check(&[pdf.clone(), png.clone(), big.clone(), missing.clone()], &Validator::new(32));

        assert_eq!(report.accepted.len(), 1);
        assert_eq!(report.accepted[0].path, pdf);
        assert_eq!(report.accepted[0].kind, DocumentKind::Pdf);

        assert_eq!(report.rejected.len(), 2);
        assert_eq!(report.rejected[0].path, png);
        assert_eq!(report.rejected[0].reason, RejectReason::UnsupportedType);
        assert_eq!(report.rejected[1].path, big);
        assert_eq!(report.rejected[1].reason, RejectReason::TooLarge { size: 64, limit: 32 });

        assert_eq!(report.unreadable.len(), 1);
        assert_eq!(report.unreadable[0].path, missing);
        assert!(!report.passed());
    }

    #[test]
    fn all_valid_files_pass() {
        let dir = scratch("pass");
        let path = dir.join("letter.docx");
        std::fs::write(&path, b"PK").unwrap();

        let report = check(&[path], &Validator::default());
        assert!(report.passed());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["accepted"][0]["size_label"], "2 Bytes");
    }
}
