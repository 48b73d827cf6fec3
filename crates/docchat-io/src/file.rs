//! Conversion from browser `File` objects to intake metadata.
//!
//! The browser reports sizes and timestamps as `f64`. They are clamped
//! into the integer ranges [`FileMeta`] uses.

use docchat_intake::{FileMeta, IncomingFile};
use web_sys::{File, FileList};

/// Metadata of a browser file.
#[must_use]
pub fn file_meta(file: &File) -> FileMeta {
    FileMeta::new(
        file.name(),
        file.type_(),
        bytes_from_js(file.size()),
        millis_from_js(file.last_modified()),
    )
}

/// Pair a browser file with its metadata.
///
/// The `File` is a reference to the underlying blob; no content is read.
#[must_use]
pub fn incoming(file: File) -> IncomingFile<File> {
    IncomingFile::new(file_meta(&file), file)
}

/// Every file of a `FileList`, in list order.
#[must_use]
pub fn from_file_list(list: &FileList) -> Vec<IncomingFile<File>> {
    (0..list.length())
        .filter_map(|i| list.item(i))
        .map(incoming)
        .collect()
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn bytes_from_js(size: f64) -> u64 {
    if size.is_finite() && size > 0.0 {
        size as u64
    } else {
        0
    }
}

#[allow(clippy::cast_possible_truncation)]
fn millis_from_js(millis: f64) -> i64 {
    if millis.is_finite() { millis as i64 } else { 0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_are_clamped() {
        assert_eq!(bytes_from_js(1536.0), 1536);
        assert_eq!(bytes_from_js(-1.0), 0);
        assert_eq!(bytes_from_js(f64::NAN), 0);
    }

    #[test]
    fn timestamps_keep_sign_and_drop_nan() {
        assert_eq!(millis_from_js(1_700_000_000_000.0), 1_700_000_000_000);
        assert_eq!(millis_from_js(-5.0), -5);
        assert_eq!(millis_from_js(f64::INFINITY), 0);
    }
}
