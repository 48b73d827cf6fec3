//! Human-readable byte sizes.
//!
//! Sizes are scaled by powers of 1024 and rounded half-up to two decimal
//! places using integer arithmetic only, so the output is identical on
//! every platform and locale. Trailing zeros are dropped (`1.5 KB`,
//! `10 MB`).

const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Format a byte count for display, e.g. `14.31 MB`.
///
/// Zero is rendered as `0 Bytes`. Values beyond the gigabyte range stay
/// in GB.
#[must_use]
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_owned();
    }

    let mut exponent = 0;
    let mut divisor: u64 = 1;
    while exponent + 1 < UNITS.len() && bytes / divisor >= 1024 {
        divisor *= 1024;
        exponent += 1;
    }

    let divisor = u128::from(divisor);
    let hundredths = (u128::from(bytes) * 100 + divisor / 2) / divisor;
    let whole = hundredths / 100;
    let frac = hundredths % 100;

    let number = if frac == 0 {
        whole.to_string()
    } else if frac % 10 == 0 {
        format!("{whole}.{}", frac / 10)
    } else {
        format!("{whole}.{frac:02}")
    };
    format!("{number} {}", UNITS[exponent])
}

/// Format a size without the space between number and unit, e.g. `10MB`.
///
/// Used for limits quoted inside sentences.
#[must_use]
pub fn format_compact(bytes: u64) -> String {
    format_file_size(bytes).replace(' ', "")
}
