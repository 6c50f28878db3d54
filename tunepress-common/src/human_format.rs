//! Human-readable formatting for track durations and file sizes
//!
//! Used by the generated record body (player info block, download link).

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Format a duration in seconds as `M:SS`.
///
/// Fractional seconds are truncated. Zero, negative and non-finite input
/// render as `0:00`.
///
/// # Examples
///
/// ```
/// use tunepress_common::human_format::format_duration;
///
/// assert_eq!(format_duration(247.5), "4:07");
/// assert_eq!(format_duration(59.9), "0:59");
/// assert_eq!(format_duration(3600.0), "60:00");
/// assert_eq!(format_duration(0.0), "0:00");
/// ```
pub fn format_duration(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "0:00".to_string();
    }

    let total = seconds.floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// Format a byte count as megabytes with one decimal (`X.X MB`).
///
/// # Examples
///
/// ```
/// use tunepress_common::human_format::format_file_size;
///
/// assert_eq!(format_file_size(12_345_678), "11.8 MB");
/// assert_eq!(format_file_size(1_048_576), "1.0 MB");
/// assert_eq!(format_file_size(0), "0 B");
/// ```
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }

    format!("{:.1} MB", bytes as f64 / BYTES_PER_MB)
}
