//! Utility functions for file naming and human-readable formatting

use crate::types::SourceRef;
use std::time::Duration;

/// Produce a storage-safe file name for an artifact
///
/// Keeps only alphanumeric characters plus `.`, `_` and `-`; everything else
/// (spaces, path separators, control characters, emoji punctuation) is
/// dropped. Alphanumeric is Unicode-aware, so non-ASCII letters survive.
///
/// If the provider reported no name, or sanitizing leaves nothing, a
/// deterministic fallback derived from the source reference is used so the
/// same message always maps to the same artifact name.
///
/// # Arguments
///
/// * `raw` - The provider-reported file name, if any
/// * `source` - The source reference, used for the fallback name
///
/// # Examples
///
/// ```
/// use media_depot::types::SourceRef;
/// use media_depot::utils::sanitize_file_name;
///
/// let source = SourceRef::new(-1001234, 42);
/// assert_eq!(
///     sanitize_file_name(Some("My Movie (final).mkv"), &source),
///     "MyMoviefinal.mkv"
/// );
/// assert_eq!(
///     sanitize_file_name(None, &source),
///     "media_-1001234_42.bin"
/// );
/// ```
#[must_use]
pub fn sanitize_file_name(raw: Option<&str>, source: &SourceRef) -> String {
    let cleaned: String = raw
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();

    if cleaned.is_empty() {
        fallback_file_name(source)
    } else {
        cleaned
    }
}

/// Deterministic artifact name for media whose provider name is unusable
fn fallback_file_name(source: &SourceRef) -> String {
    format!("media_{}_{}.bin", source.chat_id, source.message_id)
}

/// Format a byte count as a human-readable size, e.g. "12.34 MB"
///
/// Uses 1024-based units up to GB. Zero is rendered as "0 B" without
/// decimals; every other value carries two decimal places.
///
/// # Examples
///
/// ```
/// use media_depot::utils::format_file_size;
///
/// assert_eq!(format_file_size(0), "0 B");
/// assert_eq!(format_file_size(1536), "1.50 KB");
/// ```
#[must_use]
pub fn format_file_size(size_bytes: u64) -> String {
    if size_bytes == 0 {
        return "0 B".to_string();
    }

    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = size_bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", size, UNITS[unit])
}

/// Format an average transfer rate, e.g. "12.34 MB/s"
///
/// Returns `None` when the elapsed time is too short to measure a rate.
#[must_use]
pub fn format_throughput(bytes: u64, elapsed: Duration) -> Option<String> {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return None;
    }
    let rate = (bytes as f64 / secs) as u64;
    Some(format!("{}/s", format_file_size(rate)))
}

/// Format a media duration in seconds as `M:SS`
///
/// Zero (or unreported) durations render as "Unknown": providers commonly
/// omit the field rather than report an actual zero-length clip.
///
/// # Examples
///
/// ```
/// use media_depot::utils::format_media_duration;
///
/// assert_eq!(format_media_duration(65), "1:05");
/// assert_eq!(format_media_duration(0), "Unknown");
/// ```
#[must_use]
pub fn format_media_duration(duration_seconds: u32) -> String {
    if duration_seconds == 0 {
        return "Unknown".to_string();
    }
    let minutes = duration_seconds / 60;
    let seconds = duration_seconds % 60;
    format!("{minutes}:{seconds:02}")
}
