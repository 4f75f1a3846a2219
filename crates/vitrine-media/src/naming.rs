//! Stored file naming.
//!
//! Names are `<unix-millis>_<sanitized original name>`. Uniqueness comes from
//! the timestamp plus the client's file name; two uploads of the same name in
//! the same millisecond overwrite each other. Re-encoded uploads swap the
//! client's extension for `.jpg` so the name matches the stored bytes.

use chrono::Utc;

/// Reduce a client-supplied file name to something safe to join onto the
/// uploads directory.
///
/// Only the final path component is kept and characters outside
/// `[A-Za-z0-9._-]` become `_`. Leading dots are stripped so a name can
/// never be hidden or refer to a parent directory.
pub fn sanitize_file_name(original: &str) -> String {
    let last = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let cleaned: String = last
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Build a stored file name for `original` using the current time.
pub fn unique_file_name(original: &str) -> String {
    file_name_at(Utc::now().timestamp_millis(), original)
}

/// Like [`unique_file_name`], with the extension replaced by `.jpg`.
pub fn unique_jpeg_file_name(original: &str) -> String {
    let millis = Utc::now().timestamp_millis();
    format!("{millis}_{}", with_jpeg_extension(&sanitize_file_name(original)))
}

fn file_name_at(millis: i64, original: &str) -> String {
    format!("{millis}_{}", sanitize_file_name(original))
}

/// Replace the extension of an already sanitized name with `jpg`.
fn with_jpeg_extension(name: &str) -> String {
    let stem = match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    };
    format!("{stem}.jpg")
}
