//! Utility functions for file naming and output paths

use std::path::{Path, PathBuf};

/// Name used when sanitization leaves nothing behind
const FALLBACK_FILE_STEM: &str = "untitled";

/// Strip every character that is not alphanumeric, a space, a hyphen or an underscore,
/// then drop trailing whitespace.
///
/// # Examples
///
/// ```
/// use raiplay_dl::utils::sanitize_name;
///
/// assert_eq!(sanitize_name("Ep. 3: L'arrivo?"), "Ep 3 Larrivo");
/// assert_eq!(sanitize_name("Città - parte_2 "), "Città - parte_2");
/// ```
pub fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    cleaned.trim_end().to_string()
}

/// Build the download tool's output template for an episode.
///
/// The result is `{dir}/{sanitized name}.%(ext)s`; the extension placeholder is filled
/// in by the tool once the container format is known.
pub fn output_template(dir: &Path, display_name: &str) -> PathBuf {
    let mut stem = sanitize_name(display_name);
    if stem.is_empty() {
        stem = FALLBACK_FILE_STEM.to_string();
    }
    dir.join(format!("{stem}.%(ext)s"))
}

/// Best-effort display name derived from a playback URL: the last path segment
/// without its extension.
pub fn name_from_url(url: &str) -> String {
    let path = match url::Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.to_string(),
    };

    let segment = path
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();

    let stem = segment
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(segment);

    if stem.is_empty() {
        FALLBACK_FILE_STEM.to_string()
    } else {
        stem.to_string()
    }
}
