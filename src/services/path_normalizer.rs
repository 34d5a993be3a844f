//! Canonical path form for cross-system comparison.
//!
//! Stash records and Real-Debrid manifests disagree on casing, separators,
//! and URL encoding for the same file. `normalize` folds both into one
//! comparable form: scheme stripped, percent-decoded, lowercased, forward
//! slashes, no trailing separator. The function is idempotent.

use std::borrow::Cow;

/// Normalize a path from either source into its comparable form
pub fn normalize(path: &str) -> String {
    let stripped = strip_file_scheme(path);

    let decoded = match urlencoding::decode(stripped) {
        Ok(Cow::Borrowed(s)) => s.to_string(),
        Ok(Cow::Owned(s)) => s,
        // Invalid percent sequences are kept verbatim
        Err(_) => stripped.to_string(),
    };

    let mut normalized = decoded.to_lowercase().replace('\\', "/");
    while normalized.len() > 1 && normalized.ends_with('/') {
        normalized.pop();
    }
    normalized
}

/// Split a path into its parent folder and basename, handling both separator
/// conventions. A path without any separator yields an empty folder.
pub fn split_parent(path: &str) -> (&str, &str) {
    match path.rfind(['/', '\\']) {
        Some(idx) => (&path[..idx], &path[idx + 1..]),
        None => ("", path),
    }
}

/// Last component of a folder path, used as the torrent search term
pub fn folder_base_name(folder: &str) -> &str {
    let trimmed = folder.trim_end_matches(['/', '\\']);
    match trimmed.rfind(['/', '\\']) {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

fn strip_file_scheme(path: &str) -> &str {
    if path.len() >= 7 && path[..7].eq_ignore_ascii_case("file://") {
        &path[7..]
    } else {
        path
    }
}
