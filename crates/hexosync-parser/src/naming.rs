//! File name helpers shared by the attachment resolver and the dialect transform.
//!
//! Both stages must agree on the final attachment name, so the rules live here once.

use regex::Regex;
use std::sync::LazyLock;

/// Runs of whitespace inside a file name
static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Anything outside the web-safe set `[A-Za-z0-9_.-]`
static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_.\-]").unwrap());

/// Web-safe form of an attachment file name.
///
/// Trims, collapses whitespace runs to `_`, then drops every character outside
/// `[A-Za-z0-9_.-]`.
///
/// ```
/// use hexosync_parser::normalize_file_name;
///
/// assert_eq!(normalize_file_name("  my  photo (1).png "), "my_photo_1.png");
/// ```
pub fn normalize_file_name(name: &str) -> String {
    let underscored = WHITESPACE_RUN.replace_all(name.trim(), "_");
    UNSAFE_CHARS.replace_all(&underscored, "").into_owned()
}

/// Base file name of an attachment reference.
///
/// Drops an Obsidian `|size` or `|alias` suffix and every directory component.
pub fn attachment_base_name(reference: &str) -> &str {
    let target = reference.split('|').next().unwrap_or(reference).trim();
    target.rsplit(['/', '\\']).next().unwrap_or(target)
}

/// Whether a reference points off-disk (URL scheme or data URI)
pub fn is_remote_reference(reference: &str) -> bool {
    let reference = reference.trim();
    reference.contains("://")
        || reference.starts_with("data:")
        || reference.starts_with("mailto:")
}
