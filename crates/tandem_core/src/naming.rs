//! Filename resolution.
//!
//! A display name supplied by a caller never carries its own extension: the
//! extension is taken from the name the file already has (the uploader's
//! reported name, or the currently stored filename on rename).

use std::sync::LazyLock;
use tandem_error::{FileError, FileErrorKind, TandemResult};

static EXTENSION: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"\.[0-9a-z]+$").expect("Valid extension regex"));

/// Trailing `.ext` of `name`, lower-cased, or an empty string.
///
/// # Examples
///
/// ```
/// use tandem_core::extension_of;
///
/// assert_eq!(extension_of("report.pdf"), ".pdf");
/// assert_eq!(extension_of("Scan.JPEG"), ".jpeg");
/// assert_eq!(extension_of("archive.tar.gz"), ".gz");
/// assert_eq!(extension_of("README"), "");
/// ```
pub fn extension_of(name: &str) -> String {
    let lowered = name.to_lowercase();
    EXTENSION
        .find(&lowered)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Final filename for an upload.
///
/// With an override the result is `override + extension_of(reported)`;
/// without one (or with an empty one) the reported name is used unchanged.
///
/// # Examples
///
/// ```
/// use tandem_core::resolve_upload_name;
///
/// assert_eq!(resolve_upload_name("IMG_0001.PNG", Some("cover")), "cover.png");
/// assert_eq!(resolve_upload_name("IMG_0001.PNG", None), "IMG_0001.PNG");
/// ```
pub fn resolve_upload_name(reported: &str, display_name: Option<&str>) -> String {
    match non_empty(display_name) {
        Some(name) => format!("{}{}", name, extension_of(reported)),
        None => reported.to_string(),
    }
}

/// Filename after renaming `current` to `display_name`.
///
/// Returns `None` when no display name is given.
///
/// # Examples
///
/// ```
/// use tandem_core::resolve_rename;
///
/// assert_eq!(resolve_rename("report.pdf", Some("summary")).as_deref(), Some("summary.pdf"));
/// assert_eq!(resolve_rename("report.pdf", None), None);
/// ```
pub fn resolve_rename(current: &str, display_name: Option<&str>) -> Option<String> {
    non_empty(display_name).map(|name| format!("{}{}", name, extension_of(current)))
}

/// Longest filename, in bytes, most filesystems accept for one path component.
pub const MAX_FILENAME_LEN: usize = 255;

/// Reject filenames that cannot be used as a single content-store key.
pub fn validate_filename(filename: &str) -> TandemResult<()> {
    let invalid = filename.is_empty()
        || filename.len() > MAX_FILENAME_LEN
        || filename == "."
        || filename == ".."
        || filename.contains(['/', '\\', '\0']);

    if invalid {
        return Err(FileError::new(FileErrorKind::InvalidName(filename.to_string())).into());
    }
    Ok(())
}

fn non_empty(name: Option<&str>) -> Option<&str> {
    name.filter(|n| !n.is_empty())
}
