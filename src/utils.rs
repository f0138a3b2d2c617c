//! Common utility functions shared across the codebase.

/// Checks if the text contains at least one alphanumeric character.
///
/// Lines without any alphanumeric content are structural markers or
/// pure punctuation and are never translation candidates.
///
/// # Examples
///
/// ```
/// use tweeloc::utils::contains_alphanumeric;
///
/// assert!(contains_alphanumeric("Hello"));
/// assert!(contains_alphanumeric("你好"));
/// assert!(contains_alphanumeric("row 1"));
/// assert!(!contains_alphanumeric("---"));
/// assert!(!contains_alphanumeric(""));
/// ```
pub fn contains_alphanumeric(text: &str) -> bool {
    text.chars().any(|c| c.is_alphanumeric())
}

/// Normalize a relative path to forward slashes.
///
/// Dictionary files mirror the source tree's relative paths; keeping the
/// separator stable keeps the lexicographic processing order and the
/// checkpoint cursor portable across platforms.
pub fn normalize_rel_path(path: &std::path::Path) -> String {
    let s = path.to_string_lossy();
    if std::path::MAIN_SEPARATOR == '/' {
        s.into_owned()
    } else {
        s.replace(std::path::MAIN_SEPARATOR, "/")
    }
}
