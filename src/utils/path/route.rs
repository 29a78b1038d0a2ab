//! Web path utilities.
//!
//! Output files live on disk under the destination root; pages reference
//! them by a web-rooted path (`/js/admin/app.js`). These helpers convert
//! between the two and manipulate file-name suffixes without touching disk.

use std::path::{Component, Path, PathBuf};

/// Convert a file under `root` into a web-rooted path.
///
/// Components are always joined with `/`, whatever the platform separator.
/// Returns `None` when `file` is not inside `root`.
///
/// # Examples
/// ```ignore
/// web_path(Path::new("/out"), Path::new("/out/js/app.js")) -> Some("/js/app.js")
/// web_path(Path::new("/out"), Path::new("/elsewhere/app.js")) -> None
/// ```
pub fn web_path(root: &Path, file: &Path) -> Option<String> {
    let rel = file.strip_prefix(root).ok()?;
    let mut url = String::new();
    for component in rel.components() {
        if let Component::Normal(part) = component {
            url.push('/');
            url.push_str(&part.to_string_lossy());
        }
    }
    if url.is_empty() {
        url.push('/');
    }
    Some(url)
}

/// Replace the `suffix` at the end of the file name with `replacement`.
///
/// Works on the raw file name, so multi-dot suffixes such as `.tpl.html`
/// are handled. Returns `None` when the name does not end with `suffix`
/// or would become empty.
///
/// # Examples
/// ```ignore
/// replace_suffix(Path::new("admin/app.ts"), ".ts", ".html") -> Some("admin/app.html")
/// replace_suffix(Path::new("admin/app.ts"), ".js", ".html") -> None
/// ```
pub fn replace_suffix(path: &Path, suffix: &str, replacement: &str) -> Option<PathBuf> {
    let name = path.file_name()?.to_str()?;
    let stem = name.strip_suffix(suffix)?;
    if stem.is_empty() {
        return None;
    }
    Some(path.with_file_name(format!("{stem}{replacement}")))
}

/// Check whether the file name ends with `suffix` (case-sensitive).
#[inline]
pub fn has_suffix(path: &Path, suffix: &str) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.len() > suffix.len() && n.ends_with(suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_web_path() {
        assert_eq!(
            web_path(Path::new("/out"), Path::new("/out/js/admin/app.js")),
            Some("/js/admin/app.js".to_string())
        );
        assert_eq!(
            web_path(Path::new("/out"), Path::new("/out")),
            Some("/".to_string())
        );
        assert_eq!(web_path(Path::new("/out"), Path::new("/other/app.js")), None);
    }

    #[test]
    fn test_replace_suffix() {
        assert_eq!(
            replace_suffix(Path::new("admin/app.ts"), ".ts", ".html"),
            Some(PathBuf::from("admin/app.html"))
        );
        assert_eq!(
            replace_suffix(Path::new("page.js"), ".js", ".tpl.html"),
            Some(PathBuf::from("page.tpl.html"))
        );
        assert_eq!(replace_suffix(Path::new("app.ts"), ".js", ".html"), None);
        assert_eq!(replace_suffix(Path::new(".js"), ".js", ".html"), None);
    }

    #[test]
    fn test_has_suffix() {
        assert!(has_suffix(Path::new("a/index.html"), ".html"));
        assert!(has_suffix(Path::new("index.tpl.html"), ".tpl.html"));
        assert!(!has_suffix(Path::new("index.htm"), ".html"));
        assert!(!has_suffix(Path::new(".html"), ".html"));
    }
}
