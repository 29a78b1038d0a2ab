//! Shared helpers: external commands, paths, and small formatting bits.

pub mod exec;
pub mod path;

/// Format count with noun, handling pluralization
///
/// `plural_count(1, "page")` -> `"1 page"`, `plural_count(3, "page")` -> `"3 pages"`
#[inline]
pub fn plural_count(count: usize, noun: &str) -> String {
    let s = if count == 1 { "" } else { "s" };
    format!("{count} {noun}{s}")
}
