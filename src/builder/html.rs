//! Page rendering.
//!
//! A paired page gets a `<script>` tag for its bundle:
//!
//! - every `<!--#APP#-->` marker is replaced by the tag, or
//! - without a marker, a `js-app` template block holding the tag is appended
//!   so server-side layouts can place it themselves.
//!
//! The index page is a full document, never a template fragment, so it only
//! ever gets marker replacement.

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use super::BuildError;
use super::scan::HtmlPage;
use crate::log;
use crate::utils::path::replace_suffix;

pub const APP_PLACEHOLDER: &str = "<!--#APP#-->";
pub const TEMPLATE_NAME: &str = "js-app";

pub fn script_tag(src: &str) -> String {
    format!(r#"<script src="{src}"></script>"#)
}

/// Template block appended to marker-less fragments.
pub fn template_block(src: &str) -> String {
    format!(
        "\n{{{{ define \"{TEMPLATE_NAME}\" }}}}{}{{{{ end }}}}\n",
        script_tag(src)
    )
}

/// How a script reference ended up in a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Injection {
    Replaced(usize),
    Appended,
    /// Nothing to do (index page without a marker).
    Skipped,
}

/// Inject `src` into `html`.
pub fn inject<'a>(html: &'a [u8], src: &str, allow_template: bool) -> (Cow<'a, [u8]>, Injection) {
    let tag = script_tag(src);
    let (replaced, count) = replace_all(html, APP_PLACEHOLDER.as_bytes(), tag.as_bytes());
    if count > 0 {
        return (Cow::Owned(replaced), Injection::Replaced(count));
    }
    if !allow_template {
        return (Cow::Borrowed(html), Injection::Skipped);
    }
    let mut out = html.to_vec();
    out.extend_from_slice(template_block(src).as_bytes());
    (Cow::Owned(out), Injection::Appended)
}

fn replace_all(haystack: &[u8], needle: &[u8], replacement: &[u8]) -> (Vec<u8>, usize) {
    let mut out = Vec::with_capacity(haystack.len());
    let mut count = 0;
    let mut rest = haystack;
    while let Some(pos) = rest.windows(needle.len()).position(|w| w == needle) {
        out.extend_from_slice(&rest[..pos]);
        out.extend_from_slice(replacement);
        rest = &rest[pos + needle.len()..];
        count += 1;
    }
    out.extend_from_slice(rest);
    (out, count)
}

// ============================================================================
// renderer
// ============================================================================

pub struct HtmlRenderer<'a> {
    pub html_dir: PathBuf,
    pub scripts_dir: PathBuf,
    pub html_extension: &'a str,
    pub index_file: &'a str,
}

impl HtmlRenderer<'_> {
    /// Where the bundle for a page is expected before naming:
    /// `<scripts_dir>/<page path without extension>.js`.
    pub fn expected_script(&self, relative: &Path) -> Option<PathBuf> {
        replace_suffix(relative, self.html_extension, ".js").map(|p| self.scripts_dir.join(p))
    }

    fn is_index(&self, relative: &Path) -> bool {
        relative.file_name().is_some_and(|n| n == self.index_file)
    }

    /// Render one page to `<html_dir>/<relative>`.
    ///
    /// `src` is the page's script reference, `None` for unpaired pages,
    /// which are copied unchanged.
    pub fn render(&self, relative: &Path, page: &HtmlPage, src: Option<&str>) -> Result<PathBuf, BuildError> {
        let source = page.location.absolute();
        let target = self.html_dir.join(relative);

        let html = fs::read(&source).map_err(|e| BuildError::render(&source, e))?;
        let contents = match src {
            Some(src) => {
                let (contents, injection) = inject(&html, src, !self.is_index(relative));
                if injection == Injection::Skipped {
                    log!("warning"; "{} has no {} marker, copied without script",
                        relative.display(), APP_PLACEHOLDER);
                }
                contents
            }
            None => Cow::Borrowed(html.as_slice()),
        };

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| BuildError::render(parent, e))?;
        }
        fs::write(&target, &contents).map_err(|e| BuildError::render(&target, e))?;
        Ok(target)
    }
}
