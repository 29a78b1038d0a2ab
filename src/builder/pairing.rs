//! Page/script pairing.
//!
//! A script drives a page when both share the same root-relative path once
//! their suffixes are stripped: `admin/app.ts` drives `admin/app.html`.
//! Typed scripts are resolved in a second pass and overwrite plain ones,
//! so `app.ts` wins over `app.js` for the same page.

use std::collections::BTreeMap;
use std::path::PathBuf;

use super::scan::{SCRIPT_SUFFIX, ScannedAssets, SourceLocation, TYPED_SCRIPT_SUFFIX};
use crate::utils::path::replace_suffix;

/// Script flavor, decides loader and compiler config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptKind {
    Plain,
    Typed,
}

impl ScriptKind {
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Plain => SCRIPT_SUFFIX,
            Self::Typed => TYPED_SCRIPT_SUFFIX,
        }
    }
}

/// Script chosen to drive one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairedScript {
    pub location: SourceLocation,
    pub kind: ScriptKind,
}

/// Page relative path -> driving script, iterated in path order.
pub type AppPairing = BTreeMap<PathBuf, PairedScript>;

/// Pair every script with the page sharing its extension-stripped path.
///
/// Pages without a script are simply absent from the result.
pub fn resolve_pairing(assets: &ScannedAssets, html_extension: &str) -> AppPairing {
    let mut pairing = AppPairing::new();
    pair_phase(&mut pairing, assets, &assets.scripts, ScriptKind::Plain, html_extension);
    pair_phase(&mut pairing, assets, &assets.typed_scripts, ScriptKind::Typed, html_extension);
    pairing
}

fn pair_phase(
    pairing: &mut AppPairing,
    assets: &ScannedAssets,
    scripts: &[SourceLocation],
    kind: ScriptKind,
    html_extension: &str,
) {
    for script in scripts {
        let Some(page) = replace_suffix(&script.relative, kind.suffix(), html_extension) else {
            continue;
        };
        if assets.html_pages.contains_key(&page) {
            pairing.insert(
                page,
                PairedScript {
                    location: script.clone(),
                    kind,
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::scan::HtmlPage;
    use std::path::Path;

    fn assets(scripts: &[&str], typed: &[&str], pages: &[&str]) -> ScannedAssets {
        let loc = |rel: &&str| SourceLocation::new("/src", *rel);
        ScannedAssets {
            scripts: scripts.iter().map(loc).collect(),
            typed_scripts: typed.iter().map(loc).collect(),
            html_pages: pages
                .iter()
                .map(|rel| (PathBuf::from(rel), HtmlPage { location: loc(rel) }))
                .collect(),
        }
    }

    #[test]
    fn test_pairs_by_stripped_path() {
        let assets = assets(&["admin/app.js", "lonely.js"], &[], &["admin/app.html", "about.html"]);
        let pairing = resolve_pairing(&assets, ".html");

        assert_eq!(pairing.len(), 1);
        let paired = &pairing[Path::new("admin/app.html")];
        assert_eq!(paired.location.relative, PathBuf::from("admin/app.js"));
        assert_eq!(paired.kind, ScriptKind::Plain);
    }

    #[test]
    fn test_directory_must_match() {
        let assets = assets(&["app.js"], &[], &["admin/app.html"]);
        assert!(resolve_pairing(&assets, ".html").is_empty());
    }

    #[test]
    fn test_typed_wins_over_plain() {
        let assets = assets(&["index.js"], &["index.ts"], &["index.html"]);
        let pairing = resolve_pairing(&assets, ".html");

        let paired = &pairing[Path::new("index.html")];
        assert_eq!(paired.location.relative, PathBuf::from("index.ts"));
        assert_eq!(paired.kind, ScriptKind::Typed);
    }

    #[test]
    fn test_custom_extension() {
        let assets = assets(&[], &["page.ts"], &["page.htm", "page.html"]);
        let pairing = resolve_pairing(&assets, ".htm");
        assert_eq!(pairing.keys().collect::<Vec<_>>(), vec![Path::new("page.htm")]);
    }

    #[test]
    fn test_deterministic_order() {
        let assets = assets(&["b.js", "a.js", "c/d.js"], &[], &["c/d.html", "b.html", "a.html"]);
        let pages: Vec<_> = resolve_pairing(&assets, ".html").into_keys().collect();
        assert_eq!(
            pages,
            vec![
                PathBuf::from("a.html"),
                PathBuf::from("b.html"),
                PathBuf::from("c/d.html")
            ]
        );
    }
}
