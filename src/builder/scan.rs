//! Source discovery.
//!
//! Walks every source root and sorts files into scripts, typed scripts and
//! html pages. Paths are kept relative to their owning root so several roots
//! merge into one namespace:
//!
//! ```text
//! scripts/                      templates/
//! ├── index.ts   -> index.ts    ├── index.html -> index.html
//! └── admin/                    └── admin/
//!     └── app.js -> admin/app.js    └── app.html -> admin/app.html
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use jwalk::{Parallelism, WalkDir};

use super::BuildError;
use crate::core::Profile;
use crate::debug;
use crate::utils::path::has_suffix;

pub const SCRIPT_SUFFIX: &str = ".js";
pub const TYPED_SCRIPT_SUFFIX: &str = ".ts";

/// A discovered file: owning root plus path relative to it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceLocation {
    pub root: PathBuf,
    pub relative: PathBuf,
}

impl SourceLocation {
    pub fn new(root: impl Into<PathBuf>, relative: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            relative: relative.into(),
        }
    }

    /// Absolute path of the file on disk.
    pub fn absolute(&self) -> PathBuf {
        self.root.join(&self.relative)
    }
}

/// Handle to a page source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlPage {
    pub location: SourceLocation,
}

/// Everything one scan found.
#[derive(Debug, Default)]
pub struct ScannedAssets {
    pub scripts: Vec<SourceLocation>,
    pub typed_scripts: Vec<SourceLocation>,
    /// Keyed by root-relative path, unique across roots.
    pub html_pages: BTreeMap<PathBuf, HtmlPage>,
}

impl ScannedAssets {
    pub fn file_count(&self) -> usize {
        self.scripts.len() + self.typed_scripts.len() + self.html_pages.len()
    }
}

/// File classes recognized by suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileClass {
    Script,
    TypedScript,
    Page,
}

pub struct AssetScanner<'a> {
    html_extension: &'a str,
    profile: Profile,
}

impl<'a> AssetScanner<'a> {
    pub const fn new(html_extension: &'a str, profile: Profile) -> Self {
        Self {
            html_extension,
            profile,
        }
    }

    /// Scan every root in order.
    ///
    /// Any unreadable root or failed walk step aborts the whole scan.
    pub fn scan(&self, roots: &[PathBuf]) -> Result<ScannedAssets, BuildError> {
        let mut assets = ScannedAssets::default();
        for root in roots {
            self.scan_root(root, &mut assets)?;
        }
        Ok(assets)
    }

    fn scan_root(&self, root: &Path, assets: &mut ScannedAssets) -> Result<(), BuildError> {
        let meta = fs::metadata(root).map_err(|e| BuildError::fs(root, e))?;
        if !meta.is_dir() {
            return Err(BuildError::fs(
                root,
                io::Error::new(io::ErrorKind::InvalidInput, "source root is not a directory"),
            ));
        }

        let walk = WalkDir::new(root)
            .sort(true)
            .skip_hidden(false)
            .parallelism(Parallelism::Serial);
        for entry in walk {
            let entry = entry.map_err(|e| BuildError::fs(root, io::Error::other(e.to_string())))?;
            if entry.file_type().is_dir() {
                continue;
            }

            let path = entry.path();
            let Some(class) = self.classify(&path) else {
                continue;
            };
            let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
            let location = SourceLocation::new(root, relative);

            match class {
                FileClass::Script => assets.scripts.push(location),
                FileClass::TypedScript => assets.typed_scripts.push(location),
                FileClass::Page => self.insert_page(assets, location)?,
            }
        }
        Ok(())
    }

    fn classify(&self, path: &Path) -> Option<FileClass> {
        if has_suffix(path, SCRIPT_SUFFIX) {
            Some(FileClass::Script)
        } else if has_suffix(path, TYPED_SCRIPT_SUFFIX) {
            Some(FileClass::TypedScript)
        } else if has_suffix(path, self.html_extension) {
            Some(FileClass::Page)
        } else {
            None
        }
    }

    /// Release builds refuse ambiguous pages; development keeps the later root.
    fn insert_page(
        &self,
        assets: &mut ScannedAssets,
        location: SourceLocation,
    ) -> Result<(), BuildError> {
        let relative = location.relative.clone();
        if let Some(existing) = assets.html_pages.get(&relative) {
            if self.profile.is_release() {
                return Err(BuildError::DuplicateAsset {
                    relative,
                    first: existing.location.root.clone(),
                    second: location.root,
                });
            }
            debug!("scan"; "{} from {} replaces {}",
                relative.display(), location.root.display(), existing.location.root.display());
        }
        assets.html_pages.insert(relative, HtmlPage { location });
        Ok(())
    }
}
