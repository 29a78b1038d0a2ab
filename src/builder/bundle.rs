//! Bundler interface.
//!
//! The pipeline hands one [`BuildEntry`] at a time to a [`Bundler`] and
//! collects a [`BundleOutcome`]. The default implementation drives the
//! `esbuild` executable (see [`super::esbuild`]); tests plug in an
//! in-process fake.

use std::fmt;
use std::path::{Path, PathBuf};

use super::BuildError;
use super::pairing::{AppPairing, ScriptKind};
use crate::core::Profile;

// ============================================================================
// options
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceMap {
    None,
    /// Separate `.map` file referenced by a trailing comment.
    Linked,
}

/// Bundler settings, fixed for the lifetime of a builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleOptions {
    pub bundle: bool,
    pub minify_whitespace: bool,
    pub minify_identifiers: bool,
    pub minify_syntax: bool,
    pub source_map: SourceMap,
    pub target: &'static str,
}

impl BundleOptions {
    pub const RELEASE: Self = Self {
        bundle: true,
        minify_whitespace: true,
        minify_identifiers: true,
        minify_syntax: true,
        source_map: SourceMap::Linked,
        target: "esnext",
    };

    pub const DEVELOPMENT: Self = Self {
        bundle: true,
        minify_whitespace: false,
        minify_identifiers: false,
        minify_syntax: false,
        source_map: SourceMap::None,
        target: "esnext",
    };

    pub const fn for_profile(profile: Profile) -> Self {
        match profile {
            Profile::Release => Self::RELEASE,
            Profile::Development => Self::DEVELOPMENT,
        }
    }
}

// ============================================================================
// entries
// ============================================================================

/// One bundler invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildEntry {
    /// Page this entry drives, relative to its source root.
    pub page: PathBuf,
    pub entry_point: PathBuf,
    pub output_dir: PathBuf,
    pub kind: ScriptKind,
    /// Compiler settings, typed entries only.
    pub tsconfig: Option<PathBuf>,
}

impl BuildEntry {
    /// Entry file name without its script suffix (`app.ts` -> `app`).
    pub fn stem(&self) -> String {
        let name = self
            .entry_point
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        name.strip_suffix(self.kind.suffix())
            .unwrap_or(&name)
            .to_string()
    }
}

/// Turn every pairing into a fresh [`BuildEntry`], in page order.
///
/// Output for `admin/app.ts` goes to `<scripts_dir>/admin/`.
pub fn plan_entries(pairing: &AppPairing, scripts_dir: &Path, tsconfig: &Path) -> Vec<BuildEntry> {
    pairing
        .iter()
        .map(|(page, script)| {
            let output_dir = match script.location.relative.parent() {
                Some(dir) => scripts_dir.join(dir),
                None => scripts_dir.to_path_buf(),
            };
            BuildEntry {
                page: page.clone(),
                entry_point: script.location.absolute(),
                output_dir,
                kind: script.kind,
                tsconfig: (script.kind == ScriptKind::Typed).then(|| tsconfig.to_path_buf()),
            }
        })
        .collect()
}

// ============================================================================
// outcome
// ============================================================================

/// A file produced by the bundler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub path: PathBuf,
    pub contents: Vec<u8>,
}

/// A location-tagged bundler error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleMessage {
    pub file: String,
    /// 1-based, 0 when the bundler gave no location.
    pub line: u32,
    pub column: u32,
    pub text: String,
}

impl BundleMessage {
    pub fn new(file: impl Into<String>, line: u32, column: u32, text: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line,
            column,
            text: text.into(),
        }
    }
}

impl fmt::Display for BundleMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.file, self.line, self.text)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleOutcome {
    pub output_files: Vec<OutputFile>,
    pub errors: Vec<BundleMessage>,
}

// ============================================================================
// bundler
// ============================================================================

/// Something that turns an entry point into output files.
///
/// Source errors belong in [`BundleOutcome::errors`]; `Err` is reserved for
/// failures of the bundler itself (cannot launch, cannot read its output).
pub trait Bundler {
    fn name(&self) -> &str;

    fn bundle(&self, entry: &BuildEntry, options: &BundleOptions) -> Result<BundleOutcome, BuildError>;
}
