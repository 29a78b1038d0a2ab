//! `esbuild` executable driver.
//!
//! One process per entry:
//!
//! ```text
//! esbuild <entry> --bundle --outdir=<dir> --target=esnext --color=false
//!         [--minify-whitespace --minify-identifiers --minify-syntax]
//!         [--sourcemap=linked] [--loader:.ts=ts --tsconfig=<path>]
//! ```
//!
//! Errors are parsed from stderr. Both the current diagnostic layout and
//! the older single-line layout are understood:
//!
//! ```text
//! ✘ [ERROR] Expected ";" but found "b"       > app/index.ts:3:6: error: Expected ";"
//!
//!     app/index.ts:3:6:
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use super::BuildError;
use super::bundle::{BuildEntry, BundleMessage, BundleOptions, BundleOutcome, Bundler, OutputFile, SourceMap};
use crate::utils::exec::{Cmd, strip_ansi};
use crate::utils::path::resolve_path;
use crate::{debug, log};

/// Extensions esbuild may emit next to the entry stem.
const OUTPUT_EXTENSIONS: &[&str] = &[".js", ".js.map", ".css", ".css.map"];

const ERROR_MARKERS: &[&str] = &["✘ [ERROR] ", "X [ERROR] ", "[ERROR] "];
const WARNING_MARKERS: &[&str] = &["▲ [WARNING] ", "! [WARNING] ", "[WARNING] "];
const LEGACY_ERROR: &str = ": error: ";

pub struct Esbuild {
    program: PathBuf,
    cwd: PathBuf,
}

impl Esbuild {
    /// Find the bundler executable.
    ///
    /// A bare name is looked up in `<root>/node_modules/.bin` first, then on
    /// `PATH`. A name containing a separator is a path relative to `root`.
    pub fn locate(program: &str, root: &Path) -> Result<Self, BuildError> {
        let unavailable = |reason: String| BuildError::BundlerUnavailable {
            program: program.to_string(),
            reason,
        };

        let path = Path::new(program);
        let resolved = if path.components().count() > 1 {
            let candidate = resolve_path(path, root);
            if !candidate.is_file() {
                return Err(unavailable(format!("`{}` does not exist", candidate.display())));
            }
            candidate
        } else {
            let local = root.join("node_modules").join(".bin").join(program);
            if local.is_file() {
                local
            } else {
                which::which(program)
                    .map_err(|e| unavailable(format!("{e}, install it with `npm i -g esbuild`")))?
            }
        };

        debug!("bundle"; "using {}", resolved.display());
        Ok(Self {
            program: resolved,
            cwd: root.to_path_buf(),
        })
    }

    fn args(entry: &BuildEntry, options: &BundleOptions) -> Vec<String> {
        let mut args = vec![
            entry.entry_point.to_string_lossy().into_owned(),
            format!("--outdir={}", entry.output_dir.display()),
            format!("--target={}", options.target),
            "--color=false".to_string(),
            "--log-level=warning".to_string(),
        ];
        if options.bundle {
            args.push("--bundle".into());
        }
        if options.minify_whitespace {
            args.push("--minify-whitespace".into());
        }
        if options.minify_identifiers {
            args.push("--minify-identifiers".into());
        }
        if options.minify_syntax {
            args.push("--minify-syntax".into());
        }
        if options.source_map == SourceMap::Linked {
            args.push("--sourcemap=linked".into());
        }
        if let Some(tsconfig) = &entry.tsconfig {
            args.push("--loader:.ts=ts".into());
            if tsconfig.is_file() {
                args.push(format!("--tsconfig={}", tsconfig.display()));
            }
        }
        args
    }

    /// Read back whatever esbuild wrote for this entry.
    fn collect_outputs(entry: &BuildEntry) -> Result<Vec<OutputFile>, BuildError> {
        let stem = entry.stem();
        let mut files = Vec::new();
        for ext in OUTPUT_EXTENSIONS {
            let path = entry.output_dir.join(format!("{stem}{ext}"));
            if !path.is_file() {
                continue;
            }
            let contents = fs::read(&path).map_err(|e| BuildError::fs(&path, e))?;
            files.push(OutputFile { path, contents });
        }
        Ok(files)
    }
}

impl Bundler for Esbuild {
    fn name(&self) -> &str {
        "esbuild"
    }

    fn bundle(&self, entry: &BuildEntry, options: &BundleOptions) -> Result<BundleOutcome, BuildError> {
        let output = Cmd::new(&self.program)
            .args(Self::args(entry, options))
            .cwd(&self.cwd)
            .output()
            .map_err(|e| BuildError::BundlerUnavailable {
                program: self.program.display().to_string(),
                reason: format!("{e:#}"),
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        let fallback_file = entry.entry_point.display().to_string();
        let mut errors = parse_messages(&stderr, &fallback_file);

        if !output.status.success() && errors.is_empty() {
            let text = strip_ansi(stderr.trim()).into_owned();
            let text = if text.is_empty() {
                format!("esbuild exited with {}", output.status)
            } else {
                text
            };
            errors.push(BundleMessage::new(fallback_file, 0, 0, text));
        }
        if !errors.is_empty() {
            return Ok(BundleOutcome {
                output_files: Vec::new(),
                errors,
            });
        }

        Ok(BundleOutcome {
            output_files: Self::collect_outputs(entry)?,
            errors,
        })
    }
}

// ============================================================================
// diagnostics
// ============================================================================

/// Parse esbuild diagnostics into location-tagged errors.
///
/// An error header without a location line below it is reported against
/// `fallback_file` at line 0. Warnings are logged, not returned.
pub fn parse_messages(stderr: &str, fallback_file: &str) -> Vec<BundleMessage> {
    let mut messages = Vec::new();
    let mut pending: Option<String> = None;

    for raw in stderr.lines() {
        let line = strip_ansi(raw);
        let line = line.trim();

        if let Some(text) = strip_marker(line, ERROR_MARKERS) {
            if let Some(prev) = pending.replace(text.to_string()) {
                messages.push(BundleMessage::new(fallback_file, 0, 0, prev));
            }
            continue;
        }

        if let Some(text) = pending.take() {
            if line.is_empty() {
                pending = Some(text);
            } else if let Some((file, row, col)) = line.strip_suffix(':').and_then(parse_location) {
                messages.push(BundleMessage::new(file, row, col, text));
            } else {
                messages.push(BundleMessage::new(fallback_file, 0, 0, text));
            }
            continue;
        }

        if let Some(text) = strip_marker(line, WARNING_MARKERS) {
            log!("warning"; "{}", text);
        } else if let Some(message) = parse_legacy(line) {
            messages.push(message);
        }
    }

    if let Some(text) = pending {
        messages.push(BundleMessage::new(fallback_file, 0, 0, text));
    }
    messages
}

fn strip_marker<'a>(line: &'a str, markers: &[&str]) -> Option<&'a str> {
    markers.iter().find_map(|m| line.strip_prefix(m))
}

/// `file:line:col` -> parts. The file part may itself contain `:`.
fn parse_location(s: &str) -> Option<(&str, u32, u32)> {
    let mut parts = s.rsplitn(3, ':');
    let col = parts.next()?.parse().ok()?;
    let row = parts.next()?.parse().ok()?;
    let file = parts.next().filter(|f| !f.is_empty())?;
    Some((file, row, col))
}

/// `> file:line:col: error: text`
fn parse_legacy(line: &str) -> Option<BundleMessage> {
    let line = line.strip_prefix('>')?.trim_start();
    let (location, text) = line.split_once(LEGACY_ERROR)?;
    let (file, row, col) = parse_location(location)?;
    Some(BundleMessage::new(file, row, col, text))
}
