//! Output naming for cache busting.
//!
//! Release bundles carry a content fingerprint in their file name so they
//! can be cached forever: `app.js` becomes `app.1a2b3c4d.js`. Development
//! bundles keep their plain names.
//!
//! Naming is split in two: [`fingerprint`] and [`fingerprinted_path`] are
//! pure, [`OutputNamer::materialize`] moves the file on disk.

use std::fs;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use super::BuildError;
use super::bundle::OutputFile;
use crate::core::Profile;

/// Bytes of the digest kept in file names (8 hex chars).
const FINGERPRINT_BYTES: usize = 4;

/// Output path as reported by the bundler -> web-rooted reference.
pub type ScriptReferences = FxHashMap<PathBuf, String>;

/// Short content hash, 8 lowercase hex characters.
pub fn fingerprint(contents: &[u8]) -> String {
    let hash = blake3::hash(contents);
    hex::encode(&hash.as_bytes()[..FINGERPRINT_BYTES])
}

/// Insert `fingerprint` before the extension.
///
/// `js/app.js` -> `js/app.<fp>.js`, `LICENSE` -> `LICENSE.<fp>`.
/// Only the last extension moves: `app.min.js` -> `app.min.<fp>.js`.
pub fn fingerprinted_path(path: &Path, fingerprint: &str) -> PathBuf {
    let stem = path.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}.{fingerprint}.{}", ext.to_string_lossy()),
        None => format!("{stem}.{fingerprint}"),
    };
    path.with_file_name(name)
}

fn is_source_map(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "map")
}

#[derive(Debug, Clone, Copy)]
pub struct OutputNamer {
    profile: Profile,
}

impl OutputNamer {
    pub const fn new(profile: Profile) -> Self {
        Self { profile }
    }

    /// Final location of an output file. Never touches disk.
    pub fn final_path(&self, file: &OutputFile) -> PathBuf {
        if !self.profile.is_release() || is_source_map(&file.path) {
            return file.path.clone();
        }
        fingerprinted_path(&file.path, &fingerprint(&file.contents))
    }

    /// Put the output at its final location and return that location.
    ///
    /// A file the bundler left on disk is renamed; otherwise the captured
    /// bytes are written. The un-hashed path does not survive.
    pub fn materialize(&self, file: &OutputFile) -> Result<PathBuf, BuildError> {
        let target = self.final_path(file);
        if target == file.path && file.path.is_file() {
            return Ok(target);
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| BuildError::fs(parent, e))?;
        }
        if file.path.is_file() {
            fs::rename(&file.path, &target).map_err(|e| BuildError::fs(&file.path, e))?;
        } else {
            fs::write(&target, &file.contents).map_err(|e| BuildError::fs(&target, e))?;
        }
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn output(path: impl Into<PathBuf>, contents: &str) -> OutputFile {
        OutputFile {
            path: path.into(),
            contents: contents.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_fingerprint_shape() {
        let fp = fingerprint(b"console.log(1)");
        assert_eq!(fp.len(), 8);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_fingerprint_deterministic_and_sensitive() {
        assert_eq!(fingerprint(b"let a = 1"), fingerprint(b"let a = 1"));
        assert_ne!(fingerprint(b"let a = 1"), fingerprint(b"let a = 2"));
    }

    #[test]
    fn test_fingerprinted_path() {
        assert_eq!(
            fingerprinted_path(Path::new("/out/js/app.js"), "1a2b3c4d"),
            PathBuf::from("/out/js/app.1a2b3c4d.js")
        );
        assert_eq!(
            fingerprinted_path(Path::new("app.min.js"), "1a2b3c4d"),
            PathBuf::from("app.min.1a2b3c4d.js")
        );
        assert_eq!(
            fingerprinted_path(Path::new("LICENSE"), "1a2b3c4d"),
            PathBuf::from("LICENSE.1a2b3c4d")
        );
    }

    #[test]
    fn test_development_is_identity() {
        let namer = OutputNamer::new(Profile::Development);
        let file = output("/out/js/app.js", "x");
        assert_eq!(namer.final_path(&file), file.path);
    }

    #[test]
    fn test_source_maps_keep_name() {
        let namer = OutputNamer::new(Profile::Release);
        let file = output("/out/js/app.js.map", "{}");
        assert_eq!(namer.final_path(&file), file.path);
    }

    #[test]
    fn test_release_same_bytes_same_name() {
        let namer = OutputNamer::new(Profile::Release);
        let a = namer.final_path(&output("/out/js/app.js", "same"));
        let b = namer.final_path(&output("/out/js/app.js", "same"));
        let c = namer.final_path(&output("/out/js/app.js", "changed"));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_materialize_renames_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("js/app.js");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "bundle").unwrap();

        let namer = OutputNamer::new(Profile::Release);
        let target = namer.materialize(&output(&path, "bundle")).unwrap();

        assert_eq!(target, dir.path().join(format!("js/app.{}.js", fingerprint(b"bundle"))));
        assert!(target.is_file());
        assert!(!path.exists());
    }

    #[test]
    fn test_materialize_writes_in_memory_output() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("js/admin/app.js");

        let namer = OutputNamer::new(Profile::Development);
        let target = namer.materialize(&output(&path, "bundle")).unwrap();

        assert_eq!(target, path);
        assert_eq!(fs::read_to_string(&path).unwrap(), "bundle");
    }
}
