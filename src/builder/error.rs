//! Build error taxonomy.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::bundle::BundleMessage;
use crate::utils::plural_count;

/// Errors that abort a single `Builder::build()` call.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Unreadable source root, failed walk step, unwritable destination.
    #[error("filesystem error at `{}`", path.display())]
    FileSystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Same relative page path found under two roots (release only).
    #[error(
        "duplicate page `{}` found in `{}` and `{}`",
        relative.display(),
        first.display(),
        second.display()
    )]
    DuplicateAsset {
        relative: PathBuf,
        first: PathBuf,
        second: PathBuf,
    },

    /// Every error reported by the bundler across all entries.
    #[error("{} in build process, check messages above", plural_count(errors.len(), "error"))]
    Bundle { errors: Vec<BundleMessage> },

    /// The bundler executable could not be found or launched.
    #[error("bundler `{program}` is unavailable: {reason}")]
    BundlerUnavailable { program: String, reason: String },

    /// Page source unreadable or page destination unwritable.
    #[error("failed to render page `{}`", path.display())]
    Render {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl BuildError {
    pub(crate) fn fs(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::FileSystem {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn render(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Render {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundle_error_counts_messages() {
        let err = BuildError::Bundle {
            errors: vec![
                BundleMessage::new("app/index.ts", 3, 4, "Expected \";\""),
                BundleMessage::new("app/admin.ts", 1, 0, "Could not resolve \"lodash\""),
            ],
        };
        assert_eq!(err.to_string(), "2 errors in build process, check messages above");
    }

    #[test]
    fn test_duplicate_message() {
        let err = BuildError::DuplicateAsset {
            relative: "index.html".into(),
            first: "/site/a".into(),
            second: "/site/b".into(),
        };
        assert_eq!(
            err.to_string(),
            "duplicate page `index.html` found in `/site/a` and `/site/b`"
        );
    }
}
