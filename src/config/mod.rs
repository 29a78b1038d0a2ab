//! Builder configuration from `.front-builder.json`.
//!
//! # Fields
//!
//! | Field            | Purpose                                         | Default         |
//! |------------------|-------------------------------------------------|-----------------|
//! | `source`         | Source root, or list of roots (merged in order) | required        |
//! | `destination`    | Output root                                     | required        |
//! | `index_file`     | Page treated as a full document                 | `index.html`    |
//! | `html_extension` | Suffix identifying html pages                   | `.html`         |
//! | `scripts_prefix` | Bundles go to `destination/<scripts_prefix>`    | `js`            |
//! | `html_prefix`    | Pages go to `destination/<html_prefix>`         | `views`         |
//! | `tsconfig`       | Compiler settings for typed scripts             | `tsconfig.json` |
//! | `bundler`        | Bundler executable                              | `esbuild`       |
//! | `debounce_ms`    | Watch mode: quiet period before a rebuild       | `100`           |
//!
//! Relative paths are resolved against the directory holding the config file.

mod error;
mod util;

pub use error::ConfigError;
use util::{find_config_file, normalize_extension};

use crate::{cli::Cli, debug, log, utils::path::resolve_path};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    fs,
    path::{Component, Path, PathBuf},
    time::Duration,
};

const DEFAULT_INDEX_FILE: &str = "index.html";
const DEFAULT_HTML_EXTENSION: &str = ".html";
const DEFAULT_SCRIPTS_PREFIX: &str = "js";
const DEFAULT_HTML_PREFIX: &str = "views";
const DEFAULT_TSCONFIG: &str = "tsconfig.json";
const DEFAULT_BUNDLER: &str = "esbuild";
const DEFAULT_DEBOUNCE_MS: u64 = 100;

// ============================================================================
// source roots
// ============================================================================

/// One source root or an ordered list of them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged, expecting = "source can be either string or array of strings")]
pub enum SourceRoots {
    One(PathBuf),
    Many(Vec<PathBuf>),
}

impl SourceRoots {
    pub fn as_slice(&self) -> &[PathBuf] {
        match self {
            Self::One(path) => std::slice::from_ref(path),
            Self::Many(paths) => paths,
        }
    }

    fn map(&mut self, f: impl Fn(&Path) -> PathBuf) {
        match self {
            Self::One(path) => *path = f(path),
            Self::Many(paths) => paths.iter_mut().for_each(|p| *p = f(p)),
        }
    }
}

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing `.front-builder.json`
#[derive(Debug, Clone, Deserialize)]
pub struct BuilderConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    pub source: SourceRoots,

    pub destination: PathBuf,

    #[serde(default = "default_index_file")]
    pub index_file: String,

    #[serde(default = "default_html_extension")]
    pub html_extension: String,

    #[serde(default = "default_scripts_prefix")]
    pub scripts_prefix: String,

    #[serde(default = "default_html_prefix")]
    pub html_prefix: String,

    #[serde(default = "default_tsconfig")]
    pub tsconfig: PathBuf,

    #[serde(default = "default_bundler")]
    pub bundler: String,

    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_index_file() -> String {
    DEFAULT_INDEX_FILE.into()
}
fn default_html_extension() -> String {
    DEFAULT_HTML_EXTENSION.into()
}
fn default_scripts_prefix() -> String {
    DEFAULT_SCRIPTS_PREFIX.into()
}
fn default_html_prefix() -> String {
    DEFAULT_HTML_PREFIX.into()
}
fn default_tsconfig() -> PathBuf {
    DEFAULT_TSCONFIG.into()
}
fn default_bundler() -> String {
    DEFAULT_BUNDLER.into()
}
const fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

impl BuilderConfig {
    /// Configuration with every optional field at its default.
    ///
    /// Paths are used as given; call [`finalize`](Self::finalize) to resolve them.
    #[cfg(test)]
    pub fn new(sources: Vec<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            config_path: PathBuf::new(),
            root: PathBuf::new(),
            source: SourceRoots::Many(sources),
            destination: destination.into(),
            index_file: default_index_file(),
            html_extension: default_html_extension(),
            scripts_prefix: default_scripts_prefix(),
            html_prefix: default_html_prefix(),
            tsconfig: default_tsconfig(),
            bundler: default_bundler(),
            debounce_ms: default_debounce_ms(),
        }
    }

    /// Load configuration for the given CLI invocation.
    ///
    /// Searches upward from cwd for the config file; the project root is
    /// the config file's parent directory.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;
        let config_path = find_config_file(&cli.config, &cwd)
            .ok_or_else(|| ConfigError::NotFound(cli.config.clone()))?;

        let mut config = Self::from_path(&config_path)?;
        if let Some(output) = &cli.output {
            // CLI paths are relative to cwd, not to the config file
            config.destination = cwd.join(output);
        }

        let root = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        config.config_path = config_path;
        config.finalize(&root);
        config.validate()?;
        config.ensure_destination()?;
        debug!("config"; "loaded {}", config.config_path.display());

        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            let display_path = path
                .file_name()
                .map(|n| n.to_string_lossy())
                .unwrap_or_else(|| path.to_string_lossy());
            log!("warning"; "unknown fields in {} ignored: {}", display_path, ignored.join(", "));
        }

        Ok(config)
    }

    /// Parse JSON content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let mut deserializer = serde_json::Deserializer::from_str(content);
        let config = serde_ignored::deserialize(&mut deserializer, |path| {
            ignored.push(path.to_string());
        })?;
        deserializer.end()?;
        Ok((config, ignored))
    }

    /// Resolve every path against `root` and normalize derived settings.
    pub fn finalize(&mut self, root: &Path) {
        self.root = root.to_path_buf();
        self.source.map(|p| resolve_path(p, root));
        self.destination = resolve_path(&self.destination, root);
        self.tsconfig = resolve_path(&self.tsconfig, root);
        self.html_extension = normalize_extension(&self.html_extension);
        self.scripts_prefix = self.scripts_prefix.trim_matches('/').to_string();
        self.html_prefix = self.html_prefix.trim_matches('/').to_string();
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate a finalized configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sources().is_empty() {
            return Err(ConfigError::invalid("source", "at least one source directory is required"));
        }
        for source in self.sources() {
            if !source.is_dir() {
                return Err(ConfigError::invalid(
                    "source",
                    format!("source directory `{}` does not exist", source.display()),
                ));
            }
            // outputs would be scanned as sources on the next build
            if self.destination.starts_with(source) {
                return Err(ConfigError::invalid(
                    "destination",
                    format!("must not be inside source directory `{}`", source.display()),
                ));
            }
        }
        for (field, prefix) in [
            ("scripts_prefix", &self.scripts_prefix),
            ("html_prefix", &self.html_prefix),
        ] {
            if !is_plain_relative(Path::new(prefix)) {
                return Err(ConfigError::invalid(
                    field,
                    format!("`{prefix}` must stay inside the destination directory"),
                ));
            }
        }
        // output prefixes are wiped before every build
        for (field, prefix, dir) in [
            ("scripts_prefix", &self.scripts_prefix, self.scripts_dir()),
            ("html_prefix", &self.html_prefix, self.html_dir()),
        ] {
            if prefix.is_empty() {
                continue;
            }
            let overlapping = self
                .sources()
                .iter()
                .find(|s| s.starts_with(&dir) || dir.starts_with(s));
            if let Some(source) = overlapping {
                return Err(ConfigError::invalid(
                    field,
                    format!(
                        "cleaning `{}` would remove files of source directory `{}`",
                        dir.display(),
                        source.display()
                    ),
                ));
            }
        }
        if self.index_file.is_empty() || self.index_file.contains(['/', '\\']) {
            return Err(ConfigError::invalid("index_file", "must be a plain file name"));
        }
        if self.html_extension.len() < 2 {
            return Err(ConfigError::invalid("html_extension", "must not be empty"));
        }
        Ok(())
    }

    /// Create the destination directory if it is missing.
    pub fn ensure_destination(&self) -> Result<()> {
        if !self.destination.exists() {
            fs::create_dir_all(&self.destination).with_context(|| {
                format!(
                    "Error creating missing destination directory `{}`",
                    self.destination.display()
                )
            })?;
        }
        Ok(())
    }

    // ========================================================================
    // accessors
    // ========================================================================

    /// Source roots in merge order.
    pub fn sources(&self) -> &[PathBuf] {
        self.source.as_slice()
    }

    /// Output directory for bundles: `destination/<scripts_prefix>`.
    pub fn scripts_dir(&self) -> PathBuf {
        self.destination.join(&self.scripts_prefix)
    }

    /// Output directory for pages: `destination/<html_prefix>`.
    pub fn html_dir(&self) -> PathBuf {
        self.destination.join(&self.html_prefix)
    }

    /// Watch mode quiet period. Zero disables coalescing.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Relative path made only of normal components (empty is allowed).
fn is_plain_relative(path: &Path) -> bool {
    path.components().all(|c| matches!(c, Component::Normal(_)))
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(content: &str) -> Result<BuilderConfig, ConfigError> {
        BuilderConfig::parse_with_ignored(content).map(|(config, _)| config)
    }

    #[test]
    fn test_parse_single_source() {
        let config =
            parse(r#"{"source": "app", "destination": "public"}"#).unwrap();
        assert_eq!(config.sources(), &[PathBuf::from("app")]);
        assert_eq!(config.index_file, "index.html");
        assert_eq!(config.html_extension, ".html");
        assert_eq!(config.scripts_prefix, "js");
        assert_eq!(config.html_prefix, "views");
        assert_eq!(config.tsconfig, PathBuf::from("tsconfig.json"));
        assert_eq!(config.bundler, "esbuild");
        assert_eq!(config.debounce_ms, 100);
    }

    #[test]
    fn test_parse_many_sources() {
        let config = parse(
            r#"{"source": ["scripts", "templates"], "destination": "public", "html_extension": "htm"}"#,
        )
        .unwrap();
        assert_eq!(
            config.sources(),
            &[PathBuf::from("scripts"), PathBuf::from("templates")]
        );
        assert_eq!(config.html_extension, "htm");
    }

    #[test]
    fn test_parse_invalid_source() {
        let err = parse(r#"{"source": 42, "destination": "public"}"#).unwrap_err();
        assert!(err.to_string().contains("source can be either string or array of strings"));
    }

    #[test]
    fn test_parse_collects_unknown_fields() {
        let (_, ignored) = BuilderConfig::parse_with_ignored(
            r#"{"source": "app", "destination": "public", "minify": true}"#,
        )
        .unwrap();
        assert_eq!(ignored, vec!["minify".to_string()]);
    }

    #[test]
    fn test_finalize_resolves_against_root() {
        let dir = TempDir::new().unwrap();
        let root = crate::utils::path::normalize_path(dir.path());
        let mut config = parse(
            r#"{"source": "app", "destination": "public", "html_extension": "htm", "scripts_prefix": "/static/js/"}"#,
        )
        .unwrap();
        config.finalize(&root);

        assert_eq!(config.sources(), &[root.join("app")]);
        assert_eq!(config.destination, root.join("public"));
        assert_eq!(config.tsconfig, root.join("tsconfig.json"));
        assert_eq!(config.html_extension, ".htm");
        assert_eq!(config.scripts_dir(), root.join("public/static/js"));
        assert_eq!(config.html_dir(), root.join("public/views"));
    }

    #[test]
    fn test_validate_missing_source() {
        let dir = TempDir::new().unwrap();
        let mut config = BuilderConfig::new(vec!["missing".into()], "public");
        config.finalize(dir.path());
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "source", .. }));
    }

    #[test]
    fn test_validate_empty_sources() {
        let dir = TempDir::new().unwrap();
        let mut config = BuilderConfig::new(vec![], "public");
        config.finalize(dir.path());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_prefix_escape() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("app")).unwrap();
        let mut config = BuilderConfig::new(vec!["app".into()], "public");
        config.html_prefix = "../outside".into();
        config.finalize(dir.path());
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "html_prefix", .. }));
    }

    #[test]
    fn test_validate_destination_inside_source() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("app")).unwrap();
        let mut config = BuilderConfig::new(vec!["app".into()], "app/public");
        config.finalize(&crate::utils::path::normalize_path(dir.path()));
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "destination", .. }));
    }

    #[test]
    fn test_validate_source_inside_output_prefix() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("js")).unwrap();
        std::fs::write(dir.path().join("js/index.ts"), "").unwrap();
        let mut config = BuilderConfig::new(vec!["js".into()], ".");
        config.finalize(&crate::utils::path::normalize_path(dir.path()));
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "scripts_prefix", .. }));

        config.scripts_prefix = "bundles".into();
        config.html_prefix = "js/views".into();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "html_prefix", .. }));
        assert!(dir.path().join("js/index.ts").is_file());
    }

    #[test]
    fn test_validate_sibling_of_output_prefix() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("app")).unwrap();
        let mut config = BuilderConfig::new(vec!["app".into()], ".");
        config.finalize(&crate::utils::path::normalize_path(dir.path()));
        config.validate().unwrap();

        // an empty prefix never cleans, so sources below the destination are fine
        config.scripts_prefix = String::new();
        config.html_prefix = String::new();
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_ok_and_ensure_destination() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("app")).unwrap();
        let mut config = BuilderConfig::new(vec!["app".into()], "public/site");
        config.finalize(dir.path());
        config.validate().unwrap();
        config.ensure_destination().unwrap();
        assert!(dir.path().join("public/site").is_dir());
    }

    #[test]
    fn test_debounce() {
        let mut config = BuilderConfig::new(vec![], "public");
        assert_eq!(config.debounce(), Duration::from_millis(100));
        config.debounce_ms = 0;
        assert!(config.debounce().is_zero());
    }
}
