//! Build pipeline.
//!
//! One build runs every phase in order, synchronously:
//!
//! ```text
//! clean -> scan -> pair -> bundle -> name outputs -> render pages
//! ```
//!
//! Nothing is cached between builds. A failed bundle phase stops the build
//! before any page is rendered.

mod bundle;
mod error;
mod esbuild;
mod html;
mod output;
mod pairing;
mod scan;


pub use bundle::Bundler;
pub use error::BuildError;
pub use esbuild::Esbuild;

use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use bundle::{BuildEntry, BundleOptions, BundleOutcome, plan_entries};
use html::HtmlRenderer;
use output::{OutputNamer, ScriptReferences};
use pairing::{AppPairing, resolve_pairing};
use scan::{AssetScanner, ScannedAssets};

use crate::config::BuilderConfig;
use crate::core::Profile;
use crate::logger::ProgressLine;
use crate::utils::path::web_path;
use crate::utils::plural_count;
use crate::{debug, log};

/// Summary of a successful build.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub files: usize,
    pub entries: usize,
    pub outputs: usize,
    pub pages: usize,
    pub elapsed: Duration,
}

pub struct Builder<B> {
    config: BuilderConfig,
    profile: Profile,
    options: BundleOptions,
    bundler: B,
    quiet: bool,
}

impl<B: Bundler> Builder<B> {
    pub fn new(config: BuilderConfig, profile: Profile, bundler: B) -> Self {
        Self {
            config,
            profile,
            options: BundleOptions::for_profile(profile),
            bundler,
            quiet: false,
        }
    }

    /// Suppress progress and phase timing output (watch mode).
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    pub const fn profile(&self) -> Profile {
        self.profile
    }

    /// Run every phase once.
    pub fn build(&self) -> Result<BuildReport, BuildError> {
        let started = Instant::now();
        let mut report = BuildReport::default();

        self.clean_outputs()?;

        let phase = Instant::now();
        let assets = AssetScanner::new(&self.config.html_extension, self.profile)
            .scan(self.config.sources())?;
        let pairing = resolve_pairing(&assets, &self.config.html_extension);
        report.files = assets.file_count();
        self.phase_done(phase, format_args!("collected {}", plural_count(report.files, "file")));

        let phase = Instant::now();
        let entries = plan_entries(&pairing, &self.config.scripts_dir(), &self.config.tsconfig);
        let outcomes = self.bundle_all(&entries)?;
        report.entries = entries.len();
        self.phase_done(phase, format_args!("bundled {}", plural_count(report.entries, "entry point")));

        let phase = Instant::now();
        let references = self.name_outputs(&outcomes)?;
        report.outputs = outcomes.iter().map(|o| o.output_files.len()).sum();

        report.pages = self.render_pages(&assets, &pairing, &references)?;
        self.phase_done(phase, format_args!("rendered {}", plural_count(report.pages, "page")));

        report.elapsed = started.elapsed();
        Ok(report)
    }

    fn phase_done(&self, started: Instant, what: std::fmt::Arguments<'_>) {
        if self.quiet {
            debug!("build"; "{} in {:?}", what, started.elapsed());
        } else {
            log!("build"; "{} in {:?}", what, started.elapsed());
        }
    }

    /// Remove both output prefixes so stale bundles never accumulate.
    ///
    /// An empty prefix means the destination root itself, which is left alone.
    fn clean_outputs(&self) -> Result<(), BuildError> {
        for (prefix, dir) in [
            (&self.config.scripts_prefix, self.config.scripts_dir()),
            (&self.config.html_prefix, self.config.html_dir()),
        ] {
            if prefix.is_empty() || !dir.exists() {
                continue;
            }
            debug!("build"; "removing {}", dir.display());
            fs::remove_dir_all(&dir).map_err(|e| BuildError::fs(&dir, e))?;
        }
        Ok(())
    }

    /// Bundle every entry, then fail with all errors at once.
    fn bundle_all(&self, entries: &[BuildEntry]) -> Result<Vec<BundleOutcome>, BuildError> {
        let progress = (!self.quiet).then(|| ProgressLine::new(&[("bundle", entries.len())]));

        let mut outcomes = Vec::with_capacity(entries.len());
        let mut errors = Vec::new();
        debug!("bundle"; "{} entry points with {}", entries.len(), self.bundler.name());
        for entry in entries {
            debug!("bundle"; "{}: {} -> {}",
                entry.page.display(), entry.entry_point.display(), entry.output_dir.display());
            let mut outcome = self.bundler.bundle(entry, &self.options)?;
            errors.append(&mut outcome.errors);
            outcomes.push(outcome);
            if let Some(progress) = &progress {
                progress.inc("bundle");
            }
        }
        if let Some(progress) = progress {
            progress.finish();
        }

        if errors.is_empty() {
            return Ok(outcomes);
        }
        for error in &errors {
            log!("error"; "{}", error);
            debug!("error"; "{}:{}:{}", error.file, error.line, error.column);
        }
        Err(BuildError::Bundle { errors })
    }

    /// Give every output its final name, once, and record its web path.
    fn name_outputs(&self, outcomes: &[BundleOutcome]) -> Result<ScriptReferences, BuildError> {
        let namer = OutputNamer::new(self.profile);
        let mut references = ScriptReferences::default();
        for file in outcomes.iter().flat_map(|o| &o.output_files) {
            let target = namer.materialize(file)?;
            debug!("bundle"; "wrote {}", target.display());
            if let Some(src) = web_path(&self.config.destination, &target) {
                references.insert(file.path.clone(), src);
            }
        }
        Ok(references)
    }

    fn render_pages(
        &self,
        assets: &ScannedAssets,
        pairing: &AppPairing,
        references: &ScriptReferences,
    ) -> Result<usize, BuildError> {
        let renderer = HtmlRenderer {
            html_dir: self.config.html_dir(),
            scripts_dir: self.config.scripts_dir(),
            html_extension: &self.config.html_extension,
            index_file: &self.config.index_file,
        };

        for (relative, page) in &assets.html_pages {
            let src = self.script_reference(&renderer, relative, pairing, references);
            renderer.render(relative, page, src)?;
        }
        Ok(assets.html_pages.len())
    }

    fn script_reference<'r>(
        &self,
        renderer: &HtmlRenderer<'_>,
        relative: &Path,
        pairing: &AppPairing,
        references: &'r ScriptReferences,
    ) -> Option<&'r str> {
        if !pairing.contains_key(relative) {
            return None;
        }
        let expected = renderer.expected_script(relative)?;
        let src = references.get(&expected).map(String::as_str);
        if src.is_none() {
            log!("warning"; "no bundle found for {}, expected {}",
                relative.display(), expected.display());
        }
        src
    }
}
