//! `build` command.

use anyhow::Result;

use crate::builder::{BuildReport, Builder, Bundler};
use crate::{debug, log};
use crate::utils::plural_count;

/// Run one build and report it.
pub fn build_once<B: Bundler>(builder: &Builder<B>) -> Result<BuildReport> {
    let config = builder.config();
    log!("build"; "{} build into {}", builder.profile(), config.destination.display());

    let report = builder.build()?;
    debug!("build"; "{} scanned, {} bundled",
        plural_count(report.files, "source file"),
        plural_count(report.entries, "entry point"));
    log!("build"; "{} and {} in {:?}",
        plural_count(report.pages, "page"),
        plural_count(report.outputs, "bundle file"),
        report.elapsed);
    Ok(report)
}
