//! `watch` command.
//!
//! Single consumer loop on the main thread: wait for a rebuild signal,
//! absorb the rest of the burst, build, report, repeat. Builds never
//! overlap because nothing else starts them.

use anyhow::{Context, Result};
use crossbeam::channel::{never, select};

use crate::builder::{Builder, Bundler};
use crate::core::{is_shutdown, shutdown_channel};
use crate::logger::{status_detach, status_error, status_success};
use crate::utils::plural_count;
use crate::watch::{RecursiveWatcher, coalesce};
use crate::{debug, log};

/// Build once, then rebuild on every change until Ctrl+C.
///
/// The watcher is started before the initial build so edits made while it
/// runs are not lost. Only the initial build can fail the command.
pub fn watch<B: Bundler>(builder: Builder<B>) -> Result<()> {
    let handle = RecursiveWatcher::new(builder.config().sources())
        .start()
        .context("Failed to start file watcher")?;
    let shutdown = shutdown_channel().unwrap_or_else(never);

    super::build::build_once(&builder)?;
    let builder = builder.quiet(true);

    let sources: Vec<_> = builder
        .config()
        .sources()
        .iter()
        .map(|s| s.display().to_string())
        .collect();
    log!("watch"; "watching {} for changes, press Ctrl+C to stop", sources.join(", "));

    loop {
        let signalled = select! {
            recv(handle.signals()) -> msg => msg.is_ok(),
            recv(shutdown) -> _ => false,
        };
        if !signalled || is_shutdown() {
            break;
        }

        let absorbed = coalesce(handle.signals(), builder.config().debounce());
        debug!("watch"; "rebuilding after {}", plural_count(absorbed + 1, "change"));
        rebuild(&builder);
    }
    Ok(())
}

/// A failed rebuild is reported and the loop keeps waiting.
fn rebuild<B: Bundler>(builder: &Builder<B>) {
    match builder.build() {
        Ok(report) => status_success(&format!(
            "rebuilt {} in {:?}",
            plural_count(report.pages, "page"),
            report.elapsed
        )),
        Err(e) => {
            // keep bundler diagnostics printed above on screen
            status_detach();
            status_error("build failed", &e.to_string());
            status_detach();
        }
    }
}
