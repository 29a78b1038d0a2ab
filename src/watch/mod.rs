//! Recursive directory watcher.
//!
//! Every directory below every source root is subscribed individually
//! (non-recursive), so the watch set follows the tree as it changes:
//!
//! ```text
//! notify callback -> raw channel -> watcher thread -> RebuildSignal channel
//!                                    (owns WatchSet,
//!                                     subscribes new dirs,
//!                                     drops removed ones)
//! ```
//!
//! The watcher thread never waits on the consumer: signals go out on an
//! unbounded channel.

mod classifier;
mod debouncer;
mod watch_set;

#[cfg(test)]
mod tests;

pub use debouncer::coalesce;

use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

use crossbeam::channel::{Receiver, Sender, select, unbounded};
use jwalk::{Parallelism, WalkDir};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};

use classifier::{Action, classify};
use watch_set::WatchSet;

use crate::{debug, log};

/// "Something under a source root changed."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebuildSignal;

/// Per-directory subscription backend.
pub(crate) trait Subscriber {
    fn subscribe(&mut self, dir: &Path) -> notify::Result<()>;
    fn unsubscribe(&mut self, dir: &Path) -> notify::Result<()>;
}

impl Subscriber for RecommendedWatcher {
    fn subscribe(&mut self, dir: &Path) -> notify::Result<()> {
        self.watch(dir, RecursiveMode::NonRecursive)
    }

    fn unsubscribe(&mut self, dir: &Path) -> notify::Result<()> {
        self.unwatch(dir)
    }
}

// ============================================================================
// watch state
// ============================================================================

/// Subscriptions plus the backend that holds them.
pub(crate) struct WatchState<S> {
    subscriber: S,
    set: WatchSet,
}

impl<S: Subscriber> WatchState<S> {
    pub(crate) fn new(subscriber: S) -> Self {
        Self {
            subscriber,
            set: WatchSet::default(),
        }
    }

    /// Subscribe a root and its whole tree. Failing on the root is fatal.
    pub(crate) fn attach(&mut self, root: &Path) -> notify::Result<()> {
        self.subscriber.subscribe(root)?;
        self.set.insert(root.to_path_buf());
        self.subscribe_tree(root);
        Ok(())
    }

    /// Apply one raw event. Returns whether a rebuild signal is due.
    ///
    /// Subscriptions are adjusted before returning, so a file created in a
    /// new directory right after its signal is already seen.
    pub(crate) fn handle(&mut self, event: &Event) -> bool {
        match classify(event, Path::is_dir) {
            Action::Drop => false,
            Action::Signal { appeared, vanished } => {
                for path in &vanished {
                    self.unsubscribe_tree(path);
                }
                for dir in &appeared {
                    self.subscribe_tree(dir);
                }
                true
            }
        }
    }

    /// Subscribe `dir` and every directory below it that is not yet watched.
    ///
    /// Directories may vanish mid-walk; those are skipped.
    fn subscribe_tree(&mut self, dir: &Path) {
        let dirs = WalkDir::new(dir)
            .sort(true)
            .skip_hidden(false)
            .parallelism(Parallelism::Serial)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_dir())
            .map(|entry| entry.path());

        for dir in dirs {
            if self.set.contains(&dir) {
                continue;
            }
            match self.subscriber.subscribe(&dir) {
                Ok(()) => {
                    debug!("watch"; "subscribed {}", dir.display());
                    self.set.insert(dir);
                }
                Err(e) => debug!("watch"; "cannot subscribe {}: {}", dir.display(), e),
            }
        }
    }

    fn unsubscribe_tree(&mut self, path: &Path) {
        for dir in self.set.remove_tree(path) {
            // the OS usually dropped the watch along with the directory
            if let Err(e) = self.subscriber.unsubscribe(&dir) {
                debug!("watch"; "unsubscribe {}: {}", dir.display(), e);
            } else {
                debug!("watch"; "unsubscribed {}", dir.display());
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn is_watching(&self, dir: &Path) -> bool {
        self.set.contains(dir)
    }

    pub(crate) fn watched_count(&self) -> usize {
        self.set.len()
    }
}

// ============================================================================
// watcher
// ============================================================================

/// Idle watcher: roots chosen, nothing subscribed yet.
pub struct RecursiveWatcher {
    roots: Vec<PathBuf>,
}

impl RecursiveWatcher {
    pub fn new(roots: &[PathBuf]) -> Self {
        Self {
            roots: roots.to_vec(),
        }
    }

    /// Subscribe every root and start the watcher thread.
    pub fn start(self) -> notify::Result<WatchHandle> {
        let (raw_tx, raw_rx) = unbounded();
        let watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = raw_tx.send(res);
        })?;

        let mut state = WatchState::new(watcher);
        for root in &self.roots {
            state.attach(root)?;
        }
        debug!("watch"; "watching {} directories", state.watched_count());

        let (signal_tx, signal_rx) = unbounded();
        let (stop_tx, stop_rx) = unbounded::<()>();
        let thread = thread::Builder::new()
            .name("watcher".into())
            .spawn(move || run(state, &raw_rx, &stop_rx, &signal_tx))
            .map_err(notify::Error::io)?;

        Ok(WatchHandle {
            signals: signal_rx,
            stop: Some(stop_tx),
            thread: Some(thread),
        })
    }
}

/// Watcher thread body. Ends when stopped or when nobody listens anymore.
fn run(
    mut state: WatchState<RecommendedWatcher>,
    raw: &Receiver<notify::Result<Event>>,
    stop: &Receiver<()>,
    signals: &Sender<RebuildSignal>,
) {
    loop {
        let received = select! {
            recv(raw) -> msg => msg.ok(),
            recv(stop) -> _ => None,
        };
        match received {
            Some(Ok(event)) => {
                debug!("watch"; "raw notify: {:?} {:?}", event.kind, event.paths);
                if state.handle(&event) && signals.send(RebuildSignal).is_err() {
                    break;
                }
            }
            Some(Err(e)) => log!("watch"; "notify error: {}", e),
            None => break,
        }
    }
}

/// Watching state: owns the watcher thread.
///
/// Dropping the handle stops the thread and releases every subscription.
pub struct WatchHandle {
    signals: Receiver<RebuildSignal>,
    stop: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl WatchHandle {
    pub fn signals(&self) -> &Receiver<RebuildSignal> {
        &self.signals
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        // disconnecting the stop channel wakes the thread
        self.stop.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
