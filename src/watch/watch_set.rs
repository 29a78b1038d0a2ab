use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;

/// Directories currently subscribed with the OS watcher.
///
/// Owned by the watcher thread; nothing else mutates it.
#[derive(Debug, Default)]
pub(super) struct WatchSet {
    dirs: FxHashSet<PathBuf>,
}

impl WatchSet {
    pub(super) fn contains(&self, dir: &Path) -> bool {
        self.dirs.contains(dir)
    }

    pub(super) fn insert(&mut self, dir: PathBuf) -> bool {
        self.dirs.insert(dir)
    }

    /// Forget `dir` and every subscribed directory below it.
    ///
    /// Returns what was removed, parents before children.
    pub(super) fn remove_tree(&mut self, dir: &Path) -> Vec<PathBuf> {
        let mut removed: Vec<PathBuf> = self
            .dirs
            .iter()
            .filter(|d| d.starts_with(dir))
            .cloned()
            .collect();
        for d in &removed {
            self.dirs.remove(d);
        }
        removed.sort();
        removed
    }

    pub(super) fn len(&self) -> usize {
        self.dirs.len()
    }
}
