//! Raw event classification.
//!
//! Decides, per notify event, whether it is noise and which directories
//! appeared or vanished. No subscription happens here.

use std::path::{Path, PathBuf};

use notify::event::{CreateKind, ModifyKind, RenameMode};
use notify::{Event, EventKind};

/// What the watcher should do with one raw event.
#[derive(Debug, PartialEq, Eq)]
pub(super) enum Action {
    /// Metadata or access noise.
    Drop,
    /// Emit a rebuild signal after adjusting subscriptions.
    Signal {
        /// Directories to subscribe, with their subtrees.
        appeared: Vec<PathBuf>,
        /// Paths that may have been subscribed directories.
        vanished: Vec<PathBuf>,
    },
}

impl Action {
    fn signal() -> Self {
        Self::Signal {
            appeared: Vec::new(),
            vanished: Vec::new(),
        }
    }

    fn appeared(mut self, path: &Path) -> Self {
        if let Self::Signal { appeared, .. } = &mut self {
            appeared.push(path.to_path_buf());
        }
        self
    }

    fn vanished(mut self, path: &Path) -> Self {
        if let Self::Signal { vanished, .. } = &mut self {
            vanished.push(path.to_path_buf());
        }
        self
    }
}

/// Classify a raw event. `is_dir` is asked only about paths whose event
/// kind does not already say whether they are directories.
pub(super) fn classify(event: &Event, is_dir: impl Fn(&Path) -> bool) -> Action {
    match event.kind {
        EventKind::Access(_) | EventKind::Modify(ModifyKind::Metadata(_)) => Action::Drop,

        EventKind::Create(kind) => event
            .paths
            .iter()
            .filter(|p| match kind {
                CreateKind::Folder => true,
                CreateKind::File => false,
                _ => is_dir(p.as_path()),
            })
            .fold(Action::signal(), |action, p| action.appeared(p)),

        EventKind::Remove(_) => event
            .paths
            .iter()
            .fold(Action::signal(), |action, p| action.vanished(p)),

        EventKind::Modify(ModifyKind::Name(mode)) => classify_rename(mode, &event.paths, is_dir),

        _ => Action::signal(),
    }
}

fn classify_rename(mode: RenameMode, paths: &[PathBuf], is_dir: impl Fn(&Path) -> bool) -> Action {
    let action = Action::signal();
    match (mode, paths) {
        (RenameMode::From, [from, ..]) => action.vanished(from),
        (RenameMode::To, [to, ..]) if is_dir(to.as_path()) => action.appeared(to),
        (RenameMode::Both, [from, to, ..]) => {
            let action = action.vanished(from);
            if is_dir(to.as_path()) {
                action.appeared(to)
            } else {
                action
            }
        }
        // Backends that cannot tell the direction: decide by what exists now
        (RenameMode::Any | RenameMode::Other, _) => paths.iter().fold(action, |action, p| {
            if is_dir(p.as_path()) {
                action.appeared(p)
            } else if !p.exists() {
                action.vanished(p)
            } else {
                action
            }
        }),
        _ => action,
    }
}
