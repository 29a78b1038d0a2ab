use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crossbeam::channel::{Receiver, RecvTimeoutError};
use notify::event::{CreateKind, DataChange, MetadataKind, ModifyKind, RemoveKind, RenameMode};
use notify::{Event, EventKind};
use tempfile::TempDir;

use super::*;
use crate::utils::path::normalize_path;

/// Records calls instead of talking to the OS.
#[derive(Default)]
struct Recorder {
    subscribed: Vec<PathBuf>,
    unsubscribed: Vec<PathBuf>,
}

impl Subscriber for Recorder {
    fn subscribe(&mut self, dir: &Path) -> notify::Result<()> {
        if !dir.is_dir() {
            return Err(notify::Error::path_not_found());
        }
        self.subscribed.push(dir.to_path_buf());
        Ok(())
    }

    fn unsubscribe(&mut self, dir: &Path) -> notify::Result<()> {
        self.unsubscribed.push(dir.to_path_buf());
        Ok(())
    }
}

fn event(kind: EventKind, paths: &[&PathBuf]) -> Event {
    Event {
        kind,
        paths: paths.iter().map(|p| (*p).clone()).collect(),
        attrs: Default::default(),
    }
}

fn tree() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let root = normalize_path(dir.path());
    fs::create_dir_all(root.join("app/admin")).unwrap();
    fs::create_dir_all(root.join("app/.hidden")).unwrap();
    fs::write(root.join("app/index.ts"), "").unwrap();
    (dir, root)
}

// ============================================================================
// WatchState with a recording backend
// ============================================================================

#[test]
fn test_attach_subscribes_every_directory() {
    let (_dir, root) = tree();
    let mut state = WatchState::new(Recorder::default());
    state.attach(&root).unwrap();

    for dir in ["", "app", "app/admin", "app/.hidden"] {
        assert!(state.is_watching(&root.join(dir)), "{dir} not watched");
    }
    assert_eq!(state.watched_count(), 4);
    // no directory is subscribed twice
    assert_eq!(state.subscriber.subscribed.len(), 4);
}

#[test]
fn test_attach_missing_root_fails() {
    let (_dir, root) = tree();
    let mut state = WatchState::new(Recorder::default());
    assert!(state.attach(&root.join("missing")).is_err());
    assert_eq!(state.watched_count(), 0);
}

#[test]
fn test_new_directory_tree_is_subscribed() {
    let (_dir, root) = tree();
    let mut state = WatchState::new(Recorder::default());
    state.attach(&root).unwrap();

    let late = root.join("app/late");
    fs::create_dir_all(late.join("deeper")).unwrap();
    assert!(state.handle(&event(EventKind::Create(CreateKind::Folder), &[&late])));

    assert!(state.is_watching(&late));
    assert!(state.is_watching(&late.join("deeper")));
}

#[test]
fn test_removed_directory_is_unsubscribed() {
    let (_dir, root) = tree();
    let mut state = WatchState::new(Recorder::default());
    state.attach(&root).unwrap();

    let app = root.join("app");
    fs::remove_dir_all(&app).unwrap();
    assert!(state.handle(&event(EventKind::Remove(RemoveKind::Folder), &[&app])));

    assert!(!state.is_watching(&app));
    assert!(!state.is_watching(&app.join("admin")));
    assert!(state.is_watching(&root));
    assert_eq!(state.subscriber.unsubscribed.len(), 3);
}

#[test]
fn test_renamed_directory_moves_subscriptions() {
    let (_dir, root) = tree();
    let mut state = WatchState::new(Recorder::default());
    state.attach(&root).unwrap();

    let from = root.join("app/admin");
    let to = root.join("app/backoffice");
    fs::rename(&from, &to).unwrap();
    let renamed = event(EventKind::Modify(ModifyKind::Name(RenameMode::Both)), &[&from, &to]);
    assert!(state.handle(&renamed));

    assert!(!state.is_watching(&from));
    assert!(state.is_watching(&to));
}

#[test]
fn test_file_events_signal_without_subscribing() {
    let (_dir, root) = tree();
    let mut state = WatchState::new(Recorder::default());
    state.attach(&root).unwrap();
    let before = state.watched_count();

    let file = root.join("app/index.ts");
    assert!(state.handle(&event(EventKind::Modify(ModifyKind::Data(DataChange::Content)), &[&file])));
    assert!(state.handle(&event(EventKind::Remove(RemoveKind::File), &[&file])));
    assert_eq!(state.watched_count(), before);
    assert!(state.subscriber.unsubscribed.is_empty());
}

#[test]
fn test_metadata_event_is_dropped() {
    let (_dir, root) = tree();
    let mut state = WatchState::new(Recorder::default());
    state.attach(&root).unwrap();

    let chmod = event(
        EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions)),
        &[&root.join("app/index.ts")],
    );
    assert!(!state.handle(&chmod));
}

// ============================================================================
// real watcher
// ============================================================================

const TIMEOUT: Duration = Duration::from_secs(5);

/// Wait for one signal, then drain whatever follows within a short quiet period.
fn expect_signal(signals: &Receiver<RebuildSignal>) {
    signals
        .recv_timeout(TIMEOUT)
        .expect("expected a rebuild signal");
    drain(signals);
}

fn drain(signals: &Receiver<RebuildSignal>) {
    let quiet = Duration::from_millis(200);
    let deadline = Instant::now() + TIMEOUT;
    while signals.recv_timeout(quiet).is_ok() && Instant::now() < deadline {}
}

#[test]
fn test_watcher_signals_file_change() {
    let (_dir, root) = tree();
    let handle = RecursiveWatcher::new(&[root.join("app")]).start().unwrap();
    drain(handle.signals());

    fs::write(root.join("app/admin/panel.js"), "panel()").unwrap();
    expect_signal(handle.signals());
}

#[test]
fn test_watcher_follows_late_directories() {
    let (_dir, root) = tree();
    let handle = RecursiveWatcher::new(&[root.clone()]).start().unwrap();
    drain(handle.signals());

    let late = root.join("app/late");
    fs::create_dir(&late).unwrap();
    expect_signal(handle.signals());

    fs::write(late.join("late.ts"), "late()").unwrap();
    expect_signal(handle.signals());
}

#[test]
fn test_watcher_resubscribes_recreated_directory() {
    let (_dir, root) = tree();
    let handle = RecursiveWatcher::new(&[root.clone()]).start().unwrap();
    drain(handle.signals());

    let admin = root.join("app/admin");
    fs::remove_dir_all(&admin).unwrap();
    expect_signal(handle.signals());

    // only seen if the old subscription was dropped and a new one made
    fs::create_dir(&admin).unwrap();
    expect_signal(handle.signals());
    fs::write(admin.join("panel.js"), "panel()").unwrap();
    expect_signal(handle.signals());
}

#[test]
fn test_watcher_stops_on_drop() {
    let (_dir, root) = tree();
    let handle = RecursiveWatcher::new(&[root.clone()]).start().unwrap();
    let signals = handle.signals().clone();
    drop(handle);

    fs::write(root.join("app/after.js"), "").unwrap();
    // the thread is gone: anything queued drains, then the channel disconnects
    let end = loop {
        if let Err(e) = signals.recv_timeout(TIMEOUT) {
            break e;
        }
    };
    assert_eq!(end, RecvTimeoutError::Disconnected);
}
