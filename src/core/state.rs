//! Process-wide shutdown state.
//!
//! The watch loop blocks on two channels: rebuild signals and shutdown.
//! Ctrl+C flips the flag and wakes the loop so it can return normally.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam::channel::{Receiver, Sender, bounded};

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Shutdown signal sender, registered by the watch loop
static SHUTDOWN_TX: OnceLock<Sender<()>> = OnceLock::new();

/// Setup the global Ctrl+C handler. Call once at program start
///
/// - Before `shutdown_channel()`: exit immediately (nothing to clean up)
/// - After `shutdown_channel()`: wake the watch loop, which returns normally
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        SHUTDOWN.store(true, Ordering::SeqCst);

        match SHUTDOWN_TX.get() {
            Some(tx) => {
                crate::log!("watch"; "shutting down...");
                let _ = tx.try_send(());
            }
            None => std::process::exit(0),
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Register and return the receiver woken on Ctrl+C.
///
/// Returns `None` if a channel was already registered.
pub fn shutdown_channel() -> Option<Receiver<()>> {
    let (tx, rx) = bounded(1);
    SHUTDOWN_TX.set(tx).ok()?;
    Some(rx)
}

/// Check if shutdown has been requested
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}
