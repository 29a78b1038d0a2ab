use std::time::{Duration, Instant};

use crossbeam::channel::{Receiver, RecvTimeoutError};

use super::RebuildSignal;

/// A burst never holds a rebuild back longer than this many windows.
const MAX_WINDOWS: u32 = 20;

/// Swallow signals until `window` passes without a new one.
///
/// Returns how many extra signals were absorbed. A zero window absorbs
/// nothing, so every signal gets its own build.
pub fn coalesce(signals: &Receiver<RebuildSignal>, window: Duration) -> usize {
    if window.is_zero() {
        return 0;
    }

    let deadline = Instant::now() + window * MAX_WINDOWS;
    let mut absorbed = 0;
    loop {
        let wait = window.min(deadline.saturating_duration_since(Instant::now()));
        if wait.is_zero() {
            return absorbed;
        }
        match signals.recv_timeout(wait) {
            Ok(RebuildSignal) => absorbed += 1,
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => return absorbed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::channel::unbounded;

    #[test]
    fn test_zero_window_absorbs_nothing() {
        let (tx, rx) = unbounded();
        tx.send(RebuildSignal).unwrap();
        assert_eq!(coalesce(&rx, Duration::ZERO), 0);
        assert_eq!(rx.len(), 1);
    }

    #[test]
    fn test_burst_is_absorbed() {
        let (tx, rx) = unbounded();
        for _ in 0..5 {
            tx.send(RebuildSignal).unwrap();
        }
        assert_eq!(coalesce(&rx, Duration::from_millis(20)), 5);
        assert!(rx.is_empty());
    }

    #[test]
    fn test_disconnected_returns() {
        let (tx, rx) = unbounded();
        tx.send(RebuildSignal).unwrap();
        drop(tx);
        assert_eq!(coalesce(&rx, Duration::from_secs(5)), 1);
    }

    #[test]
    fn test_storm_is_capped() {
        let (tx, rx) = unbounded();
        let feeder = std::thread::spawn(move || {
            for _ in 0..200 {
                if tx.send(RebuildSignal).is_err() {
                    break;
                }
                std::thread::sleep(Duration::from_millis(1));
            }
        });
        let started = Instant::now();
        coalesce(&rx, Duration::from_millis(5));
        assert!(started.elapsed() < Duration::from_secs(2));
        drop(rx);
        feeder.join().unwrap();
    }
}
