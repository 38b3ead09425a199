use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crossbeam_channel::{Receiver, Sender, TryRecvError};

use super::frame_pool::FrameLease;

enum Slot {
    Lease(FrameLease),
    ShutDown,
}

/// Single-slot frame mailbox implementing the keep-only-latest backpressure
/// strategy.
///
/// The capture side calls [`put`](LatestFrameCell::put) for every frame; if
/// the previous frame has not been consumed yet it is discarded (and thereby
/// released). The analysis side blocks on [`take_wait`](LatestFrameCell::take_wait)
/// until a frame or shutdown arrives. Single producer, single consumer.
pub struct LatestFrameCell {
    tx: Sender<Slot>,
    rx: Receiver<Slot>,
    shut_down: AtomicBool,
    dropped: AtomicU64,
}

impl LatestFrameCell {
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::bounded(1);
        Self {
            tx,
            rx,
            shut_down: AtomicBool::new(false),
            dropped: AtomicU64::new(0),
        }
    }

    /// Stores `lease` as the latest frame, discarding any unconsumed one.
    ///
    /// After [`shut_down`](LatestFrameCell::shut_down) the lease is simply
    /// released.
    pub fn put(&self, lease: FrameLease) {
        if self.shut_down.load(Ordering::Acquire) {
            return; // lease dropped, frame released
        }

        let mut slot = Slot::Lease(lease);
        loop {
            match self.tx.try_send(slot) {
                Ok(()) => return,
                Err(crossbeam_channel::TrySendError::Full(rejected)) => {
                    // Evict the stale frame, then retry with the new one.
                    if let Ok(Slot::Lease(_stale)) = self.rx.try_recv() {
                        self.dropped.fetch_add(1, Ordering::Relaxed);
                    }
                    slot = rejected;
                }
                Err(crossbeam_channel::TrySendError::Disconnected(_)) => return,
            }
        }
    }

    /// Removes and returns the latest frame, if any.
    pub fn take(&self) -> Option<FrameLease> {
        match self.rx.try_recv() {
            Ok(Slot::Lease(lease)) => Some(lease),
            Ok(Slot::ShutDown) | Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => {
                None
            }
        }
    }

    /// Blocks until a frame is available or the cell is shut down.
    /// Returns `None` on shutdown.
    pub fn take_wait(&self) -> Option<FrameLease> {
        if self.shut_down.load(Ordering::Acquire) {
            // Drain a possibly pending lease so it gets released.
            let _ = self.rx.try_recv();
            return None;
        }
        match self.rx.recv() {
            Ok(Slot::Lease(lease)) => Some(lease),
            Ok(Slot::ShutDown) | Err(_) => None,
        }
    }

    /// Shuts the cell down: releases any pending frame and wakes the consumer.
    pub fn shut_down(&self) {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }
        // Drop a pending lease so the sentinel always fits.
        if let Ok(Slot::Lease(_stale)) = self.rx.try_recv() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        let _ = self.tx.try_send(Slot::ShutDown);
    }

    /// Frames that were replaced before the consumer took them.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for LatestFrameCell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::domain::frame_pool::FramePool;
    use crate::shared::frame::{Frame, Rotation};
    use std::sync::Arc;
    use std::thread;

    fn lease(pool: &FramePool) -> FrameLease {
        pool.lease(Frame::new(vec![0u8; 12], 2, 2, Rotation::Deg0))
    }

    #[test]
    fn test_take_empty_returns_none() {
        let cell = LatestFrameCell::new();
        assert!(cell.take().is_none());
    }

    #[test]
    fn test_put_then_take() {
        let pool = FramePool::new();
        let cell = LatestFrameCell::new();
        cell.put(lease(&pool));
        assert!(cell.take().is_some());
        assert!(cell.take().is_none());
    }

    #[test]
    fn test_put_replaces_and_releases_stale_frame() {
        let pool = FramePool::new();
        let cell = LatestFrameCell::new();

        cell.put(lease(&pool));
        cell.put(lease(&pool));
        cell.put(lease(&pool));

        // Two frames were evicted and released; one is still held.
        assert_eq!(cell.dropped(), 2);
        assert_eq!(pool.released(), 2);
        assert_eq!(pool.outstanding(), 1);

        let taken = cell.take().unwrap();
        drop(taken);
        assert_eq!(pool.outstanding(), 0);
    }

    #[test]
    fn test_put_after_shutdown_releases_frame() {
        let pool = FramePool::new();
        let cell = LatestFrameCell::new();
        cell.shut_down();
        cell.put(lease(&pool));
        assert_eq!(pool.outstanding(), 0);
        assert_eq!(pool.released(), 1);
    }

    #[test]
    fn test_shutdown_releases_pending_frame() {
        let pool = FramePool::new();
        let cell = LatestFrameCell::new();
        cell.put(lease(&pool));
        cell.shut_down();
        assert_eq!(pool.outstanding(), 0);
    }

    #[test]
    fn test_take_wait_unblocks_on_shutdown() {
        let cell = Arc::new(LatestFrameCell::new());
        let waiter = {
            let cell = cell.clone();
            thread::spawn(move || cell.take_wait())
        };
        // Give the waiter time to block.
        thread::sleep(std::time::Duration::from_millis(20));
        cell.shut_down();
        assert!(waiter.join().unwrap().is_none());
    }

    #[test]
    fn test_take_wait_receives_frame_from_other_thread() {
        let pool = FramePool::new();
        let cell = Arc::new(LatestFrameCell::new());
        let waiter = {
            let cell = cell.clone();
            thread::spawn(move || cell.take_wait())
        };
        cell.put(lease(&pool));
        let got = waiter.join().unwrap();
        assert!(got.is_some());
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let cell = LatestFrameCell::new();
        cell.shut_down();
        cell.shut_down();
        assert!(cell.take_wait().is_none());
    }
}
