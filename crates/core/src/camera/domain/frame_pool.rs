use std::sync::{Arc, Mutex};

use crate::shared::frame::Frame;

struct PoolState {
    free: Vec<Vec<u8>>,
    outstanding: usize,
    released: usize,
}

/// Pool of reusable frame buffers.
///
/// Every [`FrameLease`] handed out is returned exactly once: release happens
/// on drop, so a lease cannot be released twice or leak its buffer. The
/// `outstanding`/`released` counters exist so callers (and tests) can verify
/// the lifecycle invariant.
#[derive(Clone)]
pub struct FramePool {
    state: Arc<Mutex<PoolState>>,
}

impl FramePool {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(PoolState {
                free: Vec::new(),
                outstanding: 0,
                released: 0,
            })),
        }
    }

    /// Takes a free buffer for reuse, or a fresh one if none is available.
    pub fn take_buffer(&self) -> Vec<u8> {
        let mut state = self.lock();
        state.free.pop().unwrap_or_default()
    }

    /// Wraps a frame in a lease tied to this pool.
    pub fn lease(&self, frame: Frame) -> FrameLease {
        self.lock().outstanding += 1;
        FrameLease {
            frame: Some(frame),
            pool: self.clone(),
        }
    }

    /// A lease with no image payload. Still counts toward `outstanding`
    /// until released; the analyzer must release it without detecting.
    pub fn lease_empty(&self) -> FrameLease {
        self.lock().outstanding += 1;
        FrameLease {
            frame: None,
            pool: self.clone(),
        }
    }

    /// Leases handed out and not yet released.
    pub fn outstanding(&self) -> usize {
        self.lock().outstanding
    }

    /// Total leases released since the pool was created.
    pub fn released(&self) -> usize {
        self.lock().released
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PoolState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for FramePool {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive handle to one camera frame.
///
/// Dropping the lease releases the frame back to its pool; there is no way
/// to release twice. A lease may carry no payload ([`FrameLease::frame`]
/// returns `None`) when the camera delivered rotation metadata but no image.
pub struct FrameLease {
    frame: Option<Frame>,
    pool: FramePool,
}

impl FrameLease {
    pub fn frame(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }

    pub fn has_payload(&self) -> bool {
        self.frame.is_some()
    }

    /// Explicitly releases the frame. Equivalent to dropping the lease.
    pub fn release(self) {}
}

impl Drop for FrameLease {
    fn drop(&mut self) {
        let mut state = match self.pool.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        state.outstanding = state.outstanding.saturating_sub(1);
        state.released += 1;
        if let Some(frame) = self.frame.take() {
            state.free.push(frame.into_data());
        }
    }
}
