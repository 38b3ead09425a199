use std::sync::{Arc, Mutex};

use crate::shared::detection::Detection;

/// Latest-detections overlay state: an atomically swapped immutable snapshot.
///
/// Written from whatever thread the detector completes on, read by the render
/// path. The lock guards only the pointer swap; readers keep the `Arc` and
/// never block the writer for the duration of a draw.
pub struct DetectionCell {
    snapshot: Mutex<Arc<[Detection]>>,
}

impl DetectionCell {
    pub fn new() -> Self {
        Self {
            snapshot: Mutex::new(Arc::from(Vec::new())),
        }
    }

    /// Overwrites the snapshot wholesale. There is no merging with previous
    /// frames; detections carry no identity.
    pub fn store(&self, detections: Vec<Detection>) {
        *self.lock() = Arc::from(detections);
    }

    pub fn load(&self) -> Arc<[Detection]> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Arc<[Detection]>> {
        match self.snapshot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for DetectionCell {
    fn default() -> Self {
        Self::new()
    }
}
