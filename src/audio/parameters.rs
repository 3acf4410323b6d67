// Atomic parameters - Lock-free gain levels shared with the audio thread
// The control side writes, the mixer reads once per frame. No locks, no queue.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Thread-safe f32 stored as its bit pattern in an `AtomicU32`
#[derive(Clone, Debug)]
pub struct AtomicF32 {
    inner: Arc<AtomicU32>,
}

impl AtomicF32 {
    pub fn new(value: f32) -> Self {
        Self {
            inner: Arc::new(AtomicU32::new(value.to_bits())),
        }
    }

    pub fn set(&self, value: f32) {
        self.inner.store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn get(&self) -> f32 {
        f32::from_bits(self.inner.load(Ordering::Relaxed))
    }
}

impl Default for AtomicF32 {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Gain levels of the processing graph. Clones share the same storage.
///
/// Levels are linear multipliers and are neither validated nor clamped.
#[derive(Clone, Debug)]
pub struct MixerParameters {
    /// Master output gain
    pub volume: AtomicF32,
    /// Gain in front of the convolver
    pub reverb_send: AtomicF32,
}

impl MixerParameters {
    pub fn new(volume: f32, reverb_send: f32) -> Self {
        Self {
            volume: AtomicF32::new(volume),
            reverb_send: AtomicF32::new(reverb_send),
        }
    }
}

impl Default for MixerParameters {
    /// Full master level, reverb send closed
    fn default() -> Self {
        Self::new(1.0, 0.0)
    }
}
