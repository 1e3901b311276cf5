//! Rolling timings for each decal frame pass

use super::ring_buffer::RingBuffer;
use crate::FramePass;
use std::time::{Duration, Instant};

pub struct PassTimer {
    windows: Vec<RingBuffer<Duration>>,
}

impl PassTimer {
    /// Track the last `window` frames of every pass.
    pub fn new(window: usize) -> Self {
        Self {
            windows: (0..FramePass::COUNT).map(|_| RingBuffer::new(window)).collect(),
        }
    }

    pub fn time<F, R>(&mut self, pass: FramePass, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let start = Instant::now();
        let result = f();
        self.windows[pass.slot()].push(start.elapsed());
        result
    }

    pub fn average_ms(&self, pass: FramePass) -> f64 {
        self.windows[pass.slot()].average().as_secs_f64() * 1000.0
    }

    pub fn peak_ms(&self, pass: FramePass) -> f64 {
        self.windows[pass.slot()].peak().as_secs_f64() * 1000.0
    }
}

impl Default for PassTimer {
    fn default() -> Self {
        Self::new(60)
    }
}
