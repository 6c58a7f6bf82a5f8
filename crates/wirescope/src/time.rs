//! Frame timing and the FPS readout.
//!
//! [`FrameClock`] is ticked once per frame by the window loop. It yields the
//! frame delta for camera auto-rotation and maintains a frames-per-second
//! figure averaged over windows of at least half a second.

use std::time::{Duration, Instant};

/// Minimum span the FPS figure is averaged over.
pub const FPS_WINDOW: Duration = Duration::from_millis(500);

/// Windowed FPS counter, fed with frame deltas.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FpsCounter {
    frames: u32,
    accumulated: Duration,
    fps: u32,
}

impl FpsCounter {
    /// Record one frame. Once the window has filled, the FPS figure becomes
    /// `round(frames / elapsed)` and the window restarts.
    pub fn record(&mut self, delta: Duration) {
        self.frames += 1;
        self.accumulated += delta;
        if self.accumulated >= FPS_WINDOW {
            self.fps = (self.frames as f64 / self.accumulated.as_secs_f64()).round() as u32;
            self.frames = 0;
            self.accumulated = Duration::ZERO;
        }
    }

    /// Last computed figure; 0 until the first window fills.
    pub fn fps(&self) -> u32 {
        self.fps
    }
}

/// Wall-clock frame timer.
#[derive(Debug, Clone, Copy)]
pub struct FrameClock {
    frame_start: Instant,
    delta: Duration,
    frame_count: u64,
    fps: FpsCounter,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            frame_start: Instant::now(),
            delta: Duration::ZERO,
            frame_count: 0,
            fps: FpsCounter::default(),
        }
    }

    /// Call at the start of each frame.
    pub fn tick(&mut self) {
        let now = Instant::now();
        self.delta = now - self.frame_start;
        self.frame_start = now;
        self.frame_count += 1;
        self.fps.record(self.delta);
    }

    /// Restart timing without counting a frame, e.g. after a long load, so
    /// the next delta does not include the stall.
    pub fn reset(&mut self) {
        self.frame_start = Instant::now();
    }

    pub fn delta_secs(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn fps(&self) -> u32 {
        self.fps.fps()
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
