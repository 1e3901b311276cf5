//! Simulation and draw frame clock
//!
//! Scars age in simulation frames; object decals fade in wall-clock time
//! scaled by the simulation speed factor.

use std::time::Duration;

/// Simulation frames per second at speed factor 1.0.
pub const GAME_SPEED: u32 = 30;

/// Frame counters handed to every decal pass.
#[derive(Debug, Clone)]
pub struct FrameClock {
    sim_frame: u64,
    draw_frame: u64,
    last_frame_time: Duration,
    speed_factor: f32,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            sim_frame: 0,
            draw_frame: 0,
            last_frame_time: Duration::ZERO,
            speed_factor: 1.0,
        }
    }

    #[inline]
    pub fn sim_frame(&self) -> u64 {
        self.sim_frame
    }

    #[inline]
    pub fn draw_frame(&self) -> u64 {
        self.draw_frame
    }

    #[inline]
    pub fn speed_factor(&self) -> f32 {
        self.speed_factor
    }

    pub fn advance_sim_frame(&mut self) {
        self.sim_frame += 1;
    }

    pub fn set_sim_frame(&mut self, frame: u64) {
        self.sim_frame = frame;
    }

    /// Start a new draw frame that took `elapsed` since the previous one.
    pub fn begin_draw_frame(&mut self, elapsed: Duration) {
        self.draw_frame += 1;
        self.last_frame_time = elapsed;
    }

    pub fn set_speed_factor(&mut self, factor: f32) {
        self.speed_factor = factor.max(0.0);
    }

    /// Simulated seconds covered by the last draw frame.
    #[inline]
    pub fn frame_seconds(&self) -> f32 {
        self.last_frame_time.as_secs_f32() * self.speed_factor
    }

    /// Whether something last drawn at `frame` was drawn in the previous draw frame
    /// (or later).
    #[inline]
    pub fn drawn_recently(&self, frame: u64) -> bool {
        frame + 1 >= self.draw_frame
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
