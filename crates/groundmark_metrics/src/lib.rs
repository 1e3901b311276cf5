//! Groundmark Metrics - decal churn and frame pass instrumentation
//!
//! Counters and timers that completely vanish in shipping builds via
//! feature flags.
//!
//! # Feature Flags
//!
//! - `metrics` - Enable metrics collection (default: disabled)
//!
//! # Usage
//!
//! ```ignore
//! use groundmark_metrics::{ChurnCounters, ChurnEvent, FramePass, PassTimer};
//!
//! let mut churn = ChurnCounters::new();
//! churn.record(ChurnEvent::ScarCreated);
//!
//! let mut timer = PassTimer::new(60);
//! timer.time(FramePass::Resolve, || resolve_scars());
//! println!("resolve: {:.3}ms", timer.average_ms(FramePass::Resolve));
//! ```

#[cfg(feature = "metrics")]
mod churn;
#[cfg(feature = "metrics")]
mod pass_timer;
#[cfg(feature = "metrics")]
mod ring_buffer;

#[cfg(feature = "metrics")]
pub use churn::ChurnCounters;
#[cfg(feature = "metrics")]
pub use pass_timer::PassTimer;
#[cfg(feature = "metrics")]
pub use ring_buffer::RingBuffer;

/// Lifecycle events counted per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChurnEvent {
    ScarCreated,
    ScarDropped,
    ScarEvicted,
    ScarExpired,
    DecalCreated,
    DecalDestroyed,
    GeometryBuilt,
    GeometryRefreshed,
}

impl ChurnEvent {
    pub const COUNT: usize = 8;

    pub const ALL: [ChurnEvent; Self::COUNT] = [
        ChurnEvent::ScarCreated,
        ChurnEvent::ScarDropped,
        ChurnEvent::ScarEvicted,
        ChurnEvent::ScarExpired,
        ChurnEvent::DecalCreated,
        ChurnEvent::DecalDestroyed,
        ChurnEvent::GeometryBuilt,
        ChurnEvent::GeometryRefreshed,
    ];

    #[inline]
    pub const fn slot(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            ChurnEvent::ScarCreated => "scars_created",
            ChurnEvent::ScarDropped => "scars_dropped",
            ChurnEvent::ScarEvicted => "scars_evicted",
            ChurnEvent::ScarExpired => "scars_expired",
            ChurnEvent::DecalCreated => "decals_created",
            ChurnEvent::DecalDestroyed => "decals_destroyed",
            ChurnEvent::GeometryBuilt => "geometry_built",
            ChurnEvent::GeometryRefreshed => "geometry_refreshed",
        }
    }
}

/// Passes of a decal frame, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePass {
    Resolve,
    Expire,
    Gather,
    Draw,
}

impl FramePass {
    pub const COUNT: usize = 4;

    pub const ALL: [FramePass; Self::COUNT] = [
        FramePass::Resolve,
        FramePass::Expire,
        FramePass::Gather,
        FramePass::Draw,
    ];

    #[inline]
    pub const fn slot(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            FramePass::Resolve => "resolve",
            FramePass::Expire => "expire",
            FramePass::Gather => "gather",
            FramePass::Draw => "draw",
        }
    }
}

// ============================================================================
// Macros for conditional compilation
// ============================================================================

/// Execute code only when metrics are enabled
#[macro_export]
macro_rules! metrics {
    ($($tt:tt)*) => {
        #[cfg(feature = "metrics")]
        {
            $($tt)*
        }
    };
}

/// Time a frame pass (zero-cost when metrics disabled)
#[macro_export]
macro_rules! time_pass {
    ($timer:expr, $pass:expr, $body:block) => {{
        #[cfg(feature = "metrics")]
        {
            $timer.time($pass, || $body)
        }
        #[cfg(not(feature = "metrics"))]
        {
            $body
        }
    }};
}

// ============================================================================
// No-op stubs when metrics disabled
// ============================================================================

#[cfg(not(feature = "metrics"))]
#[derive(Debug, Default)]
pub struct ChurnCounters;

#[cfg(not(feature = "metrics"))]
impl ChurnCounters {
    pub fn new() -> Self { Self }
    pub fn record(&mut self, _event: ChurnEvent) {}
    pub fn record_n(&mut self, _event: ChurnEvent, _n: u64) {}
    pub fn get(&self, _event: ChurnEvent) -> u64 { 0 }
    pub fn reset(&mut self) {}
}

#[cfg(not(feature = "metrics"))]
#[derive(Debug, Default)]
pub struct PassTimer;

#[cfg(not(feature = "metrics"))]
impl PassTimer {
    pub fn new(_window: usize) -> Self { Self }
    pub fn time<F, R>(&mut self, _pass: FramePass, f: F) -> R where F: FnOnce() -> R { f() }
    pub fn average_ms(&self, _pass: FramePass) -> f64 { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compiles_without_metrics() {
        let mut _churn = ChurnCounters::new();
        let mut _timer = PassTimer::new(60);
    }

    #[test]
    fn slots_are_dense() {
        for (i, event) in ChurnEvent::ALL.iter().enumerate() {
            assert_eq!(event.slot(), i);
        }
        for (i, pass) in FramePass::ALL.iter().enumerate() {
            assert_eq!(pass.slot(), i);
        }
    }
}
