//! Clock abstractions: wall-clock time for event stamps and frame timing
//! for the render loop.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

/// Nominal frame rate that per-frame deltas are expressed against.
pub const REFERENCE_FRAME_RATE: f32 = 60.0;

/// Abstraction over wall-clock time, used to stamp emitted events.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock that delegates to the system clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Measures elapsed time between render-loop ticks.
///
/// Deltas are clamped to `max_delta` so that a stalled loop (debugger,
/// suspended tab, slow frame) does not feed one huge step into the physics.
#[derive(Debug, Clone)]
pub struct FrameTimer {
    last: Option<Instant>,
    max_delta: Duration,
}

impl FrameTimer {
    /// Creates a timer that never reports more than `max_delta` per tick.
    #[must_use]
    pub fn new(max_delta: Duration) -> Self {
        Self {
            last: None,
            max_delta,
        }
    }

    /// Records a tick at `now` and returns the clamped time since the
    /// previous tick. The first tick returns zero.
    pub fn tick(&mut self, now: Instant) -> Duration {
        let delta = self
            .last
            .map_or(Duration::ZERO, |last| now.saturating_duration_since(last));
        self.last = Some(now);
        delta.min(self.max_delta)
    }
}

/// Converts a wall-clock delta into frames at [`REFERENCE_FRAME_RATE`].
#[must_use]
pub fn delta_frames(delta: Duration) -> f32 {
    delta.as_secs_f32() * REFERENCE_FRAME_RATE
}
