//! The two-panel curtain opening.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use stagehand_core::easing::Easing;
use stagehand_core::error::StageError;
use tracing::{debug, info};

use super::gesture::PullTrigger;

/// Lifecycle of the curtain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CurtainState {
    Closed,
    Opening,
    Open,
}

impl fmt::Display for CurtainState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Opening => write!(f, "opening"),
            Self::Open => write!(f, "open"),
        }
    }
}

/// Curtain timing and travel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurtainConfig {
    /// Length of the opening animation in seconds.
    pub duration_secs: f32,
    /// Pause between the panels settling and the completion callback.
    pub post_open_delay_secs: f32,
    /// Horizontal travel of each panel when fully open.
    pub max_separation: f32,
}

impl Default for CurtainConfig {
    fn default() -> Self {
        Self {
            duration_secs: 1.5,
            post_open_delay_secs: 0.3,
            max_separation: 690.0,
        }
    }
}

impl CurtainConfig {
    /// Travel that clears a viewport of `width`: half of it plus a margin.
    #[must_use]
    pub fn separation_for_width(width: f32) -> f32 {
        width / 2.0 + 50.0
    }

    /// Checks the configuration.
    ///
    /// # Errors
    ///
    /// Returns `StageError::Validation` if a duration or the travel is
    /// negative or not finite.
    pub fn validate(&self) -> Result<(), StageError> {
        for (name, value) in [
            ("duration_secs", self.duration_secs),
            ("post_open_delay_secs", self.post_open_delay_secs),
            ("max_separation", self.max_separation),
        ] {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(StageError::Validation(format!(
                    "curtain {name} must be finite and non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Seconds to a `Duration`; negative or NaN is zero, infinite saturates.
fn secs(value: f32) -> Duration {
    Duration::try_from_secs_f32(value.max(0.0)).unwrap_or(Duration::MAX)
}

/// Completion callback, invoked at most once.
pub type OpenCompleteCallback = Box<dyn FnOnce() + Send>;

/// Drives the curtain from closed to open once triggered.
pub struct CurtainTransitionController {
    config: CurtainConfig,
    state: CurtainState,
    open_progress: f32,
    start_progress: f32,
    elapsed: Duration,
    held_open: Duration,
    opening_runs: u32,
    completed: bool,
    on_open_complete: Option<OpenCompleteCallback>,
}

impl fmt::Debug for CurtainTransitionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurtainTransitionController")
            .field("state", &self.state)
            .field("open_progress", &self.open_progress)
            .field("completed", &self.completed)
            .finish_non_exhaustive()
    }
}

impl CurtainTransitionController {
    #[must_use]
    pub fn new(config: CurtainConfig) -> Self {
        Self {
            config,
            state: CurtainState::Closed,
            open_progress: 0.0,
            start_progress: 0.0,
            elapsed: Duration::ZERO,
            held_open: Duration::ZERO,
            opening_runs: 0,
            completed: false,
            on_open_complete: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> CurtainState {
        self.state
    }

    /// Opening progress in `[0, 1]`, never decreasing.
    #[must_use]
    pub fn open_progress(&self) -> f32 {
        self.open_progress
    }

    /// How many times the opening animation has started. Never above 1.
    #[must_use]
    pub fn opening_runs(&self) -> u32 {
        self.opening_runs
    }

    /// `true` once the completion callback has been due.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed
    }

    /// Horizontal offset of the left panel.
    #[must_use]
    pub fn left_offset(&self) -> f32 {
        -self.open_progress * self.config.max_separation
    }

    /// Horizontal offset of the right panel.
    #[must_use]
    pub fn right_offset(&self) -> f32 {
        self.open_progress * self.config.max_separation
    }

    /// Registers the completion callback. If the curtain already
    /// completed, it runs immediately.
    pub fn on_open_complete(&mut self, callback: impl FnOnce() + Send + 'static) {
        if self.completed {
            callback();
        } else {
            self.on_open_complete = Some(Box::new(callback));
        }
    }

    /// Starts opening. Only the first call has an effect.
    pub fn trigger(&mut self) {
        if self.state != CurtainState::Closed {
            debug!(state = %self.state, "curtain already triggered");
            return;
        }
        self.state = CurtainState::Opening;
        self.start_progress = self.open_progress;
        self.elapsed = Duration::ZERO;
        self.opening_runs += 1;
        info!(duration_secs = self.config.duration_secs, "curtain opening");
    }

    /// Advances the animation by `delta`.
    pub fn update(&mut self, delta: Duration) {
        let mut carried = delta;

        if self.state == CurtainState::Opening {
            self.elapsed += delta;
            let duration = secs(self.config.duration_secs);
            let t = if duration.is_zero() {
                1.0
            } else {
                (self.elapsed.as_secs_f32() / duration.as_secs_f32()).min(1.0)
            };
            let eased = Easing::CubicOut.apply(t);
            let next = self.start_progress + (1.0 - self.start_progress) * eased;
            self.open_progress = next.max(self.open_progress);

            if t < 1.0 {
                return;
            }
            self.open_progress = 1.0;
            self.state = CurtainState::Open;
            carried = self.elapsed.saturating_sub(duration);
            info!("curtain open");
        }

        if self.state == CurtainState::Open && !self.completed {
            self.held_open += carried;
            let delay = secs(self.config.post_open_delay_secs);
            if self.held_open >= delay {
                self.completed = true;
                if let Some(callback) = self.on_open_complete.take() {
                    callback();
                }
            }
        }
    }
}

impl PullTrigger for CurtainTransitionController {
    fn trigger(&mut self) {
        CurtainTransitionController::trigger(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const FRAME: Duration = Duration::from_millis(10);

    fn counted(controller: &mut CurtainTransitionController) -> Arc<AtomicUsize> {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        controller.on_open_complete(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        calls
    }

    fn run(controller: &mut CurtainTransitionController, total: Duration) {
        let mut remaining = total;
        while !remaining.is_zero() {
            let step = remaining.min(FRAME);
            controller.update(step);
            remaining -= step;
        }
    }

    #[test]
    fn test_repeated_triggers_open_once_and_complete_once() {
        // Arrange
        let mut controller = CurtainTransitionController::new(CurtainConfig::default());
        let calls = counted(&mut controller);

        // Act
        for _ in 0..5 {
            controller.trigger();
        }
        run(&mut controller, Duration::from_millis(800));
        controller.trigger();
        run(&mut controller, Duration::from_secs(3));

        // Assert
        assert_eq!(controller.opening_runs(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(controller.state(), CurtainState::Open);
    }

    #[test]
    fn test_update_before_trigger_keeps_curtain_closed() {
        let mut controller = CurtainTransitionController::new(CurtainConfig::default());

        run(&mut controller, Duration::from_secs(2));

        assert_eq!(controller.state(), CurtainState::Closed);
        assert!(controller.open_progress().abs() < f32::EPSILON);
    }

    #[test]
    fn test_progress_follows_cubic_ease_out() {
        // Arrange
        let mut controller = CurtainTransitionController::new(CurtainConfig::default());
        controller.trigger();

        // Act
        controller.update(Duration::from_millis(750));

        // Assert
        assert!((controller.open_progress() - 0.875).abs() < 1e-4);
    }

    #[test]
    fn test_progress_is_monotonic_and_panels_symmetric() {
        let mut controller = CurtainTransitionController::new(CurtainConfig::default());
        controller.trigger();

        let mut last = 0.0;
        for _ in 0..200 {
            controller.update(FRAME);
            let progress = controller.open_progress();
            assert!(progress >= last);
            assert!((controller.left_offset() + controller.right_offset()).abs() < 1e-4);
            last = progress;
        }
        assert!((last - 1.0).abs() < f32::EPSILON);
        assert!((controller.right_offset() - 690.0).abs() < 1e-3);
    }

    #[test]
    fn test_callback_waits_for_post_open_delay() {
        // Arrange
        let mut controller = CurtainTransitionController::new(CurtainConfig::default());
        let calls = counted(&mut controller);
        controller.trigger();

        // Act
        run(&mut controller, Duration::from_millis(1500));
        let at_open = calls.load(Ordering::SeqCst);
        run(&mut controller, Duration::from_millis(150));
        let mid_delay = calls.load(Ordering::SeqCst);
        run(&mut controller, Duration::from_millis(200));

        // Assert
        assert_eq!(at_open, 0);
        assert_eq!(mid_delay, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(controller.is_complete());
    }

    #[test]
    fn test_single_large_update_opens_and_completes() {
        let mut controller = CurtainTransitionController::new(CurtainConfig::default());
        let calls = counted(&mut controller);
        controller.trigger();

        controller.update(Duration::from_secs(5));

        assert_eq!(controller.state(), CurtainState::Open);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_late_registration_runs_immediately() {
        // Arrange
        let mut controller = CurtainTransitionController::new(CurtainConfig::default());
        controller.trigger();
        run(&mut controller, Duration::from_secs(2));

        // Act
        let calls = counted(&mut controller);

        // Assert
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_separation_clears_viewport_with_margin() {
        assert!((CurtainConfig::separation_for_width(1280.0) - 690.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_validate_rejects_non_finite_and_negative_timings() {
        assert!(CurtainConfig::default().validate().is_ok());

        for config in [
            CurtainConfig {
                duration_secs: f32::INFINITY,
                ..CurtainConfig::default()
            },
            CurtainConfig {
                post_open_delay_secs: f32::NAN,
                ..CurtainConfig::default()
            },
            CurtainConfig {
                max_separation: -1.0,
                ..CurtainConfig::default()
            },
        ] {
            assert!(matches!(config.validate(), Err(StageError::Validation(_))), "{config:?}");
        }
    }

    #[test]
    fn test_unbounded_durations_never_complete_and_do_not_panic() {
        // Arrange
        let mut controller = CurtainTransitionController::new(CurtainConfig {
            duration_secs: f32::INFINITY,
            post_open_delay_secs: f32::INFINITY,
            ..CurtainConfig::default()
        });
        let calls = counted(&mut controller);
        controller.trigger();

        // Act
        run(&mut controller, Duration::from_secs(3));

        // Assert
        assert_eq!(controller.state(), CurtainState::Opening);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
