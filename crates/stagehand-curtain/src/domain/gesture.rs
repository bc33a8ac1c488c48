//! Pointer-drag tracking for the rope pull.
//!
//! Forces are applied incrementally: each move pushes the weight by the
//! distance travelled since the previous move, never by the total. The
//! trigger decision uses the high-water mark of downward displacement from
//! where the current gesture started, so oscillating the pointer or
//! flicking and letting go never adds up to a pull.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use stagehand_physics::domain::body::BodyId;
use stagehand_physics::domain::world::PhysicsWorld;
use tracing::{debug, info};

/// Receiver of the one-shot pull trigger.
pub trait PullTrigger {
    /// Called once when the pull threshold is crossed.
    fn trigger(&mut self);
}

/// Gesture tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Downward displacement, in pixels, that fires the trigger.
    pub pull_threshold: f32,
    /// Force applied per pixel of downward pointer travel.
    pub pull_force_per_px: f32,
    /// Upward force applied when an unfinished pull is released.
    pub return_force: f32,
    /// Radius around the weight that accepts a pointer-down.
    pub hit_radius: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            pull_threshold: 100.0,
            pull_force_per_px: 600.0,
            return_force: 3000.0,
            hit_radius: 50.0,
        }
    }
}

/// Observable state of the gesture.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct GestureState {
    /// A drag on the weight is in progress.
    pub pointer_down: bool,
    /// Pointer Y where the current drag began.
    pub gesture_origin_y: f32,
    /// Pointer Y at the previous move; forces use the distance from here.
    pub drag_start_y: f32,
    /// Largest downward displacement seen in any drag.
    pub cumulative_pulled: f32,
    /// The trigger has fired.
    pub triggered: bool,
}

/// Turns pointer events into forces on the rope's weighted end.
#[derive(Debug, Clone)]
pub struct GestureTracker {
    config: GestureConfig,
    state: GestureState,
    end_body: BodyId,
    attached: bool,
}

impl GestureTracker {
    /// Creates a tracker bound to the weighted end body.
    #[must_use]
    pub fn new(end_body: BodyId, config: GestureConfig) -> Self {
        Self {
            config,
            state: GestureState::default(),
            end_body,
            attached: true,
        }
    }

    /// Current gesture state.
    #[must_use]
    pub fn state(&self) -> &GestureState {
        &self.state
    }

    /// Tuning in use.
    #[must_use]
    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    /// `false` once the trigger fired or the tracker was torn down.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Pull progress in `[0, 1]`.
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.config.pull_threshold <= 0.0 {
            return 1.0;
        }
        (self.state.cumulative_pulled / self.config.pull_threshold).clamp(0.0, 1.0)
    }

    /// Starts a drag if `pointer` is on the weight. Returns `true` when
    /// tracking began.
    pub fn on_pointer_down(&mut self, world: &PhysicsWorld, pointer: Vec2) -> bool {
        if !self.attached {
            return false;
        }
        let Some(body) = world.body(self.end_body) else {
            return false;
        };
        if !body.contains(pointer, self.config.hit_radius) {
            return false;
        }

        self.state.pointer_down = true;
        self.state.gesture_origin_y = pointer.y;
        self.state.drag_start_y = pointer.y;
        debug!(y = pointer.y, "rope grabbed");
        true
    }

    /// Applies the incremental pull and fires `target` once the
    /// high-water mark reaches the threshold.
    pub fn on_pointer_move(
        &mut self,
        world: &mut PhysicsWorld,
        pointer: Vec2,
        target: &mut dyn PullTrigger,
    ) {
        if !self.attached || !self.state.pointer_down {
            return;
        }

        let delta_y = pointer.y - self.state.drag_start_y;
        if delta_y > 0.0 {
            world.apply_force(
                self.end_body,
                Vec2::new(0.0, delta_y * self.config.pull_force_per_px),
            );
        }
        self.state.drag_start_y = pointer.y;

        let displacement = pointer.y - self.state.gesture_origin_y;
        self.state.cumulative_pulled = self.state.cumulative_pulled.max(displacement);

        if !self.state.triggered && self.state.cumulative_pulled >= self.config.pull_threshold {
            self.state.triggered = true;
            self.state.pointer_down = false;
            self.attached = false;
            info!(
                pulled = self.state.cumulative_pulled,
                threshold = self.config.pull_threshold,
                "pull threshold reached"
            );
            target.trigger();
        }
    }

    /// Ends the drag; an unfinished pull gets a small upward nudge.
    pub fn on_pointer_up(&mut self, world: &mut PhysicsWorld) {
        if !self.state.pointer_down {
            return;
        }
        self.state.pointer_down = false;
        if !self.state.triggered {
            world.apply_force(self.end_body, Vec2::new(0.0, -self.config.return_force));
            debug!(
                pulled = self.state.cumulative_pulled,
                "rope released before threshold"
            );
        }
    }

    /// Clears all gesture state and detaches for good.
    pub fn reset(&mut self) {
        self.state = GestureState::default();
        self.attached = false;
    }
}
