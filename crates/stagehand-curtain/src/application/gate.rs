//! The curtain gate: rope physics, pull gesture and curtain opening wired
//! together as the entry experience.
//!
//! The gate owns its own `PhysicsWorld`. Pointer events feed the gesture
//! tracker; crossing the pull threshold triggers the curtain exactly once,
//! plays the opening sound and starts fading the rope out. The completion
//! callback registered through [`CurtainGate::on_open_complete`] fires once
//! the panels have settled.

use std::sync::Arc;
use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use stagehand_core::error::StageError;
use stagehand_core::scene::Viewport;
use stagehand_core::sound::SoundService;
use stagehand_physics::application::rope_rig::{RopeConfig, RopeRig};
use stagehand_physics::domain::world::{PhysicsWorld, WorldConfig};
use tracing::{debug, info, instrument};

use crate::domain::curtain::{CurtainConfig, CurtainState, CurtainTransitionController};
use crate::domain::gesture::{GestureConfig, GestureState, GestureTracker, PullTrigger};

/// Name under which the opening sound is registered.
pub const CURTAIN_OPEN_SOUND: &str = "curtainOpen";
/// Name under which the click sound is registered.
pub const CLICK_SOUND: &str = "click";

/// Everything tunable about the gate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub world: WorldConfig,
    pub rope: RopeConfig,
    pub gesture: GestureConfig,
    pub curtain: CurtainConfig,
    /// Seconds for the rope and weight to fade out after the trigger.
    pub rope_fade_secs: f32,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            rope: RopeConfig::default(),
            gesture: GestureConfig::default(),
            curtain: CurtainConfig::default(),
            rope_fade_secs: 0.8,
        }
    }
}

impl GateConfig {
    /// Centres the rope and sizes the curtain travel for `viewport`.
    #[must_use]
    pub fn fitted_to(mut self, viewport: Viewport) -> Self {
        self.rope.anchor.x = viewport.width / 2.0;
        self.curtain.max_separation = CurtainConfig::separation_for_width(viewport.width);
        self
    }
}

/// What a renderer needs to draw one frame of the gate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateFrame {
    pub rope: Vec<Vec2>,
    pub weight: Option<Vec2>,
    pub rope_alpha: f32,
    pub left_offset: f32,
    pub right_offset: f32,
    pub pull_progress: f32,
    pub state: CurtainState,
}

/// Triggers the curtain and plays the opening sound in one step.
struct OpeningCue<'a> {
    curtain: &'a mut CurtainTransitionController,
    sound: &'a dyn SoundService,
    triggered_at: &'a mut Option<Duration>,
    now: Duration,
}

impl PullTrigger for OpeningCue<'_> {
    fn trigger(&mut self) {
        if self.triggered_at.is_some() {
            return;
        }
        *self.triggered_at = Some(self.now);
        self.curtain.trigger();
        self.sound.play(CURTAIN_OPEN_SOUND);
    }
}

/// The interactive entry gate.
pub struct CurtainGate {
    config: GateConfig,
    world: PhysicsWorld,
    rig: Option<RopeRig>,
    tracker: GestureTracker,
    curtain: CurtainTransitionController,
    sound: Arc<dyn SoundService>,
    clock: Duration,
    triggered_at: Option<Duration>,
}

impl std::fmt::Debug for CurtainGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurtainGate")
            .field("curtain", &self.curtain)
            .field("gesture", self.tracker.state())
            .field("bodies", &self.world.body_count())
            .finish_non_exhaustive()
    }
}

impl CurtainGate {
    /// Builds the rope rig and registers the gate's sounds.
    ///
    /// # Errors
    ///
    /// Returns `StageError::Validation` if the rope or curtain configuration
    /// is invalid.
    #[instrument(skip(sound), fields(segments = config.rope.segment_count))]
    pub fn new(config: GateConfig, sound: Arc<dyn SoundService>) -> Result<Self, StageError> {
        config.curtain.validate()?;
        let mut world = PhysicsWorld::new(config.world);
        let rig = RopeRig::build(&mut world, config.rope)?;
        let tracker = GestureTracker::new(rig.end_body(), config.gesture);

        sound.register(CURTAIN_OPEN_SOUND, "sounds/curtain-open.mp3");
        sound.register(CLICK_SOUND, "sounds/click.mp3");

        info!(threshold = config.gesture.pull_threshold, "curtain gate ready");
        Ok(Self {
            config,
            world,
            rig: Some(rig),
            tracker,
            curtain: CurtainTransitionController::new(config.curtain),
            sound,
            clock: Duration::ZERO,
            triggered_at: None,
        })
    }

    /// Registers the callback fired once the curtain is fully open.
    pub fn on_open_complete(&mut self, callback: impl FnOnce() + Send + 'static) {
        self.curtain.on_open_complete(callback);
    }

    /// Forwards a pointer press. Returns `true` if it landed on the weight.
    pub fn pointer_down(&mut self, pointer: Vec2) -> bool {
        self.tracker.on_pointer_down(&self.world, pointer)
    }

    /// Forwards a pointer move.
    pub fn pointer_move(&mut self, pointer: Vec2) {
        let mut cue = OpeningCue {
            curtain: &mut self.curtain,
            sound: self.sound.as_ref(),
            triggered_at: &mut self.triggered_at,
            now: self.clock,
        };
        self.tracker
            .on_pointer_move(&mut self.world, pointer, &mut cue);
    }

    /// Forwards a pointer release.
    pub fn pointer_up(&mut self) {
        self.tracker.on_pointer_up(&mut self.world);
    }

    /// Steps physics and the curtain by `delta`.
    pub fn update(&mut self, delta: Duration) {
        self.clock += delta;
        if self.rig.is_some() {
            self.world.step(delta);
        }
        self.curtain.update(delta);
    }

    /// Alpha of the rope and weight: 1 until the trigger, then a linear
    /// fade to 0.
    #[must_use]
    pub fn rope_alpha(&self) -> f32 {
        let Some(at) = self.triggered_at else {
            return 1.0;
        };
        if self.config.rope_fade_secs <= 0.0 {
            return 0.0;
        }
        let since = self.clock.saturating_sub(at).as_secs_f32();
        (1.0 - since / self.config.rope_fade_secs).clamp(0.0, 1.0)
    }

    /// Pull progress in `[0, 1]`.
    #[must_use]
    pub fn pull_progress(&self) -> f32 {
        self.tracker.progress()
    }

    #[must_use]
    pub fn gesture(&self) -> &GestureState {
        self.tracker.state()
    }

    #[must_use]
    pub fn curtain(&self) -> &CurtainTransitionController {
        &self.curtain
    }

    /// Where the weight currently is, for aiming a pointer at it.
    #[must_use]
    pub fn weight_position(&self) -> Option<Vec2> {
        self.rig
            .as_ref()
            .and_then(|rig| rig.end_position(&self.world))
    }

    #[must_use]
    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    /// Renderable snapshot of the current frame.
    #[must_use]
    pub fn frame(&self) -> GateFrame {
        GateFrame {
            rope: self
                .rig
                .as_ref()
                .map(|rig| rig.positions(&self.world))
                .unwrap_or_default(),
            weight: self.weight_position(),
            rope_alpha: self.rope_alpha(),
            left_offset: self.curtain.left_offset(),
            right_offset: self.curtain.right_offset(),
            pull_progress: self.pull_progress(),
            state: self.curtain.state(),
        }
    }

    /// Removes the rope from the world and detaches the gesture handlers.
    /// Safe to call more than once.
    pub fn teardown(&mut self) {
        self.tracker.reset();
        if let Some(rig) = self.rig.take() {
            rig.teardown(&mut self.world);
            debug!("curtain gate torn down");
        }
    }
}
