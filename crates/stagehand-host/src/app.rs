//! The host application.
//!
//! Owns the render loop: every frame it steps the curtain gate while the
//! curtain is up, advances running transition tweens, forwards the frame
//! delta to the scene manager and collects scene events. Once the curtain
//! reports fully open, the gate is torn down and the first room is shown.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use glam::Vec2;
use serde::Serialize;
use stagehand_core::clock::{Clock, FrameTimer, SystemClock, delta_frames};
use stagehand_core::error::StageError;
use stagehand_core::scene::{SceneFactory, SceneId, Viewport};
use stagehand_core::sound::SoundService;
use stagehand_curtain::application::gate::CurtainGate;
use stagehand_navigation::application::animator::{
    TransitionAnimator, TweenAnimator, TweenDriver,
};
use stagehand_navigation::application::scene_manager::SceneManager;
use stagehand_navigation::domain::events::{SceneEvent, SceneEventKind};
use stagehand_navigation::domain::navigation::{ChangeOptions, NavigationOutcome};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};

use crate::config::{HostConfig, TourStep};
use crate::error::AppError;
use crate::rooms::HOUSE;

/// Preset used for the first room after the curtain.
pub const OPENING_TRANSITION: &str = "fade";
/// Duration of the first room's transition.
pub const OPENING_DURATION: Duration = Duration::from_millis(800);

/// Pointer travel per frame of the scripted pull.
const PULL_STEP_PX: f32 = 8.0;
const MAX_PULL_FRAMES: u32 = 600;
const MAX_FRAME_DELTA: Duration = Duration::from_millis(100);
/// Wall-clock seconds a single wait (curtain, navigation) may take.
const WAIT_LIMIT_SECS: u64 = 30;

type PendingNavigation = JoinHandle<Result<NavigationOutcome, StageError>>;

/// Where the host is in its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HostPhase {
    /// The curtain gate is up and accepts pointer input.
    Curtain,
    /// The curtain is gone; rooms are navigated through the scene manager.
    Rooms,
    /// Torn down.
    Stopped,
}

/// Result of [`HostApplication::run`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Every scene that became active, in order.
    pub visited: Vec<SceneId>,
    /// Frames ticked.
    pub frames: u64,
    /// `true` if the run was stopped early.
    pub interrupted: bool,
}

pub struct HostApplication {
    config: HostConfig,
    gate: CurtainGate,
    opened: Arc<AtomicBool>,
    manager: Arc<SceneManager>,
    driver: Option<TweenDriver>,
    sound: Arc<dyn SoundService>,
    events: broadcast::Receiver<SceneEvent>,
    pending: Option<PendingNavigation>,
    phase: HostPhase,
    visited: Vec<SceneId>,
    frames: u64,
    timer: FrameTimer,
    pacer: Option<Interval>,
    stop: Arc<AtomicBool>,
}

impl std::fmt::Debug for HostApplication {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostApplication")
            .field("phase", &self.phase)
            .field("frames", &self.frames)
            .field("visited", &self.visited)
            .field("gate", &self.gate)
            .field("manager", &self.manager)
            .finish_non_exhaustive()
    }
}

impl HostApplication {
    /// Builds a host that animates transitions with tweens advanced by its
    /// own render loop.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Stage` if the curtain gate cannot be built.
    pub fn new(
        config: HostConfig,
        factory: Arc<dyn SceneFactory>,
        sound: Arc<dyn SoundService>,
    ) -> Result<Self, AppError> {
        let driver = TweenDriver::new();
        let animator = Arc::new(TweenAnimator::new(driver.clone(), config.viewport));
        Self::assemble(
            config,
            factory,
            sound,
            animator,
            Arc::new(SystemClock),
            Some(driver),
        )
    }

    /// Builds a host around a caller-supplied animator and clock.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Stage` if the curtain gate cannot be built.
    pub fn with_animator(
        config: HostConfig,
        factory: Arc<dyn SceneFactory>,
        sound: Arc<dyn SoundService>,
        animator: Arc<dyn TransitionAnimator>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AppError> {
        Self::assemble(config, factory, sound, animator, clock, None)
    }

    fn assemble(
        config: HostConfig,
        factory: Arc<dyn SceneFactory>,
        sound: Arc<dyn SoundService>,
        animator: Arc<dyn TransitionAnimator>,
        clock: Arc<dyn Clock>,
        driver: Option<TweenDriver>,
    ) -> Result<Self, AppError> {
        let mut gate = CurtainGate::new(config.gate_config(), Arc::clone(&sound))?;
        let opened = Arc::new(AtomicBool::new(false));
        gate.on_open_complete({
            let opened = Arc::clone(&opened);
            move || opened.store(true, Ordering::SeqCst)
        });

        let manager = Arc::new(SceneManager::new(
            factory,
            animator,
            Arc::clone(&sound),
            clock,
            config.viewport,
        ));
        let events = manager.subscribe();

        Ok(Self {
            config,
            gate,
            opened,
            manager,
            driver,
            sound,
            events,
            pending: None,
            phase: HostPhase::Curtain,
            visited: Vec::new(),
            frames: 0,
            timer: FrameTimer::new(MAX_FRAME_DELTA),
            pacer: None,
            stop: Arc::new(AtomicBool::new(false)),
        })
    }

    #[must_use]
    pub fn manager(&self) -> &Arc<SceneManager> {
        &self.manager
    }

    #[must_use]
    pub fn gate(&self) -> &CurtainGate {
        &self.gate
    }

    #[must_use]
    pub fn phase(&self) -> HostPhase {
        self.phase
    }

    /// Scenes that became active so far, in order.
    #[must_use]
    pub fn visited(&self) -> &[SceneId] {
        &self.visited
    }

    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Flag that stops [`run`](Self::run) at the next frame when set.
    #[must_use]
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Advances the host by one frame of `delta`.
    pub fn tick(&mut self, delta: Duration) {
        if self.phase == HostPhase::Stopped {
            return;
        }
        self.frames += 1;

        if self.phase == HostPhase::Curtain {
            self.gate.update(delta);
            if self.opened.load(Ordering::SeqCst) {
                self.open_rooms();
            }
        }
        if let Some(driver) = &self.driver {
            driver.advance(delta);
        }
        self.manager.update(delta_frames(delta));
        self.drain_events();
    }

    /// Forwards a pointer press to the curtain gate. Returns `true` if it
    /// grabbed the weight.
    pub fn pointer_down(&mut self, pointer: Vec2) -> bool {
        self.phase == HostPhase::Curtain && self.gate.pointer_down(pointer)
    }

    pub fn pointer_move(&mut self, pointer: Vec2) {
        if self.phase == HostPhase::Curtain {
            self.gate.pointer_move(pointer);
        }
    }

    pub fn pointer_up(&mut self) {
        if self.phase == HostPhase::Curtain {
            self.gate.pointer_up();
        }
    }

    /// Records a new viewport and forwards it to the scene manager.
    pub fn resize(&mut self, viewport: Viewport) {
        self.config.viewport = viewport;
        self.manager.resize(viewport);
    }

    fn open_rooms(&mut self) {
        self.gate.teardown();
        self.phase = HostPhase::Rooms;
        info!(frames = self.frames, "curtain open, entering the house");

        let options = ChangeOptions::default()
            .with_transition(OPENING_TRANSITION)
            .with_duration(OPENING_DURATION);
        self.pending = self.manager.change_detached(HOUSE, options);
        if self.pending.is_none() {
            warn!(scene = HOUSE, "first room could not be shown");
        }
    }

    fn drain_events(&mut self) {
        loop {
            match self.events.try_recv() {
                Ok(event) => match event.kind {
                    SceneEventKind::SceneChanged(changed) => {
                        debug!(scene = %changed.scene_id, "host saw scene change");
                        self.visited.push(changed.scene_id);
                    }
                    SceneEventKind::NavigationFailed(failed) => {
                        warn!(scene = %failed.scene_id, reason = %failed.reason, "host saw failed navigation");
                    }
                },
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "scene events lagged");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
    }

    fn wait_limit(&self) -> u64 {
        u64::from(self.config.frame_rate) * WAIT_LIMIT_SECS
    }

    /// Waits for the next frame and ticks it. Realtime hosts pace against
    /// the wall clock; otherwise a fixed frame period is fed after yielding
    /// to other tasks.
    async fn next_frame(&mut self) {
        let delta = if self.config.realtime {
            let period = self.config.frame_period();
            let pacer = self.pacer.get_or_insert_with(|| {
                let mut interval = tokio::time::interval(period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
                interval
            });
            pacer.tick().await;
            self.timer.tick(Instant::now())
        } else {
            tokio::task::yield_now().await;
            self.config.frame_period()
        };
        self.tick(delta);
    }

    /// Drags the weight straight down until the curtain triggers. Returns
    /// `true` if it did.
    pub async fn pull_rope(&mut self) -> bool {
        let Some(weight) = self.gate.weight_position() else {
            return false;
        };
        if !self.pointer_down(weight) {
            warn!(x = weight.x, y = weight.y, "scripted pull missed the weight");
            return false;
        }

        let mut pointer = weight;
        for _ in 0..MAX_PULL_FRAMES {
            if self.gate.gesture().triggered || self.stop_requested() {
                break;
            }
            pointer.y += PULL_STEP_PX;
            self.pointer_move(pointer);
            self.next_frame().await;
        }
        let triggered = self.gate.gesture().triggered || self.phase != HostPhase::Curtain;
        self.pointer_up();
        triggered
    }

    /// Ticks until the curtain has opened.
    async fn await_curtain(&mut self) {
        let limit = self.wait_limit();
        let mut waited = 0;
        while self.phase == HostPhase::Curtain && waited < limit && !self.stop_requested() {
            self.next_frame().await;
            waited += 1;
        }
    }

    /// Ticks until the pending navigation has finished and returns its
    /// outcome. `Ok(None)` if nothing was pending or the run was stopped.
    ///
    /// # Errors
    ///
    /// Returns the navigation's `StageError`, or `StageError::Infrastructure`
    /// if it did not finish in time.
    pub async fn settle(&mut self) -> Result<Option<NavigationOutcome>, AppError> {
        let Some(handle) = self.pending.take() else {
            return Ok(None);
        };

        let limit = self.wait_limit();
        let mut waited = 0;
        while !handle.is_finished() {
            if self.stop_requested() {
                handle.abort();
                return Ok(None);
            }
            if waited >= limit {
                handle.abort();
                return Err(StageError::Infrastructure(format!(
                    "navigation did not finish within {WAIT_LIMIT_SECS} s"
                ))
                .into());
            }
            self.next_frame().await;
            waited += 1;
        }

        let outcome = handle
            .await
            .map_err(|e| StageError::Infrastructure(format!("navigation task failed: {e}")))??;
        self.drain_events();
        Ok(Some(outcome))
    }

    async fn settle_logged(&mut self) {
        match self.settle().await {
            Ok(Some(outcome)) => debug!(?outcome, "navigation settled"),
            Ok(None) => {}
            Err(e) => error!(error = %e, "navigation did not complete"),
        }
    }

    async fn perform(&mut self) {
        if !self.pull_rope().await {
            warn!("curtain was not opened");
            return;
        }
        self.await_curtain().await;
        self.settle_logged().await;

        for step in self.config.tour.clone() {
            if self.stop_requested() {
                break;
            }
            self.pending = match &step {
                TourStep::Go { target, transition } => {
                    let mut options = ChangeOptions::default();
                    if let Some(transition) = transition {
                        options = options.with_transition(transition.as_str());
                    }
                    self.manager.change_detached(target.clone(), options)
                }
                TourStep::Back => self.manager.go_back_detached(),
            };
            if self.pending.is_none() {
                warn!(?step, "tour step ignored");
                continue;
            }
            self.settle_logged().await;
        }
    }

    /// Pulls the rope, waits for the first room, walks the configured tour
    /// and shuts down. Ctrl-C stops the run at the next frame.
    #[instrument(skip(self))]
    pub async fn run(&mut self) -> RunSummary {
        let stop = Arc::clone(&self.stop);
        let interrupt = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received, stopping");
                stop.store(true, Ordering::SeqCst);
            }
        });

        self.perform().await;
        interrupt.abort();
        self.shutdown();

        RunSummary {
            visited: self.visited.clone(),
            frames: self.frames,
            interrupted: self.stop_requested(),
        }
    }

    /// Abandons any pending navigation, destroys the active scene and the
    /// curtain rig, and stops ambient sound. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if self.phase == HostPhase::Stopped {
            return;
        }
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
        if let Some(driver) = &self.driver {
            driver.finish_all();
        }
        self.drain_events();
        self.manager.destroy();
        self.gate.teardown();
        self.sound.set_ambient(None);
        self.phase = HostPhase::Stopped;
        info!(
            frames = self.frames,
            visited = self.visited.len(),
            "host stopped"
        );
    }
}
