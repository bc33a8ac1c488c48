//! Transition animators.
//!
//! [`TweenAnimator`] registers preset tweens with a [`TweenDriver`] that the
//! host advances once per frame, and resolves when the tween lands.
//! [`InstantAnimator`] applies the end state at once, for headless runs.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use stagehand_core::container::ContainerHandle;
use stagehand_core::scene::Viewport;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::domain::preset::{Transition, TweenSpec};
use crate::domain::tween::Tween;

/// Plays enter and exit animations on scene containers.
///
/// Both methods resolve when the animation has finished. A preset name that
/// is not recognised resolves immediately without touching the container.
#[async_trait]
pub trait TransitionAnimator: Send + Sync {
    /// Animates an outgoing container off stage.
    async fn exit(&self, container: &ContainerHandle, preset: &str, duration: Duration);

    /// Animates an incoming container to rest.
    async fn enter(&self, container: &ContainerHandle, preset: &str, duration: Duration);

    /// Viewport changes that affect preset travel.
    fn resize(&self, _viewport: Viewport) {}
}

fn parse_preset(preset: &str) -> Option<Transition> {
    match preset.parse::<Transition>() {
        Ok(transition) => Some(transition),
        Err(_) => {
            warn!(preset, "unknown transition preset, skipping animation");
            None
        }
    }
}

#[derive(Debug)]
struct ActiveTween {
    tween: Tween,
    done: Option<oneshot::Sender<()>>,
}

impl ActiveTween {
    fn complete(&mut self) {
        if let Some(done) = self.done.take() {
            // The waiter may have been dropped; nothing to notify then.
            let _ = done.send(());
        }
    }
}

/// Shared set of running tweens, advanced by the render loop.
#[derive(Debug, Clone, Default)]
pub struct TweenDriver {
    active: Arc<Mutex<Vec<ActiveTween>>>,
}

impl TweenDriver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts `spec` on `container`. Any tween already running on the same
    /// container is finished first. The receiver resolves when this tween
    /// lands.
    pub fn play(&self, container: ContainerHandle, spec: TweenSpec) -> oneshot::Receiver<()> {
        let (done, finished) = oneshot::channel();
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);

        active.retain_mut(|running| {
            if running.tween.container().same_as(&container) {
                running.tween.finish();
                running.complete();
                return false;
            }
            true
        });

        let mut entry = ActiveTween {
            tween: Tween::start(container, spec),
            done: Some(done),
        };
        if spec.duration.is_zero() {
            entry.tween.finish();
            entry.complete();
        } else {
            active.push(entry);
        }
        finished
    }

    /// Advances every tween by `delta`. Returns how many finished.
    pub fn advance(&self, delta: Duration) -> usize {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        let before = active.len();
        active.retain_mut(|running| {
            if running.tween.advance(delta) {
                running.complete();
                return false;
            }
            true
        });
        before - active.len()
    }

    /// Jumps every tween to its end state and resolves its waiter.
    pub fn finish_all(&self) {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        for running in active.iter_mut() {
            running.tween.finish();
            running.complete();
        }
        active.clear();
    }

    /// Number of tweens still running.
    #[must_use]
    pub fn active(&self) -> usize {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Animator backed by a [`TweenDriver`].
#[derive(Debug)]
pub struct TweenAnimator {
    driver: TweenDriver,
    viewport: Mutex<Viewport>,
}

impl TweenAnimator {
    #[must_use]
    pub fn new(driver: TweenDriver, viewport: Viewport) -> Self {
        Self {
            driver,
            viewport: Mutex::new(viewport),
        }
    }

    #[must_use]
    pub fn driver(&self) -> &TweenDriver {
        &self.driver
    }

    fn viewport(&self) -> Viewport {
        *self.viewport.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn run(&self, container: &ContainerHandle, spec: TweenSpec) {
        let finished = self.driver.play(container.clone(), spec);
        // A dropped sender means the driver went away; treat as finished.
        let _ = finished.await;
    }
}

#[async_trait]
impl TransitionAnimator for TweenAnimator {
    async fn exit(&self, container: &ContainerHandle, preset: &str, duration: Duration) {
        let Some(transition) = parse_preset(preset) else {
            return;
        };
        let spec = transition.exit_tween(container.transform(), self.viewport(), duration);
        debug!(preset, ?duration, "exit animation");
        self.run(container, spec).await;
    }

    async fn enter(&self, container: &ContainerHandle, preset: &str, duration: Duration) {
        let Some(transition) = parse_preset(preset) else {
            return;
        };
        let spec = transition.enter_tween(self.viewport(), duration);
        debug!(preset, ?duration, "enter animation");
        self.run(container, spec).await;
    }

    fn resize(&self, viewport: Viewport) {
        *self.viewport.lock().unwrap_or_else(PoisonError::into_inner) = viewport;
    }
}

/// Animator that lands every tween immediately and records what it played
/// as `"exit:<preset>"` / `"enter:<preset>"`.
#[derive(Debug, Default)]
pub struct InstantAnimator {
    viewport: Mutex<Viewport>,
    played: Mutex<Vec<String>>,
}

impl InstantAnimator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every animation requested so far, oldest first.
    #[must_use]
    pub fn played(&self) -> Vec<String> {
        self.played
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, phase: &str, preset: &str) {
        self.played
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(format!("{phase}:{preset}"));
    }

    fn viewport(&self) -> Viewport {
        *self.viewport.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl TransitionAnimator for InstantAnimator {
    async fn exit(&self, container: &ContainerHandle, preset: &str, duration: Duration) {
        self.record("exit", preset);
        if let Some(transition) = parse_preset(preset) {
            let spec = transition.exit_tween(container.transform(), self.viewport(), duration);
            container.set_transform(spec.to);
        }
    }

    async fn enter(&self, container: &ContainerHandle, preset: &str, duration: Duration) {
        self.record("enter", preset);
        if let Some(transition) = parse_preset(preset) {
            container.set_transform(transition.enter_tween(self.viewport(), duration).to);
        }
    }

    fn resize(&self, viewport: Viewport) {
        *self.viewport.lock().unwrap_or_else(PoisonError::into_inner) = viewport;
    }
}
