//! A tween in flight.

use std::time::Duration;

use stagehand_core::container::ContainerHandle;

use super::preset::TweenSpec;

/// Plays a [`TweenSpec`] onto a container as time is fed to it.
#[derive(Debug)]
pub struct Tween {
    container: ContainerHandle,
    spec: TweenSpec,
    elapsed: Duration,
}

impl Tween {
    /// Starts a tween; the container jumps to the spec's start state.
    #[must_use]
    pub fn start(container: ContainerHandle, spec: TweenSpec) -> Self {
        container.set_transform(spec.from);
        Self {
            container,
            spec,
            elapsed: Duration::ZERO,
        }
    }

    /// Advances by `delta` and writes the sampled transform. Returns `true`
    /// once the end state has been written.
    pub fn advance(&mut self, delta: Duration) -> bool {
        self.elapsed += delta;
        let t = if self.spec.duration.is_zero() {
            1.0
        } else {
            (self.elapsed.as_secs_f32() / self.spec.duration.as_secs_f32()).min(1.0)
        };
        if t >= 1.0 {
            self.container.set_transform(self.spec.to);
            return true;
        }
        self.container.set_transform(self.spec.sample(t));
        false
    }

    /// Jumps straight to the end state.
    pub fn finish(&self) {
        self.container.set_transform(self.spec.to);
    }

    #[must_use]
    pub fn container(&self) -> &ContainerHandle {
        &self.container
    }
}
