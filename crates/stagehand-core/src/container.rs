//! Visual root handles.
//!
//! A scene's container is the only visual state the core touches: the
//! transition presets animate its opacity, offset and scale. Rendering
//! backends read the same handle to draw the scene.

use std::sync::{Arc, Mutex, PoisonError};

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Opacity, offset and uniform scale of a container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Opacity in `[0, 1]`.
    pub alpha: f32,
    /// Offset from the stage origin, in pixels.
    pub position: Vec2,
    /// Uniform scale factor.
    pub scale: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            position: Vec2::ZERO,
            scale: 1.0,
        }
    }
}

impl Transform {
    /// Linear interpolation between two transforms.
    #[must_use]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        Self {
            alpha: self.alpha + (other.alpha - self.alpha) * t,
            position: self.position.lerp(other.position, t),
            scale: self.scale + (other.scale - self.scale) * t,
        }
    }
}

/// Shared handle to a container's transform.
///
/// Cloning the handle shares the same underlying container; use
/// [`ContainerHandle::same_as`] for identity comparisons.
#[derive(Debug, Clone, Default)]
pub struct ContainerHandle {
    inner: Arc<Mutex<Transform>>,
}

impl ContainerHandle {
    /// Creates a container at the default transform.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the current transform.
    #[must_use]
    pub fn transform(&self) -> Transform {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the transform.
    pub fn set_transform(&self, transform: Transform) {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = transform;
    }

    /// Mutates the transform in place.
    pub fn update(&self, f: impl FnOnce(&mut Transform)) {
        f(&mut self.inner.lock().unwrap_or_else(PoisonError::into_inner));
    }

    /// Returns `true` if both handles refer to the same container.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
