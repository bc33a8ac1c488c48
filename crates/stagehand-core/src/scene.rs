//! Scene lifecycle contract.
//!
//! A scene is a navigable unit of content. The scene manager drives it
//! through `init → enter → (update/resize)* → exit → destroy`; every hook
//! except `destroy` has a no-op default so a scene implements only the
//! capabilities it needs.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::container::ContainerHandle;
use crate::error::StageError;
use crate::sound::SoundService;

/// Identifier of a scene, e.g. `"HOUSE"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneId(String);

impl SceneId {
    /// Creates a scene id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SceneId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for SceneId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Size of the drawable area, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

/// Services injected into every scene at construction time.
#[derive(Clone)]
pub struct SceneServices {
    /// Audio playback.
    pub sound: Arc<dyn SoundService>,
    /// Current viewport size.
    pub viewport: Viewport,
}

impl fmt::Debug for SceneServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneServices")
            .field("viewport", &self.viewport)
            .finish_non_exhaustive()
    }
}

/// Lifecycle hooks consumed by the scene manager.
#[async_trait]
pub trait Scene: Send {
    /// The scene's visual root.
    fn container(&self) -> &ContainerHandle;

    /// Asynchronous preparation before the scene is attached.
    ///
    /// # Errors
    ///
    /// Returns `StageError::SceneInit` (or any other variant) if the scene
    /// cannot be shown; the manager logs it and releases navigation.
    async fn init(&mut self) -> Result<(), StageError> {
        Ok(())
    }

    /// Called once the container is attached to the stage.
    fn enter(&mut self) {}

    /// Called after the exit animation, before `destroy`.
    fn exit(&mut self) {}

    /// Per-frame update; `delta_frames` is elapsed time in 60 Hz frames.
    fn update(&mut self, _delta_frames: f32) {}

    /// Called when the viewport changes size.
    fn resize(&mut self, _viewport: Viewport) {}

    /// Releases everything the scene owns.
    fn destroy(&mut self);
}

/// Builds scene instances by id.
pub trait SceneFactory: Send + Sync {
    /// Returns `true` if `id` can be built.
    fn contains(&self, id: &SceneId) -> bool;

    /// Builds a fresh instance of the scene.
    ///
    /// # Errors
    ///
    /// Returns `StageError::UnknownScene` for ids the factory does not know
    /// and `StageError::SceneConstruction` when building fails.
    fn create(&self, id: &SceneId, services: &SceneServices) -> Result<Box<dyn Scene>, StageError>;
}
