//! Error types shared across the Stagehand crates.

use thiserror::Error;

use crate::scene::SceneId;

/// Top-level error type for scene, physics and curtain operations.
#[derive(Debug, Clone, Error)]
pub enum StageError {
    /// No scene is registered under the requested id.
    #[error("unknown scene: {0}")]
    UnknownScene(SceneId),

    /// The scene factory failed to build the scene instance.
    #[error("failed to construct scene {scene}: {reason}")]
    SceneConstruction {
        /// The scene that was being built.
        scene: SceneId,
        /// Why construction failed.
        reason: String,
    },

    /// The scene was built but its `init` hook failed.
    #[error("scene {scene} failed to initialise: {reason}")]
    SceneInit {
        /// The scene whose initialisation failed.
        scene: SceneId,
        /// Why initialisation failed.
        reason: String,
    },

    /// Invalid configuration or a reference to something that does not exist.
    #[error("validation error: {0}")]
    Validation(String),

    /// A collaborator (audio backend, asset source, runtime) failed.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}
