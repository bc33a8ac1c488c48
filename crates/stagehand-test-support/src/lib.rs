//! Shared test doubles for the Stagehand scene runtime.

mod clock;
mod scene;
mod sound;

pub use clock::FixedClock;
pub use scene::{LifecycleLog, RecordingScene, RecordingSceneFactory};
pub use sound::RecordingSoundService;
