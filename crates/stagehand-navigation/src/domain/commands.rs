//! Navigation commands.

use stagehand_core::command::Command;
use stagehand_core::scene::SceneId;
use uuid::Uuid;

use super::navigation::ChangeOptions;

/// Command to navigate to a scene.
#[derive(Debug, Clone)]
pub struct ChangeScene {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The scene to show.
    pub target: SceneId,
    /// How to get there.
    pub options: ChangeOptions,
}

impl ChangeScene {
    /// Creates the command with a fresh correlation id.
    #[must_use]
    pub fn new(target: impl Into<SceneId>, options: ChangeOptions) -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
            target: target.into(),
            options,
        }
    }
}

impl Command for ChangeScene {
    fn command_type(&self) -> &'static str {
        "navigation.change_scene"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to return to the previous scene.
#[derive(Debug, Clone)]
pub struct GoBack {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
}

impl Default for GoBack {
    fn default() -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
        }
    }
}

impl Command for GoBack {
    fn command_type(&self) -> &'static str {
        "navigation.go_back"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
