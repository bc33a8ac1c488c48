//! Command handlers for navigation.
//!
//! Thin entry points that carry a command's correlation id through to the
//! events the scene manager emits.

use stagehand_core::command::Command;
use stagehand_core::error::StageError;
use tracing::{info, instrument};

use crate::application::scene_manager::SceneManager;
use crate::domain::commands::{ChangeScene, GoBack};
use crate::domain::navigation::NavigationOutcome;

/// Handles the `ChangeScene` command.
///
/// # Errors
///
/// Returns `StageError` if the target scene cannot be built or initialised.
#[instrument(skip(command, manager), fields(correlation_id = %command.correlation_id, target = %command.target))]
pub async fn handle_change_scene(
    command: &ChangeScene,
    manager: &SceneManager,
) -> Result<NavigationOutcome, StageError> {
    info!(command = command.command_type(), "handling change_scene command");
    manager
        .change_correlated(
            command.target.clone(),
            command.options.clone(),
            command.correlation_id,
        )
        .await
}

/// Handles the `GoBack` command.
///
/// # Errors
///
/// Returns `StageError` if the previous scene cannot be rebuilt.
#[instrument(skip(command, manager), fields(correlation_id = %command.correlation_id))]
pub async fn handle_go_back(
    command: &GoBack,
    manager: &SceneManager,
) -> Result<NavigationOutcome, StageError> {
    info!(command = command.command_type(), "handling go_back command");
    manager.go_back_correlated(command.correlation_id).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use stagehand_core::scene::{SceneId, Viewport};
    use stagehand_test_support::{FixedClock, RecordingSceneFactory, RecordingSoundService};
    use uuid::Uuid;

    use super::*;
    use crate::application::animator::InstantAnimator;
    use crate::domain::navigation::ChangeOptions;

    fn manager() -> SceneManager {
        SceneManager::new(
            Arc::new(RecordingSceneFactory::new(&["HOUSE", "INTERIOR"])),
            Arc::new(InstantAnimator::new()),
            Arc::new(RecordingSoundService::default()),
            Arc::new(FixedClock::default()),
            Viewport::default(),
        )
    }

    #[tokio::test]
    async fn test_change_scene_events_carry_command_correlation_id() {
        // Arrange
        let manager = manager();
        let mut events = manager.subscribe();
        let command = ChangeScene {
            correlation_id: Uuid::new_v4(),
            target: SceneId::from("HOUSE"),
            options: ChangeOptions::default(),
        };

        // Act
        let outcome = handle_change_scene(&command, &manager).await.unwrap();

        // Assert
        assert_eq!(outcome, NavigationOutcome::Completed("HOUSE".into()));
        let event = events.recv().await.unwrap();
        assert_eq!(event.metadata.correlation_id, command.correlation_id);
        assert_eq!(event.metadata.event_type, "navigation.scene_changed");
        assert_eq!(event.metadata.occurred_at, FixedClock::default().0);
    }

    #[tokio::test]
    async fn test_go_back_returns_to_previous_scene() {
        // Arrange
        let manager = manager();
        handle_change_scene(&ChangeScene::new("HOUSE", ChangeOptions::default()), &manager)
            .await
            .unwrap();
        handle_change_scene(
            &ChangeScene::new("INTERIOR", ChangeOptions::default()),
            &manager,
        )
        .await
        .unwrap();

        // Act
        let outcome = handle_go_back(&GoBack::default(), &manager).await.unwrap();

        // Assert
        assert_eq!(outcome, NavigationOutcome::Completed("HOUSE".into()));
        assert!(!manager.can_go_back());
    }
}
