//! Query handlers for navigation.

use serde::Serialize;
use stagehand_core::scene::SceneId;

use crate::application::scene_manager::SceneManager;
use crate::domain::navigation::TransitionState;

/// Read-only view of the scene manager.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavigationView {
    /// The active scene, if any.
    pub current: Option<SceneId>,
    /// Previously visited scenes, oldest first.
    pub history: Vec<SceneId>,
    /// Whether `go_back` would navigate.
    pub can_go_back: bool,
    /// Current phase of the transition guard.
    pub transition_state: TransitionState,
}

/// Builds a [`NavigationView`] of `manager`.
#[must_use]
pub fn get_navigation(manager: &SceneManager) -> NavigationView {
    let history = manager.history();
    NavigationView {
        current: manager.current_id(),
        can_go_back: !history.is_empty(),
        history,
        transition_state: manager.transition_state(),
    }
}
