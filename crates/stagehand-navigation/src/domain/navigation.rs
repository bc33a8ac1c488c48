//! Navigation state, options and outcomes.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use stagehand_core::scene::SceneId;

use super::preset::Transition;

/// Phase of the scene manager's transition guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum TransitionState {
    /// No navigation in progress; `change` and `go_back` are accepted.
    #[default]
    Idle,
    /// The outgoing scene is animating out or being torn down.
    ExitingOld,
    /// The incoming scene is attached and animating in.
    EnteringNew,
}

impl fmt::Display for TransitionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::ExitingOld => write!(f, "exiting_old"),
            Self::EnteringNew => write!(f, "entering_new"),
        }
    }
}

/// How a navigation is performed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeOptions {
    /// Preset name, e.g. `"fade"`. Unknown names skip the animation.
    pub transition: String,
    /// Length of each of the exit and enter animations.
    pub duration: Duration,
    /// Push the outgoing scene id onto the history.
    pub add_to_history: bool,
}

impl Default for ChangeOptions {
    fn default() -> Self {
        Self {
            transition: Transition::Fade.as_str().to_owned(),
            duration: Duration::from_millis(500),
            add_to_history: true,
        }
    }
}

impl ChangeOptions {
    #[must_use]
    pub fn with_transition(mut self, transition: impl Into<String>) -> Self {
        self.transition = transition.into();
        self
    }

    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    #[must_use]
    pub fn without_history(mut self) -> Self {
        self.add_to_history = false;
        self
    }
}

/// Why a navigation request was dropped without effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum IgnoredReason {
    /// Another navigation holds the transition guard.
    Busy,
    /// The factory cannot build the requested id.
    UnknownScene(SceneId),
    /// The requested id is already the active scene.
    AlreadyActive(SceneId),
    /// `go_back` with an empty history.
    NoHistory,
}

impl fmt::Display for IgnoredReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => write!(f, "transition in progress"),
            Self::UnknownScene(id) => write!(f, "unknown scene {id}"),
            Self::AlreadyActive(id) => write!(f, "scene {id} is already active"),
            Self::NoHistory => write!(f, "history is empty"),
        }
    }
}

/// Result of a navigation request that did not fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum NavigationOutcome {
    /// The target scene is now active.
    Completed(SceneId),
    /// The request was dropped; nothing changed.
    Ignored(IgnoredReason),
}

impl NavigationOutcome {
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}
