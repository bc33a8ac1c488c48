//! Events emitted by the scene manager.

use serde::{Deserialize, Serialize};
use stagehand_core::event::{DomainEvent, EventMetadata};
use stagehand_core::scene::SceneId;

/// Emitted when a navigation completes and the manager is idle again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneChanged {
    /// The scene now active.
    pub scene_id: SceneId,
    /// The scene it replaced, if any.
    pub previous: Option<SceneId>,
    /// Preset name used for the transition.
    pub transition: String,
}

/// Emitted when building or initialising the target scene failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationFailed {
    /// The scene that could not be shown.
    pub scene_id: SceneId,
    /// Human-readable cause.
    pub reason: String,
}

/// Event payload variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SceneEventKind {
    SceneChanged(SceneChanged),
    NavigationFailed(NavigationFailed),
}

/// Event envelope.
#[derive(Debug, Clone)]
pub struct SceneEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: SceneEventKind,
}

impl SceneEventKind {
    /// Routing name of the payload variant.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::SceneChanged(_) => "navigation.scene_changed",
            Self::NavigationFailed(_) => "navigation.navigation_failed",
        }
    }
}

impl DomainEvent for SceneEvent {
    fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    fn to_payload(&self) -> serde_json::Value {
        serde_json::to_value(&self.kind).unwrap_or_default()
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
