//! The room catalogue and the scene it builds.
//!
//! Rooms are data: a title, a subtitle, a palette and optional sounds. The
//! catalogue is either the built-in set or a YAML file of the same shape:
//!
//! ```yaml
//! rooms:
//!   - id: LIVING
//!     title: Living Room
//!     subtitle: Our Milestone Timeline
//!     color: 0x8b7355
//!     gradient_top: 0x2a2015
//!     gradient_bottom: 0x1a150a
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stagehand_core::container::ContainerHandle;
use stagehand_core::error::StageError;
use stagehand_core::scene::{Scene, SceneFactory, SceneId, SceneServices, Viewport};
use stagehand_core::sound::SoundService;
use tracing::{debug, info};

use crate::error::AppError;

/// Id of the first room shown after the curtain opens.
pub const HOUSE: &str = "HOUSE";

const CLICK_SOURCE: &str = "sounds/click.mp3";
const DOOR_SOURCE: &str = "sounds/door.mp3";

/// Static description of one room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConfig {
    pub id: SceneId,
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    pub color: u32,
    pub gradient_top: u32,
    pub gradient_bottom: u32,
    /// Looping track started on enter and stopped on exit.
    #[serde(default)]
    pub ambient: Option<String>,
    /// Registered name of a sound played when leaving the room.
    #[serde(default)]
    pub exit_sound: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    rooms: Vec<RoomConfig>,
}

/// Every room the host can navigate to.
#[derive(Debug, Clone)]
pub struct RoomCatalog {
    rooms: BTreeMap<SceneId, RoomConfig>,
}

#[allow(clippy::too_many_arguments)]
fn room(
    id: &str,
    title: &str,
    subtitle: Option<&str>,
    color: u32,
    gradient_top: u32,
    gradient_bottom: u32,
    ambient: Option<&str>,
    exit_sound: Option<&str>,
) -> RoomConfig {
    RoomConfig {
        id: id.into(),
        title: title.to_owned(),
        subtitle: subtitle.map(str::to_owned),
        color,
        gradient_top,
        gradient_bottom,
        ambient: ambient.map(str::to_owned),
        exit_sound: exit_sound.map(str::to_owned),
    }
}

impl RoomCatalog {
    /// The rooms of the house, garden and balcony.
    #[must_use]
    #[rustfmt::skip]
    #[allow(clippy::unreadable_literal)]
    pub fn builtin() -> Self {
        Self::from_rooms(vec![
            room(HOUSE, "The House", None, 0x5c3a21, 0x0a0a1a, 0x1a1a3a, None, Some("doorOpen")),
            room("INTERIOR", "Hallway", None, 0x654321, 0x2a1810, 0x1a0a05, None, Some("doorOpen")),
            room("LIVING", "Living Room", Some("Our Milestone Timeline"), 0x8b7355, 0x2a2015, 0x1a150a, Some("sounds/living.mp3"), None),
            room("BEDROOM", "Bedroom", Some("Love Letters"), 0xdda0dd, 0x2a1a2a, 0x1a0a1a, Some("sounds/bedroom.mp3"), None),
            room("KITCHEN", "Kitchen", Some("Sweet Moments"), 0xfaf0e6, 0x3a2a1a, 0x2a1a0a, Some("sounds/kitchen.mp3"), None),
            room("GAMING", "Gaming Room", Some("How Well Do You Know Us?"), 0x1a3a5a, 0x0a0a1a, 0x1a1a3a, Some("sounds/gaming.mp3"), None),
            room("DANCE", "Dance Room", Some("Our Soundtrack"), 0xff69b4, 0x1a0a1a, 0x3a1a3a, Some("sounds/dance.mp3"), None),
            room("STUDY", "Study Room", Some("Our Story in Code"), 0x2d5a3d, 0x0a1a0f, 0x1a2a1f, Some("sounds/study.mp3"), None),
            room("GARDEN", "Garden", Some("Our Future Dreams"), 0x228b22, 0x1a3a2a, 0x0a2a1a, Some("sounds/garden.mp3"), None),
            room("GARDEN_SITTING", "Sitting Area", Some("A Quiet Place"), 0x228b22, 0x1a3a2a, 0x0a2a1a, Some("sounds/garden.mp3"), None),
            room("GARDEN_PATH", "Garden Path", None, 0x228b22, 0x1a3a2a, 0x0a2a1a, Some("sounds/garden.mp3"), None),
            room("BALCONY", "Balcony", None, 0x1a1a3a, 0x0a0a1a, 0x1a1a3a, Some("sounds/night.mp3"), None),
        ])
    }

    /// Builds a catalogue from explicit rooms; later duplicates win.
    #[must_use]
    pub fn from_rooms(rooms: Vec<RoomConfig>) -> Self {
        Self {
            rooms: rooms.into_iter().map(|room| (room.id.clone(), room)).collect(),
        }
    }

    /// Parses a YAML catalogue.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Yaml` if the document is malformed and
    /// `AppError::Config` if it lists no rooms or lacks the [`HOUSE`] room
    /// shown after the curtain.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, AppError> {
        let file: CatalogFile = serde_yaml::from_str(yaml)?;
        if file.rooms.is_empty() {
            return Err(AppError::Config("room catalogue lists no rooms".into()));
        }
        let catalog = Self::from_rooms(file.rooms);
        if !catalog.contains(&HOUSE.into()) {
            return Err(AppError::Config(format!(
                "room catalogue must include the {HOUSE} room"
            )));
        }
        Ok(catalog)
    }

    /// Loads a YAML catalogue from `path`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the file cannot be read, otherwise as
    /// [`from_yaml_str`](Self::from_yaml_str).
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let yaml = std::fs::read_to_string(path)?;
        let catalog = Self::from_yaml_str(&yaml)?;
        info!(path = %path.display(), rooms = catalog.len(), "loaded room catalogue");
        Ok(catalog)
    }

    #[must_use]
    pub fn get(&self, id: &SceneId) -> Option<&RoomConfig> {
        self.rooms.get(id)
    }

    /// Room ids in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &SceneId> {
        self.rooms.keys()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

impl SceneFactory for RoomCatalog {
    fn contains(&self, id: &SceneId) -> bool {
        self.rooms.contains_key(id)
    }

    fn create(&self, id: &SceneId, services: &SceneServices) -> Result<Box<dyn Scene>, StageError> {
        let config = self
            .rooms
            .get(id)
            .ok_or_else(|| StageError::UnknownScene(id.clone()))?;
        Ok(Box::new(RoomScene::new(config.clone(), services)))
    }
}

/// A room shown by the scene manager.
pub struct RoomScene {
    config: RoomConfig,
    container: ContainerHandle,
    sound: Arc<dyn SoundService>,
    viewport: Viewport,
    frames: f32,
}

impl std::fmt::Debug for RoomScene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomScene")
            .field("id", &self.config.id)
            .field("viewport", &self.viewport)
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}

impl RoomScene {
    #[must_use]
    pub fn new(config: RoomConfig, services: &SceneServices) -> Self {
        Self {
            config,
            container: ContainerHandle::new(),
            sound: Arc::clone(&services.sound),
            viewport: services.viewport,
            frames: 0.0,
        }
    }

    #[must_use]
    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Frames elapsed while the room was active.
    #[must_use]
    pub fn frames(&self) -> f32 {
        self.frames
    }
}

#[async_trait]
impl Scene for RoomScene {
    fn container(&self) -> &ContainerHandle {
        &self.container
    }

    async fn init(&mut self) -> Result<(), StageError> {
        self.sound.register("click", CLICK_SOURCE);
        if let Some(name) = &self.config.exit_sound {
            self.sound.register(name, DOOR_SOURCE);
        }
        Ok(())
    }

    fn enter(&mut self) {
        if let Some(ambient) = &self.config.ambient {
            self.sound.set_ambient(Some(ambient));
        }
        info!(
            room = %self.config.id,
            title = %self.config.title,
            subtitle = self.config.subtitle.as_deref().unwrap_or(""),
            "entered room"
        );
    }

    fn exit(&mut self) {
        if let Some(name) = &self.config.exit_sound {
            self.sound.play(name);
        }
        if self.config.ambient.is_some() {
            self.sound.set_ambient(None);
        }
    }

    fn update(&mut self, delta_frames: f32) {
        self.frames += delta_frames;
    }

    fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn destroy(&mut self) {
        debug!(room = %self.config.id, frames = self.frames, "room destroyed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagehand_test_support::RecordingSoundService;

    fn services(sound: Arc<RecordingSoundService>) -> SceneServices {
        SceneServices {
            sound,
            viewport: Viewport::default(),
        }
    }

    #[test]
    fn test_builtin_catalogue_has_every_room() {
        let catalog = RoomCatalog::builtin();

        for id in [
            "HOUSE",
            "INTERIOR",
            "LIVING",
            "BEDROOM",
            "KITCHEN",
            "GAMING",
            "DANCE",
            "STUDY",
            "GARDEN",
            "GARDEN_SITTING",
            "GARDEN_PATH",
            "BALCONY",
        ] {
            assert!(catalog.contains(&id.into()), "{id} missing");
        }
        assert_eq!(catalog.len(), 12);
        let living = catalog.get(&"LIVING".into()).unwrap();
        assert_eq!(living.title, "Living Room");
        assert_eq!(living.subtitle.as_deref(), Some("Our Milestone Timeline"));
    }

    #[test]
    fn test_yaml_catalogue_parses_hex_colours() {
        // Arrange
        let yaml = "rooms:\n  - id: HOUSE\n    title: The House\n    color: 0x5c3a21\n    gradient_top: 0x0a0a1a\n    gradient_bottom: 0x1a1a3a\n  - id: ATTIC\n    title: Attic\n    color: 0x8b7355\n    gradient_top: 0x2a2015\n    gradient_bottom: 0x1a150a\n";

        // Act
        let catalog = RoomCatalog::from_yaml_str(yaml).unwrap();

        // Assert
        let attic = catalog.get(&"ATTIC".into()).unwrap();
        assert_eq!(attic.color, 0x8b7355);
        assert_eq!(attic.subtitle, None);
        assert_eq!(catalog.len(), 2);
        assert!(!catalog.contains(&"LIVING".into()));
    }

    #[test]
    fn test_yaml_catalogue_without_house_is_rejected() {
        let yaml = "rooms:\n  - id: ATTIC\n    title: Attic\n    color: 0x8b7355\n    gradient_top: 0x2a2015\n    gradient_bottom: 0x1a150a\n";

        let result = RoomCatalog::from_yaml_str(yaml);

        assert!(matches!(result, Err(AppError::Config(message)) if message.contains("HOUSE")));
    }

    #[test]
    fn test_empty_yaml_catalogue_is_rejected() {
        let result = RoomCatalog::from_yaml_str("rooms: []\n");

        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_create_unknown_room_fails() {
        let catalog = RoomCatalog::builtin();
        let sound = Arc::new(RecordingSoundService::default());

        let result = catalog.create(&"ATTIC".into(), &services(sound));

        assert!(matches!(result, Err(StageError::UnknownScene(_))));
    }

    #[tokio::test]
    async fn test_room_lifecycle_drives_sounds() {
        // Arrange
        let catalog = RoomCatalog::builtin();
        let sound = Arc::new(RecordingSoundService::default());
        let mut scene = catalog
            .create(&"GARDEN".into(), &services(sound.clone()))
            .unwrap();

        // Act
        scene.init().await.unwrap();
        scene.enter();
        let during = sound.ambient();
        scene.update(2.0);
        scene.exit();
        scene.destroy();

        // Assert
        assert_eq!(during.as_deref(), Some("sounds/garden.mp3"));
        assert_eq!(sound.ambient(), None);
        assert!(sound.registered().iter().any(|(name, _)| name == "click"));
    }

    #[tokio::test]
    async fn test_leaving_house_plays_door_sound() {
        let catalog = RoomCatalog::builtin();
        let sound = Arc::new(RecordingSoundService::default());
        let mut scene = catalog
            .create(&HOUSE.into(), &services(sound.clone()))
            .unwrap();

        scene.init().await.unwrap();
        scene.enter();
        scene.exit();

        assert_eq!(sound.played(), vec!["doorOpen".to_owned()]);
    }
}
