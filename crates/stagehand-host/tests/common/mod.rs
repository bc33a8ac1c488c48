//! Shared test helpers for host integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use stagehand_core::clock::Clock;
use stagehand_core::scene::{SceneFactory, Viewport};
use stagehand_core::sound::SoundService;
use stagehand_host::app::HostApplication;
use stagehand_host::config::{HostConfig, parse_tour};
use stagehand_host::rooms::RoomCatalog;
use stagehand_navigation::application::animator::InstantAnimator;
use stagehand_navigation::application::scene_manager::SceneManager;
use stagehand_test_support::{FixedClock, RecordingSoundService};

/// Fixed timestamp used across all integration tests.
fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(
        chrono::TimeZone::with_ymd_and_hms(&chrono::Utc, 2026, 1, 15, 10, 0, 0).unwrap(),
    ))
}

/// A host over the built-in rooms with its test doubles exposed.
pub struct TestHost {
    pub app: HostApplication,
    pub sound: Arc<RecordingSoundService>,
    pub animator: Arc<InstantAnimator>,
}

/// Builds a headless host over the built-in rooms that walks `tour`.
/// Transitions land instantly and frames run back to back.
pub fn build_test_host(tour: &str) -> TestHost {
    let config = HostConfig {
        tour: parse_tour(tour).unwrap(),
        realtime: false,
        ..HostConfig::default()
    };
    let sound = Arc::new(RecordingSoundService::default());
    let animator = Arc::new(InstantAnimator::new());
    let app = HostApplication::with_animator(
        config,
        Arc::new(RoomCatalog::builtin()),
        Arc::clone(&sound) as Arc<dyn SoundService>,
        Arc::clone(&animator) as _,
        fixed_clock(),
    )
    .unwrap();

    TestHost {
        app,
        sound,
        animator,
    }
}

/// Builds a scene manager over the built-in rooms, without the curtain.
pub fn build_room_manager() -> (SceneManager, Arc<RecordingSoundService>) {
    let sound = Arc::new(RecordingSoundService::default());
    let catalog: Arc<dyn SceneFactory> = Arc::new(RoomCatalog::builtin());
    let manager = SceneManager::new(
        catalog,
        Arc::new(InstantAnimator::new()),
        Arc::clone(&sound) as Arc<dyn SoundService>,
        fixed_clock(),
        Viewport::default(),
    );
    (manager, sound)
}

/// Builds a headless host with the tween-driven animator `main` uses.
/// Frames run back to back, so transitions take their full frame count.
pub fn build_tweened_host(tour: &str) -> (HostApplication, Arc<RecordingSoundService>) {
    let config = HostConfig {
        tour: parse_tour(tour).unwrap(),
        realtime: false,
        ..HostConfig::default()
    };
    let sound = Arc::new(RecordingSoundService::default());
    let app = HostApplication::new(
        config,
        Arc::new(RoomCatalog::builtin()),
        Arc::clone(&sound) as Arc<dyn SoundService>,
    )
    .unwrap();
    (app, sound)
}
