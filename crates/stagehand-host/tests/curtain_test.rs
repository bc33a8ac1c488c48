//! Integration tests for the curtain gate in front of the rooms.

mod common;

use std::time::Duration;

use glam::Vec2;
use stagehand_core::scene::SceneId;
use stagehand_curtain::domain::curtain::CurtainState;
use stagehand_host::app::HostPhase;

const FRAME: Duration = Duration::from_micros(16_667);

#[tokio::test]
async fn test_pull_opens_curtain_and_enters_house() {
    // Arrange
    let mut host = common::build_test_host("");

    // Act
    let summary = host.app.run().await;

    // Assert
    assert_eq!(summary.visited, vec![SceneId::from("HOUSE")]);
    assert!(!summary.interrupted);
    assert!(host.sound.played().contains(&"curtainOpen".to_owned()));
    assert!(host.animator.played().contains(&"enter:fade".to_owned()));
    assert_eq!(host.app.phase(), HostPhase::Stopped);
}

#[tokio::test]
async fn test_short_pull_leaves_curtain_closed() {
    // Arrange
    let mut host = common::build_test_host("");
    let weight = host.app.gate().weight_position().unwrap();

    // Act
    assert!(host.app.pointer_down(weight));
    host.app.pointer_move(weight + Vec2::new(0.0, 40.0));
    host.app.pointer_up();
    for _ in 0..240 {
        host.app.tick(FRAME);
    }

    // Assert
    assert_eq!(host.app.gate().curtain().state(), CurtainState::Closed);
    assert_eq!(host.app.phase(), HostPhase::Curtain);
    assert!(host.app.manager().current_id().is_none());
}

#[tokio::test]
async fn test_pulling_past_threshold_in_one_move_opens_once() {
    // Arrange
    let mut host = common::build_test_host("");
    let weight = host.app.gate().weight_position().unwrap();
    host.app.pointer_down(weight);

    // Act
    host.app.pointer_move(weight + Vec2::new(0.0, 150.0));
    host.app.pointer_move(weight + Vec2::new(0.0, 300.0));
    host.app.pointer_up();

    // Assert
    assert_eq!(host.app.gate().curtain().state(), CurtainState::Opening);
    assert_eq!(host.app.gate().curtain().opening_runs(), 1);
    let opens = host
        .sound
        .played()
        .iter()
        .filter(|name| name.as_str() == "curtainOpen")
        .count();
    assert_eq!(opens, 1);
}

#[tokio::test]
async fn test_default_tour_visits_rooms_in_order() {
    let mut host = common::build_test_host("INTERIOR,LIVING:slideLeft,back,back");

    let summary = host.app.run().await;

    let expected: Vec<SceneId> = ["HOUSE", "INTERIOR", "LIVING", "INTERIOR", "HOUSE"]
        .into_iter()
        .map(SceneId::from)
        .collect();
    assert_eq!(summary.visited, expected);
    assert!(host.animator.played().contains(&"enter:slideLeft".to_owned()));
    assert_eq!(host.sound.ambient(), None);
}

#[tokio::test]
async fn test_unknown_room_in_tour_is_skipped() {
    let mut host = common::build_test_host("ATTIC,KITCHEN");

    let summary = host.app.run().await;

    let expected: Vec<SceneId> = ["HOUSE", "KITCHEN"].into_iter().map(SceneId::from).collect();
    assert_eq!(summary.visited, expected);
}

#[tokio::test]
async fn test_tweened_host_runs_curtain_and_tour() {
    // Arrange
    let (mut app, sound) = common::build_tweened_host("INTERIOR,back");

    // Act
    let summary = app.run().await;

    // Assert
    let expected: Vec<SceneId> = ["HOUSE", "INTERIOR", "HOUSE"]
        .into_iter()
        .map(SceneId::from)
        .collect();
    assert_eq!(summary.visited, expected);
    assert!(!summary.interrupted);
    assert!(summary.frames > 100, "ran {} frames", summary.frames);
    assert!(sound.played().contains(&"curtainOpen".to_owned()));
    assert_eq!(app.phase(), HostPhase::Stopped);
}
