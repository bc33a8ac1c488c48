//! Stagehand — navigation.
//!
//! The scene manager owns the active scene, the history of visited scene
//! ids and the transition guard that serialises navigation. Transition
//! presets describe enter/exit tweens declaratively; the tween animator
//! plays them on a driver advanced by the host's render loop.

pub mod application;
pub mod domain;
