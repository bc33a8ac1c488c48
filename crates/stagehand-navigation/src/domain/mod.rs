//! Navigation domain types.

pub mod commands;
pub mod events;
pub mod navigation;
pub mod preset;
pub mod stage;
pub mod tween;
