//! Stagehand Core — shared abstractions.
//!
//! This crate defines the traits and value types that the physics, curtain,
//! navigation and host crates agree on. It contains no runtime loop and no
//! rendering code.

pub mod clock;
pub mod command;
pub mod container;
pub mod easing;
pub mod error;
pub mod event;
pub mod scene;
pub mod sound;
