//! Stagehand host — wires the curtain gate, the room catalogue and the
//! scene manager into one frame loop.

pub mod app;
pub mod config;
pub mod error;
pub mod rooms;
pub mod sound;
