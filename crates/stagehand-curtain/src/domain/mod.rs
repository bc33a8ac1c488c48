//! Gesture tracking and the curtain state machine.

pub mod curtain;
pub mod gesture;
