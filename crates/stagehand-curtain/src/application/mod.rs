//! The assembled curtain gate.

pub mod gate;
