//! Stagehand — curtain gate.
//!
//! Converts a downward pull on the simulated rope into a one-shot curtain
//! opening, and reports completion through a single callback.

pub mod application;
pub mod domain;
