//! Stagehand — physics.
//!
//! A small deterministic 2D world of point-mass bodies joined by distance
//! constraints, and the rope rig built on top of it for the curtain pull.

pub mod application;
pub mod domain;
