//! Bodies, constraints and the world that steps them.

pub mod body;
pub mod constraint;
pub mod world;
