//! Rigs assembled from world primitives.

pub mod rope_rig;
