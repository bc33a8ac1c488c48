//! The pull-rope rig: an anchored chain of segments ending in a weight.
//!
//! Layout (top to bottom): fixed anchor point → `segments[0]` → … →
//! `segments[last]` → weighted end body. `links[0]` is the anchor link and
//! `links[i]` for `i ≥ 1` joins `segments[i - 1]` to `segments[i]`, so there
//! are exactly as many links as segments. The tail constraint joining the
//! last segment to the weight is kept apart because it is deliberately
//! looser than the links.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use stagehand_core::error::StageError;
use tracing::info;

use crate::domain::body::{BodyDesc, BodyId, CollisionFilter, Shape};
use crate::domain::constraint::{ConstraintDesc, ConstraintId, Endpoint};
use crate::domain::world::PhysicsWorld;

/// Rope geometry and material.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RopeConfig {
    /// World-fixed point the rope hangs from.
    pub anchor: Vec2,
    /// Number of segments, at least 2.
    pub segment_count: usize,
    /// Centre-to-centre distance between segments, positive.
    pub segment_length: f32,
    /// Link stiffness in `(0, 1]`.
    pub stiffness: f32,
    /// Link damping in `[0, 1)`.
    pub damping: f32,
    /// Segment thickness, used for the collision shape and drawing.
    pub segment_width: f32,
    /// Mass of one segment.
    pub segment_mass: f32,
    /// Air friction of segments and weight.
    pub air_friction: f32,
    /// Radius of the weighted end.
    pub weight_radius: f32,
    /// Mass of the weighted end.
    pub weight_mass: f32,
    /// Stiffness of the tail constraint; must not exceed `stiffness`.
    pub tail_stiffness: f32,
}

impl Default for RopeConfig {
    fn default() -> Self {
        Self {
            anchor: Vec2::new(640.0, 80.0),
            segment_count: 12,
            segment_length: 25.0,
            stiffness: 0.9,
            damping: 0.1,
            segment_width: 12.0,
            segment_mass: 1.0,
            air_friction: 0.05,
            weight_radius: 20.0,
            weight_mass: 2.5,
            tail_stiffness: 0.6,
        }
    }
}

impl RopeConfig {
    /// Checks the configuration.
    ///
    /// # Errors
    ///
    /// Returns `StageError::Validation` describing the first invalid field.
    pub fn validate(&self) -> Result<(), StageError> {
        let fail = |message: String| Err(StageError::Validation(message));
        if self.segment_count < 2 {
            return fail(format!(
                "rope needs at least 2 segments, got {}",
                self.segment_count
            ));
        }
        if !(self.segment_length > 0.0 && self.segment_length.is_finite()) {
            return fail(format!(
                "segment length must be positive, got {}",
                self.segment_length
            ));
        }
        if !(self.stiffness > 0.0 && self.stiffness <= 1.0) {
            return fail(format!("stiffness must be in (0, 1], got {}", self.stiffness));
        }
        if !(0.0..1.0).contains(&self.damping) {
            return fail(format!("damping must be in [0, 1), got {}", self.damping));
        }
        if !(self.tail_stiffness > 0.0 && self.tail_stiffness <= self.stiffness) {
            return fail(format!(
                "tail stiffness must be in (0, {}], got {}",
                self.stiffness, self.tail_stiffness
            ));
        }
        let positive = |value: f32| value > 0.0 && value.is_finite();
        if !(positive(self.segment_mass) && positive(self.weight_mass)) {
            return fail(format!(
                "segment and weight masses must be positive, got {} and {}",
                self.segment_mass, self.weight_mass
            ));
        }
        if !(positive(self.weight_radius) && positive(self.segment_width)) {
            return fail(format!(
                "weight radius and segment width must be positive, got {} and {}",
                self.weight_radius, self.segment_width
            ));
        }
        if !(0.0..1.0).contains(&self.air_friction) {
            return fail(format!(
                "air friction must be in [0, 1), got {}",
                self.air_friction
            ));
        }
        if !self.anchor.is_finite() {
            return fail(format!("anchor must be finite, got {}", self.anchor));
        }
        Ok(())
    }
}

/// Handles to the bodies and constraints of one rope inside a world.
#[derive(Debug, Clone)]
pub struct RopeRig {
    config: RopeConfig,
    group: i32,
    segments: Vec<BodyId>,
    links: Vec<ConstraintId>,
    end: BodyId,
    tail: ConstraintId,
}

impl RopeRig {
    /// Builds the rope hanging straight down from the anchor and registers
    /// it with `world`.
    ///
    /// # Errors
    ///
    /// Returns `StageError::Validation` if `config` is invalid.
    #[allow(clippy::cast_precision_loss)]
    pub fn build(world: &mut PhysicsWorld, config: RopeConfig) -> Result<Self, StageError> {
        config.validate()?;

        let group = world.next_group(true);
        let filter = CollisionFilter { group };
        let half = config.segment_length / 2.0;

        let segments: Vec<BodyId> = (0..config.segment_count)
            .map(|i| {
                world.add_body(&BodyDesc {
                    position: config.anchor
                        + Vec2::new(0.0, half + i as f32 * config.segment_length),
                    mass: config.segment_mass,
                    air_friction: config.air_friction,
                    restitution: 0.1,
                    shape: Shape::Rectangle {
                        width: config.segment_width,
                        height: config.segment_length,
                    },
                    filter,
                })
            })
            .collect();

        let mut links = Vec::with_capacity(segments.len());
        links.push(world.add_constraint(&ConstraintDesc {
            a: Endpoint::Fixed(config.anchor),
            b: Endpoint::Body(segments[0]),
            length: half,
            stiffness: 1.0,
            damping: 0.0,
        })?);
        for pair in segments.windows(2) {
            links.push(world.add_constraint(&ConstraintDesc {
                a: Endpoint::Body(pair[0]),
                b: Endpoint::Body(pair[1]),
                length: config.segment_length,
                stiffness: config.stiffness,
                damping: config.damping,
            })?);
        }

        let last = segments[segments.len() - 1];
        let tail_length = half + config.weight_radius;
        let last_position = world
            .body(last)
            .map_or(config.anchor, |body| body.position);
        let end = world.add_body(&BodyDesc {
            position: last_position + Vec2::new(0.0, tail_length),
            mass: config.weight_mass,
            air_friction: config.air_friction,
            restitution: 0.0,
            shape: Shape::Circle {
                radius: config.weight_radius,
            },
            filter,
        });
        let tail = world.add_constraint(&ConstraintDesc {
            a: Endpoint::Body(last),
            b: Endpoint::Body(end),
            length: tail_length,
            stiffness: config.tail_stiffness,
            damping: config.damping,
        })?;

        info!(
            segments = segments.len(),
            group,
            anchor_x = config.anchor.x,
            anchor_y = config.anchor.y,
            "built rope rig"
        );

        Ok(Self {
            config,
            group,
            segments,
            links,
            end,
            tail,
        })
    }

    /// The configuration the rig was built from.
    #[must_use]
    pub fn config(&self) -> &RopeConfig {
        &self.config
    }

    /// The non-colliding group shared by every rig body.
    #[must_use]
    pub fn group(&self) -> i32 {
        self.group
    }

    /// Segment handles, anchor end first.
    #[must_use]
    pub fn segments(&self) -> &[BodyId] {
        &self.segments
    }

    /// Anchor link followed by the inter-segment links.
    #[must_use]
    pub fn links(&self) -> &[ConstraintId] {
        &self.links
    }

    /// The weighted end body.
    #[must_use]
    pub fn end_body(&self) -> BodyId {
        self.end
    }

    /// The constraint joining the last segment to the weight.
    #[must_use]
    pub fn tail(&self) -> ConstraintId {
        self.tail
    }

    /// Snapshot of segment centres, anchor end first.
    #[must_use]
    pub fn positions(&self, world: &PhysicsWorld) -> Vec<Vec2> {
        self.segments
            .iter()
            .filter_map(|id| world.body(*id).map(|body| body.position))
            .collect()
    }

    /// Position of the weighted end, if still in the world.
    #[must_use]
    pub fn end_position(&self, world: &PhysicsWorld) -> Option<Vec2> {
        world.body(self.end).map(|body| body.position)
    }

    /// Centre-to-centre distance of each adjacent segment pair.
    #[must_use]
    pub fn segment_distances(&self, world: &PhysicsWorld) -> Vec<f32> {
        self.positions(world)
            .windows(2)
            .map(|pair| pair[0].distance(pair[1]))
            .collect()
    }

    /// Removes every rig body; their constraints go with them.
    pub fn teardown(self, world: &mut PhysicsWorld) {
        for id in self.segments.iter().chain(std::iter::once(&self.end)) {
            world.remove_body(*id);
        }
        info!(group = self.group, "tore down rope rig");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const FRAME: Duration = Duration::from_micros(16_667);

    #[test]
    fn test_build_creates_one_link_per_segment_and_a_tail() {
        // Arrange
        let mut world = PhysicsWorld::default();

        // Act
        let rig = RopeRig::build(&mut world, RopeConfig::default()).unwrap();

        // Assert
        assert_eq!(rig.segments().len(), 12);
        assert_eq!(rig.links().len(), rig.segments().len());
        assert_eq!(world.body_count(), 13);
        assert_eq!(world.constraint_count(), 13);
        assert!(world.constraint(rig.tail()).unwrap().references(rig.end_body()));
        assert!(rig.group() < 0);
    }

    #[test]
    fn test_chain_is_connected_in_order() {
        let mut world = PhysicsWorld::default();
        let rig = RopeRig::build(&mut world, RopeConfig::default()).unwrap();

        let anchor = world.constraint(rig.links()[0]).unwrap();
        assert!(matches!(anchor.a, Endpoint::Fixed(_)));
        assert_eq!(anchor.b, Endpoint::Body(rig.segments()[0]));
        for (i, link) in rig.links().iter().enumerate().skip(1) {
            let link = world.constraint(*link).unwrap();
            assert_eq!(link.a, Endpoint::Body(rig.segments()[i - 1]));
            assert_eq!(link.b, Endpoint::Body(rig.segments()[i]));
        }
    }

    #[test]
    fn test_tail_is_looser_than_links() {
        let mut world = PhysicsWorld::default();
        let rig = RopeRig::build(&mut world, RopeConfig::default()).unwrap();

        let tail = world.constraint(rig.tail()).unwrap();
        let link = world.constraint(rig.links()[1]).unwrap();
        assert!(tail.stiffness < link.stiffness);
    }

    #[test]
    fn test_chain_holds_segment_length_under_gravity() {
        // Arrange
        let mut world = PhysicsWorld::default();
        let config = RopeConfig {
            segment_count: 14,
            ..RopeConfig::default()
        };
        let rig = RopeRig::build(&mut world, config).unwrap();

        // Act
        for _ in 0..1000 {
            world.step(FRAME);
        }

        // Assert
        let tolerance = config.segment_length * 0.05;
        let distances = rig.segment_distances(&world);
        assert_eq!(distances.len(), 13);
        for distance in distances {
            assert!(
                (distance - config.segment_length).abs() < tolerance,
                "segment distance {distance}"
            );
        }
    }

    #[test]
    fn test_rejects_invalid_configs() {
        let invalid = [
            RopeConfig {
                segment_count: 1,
                ..RopeConfig::default()
            },
            RopeConfig {
                segment_length: 0.0,
                ..RopeConfig::default()
            },
            RopeConfig {
                stiffness: 0.0,
                ..RopeConfig::default()
            },
            RopeConfig {
                damping: 1.0,
                ..RopeConfig::default()
            },
            RopeConfig {
                tail_stiffness: 0.95,
                ..RopeConfig::default()
            },
            RopeConfig {
                segment_mass: f32::NAN,
                ..RopeConfig::default()
            },
            RopeConfig {
                weight_radius: f32::INFINITY,
                ..RopeConfig::default()
            },
            RopeConfig {
                air_friction: f32::NAN,
                ..RopeConfig::default()
            },
            RopeConfig {
                anchor: Vec2::new(f32::NAN, 80.0),
                ..RopeConfig::default()
            },
        ];

        for config in invalid {
            let mut world = PhysicsWorld::default();
            let result = RopeRig::build(&mut world, config);
            assert!(
                matches!(result, Err(StageError::Validation(_))),
                "{config:?} should be rejected"
            );
            assert_eq!(world.body_count(), 0);
        }
    }

    #[test]
    fn test_teardown_removes_bodies_and_constraints() {
        let mut world = PhysicsWorld::default();
        let rig = RopeRig::build(&mut world, RopeConfig::default()).unwrap();

        rig.teardown(&mut world);

        assert_eq!(world.body_count(), 0);
        assert_eq!(world.constraint_count(), 0);
    }
}
