//! Simulated bodies.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Handle to a body owned by a [`PhysicsWorld`](super::world::PhysicsWorld).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BodyId(pub u32);

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BodyId({})", self.0)
    }
}

/// Collision and hit-test shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// Disc of the given radius.
    Circle {
        /// Radius in pixels.
        radius: f32,
    },
    /// Axis-aligned box (rotation is ignored for collision).
    Rectangle {
        /// Width in pixels.
        width: f32,
        /// Height in pixels.
        height: f32,
    },
}

impl Shape {
    /// Radius of the smallest circle enclosing the shape.
    #[must_use]
    pub fn bounding_radius(self) -> f32 {
        match self {
            Self::Circle { radius } => radius,
            Self::Rectangle { width, height } => 0.5 * width.hypot(height),
        }
    }
}

/// Collision group tag.
///
/// Group `0` means "no group". Two bodies in the same non-zero group always
/// collide when the group is positive and never collide when it is negative.
/// Bodies in different groups fall back to colliding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CollisionFilter {
    /// Group number.
    pub group: i32,
}

impl CollisionFilter {
    /// Returns `true` if bodies with these filters resolve collisions.
    #[must_use]
    pub fn can_collide(self, other: Self) -> bool {
        if self.group != 0 && self.group == other.group {
            return self.group > 0;
        }
        true
    }
}

/// Parameters for creating a body.
#[derive(Debug, Clone, Copy)]
pub struct BodyDesc {
    /// Initial position.
    pub position: Vec2,
    /// Mass; zero or negative makes the body static.
    pub mass: f32,
    /// Fraction of velocity lost per 60 Hz frame.
    pub air_friction: f32,
    /// Bounciness used in collision response.
    pub restitution: f32,
    /// Collision and hit-test shape.
    pub shape: Shape,
    /// Collision group.
    pub filter: CollisionFilter,
}

impl Default for BodyDesc {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            mass: 1.0,
            air_friction: 0.01,
            restitution: 0.0,
            shape: Shape::Circle { radius: 10.0 },
            filter: CollisionFilter::default(),
        }
    }
}

/// A point mass with orientation.
#[derive(Debug, Clone)]
pub struct Body {
    pub(crate) id: BodyId,
    /// Centre position in pixels.
    pub position: Vec2,
    /// Velocity in pixels per second.
    pub velocity: Vec2,
    /// Orientation in radians.
    pub angle: f32,
    /// Angular velocity in radians per second.
    pub angular_velocity: f32,
    /// Fraction of velocity lost per 60 Hz frame.
    pub air_friction: f32,
    /// Bounciness used in collision response.
    pub restitution: f32,
    /// Collision and hit-test shape.
    pub shape: Shape,
    /// Collision group.
    pub filter: CollisionFilter,
    pub(crate) inverse_mass: f32,
    pub(crate) force: Vec2,
    pub(crate) previous_position: Vec2,
    pub(crate) last_finite_position: Vec2,
}

impl Body {
    pub(crate) fn from_desc(id: BodyId, desc: &BodyDesc) -> Self {
        let inverse_mass = if desc.mass > 0.0 { desc.mass.recip() } else { 0.0 };
        Self {
            id,
            position: desc.position,
            velocity: Vec2::ZERO,
            angle: 0.0,
            angular_velocity: 0.0,
            air_friction: desc.air_friction.clamp(0.0, 1.0),
            restitution: desc.restitution.max(0.0),
            shape: desc.shape,
            filter: desc.filter,
            inverse_mass,
            force: Vec2::ZERO,
            previous_position: desc.position,
            last_finite_position: desc.position,
        }
    }

    /// Returns the body's handle.
    #[must_use]
    pub fn id(&self) -> BodyId {
        self.id
    }

    /// Returns `1 / mass`, or zero for static bodies.
    #[must_use]
    pub fn inverse_mass(&self) -> f32 {
        self.inverse_mass
    }

    /// Returns `true` if the body never moves.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.inverse_mass == 0.0
    }

    /// Returns the force accumulated for the next step.
    #[must_use]
    pub fn pending_force(&self) -> Vec2 {
        self.force
    }

    /// Returns `true` if `point` lies within `radius` of the centre.
    #[must_use]
    pub fn contains(&self, point: Vec2, radius: f32) -> bool {
        self.position.distance_squared(point) <= radius * radius
    }
}
