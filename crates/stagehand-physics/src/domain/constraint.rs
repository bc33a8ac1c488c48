//! Distance constraints.

use std::fmt;

use glam::Vec2;

use super::body::BodyId;

/// Handle to a constraint owned by a [`PhysicsWorld`](super::world::PhysicsWorld).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConstraintId(pub u32);

impl fmt::Display for ConstraintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConstraintId({})", self.0)
    }
}

/// One end of a constraint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Endpoint {
    /// The centre of a body.
    Body(BodyId),
    /// A point fixed in world space.
    Fixed(Vec2),
}

impl Endpoint {
    /// Returns the body id if this endpoint is attached to a body.
    #[must_use]
    pub fn body(self) -> Option<BodyId> {
        match self {
            Self::Body(id) => Some(id),
            Self::Fixed(_) => None,
        }
    }
}

/// Parameters for creating a constraint.
#[derive(Debug, Clone, Copy)]
pub struct ConstraintDesc {
    /// First endpoint.
    pub a: Endpoint,
    /// Second endpoint.
    pub b: Endpoint,
    /// Rest distance between the endpoints.
    pub length: f32,
    /// Fraction of the length error corrected per solver iteration, `(0, 1]`.
    pub stiffness: f32,
    /// Fraction of relative velocity along the constraint removed per step, `[0, 1)`.
    pub damping: f32,
}

/// A distance relation between two endpoints.
///
/// Constraints refer to bodies by id and never own them.
#[derive(Debug, Clone, Copy)]
pub struct Constraint {
    pub(crate) id: ConstraintId,
    /// First endpoint.
    pub a: Endpoint,
    /// Second endpoint.
    pub b: Endpoint,
    /// Rest distance between the endpoints.
    pub length: f32,
    /// Fraction of the length error corrected per solver iteration.
    pub stiffness: f32,
    /// Fraction of relative velocity along the constraint removed per step.
    pub damping: f32,
}

impl Constraint {
    pub(crate) fn from_desc(id: ConstraintId, desc: &ConstraintDesc) -> Self {
        Self {
            id,
            a: desc.a,
            b: desc.b,
            length: desc.length.max(0.0),
            stiffness: desc.stiffness.clamp(f32::EPSILON, 1.0),
            damping: desc.damping.clamp(0.0, 1.0),
        }
    }

    /// Returns the constraint's handle.
    #[must_use]
    pub fn id(&self) -> ConstraintId {
        self.id
    }

    /// Returns `true` if either endpoint is `body`.
    #[must_use]
    pub fn references(&self, body: BodyId) -> bool {
        self.a.body() == Some(body) || self.b.body() == Some(body)
    }
}
