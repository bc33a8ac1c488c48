//! The simulation world.
//!
//! Each step is split into fixed substeps. A substep applies gravity and
//! accumulated forces, integrates velocity then position (semi-implicit
//! Euler), relaxes every constraint for a fixed number of iterations,
//! re-derives velocity from the corrected positions, damps constraint
//! motion and finally resolves collisions. Bodies and constraints are kept
//! in id order, so identical inputs always give identical results.

use std::collections::BTreeMap;
use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use stagehand_core::error::StageError;
use tracing::{debug, warn};

use super::body::{Body, BodyDesc, BodyId};
use super::constraint::{Constraint, ConstraintDesc, ConstraintId, Endpoint};

/// Separations below this are treated as coincident.
const MIN_SEPARATION: f32 = 1e-6;

/// Air friction coefficients are expressed per frame at this period.
const REFERENCE_FRAME_SECS: f32 = 1.0 / 60.0;

/// Tuning for a [`PhysicsWorld`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Gravitational acceleration in pixels per second squared.
    pub gravity: Vec2,
    /// Longest substep, in seconds.
    pub fixed_step_secs: f32,
    /// Longest delta a single `step` will simulate, in seconds.
    pub max_step_secs: f32,
    /// Constraint relaxation passes per substep.
    pub iterations: usize,
    /// Speed limit in pixels per second.
    pub max_speed: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, 300.0),
            fixed_step_secs: 1.0 / 120.0,
            max_step_secs: 0.1,
            iterations: 20,
            max_speed: 4000.0,
        }
    }
}

/// Owns every body and constraint and advances them in time.
#[derive(Debug)]
pub struct PhysicsWorld {
    config: WorldConfig,
    bodies: BTreeMap<BodyId, Body>,
    constraints: BTreeMap<ConstraintId, Constraint>,
    next_body_id: u32,
    next_constraint_id: u32,
    last_colliding_group: i32,
    last_non_colliding_group: i32,
    step_count: u64,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(WorldConfig::default())
    }
}

impl PhysicsWorld {
    /// Creates an empty world.
    #[must_use]
    pub fn new(config: WorldConfig) -> Self {
        Self {
            config,
            bodies: BTreeMap::new(),
            constraints: BTreeMap::new(),
            next_body_id: 0,
            next_constraint_id: 0,
            last_colliding_group: 0,
            last_non_colliding_group: 0,
            step_count: 0,
        }
    }

    /// Returns the world's tuning.
    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Allocates a fresh collision group. Non-colliding groups are negative,
    /// colliding groups positive.
    pub fn next_group(&mut self, non_colliding: bool) -> i32 {
        if non_colliding {
            self.last_non_colliding_group -= 1;
            self.last_non_colliding_group
        } else {
            self.last_colliding_group += 1;
            self.last_colliding_group
        }
    }

    /// Adds a body and returns its handle.
    pub fn add_body(&mut self, desc: &BodyDesc) -> BodyId {
        let id = BodyId(self.next_body_id);
        self.next_body_id += 1;
        self.bodies.insert(id, Body::from_desc(id, desc));
        id
    }

    /// Removes a body together with every constraint that references it.
    pub fn remove_body(&mut self, id: BodyId) -> Option<Body> {
        let body = self.bodies.remove(&id)?;
        let before = self.constraints.len();
        self.constraints.retain(|_, constraint| !constraint.references(id));
        debug!(
            body = %id,
            constraints_removed = before - self.constraints.len(),
            "removed body"
        );
        Some(body)
    }

    /// Adds a constraint between two endpoints.
    ///
    /// # Errors
    ///
    /// Returns `StageError::Validation` if an endpoint names a body that is
    /// not in the world or the length is not a finite non-negative number.
    pub fn add_constraint(&mut self, desc: &ConstraintDesc) -> Result<ConstraintId, StageError> {
        for endpoint in [desc.a, desc.b] {
            if let Some(body) = endpoint.body() {
                if !self.bodies.contains_key(&body) {
                    return Err(StageError::Validation(format!(
                        "constraint references missing body {body}"
                    )));
                }
            }
        }
        if !desc.length.is_finite() || desc.length < 0.0 {
            return Err(StageError::Validation(format!(
                "constraint length must be finite and non-negative, got {}",
                desc.length
            )));
        }

        let id = ConstraintId(self.next_constraint_id);
        self.next_constraint_id += 1;
        self.constraints.insert(id, Constraint::from_desc(id, desc));
        Ok(id)
    }

    /// Removes a constraint.
    pub fn remove_constraint(&mut self, id: ConstraintId) -> Option<Constraint> {
        self.constraints.remove(&id)
    }

    /// Returns a body by handle.
    #[must_use]
    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(&id)
    }

    /// Returns a mutable body by handle.
    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.get_mut(&id)
    }

    /// Returns a constraint by handle.
    #[must_use]
    pub fn constraint(&self, id: ConstraintId) -> Option<&Constraint> {
        self.constraints.get(&id)
    }

    /// Iterates bodies in id order.
    pub fn bodies(&self) -> impl Iterator<Item = &Body> {
        self.bodies.values()
    }

    /// Iterates constraints in id order.
    pub fn constraints(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.values()
    }

    /// Number of live bodies.
    #[must_use]
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Number of live constraints.
    #[must_use]
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Number of completed `step` calls.
    #[must_use]
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Accumulates a force on a body for the next step. Returns `false` if
    /// the body does not exist or the force is not finite.
    pub fn apply_force(&mut self, id: BodyId, force: Vec2) -> bool {
        if !force.is_finite() {
            warn!(body = %id, "ignoring non-finite force");
            return false;
        }
        match self.bodies.get_mut(&id) {
            Some(body) => {
                body.force += force;
                true
            }
            None => false,
        }
    }

    /// Advances the simulation by `delta`.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn step(&mut self, delta: Duration) {
        let dt = delta.as_secs_f32().min(self.config.max_step_secs);
        if dt <= 0.0 {
            return;
        }
        let fixed = self.config.fixed_step_secs.max(1e-4);
        let substeps = (dt / fixed).ceil().max(1.0) as u32;
        let h = dt / substeps as f32;

        for _ in 0..substeps {
            self.substep(h);
        }

        for body in self.bodies.values_mut() {
            body.force = Vec2::ZERO;
        }
        self.step_count += 1;
    }

    fn substep(&mut self, h: f32) {
        let gravity = self.config.gravity;
        let max_speed = self.config.max_speed;

        for body in self.bodies.values_mut() {
            body.previous_position = body.position;
            if body.is_static() {
                body.velocity = Vec2::ZERO;
                continue;
            }
            let acceleration = gravity + body.force * body.inverse_mass;
            body.velocity += acceleration * h;
            let retain = (1.0 - body.air_friction).powf(h / REFERENCE_FRAME_SECS);
            body.velocity = (body.velocity * retain).clamp_length_max(max_speed);
            body.angular_velocity *= retain;
            body.position += body.velocity * h;
            body.angle += body.angular_velocity * h;
        }

        for _ in 0..self.config.iterations {
            for constraint in self.constraints.values() {
                relax(&mut self.bodies, constraint);
            }
        }

        for body in self.bodies.values_mut() {
            if !body.is_static() {
                body.velocity = (body.position - body.previous_position) / h;
            }
        }

        for constraint in self.constraints.values() {
            dampen(&mut self.bodies, constraint);
        }

        self.resolve_collisions();
        self.guard_non_finite();
    }

    fn resolve_collisions(&mut self) {
        let ids: Vec<BodyId> = self.bodies.keys().copied().collect();
        for (index, &a) in ids.iter().enumerate() {
            for &b in &ids[index + 1..] {
                let (Some(first), Some(second)) = (self.bodies.get(&a), self.bodies.get(&b))
                else {
                    continue;
                };
                if !first.filter.can_collide(second.filter) {
                    continue;
                }
                let (wa, wb) = (first.inverse_mass, second.inverse_mass);
                let w = wa + wb;
                if w <= 0.0 {
                    continue;
                }
                let delta = second.position - first.position;
                let distance = delta.length();
                let reach = first.shape.bounding_radius() + second.shape.bounding_radius();
                if distance >= reach || distance < MIN_SEPARATION {
                    continue;
                }

                let normal = delta / distance;
                let overlap = reach - distance;
                let approach = (second.velocity - first.velocity).dot(normal);
                let restitution = first.restitution.max(second.restitution);
                let impulse = if approach < 0.0 {
                    -(1.0 + restitution) * approach / w
                } else {
                    0.0
                };

                if let Some(body) = self.bodies.get_mut(&a) {
                    body.position -= normal * (overlap * wa / w);
                    body.velocity -= normal * (impulse * wa);
                }
                if let Some(body) = self.bodies.get_mut(&b) {
                    body.position += normal * (overlap * wb / w);
                    body.velocity += normal * (impulse * wb);
                }
            }
        }
    }

    fn guard_non_finite(&mut self) {
        let max_speed = self.config.max_speed;
        for body in self.bodies.values_mut() {
            if body.position.is_finite() && body.velocity.is_finite() && body.angle.is_finite() {
                body.velocity = body.velocity.clamp_length_max(max_speed);
                body.last_finite_position = body.position;
                continue;
            }
            debug!(body = %body.id, "resetting non-finite body state");
            body.position = body.last_finite_position;
            body.previous_position = body.last_finite_position;
            body.velocity = Vec2::ZERO;
            body.angular_velocity = 0.0;
            if !body.angle.is_finite() {
                body.angle = 0.0;
            }
        }
    }
}

/// Position, velocity and inverse mass of an endpoint. Fixed points are
/// immovable.
fn endpoint_state(bodies: &BTreeMap<BodyId, Body>, endpoint: Endpoint) -> Option<(Vec2, Vec2, f32)> {
    match endpoint {
        Endpoint::Fixed(point) => Some((point, Vec2::ZERO, 0.0)),
        Endpoint::Body(id) => bodies
            .get(&id)
            .map(|body| (body.position, body.velocity, body.inverse_mass)),
    }
}

fn with_body(bodies: &mut BTreeMap<BodyId, Body>, endpoint: Endpoint, f: impl FnOnce(&mut Body)) {
    if let Endpoint::Body(id) = endpoint {
        if let Some(body) = bodies.get_mut(&id) {
            f(body);
        }
    }
}

fn relax(bodies: &mut BTreeMap<BodyId, Body>, constraint: &Constraint) {
    let (Some((pa, _, wa)), Some((pb, _, wb))) = (
        endpoint_state(bodies, constraint.a),
        endpoint_state(bodies, constraint.b),
    ) else {
        return;
    };
    let w = wa + wb;
    if w <= 0.0 {
        return;
    }
    let delta = pb - pa;
    let distance = delta.length();
    if distance < MIN_SEPARATION {
        return;
    }

    let correction = delta * ((distance - constraint.length) / distance * constraint.stiffness / w);
    with_body(bodies, constraint.a, |body| body.position += correction * wa);
    with_body(bodies, constraint.b, |body| body.position -= correction * wb);
}

fn dampen(bodies: &mut BTreeMap<BodyId, Body>, constraint: &Constraint) {
    if constraint.damping <= 0.0 {
        return;
    }
    let (Some((pa, va, wa)), Some((pb, vb, wb))) = (
        endpoint_state(bodies, constraint.a),
        endpoint_state(bodies, constraint.b),
    ) else {
        return;
    };
    let w = wa + wb;
    let normal = (pb - pa).normalize_or_zero();
    if w <= 0.0 || normal == Vec2::ZERO {
        return;
    }

    let separating = (vb - va).dot(normal);
    let impulse = normal * (separating * constraint.damping / w);
    with_body(bodies, constraint.a, |body| body.velocity += impulse * wa);
    with_body(bodies, constraint.b, |body| body.velocity -= impulse * wb);
}
