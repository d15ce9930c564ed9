//! A fixed-step 2D world of circular bodies.
//!
//! Bodies store nothing but their position history; velocity is always the
//! finite difference of the last two recorded positions. [`World::step`]
//! resolves pairwise elastic collisions, coasts every other dynamic body with
//! friction, and freezes bodies that leave the arena at its boundary.

use bevy_heavy::ComputeMassProperties2d as _;
use bevy_math::primitives::Circle;
use glam::DVec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Index of a body inside its world, in insertion order.
pub type BodyId = usize;

/// Axis-aligned arena limits, as `(min, max)` per axis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldBounds {
    pub x: (f64, f64),
    pub y: (f64, f64),
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self {
            x: (-1000.0, 1000.0),
            y: (-1000.0, 1000.0),
        }
    }
}

impl WorldBounds {
    pub fn new(x: (f64, f64), y: (f64, f64)) -> Self {
        Self { x, y }
    }

    /// Nearest point of the arena to `pos`.
    pub fn clip(&self, pos: DVec2) -> DVec2 {
        DVec2::new(
            pos.x.min(self.x.1).max(self.x.0),
            pos.y.min(self.y.1).max(self.y.0),
        )
    }
}

/// A circular rigid body.
#[derive(Clone, Debug, PartialEq)]
pub struct Ball {
    /// Label used by sensory primitives and snapshots.
    pub name: String,

    pub radius: f64,

    /// Mass; any two bodies that may collide need a positive total mass.
    pub mass: f64,

    /// Fraction of the step velocity lost per step (coefficient times `dt`).
    friction: f64,

    is_static: bool,

    dt: f64,

    /// Append-only; the last two entries define the velocity.
    positions: Vec<DVec2>,
}

impl Ball {
    /// A dynamic body at rest at `pos`.
    pub fn new(dt: f64, radius: f64, mass: f64, pos: DVec2) -> Self {
        Self {
            name: String::new(),
            radius,
            mass,
            friction: 0.0,
            is_static: false,
            dt,
            positions: vec![pos, pos],
        }
    }

    /// A body whose mass is that of a disc of the given areal `density`.
    ///
    /// The mass comes from `bevy_heavy` mass properties, which are computed in
    /// `f32`; the result carries single precision.
    pub fn from_density(dt: f64, radius: f64, density: f64, pos: DVec2) -> Self {
        let mass = Circle::new(radius as f32).mass(density as f32);
        Self::new(dt, radius, f64::from(mass), pos)
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Seeds the history so that the derived velocity equals `velocity`.
    pub fn with_velocity(mut self, velocity: DVec2) -> Self {
        let pos = self.pos();
        self.positions = vec![pos - self.dt * velocity, pos];
        self
    }

    /// Sets the friction coefficient, per unit of time.
    pub fn with_friction(mut self, coefficient: f64) -> Self {
        self.friction = coefficient * self.dt;
        self
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    pub fn pos(&self) -> DVec2 {
        self.positions[self.positions.len() - 1]
    }

    /// Displacement over the last step.
    pub fn step_vel(&self) -> DVec2 {
        let n = self.positions.len();
        self.positions[n - 1] - self.positions[n - 2]
    }

    pub fn vel(&self) -> DVec2 {
        self.step_vel() / self.dt
    }

    pub fn positions(&self) -> &[DVec2] {
        &self.positions
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn friction(&self) -> f64 {
        self.friction
    }
}

/// A recorded contact between two bodies.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CollisionEvent {
    /// Simulated time at which the contact was resolved.
    pub time: f64,

    /// Point on the first body's surface along the line of centers.
    pub contact: DVec2,

    pub bodies: (BodyId, BodyId),
}

/// Body state handed to a rendering collaborator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BodySnapshot {
    pub id: BodyId,
    pub name: String,
    pub radius: f64,
    pub position: DVec2,
    pub is_static: bool,
}

/// A fixed-step simulation of circular bodies inside a bounded arena.
#[derive(Clone, Debug)]
pub struct World {
    dt: f64,
    time: f64,
    bounds: WorldBounds,
    bodies: Vec<Ball>,
    collidable: Vec<bool>,
    collisions: Vec<CollisionEvent>,
}

impl World {
    pub fn new(dt: f64, bounds: WorldBounds) -> Self {
        Self {
            dt,
            time: 0.0,
            bounds,
            bodies: Vec::new(),
            collidable: Vec::new(),
            collisions: Vec::new(),
        }
    }

    /// Adds a body that takes part in collisions.
    pub fn add(&mut self, ball: Ball) -> BodyId {
        self.bodies.push(ball);
        self.collidable.push(true);
        self.bodies.len() - 1
    }

    /// Adds a body that is carried along but never collides or moves by itself.
    pub fn add_passive(&mut self, ball: Ball) -> BodyId {
        self.bodies.push(ball);
        self.collidable.push(false);
        self.bodies.len() - 1
    }

    pub fn body(&self, id: BodyId) -> Option<&Ball> {
        self.bodies.get(id)
    }

    pub fn bodies(&self) -> &[Ball] {
        &self.bodies
    }

    /// Drives a body to `pos` from outside the simulation (kinematic bodies).
    pub fn move_body(&mut self, id: BodyId, pos: DVec2) {
        if let Some(ball) = self.bodies.get_mut(id) {
            ball.positions.push(pos);
        }
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Simulated time elapsed since creation.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn bounds(&self) -> WorldBounds {
        self.bounds
    }

    pub fn collisions(&self) -> &[CollisionEvent] {
        &self.collisions
    }

    pub fn into_collisions(self) -> Vec<CollisionEvent> {
        self.collisions
    }

    pub fn snapshot(&self) -> Vec<BodySnapshot> {
        self.bodies
            .iter()
            .enumerate()
            .map(|(id, ball)| BodySnapshot {
                id,
                name: ball.name.clone(),
                radius: ball.radius,
                position: ball.pos(),
                is_static: ball.is_static,
            })
            .collect()
    }

    /// Advances the world by one `dt`.
    pub fn step(&mut self) {
        let mut updated: Vec<bool> = self.bodies.iter().map(Ball::is_static).collect();
        let active: Vec<BodyId> = (0..self.bodies.len())
            .filter(|&i| self.collidable[i])
            .collect();

        for (n, &i) in active.iter().enumerate() {
            for &j in &active[n + 1..] {
                if self.overlapping(i, j) {
                    self.resolve_collision(i, j, &mut updated);
                }
            }
        }
        self.time += self.dt;

        for &i in &active {
            if !updated[i] {
                let ball = &mut self.bodies[i];
                let next = ball.pos() + (1.0 - ball.friction).max(0.0) * ball.step_vel();
                ball.positions.push(next);
            }
        }

        self.freeze_at_bounds(&active);
    }

    fn overlapping(&self, i: BodyId, j: BodyId) -> bool {
        let (b1, b2) = (&self.bodies[i], &self.bodies[j]);
        let reach = b1.radius + b2.radius;
        !(b1.is_static && b2.is_static) && b1.pos().distance_squared(b2.pos()) < reach * reach
    }

    /// Elastic collision; each dynamic body moves one `dt` with its new velocity.
    fn resolve_collision(&mut self, i: BodyId, j: BodyId, updated: &mut [bool]) {
        let (b1, b2) = (&self.bodies[i], &self.bodies[j]);
        let (v1, v2) = (b1.vel(), b2.vel());
        let (p1, p2) = (b1.pos(), b2.pos());
        let (m1, m2) = (b1.mass, b2.mass);

        let u12 = p1 - p2;
        let norm_sq = u12.length_squared();
        // Coincident centers have no line of centers to push along.
        let d12 = if norm_sq > 0.0 {
            2.0 / (m1 + m2) * (v1 - v2).dot(u12) / norm_sq * u12
        } else {
            DVec2::ZERO
        };
        let contact = p1 + (p2 - p1).normalize_or_zero() * b1.radius;

        let dt = self.dt;
        if !self.bodies[i].is_static {
            self.bodies[i].positions.push(p1 + dt * (v1 - m2 * d12));
            updated[i] = true;
        }
        if !self.bodies[j].is_static {
            self.bodies[j].positions.push(p2 + dt * (v2 + m1 * d12));
            updated[j] = true;
        }

        debug!(time = self.time, i, j, "resolved collision");
        self.collisions.push(CollisionEvent {
            time: self.time,
            contact,
            bodies: (i, j),
        });
    }

    fn freeze_at_bounds(&mut self, active: &[BodyId]) {
        for &i in active {
            let ball = &mut self.bodies[i];
            if ball.is_static {
                continue;
            }
            let pos = ball.pos();
            let clipped = self.bounds.clip(pos);
            if clipped != pos {
                warn!(body = %ball.name, x = clipped.x, y = clipped.y, "body frozen at arena boundary");
                ball.is_static = true;
                ball.positions.push(clipped);
                ball.positions.push(clipped);
            }
        }
    }
}
