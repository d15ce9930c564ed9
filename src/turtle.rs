//! Planar turtle state used to walk a kinematic chain.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// The state of the chain-walking turtle.
///
/// Tracks the end position of the last link visited and the absolute heading
/// of that link, in degrees from the world `+X` axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ArmTurtle {
    /// Current world-space position of the cursor.
    pub position: DVec2,

    /// Current absolute heading, in degrees.
    pub heading: f64,
}

impl ArmTurtle {
    pub fn new(position: DVec2, heading: f64) -> Self {
        Self { position, heading }
    }

    /// Builds a turtle from an `(x, y, heading)` triple.
    pub fn from_origin(origin: [f64; 3]) -> Self {
        Self::new(DVec2::new(origin[0], origin[1]), origin[2])
    }

    /// Returns the unit vector along the current heading.
    pub fn forward(&self) -> DVec2 {
        let (sin, cos) = self.heading.to_radians().sin_cos();
        DVec2::new(cos, sin)
    }

    /// Rotates the turtle by `angle` degrees (counter-clockwise positive).
    pub fn turn(&mut self, angle: f64) {
        self.heading += angle;
    }

    /// Moves the turtle `length` units along its heading.
    pub fn advance(&mut self, length: f64) {
        self.position += self.forward() * length;
    }

    /// `(x, y, heading)` components, in that order.
    pub fn components(&self) -> [f64; 3] {
        [self.position.x, self.position.y, self.heading]
    }
}
