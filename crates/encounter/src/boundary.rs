//! Leash regions attached to boss slots.
//!
//! The host checks an engaged boss against the regions of its slot and
//! forces an evade when it leaves them. A region is a circle or an
//! axis-aligned ellipse; an inverted region describes the area the boss must
//! stay *out* of.

use serde::{Deserialize, Serialize};

/// Point on the ground plane.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum BoundaryShape {
    Circle {
        center: Position,
        radius: f32,
    },
    Ellipse {
        center: Position,
        radius_x: f32,
        radius_y: f32,
    },
}

impl BoundaryShape {
    fn contains(&self, pos: Position) -> bool {
        match *self {
            BoundaryShape::Circle { center, radius } => {
                let dx = pos.x - center.x;
                let dy = pos.y - center.y;
                dx * dx + dy * dy <= radius * radius
            }
            BoundaryShape::Ellipse {
                center,
                radius_x,
                radius_y,
            } => {
                if radius_x <= 0.0 || radius_y <= 0.0 {
                    return false;
                }
                let nx = (pos.x - center.x) / radius_x;
                let ny = (pos.y - center.y) / radius_y;
                nx * nx + ny * ny <= 1.0
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Boundary {
    #[serde(flatten)]
    pub shape: BoundaryShape,
    #[serde(default)]
    pub inverted: bool,
}

impl Boundary {
    pub const fn circle(center: Position, radius: f32) -> Self {
        Self {
            shape: BoundaryShape::Circle { center, radius },
            inverted: false,
        }
    }

    pub const fn ellipse(center: Position, radius_x: f32, radius_y: f32) -> Self {
        Self {
            shape: BoundaryShape::Ellipse {
                center,
                radius_x,
                radius_y,
            },
            inverted: false,
        }
    }

    #[must_use]
    pub const fn inverted(mut self) -> Self {
        self.inverted = !self.inverted;
        self
    }

    /// True when `pos` is on the permitted side of this boundary.
    pub fn is_within(&self, pos: Position) -> bool {
        self.shape.contains(pos) != self.inverted
    }
}
