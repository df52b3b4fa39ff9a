//! Minimal planar geometry for segment shapes.
//!
//! The map builder that produces segment shapes lives outside this crate;
//! path algorithms only need lengths, midpoints and turn angles, so the
//! geometry kept here is deliberately small.

use serde::{Deserialize, Serialize};

/// A point in the plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn dist(&self, other: &Point2) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// True when the two points coincide within `tolerance`.
    pub fn approx_eq(&self, other: &Point2, tolerance: f64) -> bool {
        self.dist(other) < tolerance
    }
}

/// A straight line segment between two endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub a: Point2,
    pub b: Point2,
}

impl Line {
    pub fn new(a: Point2, b: Point2) -> Self {
        Self { a, b }
    }

    pub fn length(&self) -> f64 {
        self.a.dist(&self.b)
    }

    pub fn midpoint(&self) -> Point2 {
        Point2::new((self.a.x + self.b.x) / 2.0, (self.a.y + self.b.y) / 2.0)
    }

    /// The endpoint away from `junction` (whichever endpoint is nearer to
    /// `junction` is considered the entry end).
    pub fn far_end(&self, junction: &Point2) -> Point2 {
        if self.a.dist(junction) <= self.b.dist(junction) {
            self.b
        } else {
            self.a
        }
    }

    /// Unit direction of travel from `from` towards `to`. Zero-length
    /// segments yield a zero vector, which downstream angle code treats as
    /// collinear.
    pub fn direction(from: &Point2, to: &Point2) -> (f64, f64) {
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        let len = dx.hypot(dy);
        if len == 0.0 {
            (0.0, 0.0)
        } else {
            (dx / len, dy / len)
        }
    }
}

/// Turn angle in radians, in [0, pi], between two unit directions of
/// travel. Collinear continuation is 0; a U-turn is pi.
pub fn turn_angle(incoming: (f64, f64), outgoing: (f64, f64)) -> f64 {
    let dot = incoming.0 * outgoing.0 + incoming.1 * outgoing.1;
    dot.clamp(-1.0, 1.0).acos()
}
