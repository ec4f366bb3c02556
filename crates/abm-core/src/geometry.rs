//! Agent geometry: planar points and owned shapes.
//!
//! Geometry *computation* (areas, intersections, projections) is the business
//! of an external topology collaborator; this module only defines the owned
//! state an agent carries.  A [`Shape`] is deliberately minimal — a location
//! plus nothing else — so that two agents can never alias one mutable shape:
//! shapes are plain `Clone` values that an agent absorbs by copy.

/// A planar coordinate.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[inline]
    pub fn distance(self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}

// ── Shape ─────────────────────────────────────────────────────────────────────

/// The geometry owned by one agent (exactly one shape per live agent).
///
/// An agent offered a shape by a caller *absorbs* it (takes it by value or
/// clones it) rather than aliasing it, so no two agents ever share mutable
/// geometry.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Shape {
    location: Point,
}

impl Shape {
    /// A point shape at `location`.
    pub fn at(location: Point) -> Self {
        Self { location }
    }

    #[inline]
    pub fn location(&self) -> Point {
        self.location
    }

    #[inline]
    pub fn set_location(&mut self, location: Point) {
        self.location = location;
    }
}

impl Default for Shape {
    fn default() -> Self {
        Shape::at(Point::ORIGIN)
    }
}

impl From<Point> for Shape {
    fn from(p: Point) -> Self {
        Shape::at(p)
    }
}
