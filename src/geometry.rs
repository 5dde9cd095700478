//! Planar geometry primitives in screen coordinates (y grows downward).

use serde::{Deserialize, Serialize};

/// A point in world units
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Point reached by travelling `distance` along `heading_degrees`
    #[inline]
    pub fn advance(self, heading_degrees: f32, distance: f32) -> Self {
        let (dx, dy) = heading_vector(heading_degrees);
        Self::new(self.x + dx * distance, self.y + dy * distance)
    }

    #[inline]
    pub fn distance(self, other: Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Shortest distance from this point to the segment `a`-`b`
    pub fn distance_to_segment(self, a: Point, b: Point) -> f32 {
        let abx = b.x - a.x;
        let aby = b.y - a.y;
        let len_sq = abx * abx + aby * aby;
        if len_sq == 0.0 {
            return self.distance(a);
        }
        let t = (((self.x - a.x) * abx + (self.y - a.y) * aby) / len_sq).clamp(0.0, 1.0);
        self.distance(Point::new(a.x + abx * t, a.y + aby * t))
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self::new(x, y)
    }
}

/// Unit vector for a heading in degrees
#[inline]
pub fn heading_vector(heading_degrees: f32) -> (f32, f32) {
    let rad = heading_degrees.to_radians();
    (rad.cos(), rad.sin())
}

/// Axis-aligned rectangle
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Half-open containment: left and top edges inside, right and bottom outside
    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    /// True if `p` lies inside and within `thickness` of an edge
    pub fn on_outline(&self, p: Point, thickness: f32) -> bool {
        self.contains(p)
            && (p.x < self.x + thickness
                || p.x >= self.right() - thickness
                || p.y < self.y + thickness
                || p.y >= self.bottom() - thickness)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}
