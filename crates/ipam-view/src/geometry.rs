//! Canvas coordinates shared by drag-and-drop and topology views

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Sub};

/// 2D point or vector in canvas units
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate
    pub y: f64,
}

impl Point {
    /// Point at (`x`, `y`)
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean length
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Squared distance to `other`
    pub fn distance_squared(self, other: Point) -> f64 {
        let d = self - other;
        d.x * d.x + d.y * d.y
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Div<f64> for Point {
    type Output = Point;

    fn div(self, rhs: f64) -> Point {
        Point::new(self.x / rhs, self.y / rhs)
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Top-left corner
    pub origin: Point,
    /// Extent along x
    pub width: f64,
    /// Extent along y
    pub height: f64,
}

impl Rect {
    /// Rectangle with top-left corner at (`x`, `y`)
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Point::new(x, y),
            width,
            height,
        }
    }

    /// Geometric center
    pub fn center(&self) -> Point {
        Point::new(self.origin.x + self.width / 2.0, self.origin.y + self.height / 2.0)
    }

    /// True when `point` lies inside or on the border
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.origin.x
            && point.x <= self.origin.x + self.width
            && point.y >= self.origin.y
            && point.y <= self.origin.y + self.height
    }
}
