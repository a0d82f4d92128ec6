use serde::{Deserialize, Serialize};

use crate::rectangle::Rect;

/// Bounding sphere (circle, in 2D): centre plus radius.
///
/// An alternative enclosure to [`Rect`]. Spheres are cheaper to combine and
/// to measure against, and can be tighter than rectangles for elongated
/// diagonal shapes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    pub center: [f64; 2],
    pub radius: f64,
}

impl Sphere {
    /// Creates a sphere from its centre and radius.
    pub fn new(cx: f64, cy: f64, radius: f64) -> Self {
        assert!(radius >= 0.0, "Invalid sphere radius");
        Sphere {
            center: [cx, cy],
            radius,
        }
    }

    /// The sphere circumscribing a rectangle: centred on the rectangle with
    /// radius half its diagonal.
    pub fn from_rect(rect: &Rect) -> Self {
        let center = rect.center();
        let radius = f64::hypot(
            rect.max[0] - rect.min[0],
            rect.max[1] - rect.min[1],
        ) / 2.0;
        Sphere { center, radius }
    }

    /// Smallest sphere containing both `self` and `other`.
    pub fn union(&self, other: &Sphere) -> Sphere {
        let d = f64::hypot(
            other.center[0] - self.center[0],
            other.center[1] - self.center[1],
        );
        // One sphere swallows the other.
        if self.radius >= d + other.radius {
            return *self;
        }
        if other.radius >= d + self.radius {
            return *other;
        }
        let radius = (d + self.radius + other.radius) / 2.0;
        let t = (radius - self.radius) / d;
        Sphere {
            center: [
                self.center[0] + (other.center[0] - self.center[0]) * t,
                self.center[1] + (other.center[1] - self.center[1]) * t,
            ],
            radius,
        }
    }

    /// Distance from the sphere's centre to the closest point of `rect`.
    fn center_to_rect(&self, rect: &Rect) -> f64 {
        let cx = self.center[0].clamp(rect.min[0], rect.max[0]);
        let cy = self.center[1].clamp(rect.min[1], rect.max[1]);
        f64::hypot(self.center[0] - cx, self.center[1] - cy)
    }

    /// Distance from the sphere's centre to the farthest corner of `rect`.
    fn center_to_rect_far(&self, rect: &Rect) -> f64 {
        let dx = (self.center[0] - rect.min[0])
            .abs()
            .max((self.center[0] - rect.max[0]).abs());
        let dy = (self.center[1] - rect.min[1])
            .abs()
            .max((self.center[1] - rect.max[1]).abs());
        f64::hypot(dx, dy)
    }

    /// Minimum distance between any point of this sphere and any point of
    /// `rect`. Zero when they overlap.
    pub fn min_distance(&self, rect: &Rect) -> f64 {
        (self.center_to_rect(rect) - self.radius).max(0.0)
    }

    /// Maximum distance between any point of this sphere and any point of
    /// `rect`.
    pub fn max_distance(&self, rect: &Rect) -> f64 {
        self.center_to_rect_far(rect) + self.radius
    }

    /// Returns true if the sphere and the rectangle overlap or touch.
    pub fn intersects_rect(&self, rect: &Rect) -> bool {
        self.center_to_rect(rect) <= self.radius
    }

    /// Grows the radius by `amount`.
    pub fn expand(&self, amount: f64) -> Sphere {
        Sphere {
            center: self.center,
            radius: self.radius + amount,
        }
    }

    /// The smallest rectangle containing this sphere.
    pub fn bounding_rect(&self) -> Rect {
        Rect {
            min: [self.center[0] - self.radius, self.center[1] - self.radius],
            max: [self.center[0] + self.radius, self.center[1] + self.radius],
        }
    }
}
