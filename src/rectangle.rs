use serde::{Deserialize, Serialize};

/// Axis-aligned bounding rectangle over `f64` coordinates.
///
/// This is the workhorse enclosure of the index: every shape is summarised
/// by its bounding rectangle at build time, and internal nodes carry the
/// union of their children's rectangles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: [f64; 2], // [x_min, y_min]
    pub max: [f64; 2], // [x_max, y_max]
}

impl Rect {
    /// Creates a new rectangle from its corner coordinates.
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        assert!(x_min <= x_max && y_min <= y_max, "Invalid rectangle bounds");
        Rect {
            min: [x_min, y_min],
            max: [x_max, y_max],
        }
    }

    /// Creates a degenerate rectangle covering a single point.
    pub fn from_point(x: f64, y: f64) -> Self {
        Rect {
            min: [x, y],
            max: [x, y],
        }
    }

    /// Computes the union of two rectangles.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            min: [
                self.min[0].min(other.min[0]),
                self.min[1].min(other.min[1]),
            ],
            max: [
                self.max[0].max(other.max[0]),
                self.max[1].max(other.max[1]),
            ],
        }
    }

    /// Returns true if the two rectangles intersect (edge contact counts).
    pub fn intersects(&self, other: &Rect) -> bool {
        self.min[0] <= other.max[0]
            && self.max[0] >= other.min[0]
            && self.min[1] <= other.max[1]
            && self.max[1] >= other.min[1]
    }

    /// Returns true if `other` lies entirely inside this rectangle.
    pub fn contains(&self, other: &Rect) -> bool {
        self.min[0] <= other.min[0]
            && self.min[1] <= other.min[1]
            && self.max[0] >= other.max[0]
            && self.max[1] >= other.max[1]
    }

    /// Returns true if the point lies inside this rectangle.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        self.min[0] <= x && x <= self.max[0] && self.min[1] <= y && y <= self.max[1]
    }

    /// Center point of the rectangle.
    pub fn center(&self) -> [f64; 2] {
        [
            (self.min[0] + self.max[0]) / 2.0,
            (self.min[1] + self.max[1]) / 2.0,
        ]
    }

    /// Minimum distance between any point of this rectangle and any point
    /// of `other`. Zero when the rectangles overlap or touch.
    ///
    /// This is a lower bound on the distance between geometries enclosed by
    /// the two rectangles.
    pub fn min_distance(&self, other: &Rect) -> f64 {
        let dx = (self.min[0] - other.max[0])
            .max(other.min[0] - self.max[0])
            .max(0.0);
        let dy = (self.min[1] - other.max[1])
            .max(other.min[1] - self.max[1])
            .max(0.0);
        (dx * dx + dy * dy).sqrt()
    }

    /// Maximum distance between any point of this rectangle and any point
    /// of `other`.
    ///
    /// The dual of [`Rect::min_distance`]: an upper bound on the distance
    /// between geometries enclosed by the two rectangles.
    pub fn max_distance(&self, other: &Rect) -> f64 {
        let dx = (self.max[0] - other.min[0])
            .abs()
            .max((other.max[0] - self.min[0]).abs());
        let dy = (self.max[1] - other.min[1])
            .abs()
            .max((other.max[1] - self.min[1]).abs());
        (dx * dx + dy * dy).sqrt()
    }

    /// Grows the rectangle outward by `amount` on every side.
    pub fn expand(&self, amount: f64) -> Rect {
        Rect {
            min: [self.min[0] - amount, self.min[1] - amount],
            max: [self.max[0] + amount, self.max[1] + amount],
        }
    }

    /// Returns true if all four coordinates are finite.
    pub fn is_finite(&self) -> bool {
        self.min[0].is_finite()
            && self.min[1].is_finite()
            && self.max[0].is_finite()
            && self.max[1].is_finite()
    }
}
