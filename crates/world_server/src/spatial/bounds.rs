use meridian_event_system::Vector3;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box.
///
/// `min[i] <= max[i]` holds on every axis; [`Bounds::new`] normalizes its
/// corners so callers may pass them in any order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl Bounds {
    /// Creates a box spanning the two corners, taking component-wise min/max.
    pub fn new(a: [f64; 3], b: [f64; 3]) -> Self {
        Self {
            min: [a[0].min(b[0]), a[1].min(b[1]), a[2].min(b[2])],
            max: [a[0].max(b[0]), a[1].max(b[1]), a[2].max(b[2])],
        }
    }

    /// Cube of half-size `half_extent` centered on `center`.
    pub fn around(center: Vector3, half_extent: f64) -> Self {
        Self::new(
            [center.x - half_extent, center.y - half_extent, center.z - half_extent],
            [center.x + half_extent, center.y + half_extent, center.z + half_extent],
        )
    }

    /// Cube spanning `[-half_size, half_size]` on every axis.
    pub fn symmetric(half_size: f64) -> Self {
        Self::around(Vector3::zero(), half_size)
    }

    pub fn center(&self) -> [f64; 3] {
        [
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
            (self.min[2] + self.max[2]) * 0.5,
        ]
    }

    pub fn size(&self) -> [f64; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }

    /// Inclusive on every axis.
    pub fn contains_point(&self, p: &[f64; 3]) -> bool {
        (0..3).all(|i| self.min[i] <= p[i] && p[i] <= self.max[i])
    }

    /// Whether `other` lies entirely inside this box.
    pub fn contains(&self, other: &Bounds) -> bool {
        (0..3).all(|i| self.min[i] <= other.min[i] && other.max[i] <= self.max[i])
    }

    /// Whether the boxes share at least one point (touching faces count).
    pub fn intersects(&self, other: &Bounds) -> bool {
        (0..3).all(|i| !(self.max[i] < other.min[i] || other.max[i] < self.min[i]))
    }

    /// The eight octants, ordered by x then y then z bit.
    pub fn octants(&self) -> [Bounds; 8] {
        let c = self.center();
        std::array::from_fn(|i| {
            let mut min = self.min;
            let mut max = c;
            for axis in 0..3 {
                if i & (1 << axis) != 0 {
                    min[axis] = c[axis];
                    max[axis] = self.max[axis];
                }
            }
            Bounds { min, max }
        })
    }
}
