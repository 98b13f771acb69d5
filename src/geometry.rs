use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned box stored as (min, max) corners.
#[derive(Copy, Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Aab {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aab {
    pub fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            min: Vec2::new(min_x, min_y),
            max: Vec2::new(max_x, max_y),
        }
    }

    pub fn from_min_size(min: Vec2, size: Vec2) -> Self {
        Self { min, max: min + size }
    }

    #[inline]
    pub fn translated(self, offset: Vec2) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Grow (or shrink, for negative `margin`) by `margin` on every side.
    #[inline]
    pub fn inflated(self, margin: f32) -> Self {
        Self {
            min: self.min - Vec2::splat(margin),
            max: self.max + Vec2::splat(margin),
        }
    }

    #[inline]
    pub fn union(self, other: Aab) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Envelope of this box over a straight-line move by `delta`.
    #[inline]
    pub fn swept(self, delta: Vec2) -> Self {
        self.union(self.translated(delta))
    }

    /// Interior test; points on the boundary are outside.
    #[inline]
    pub fn contains_strict(&self, p: Vec2) -> bool {
        p.x > self.min.x && p.x < self.max.x && p.y > self.min.y && p.y < self.max.y
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// Set of offsets `p` at which `other` translated by `p` overlaps `self`.
    #[inline]
    pub fn minkowski_difference(self, other: Aab) -> Self {
        Self {
            min: self.min - other.max,
            max: self.max - other.min,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minkowski_difference_of_unit_boxes() {
        let b = Aab::new(10.0, 10.0, 20.0, 20.0);
        let a = Aab::new(-1.0, -2.0, 1.0, 2.0);
        let sum = b.minkowski_difference(a);
        assert_eq!(sum, Aab::new(9.0, 8.0, 21.0, 22.0));
        assert_eq!(sum.width(), a.width() + b.width());
        assert_eq!(sum.height(), a.height() + b.height());
    }

    #[test]
    fn test_swept_envelope_covers_both_ends() {
        let a = Aab::new(0.0, 0.0, 2.0, 2.0);
        let s = a.swept(Vec2::new(-3.0, 5.0));
        assert_eq!(s, Aab::new(-3.0, 0.0, 2.0, 7.0));
    }

    #[test]
    fn test_contains_strict_excludes_boundary() {
        let a = Aab::new(0.0, 0.0, 1.0, 1.0);
        assert!(a.contains_strict(Vec2::splat(0.5)));
        assert!(!a.contains_strict(Vec2::new(0.0, 0.5)));
        assert!(!a.contains_strict(Vec2::new(0.5, 1.0)));
    }
}
