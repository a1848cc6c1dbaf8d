use crate::float_types::Real;
use nalgebra::{Point3, Vector3};

/// Axis-aligned box expressed in some node frame (world axes for
/// axis-aligned trees, principal axes for oriented trees).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub mins: Point3<Real>,
    pub maxs: Point3<Real>,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::empty()
    }
}

impl BoundingBox {
    #[inline]
    pub const fn new(mins: Point3<Real>, maxs: Point3<Real>) -> Self {
        Self { mins, maxs }
    }

    /// A box that contains nothing; the first [`include`](Self::include)
    /// collapses it onto that point.
    pub const fn empty() -> Self {
        Self {
            mins: Point3::new(Real::MAX, Real::MAX, Real::MAX),
            maxs: Point3::new(Real::MIN, Real::MIN, Real::MIN),
        }
    }

    pub fn from_points<'a, I: IntoIterator<Item = &'a Point3<Real>>>(points: I) -> Self {
        let mut bounds = Self::empty();
        for p in points {
            bounds.include(p);
        }
        bounds
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mins.x > self.maxs.x || self.mins.y > self.maxs.y || self.mins.z > self.maxs.z
    }

    /// Grow the box to contain `p`.
    #[inline]
    pub fn include(&mut self, p: &Point3<Real>) {
        self.mins = self.mins.inf(p);
        self.maxs = self.maxs.sup(p);
    }

    #[inline]
    pub fn extents(&self) -> Vector3<Real> {
        if self.is_empty() {
            return Vector3::zeros();
        }
        self.maxs - self.mins
    }

    #[inline]
    pub fn diagonal_length(&self) -> Real {
        self.extents().norm()
    }

    /// Index of the axis with the largest extent; ties go to the lower axis.
    pub fn longest_axis(&self) -> usize {
        let e = self.extents();
        let mut axis = 0;
        for i in 1..3 {
            if e[i] > e[axis] {
                axis = i;
            }
        }
        axis
    }

    /// Squared Euclidean distance from `p` (in the same frame) to the box,
    /// zero when `p` is inside.
    pub fn squared_distance(&self, p: &Point3<Real>) -> Real {
        (0..3)
            .map(|i| {
                let d = (self.mins[i] - p[i]).max(p[i] - self.maxs[i]).max(0.0);
                d * d
            })
            .sum()
    }
}
