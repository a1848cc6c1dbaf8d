//! Orientation-aware closest-point search.
//!
//! The error of matching a measurement at `x` with unit normal `n` to a
//! point `y` on a datum with unit normal `N` is
//!
//! ```text
//! E = k (1 - n.N) + |y - x|^2 / (2 sigma^2)
//! ```
//!
//! Nodes are pruned with the box distance plus a normal-cone bound: every
//! datum normal lies within `theta_max` of the node's average normal, so by
//! the triangle inequality on the sphere its angle to `n` is at least
//! `angle(n, average) - theta_max`.

use crate::errors::ParameterError;
use crate::float_types::Real;
use crate::float_types::parry3d::query::PointQuery;
use crate::pdtree::{DatumMatch, DatumSet, Node, SearchAlgorithm};
use nalgebra::{Point3, Vector3};

/// Slack subtracted from the cone angle bound to absorb `acos` round-off.
const ANGLE_SLACK: Real = 1e-6;

/// A measurement position and its unit surface normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalQuery {
    pub point: Point3<Real>,
    pub normal: Vector3<Real>,
}

impl DirectionalQuery {
    /// `normal` is normalised; a zero normal is replaced by +z.
    pub fn new(point: Point3<Real>, normal: Vector3<Real>) -> Self {
        Self {
            point,
            normal: normal.try_normalize(Real::EPSILON).unwrap_or_else(Vector3::z),
        }
    }
}

/// Weighted position + orientation search.
///
/// The normal-cone bound needs `k >= 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Directional {
    k: Real,
    sigma2: Real,
}

impl Default for Directional {
    fn default() -> Self {
        Self {
            k: 1.0,
            sigma2: 1.0,
        }
    }
}

impl Directional {
    /// `k` weighs the orientation term, `sigma2` is the positional noise
    /// variance.
    pub fn new(k: Real, sigma2: Real) -> Result<Self, ParameterError> {
        if !k.is_finite() || k < 0.0 {
            return Err(ParameterError::InvalidWeight(k));
        }
        if !sigma2.is_finite() || sigma2 <= 0.0 {
            return Err(ParameterError::InvalidVariance(sigma2));
        }
        Ok(Self { k, sigma2 })
    }

    pub const fn k(&self) -> Real {
        self.k
    }

    pub const fn sigma2(&self) -> Real {
        self.sigma2
    }

    #[inline]
    fn positional(&self, squared_distance: Real) -> Real {
        squared_distance / (2.0 * self.sigma2)
    }

    #[inline]
    fn orientation(&self, query_normal: &Vector3<Real>, datum_normal: Option<Vector3<Real>>) -> Real {
        datum_normal.map_or(0.0, |n| self.k * (1.0 - query_normal.dot(&n)))
    }
}

impl<D: DatumSet + ?Sized> SearchAlgorithm<D> for Directional {
    type Query = DirectionalQuery;

    fn query_point(&self, query: &DirectionalQuery) -> Point3<Real> {
        query.point
    }

    fn node_might_be_closer(
        &self,
        _data: &D,
        query: &DirectionalQuery,
        node: &Node,
        bound: Real,
    ) -> bool {
        let orientation_bound = node.orientation.map_or(0.0, |o| {
            let theta = query.normal.dot(&o.average).clamp(-1.0, 1.0).acos();
            let gap = (theta - o.theta_max - ANGLE_SLACK).max(0.0);
            self.k * (1.0 - gap.cos())
        });
        let local = node.frame.transform_point(&query.point);
        orientation_bound + self.positional(node.bounds.squared_distance(&local)) <= bound
    }

    fn datum_might_be_closer(
        &self,
        data: &D,
        query: &DirectionalQuery,
        datum: usize,
        bound: Real,
    ) -> bool {
        let d = data.datum_aabb(datum).distance_to_local_point(&query.point, true);
        self.orientation(&query.normal, data.normal(datum)) + self.positional(d * d) <= bound
    }

    fn closest_point_on_datum(
        &self,
        data: &D,
        query: &DirectionalQuery,
        datum: usize,
    ) -> DatumMatch {
        let (point, feature) = data.closest_point(datum, &query.point);
        DatumMatch {
            point,
            feature,
            error: self.orientation(&query.normal, data.normal(datum))
                + self.positional((point - query.point).norm_squared()),
        }
    }
}
