//! Traits separating the generic tree from datum geometry and from the
//! metric-specific pruning rules.

use crate::covariance::MahalanobisFactors;
use crate::float_types::Real;
use crate::float_types::parry3d::bounding_volume::Aabb;
use crate::geometry::{BoundingBox, Feature};
use crate::pdtree::node::Node;
use nalgebra::{IsometryMatrix3, Matrix3, Point3, Vector3};

/// A collection of datums (triangles, segments, points) a tree can index.
///
/// The tree never copies datum geometry; it only stores datum indices and
/// calls back into the set whenever it needs positions or bounds.
pub trait DatumSet: Sync {
    /// Number of datums.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Representative point used to compute node statistics and to decide
    /// on which side of a split a datum goes.
    fn sort_point(&self, datum: usize) -> Point3<Real>;

    /// Grow `bounds` (expressed in `frame`) so it encloses the whole datum.
    fn enlarge_bounds(&self, frame: &IsometryMatrix3<Real>, datum: usize, bounds: &mut BoundingBox);

    /// World-space bounding box of the datum.
    fn datum_aabb(&self, datum: usize) -> Aabb;

    /// Unit surface normal, if the datum carries orientation.
    fn normal(&self, _datum: usize) -> Option<Vector3<Real>> {
        None
    }

    /// Measurement noise covariance attached to the datum.
    fn covariance(&self, _datum: usize) -> Matrix3<Real> {
        Matrix3::zeros()
    }

    /// Eigenvalues of [`covariance`](Self::covariance), descending.
    fn covariance_eigenvalues(&self, _datum: usize) -> Vector3<Real> {
        Vector3::zeros()
    }

    /// Euclidean closest point on the datum.
    fn closest_point(&self, datum: usize, point: &Point3<Real>) -> (Point3<Real>, Feature);

    /// Closest point on the datum under the Mahalanobis metric `factors`.
    fn most_likely_point(
        &self,
        datum: usize,
        point: &Point3<Real>,
        factors: &MahalanobisFactors,
    ) -> (Point3<Real>, Feature);
}

impl<T: DatumSet + ?Sized> DatumSet for &T {
    fn len(&self) -> usize {
        (**self).len()
    }

    fn sort_point(&self, datum: usize) -> Point3<Real> {
        (**self).sort_point(datum)
    }

    fn enlarge_bounds(&self, frame: &IsometryMatrix3<Real>, datum: usize, bounds: &mut BoundingBox) {
        (**self).enlarge_bounds(frame, datum, bounds)
    }

    fn datum_aabb(&self, datum: usize) -> Aabb {
        (**self).datum_aabb(datum)
    }

    fn normal(&self, datum: usize) -> Option<Vector3<Real>> {
        (**self).normal(datum)
    }

    fn covariance(&self, datum: usize) -> Matrix3<Real> {
        (**self).covariance(datum)
    }

    fn covariance_eigenvalues(&self, datum: usize) -> Vector3<Real> {
        (**self).covariance_eigenvalues(datum)
    }

    fn closest_point(&self, datum: usize, point: &Point3<Real>) -> (Point3<Real>, Feature) {
        (**self).closest_point(datum, point)
    }

    fn most_likely_point(
        &self,
        datum: usize,
        point: &Point3<Real>,
        factors: &MahalanobisFactors,
    ) -> (Point3<Real>, Feature) {
        (**self).most_likely_point(datum, point, factors)
    }
}

/// Exact match of a query against a single datum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatumMatch {
    pub point: Point3<Real>,
    pub feature: Feature,
    /// Value of the strategy's objective; smaller is better.
    pub error: Real,
}

/// Metric-specific pruning policy driving the branch-and-bound search.
///
/// Both `*_might_be_closer` tests must be conservative: returning `false`
/// is only allowed when nothing in the node (or datum) can reach an error
/// strictly below `bound`.
pub trait SearchAlgorithm<D: DatumSet + ?Sized> {
    type Query;

    /// Position of the measurement.
    fn query_point(&self, query: &Self::Query) -> Point3<Real>;

    fn node_might_be_closer(&self, data: &D, query: &Self::Query, node: &Node, bound: Real) -> bool;

    fn datum_might_be_closer(&self, data: &D, query: &Self::Query, datum: usize, bound: Real)
    -> bool;

    fn closest_point_on_datum(&self, data: &D, query: &Self::Query, datum: usize) -> DatumMatch;
}
