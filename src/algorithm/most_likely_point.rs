//! Most-likely-point search under anisotropic measurement noise.
//!
//! For a measurement `x` with covariance `Mx` and a datum with covariance
//! `My`, the match error of a point `y` on the datum is
//!
//! ```text
//! E(y) = (y - x)' inv(M) (y - x) + ln det M,    M = Mx + My
//! ```
//!
//! Node pruning replaces `My` by `lambda I`, where `lambda` is the largest
//! datum eigenvalue in the node, which under-estimates the quadratic term, and
//! bounds the log-determinant term from below with Fiedler's inequality
//! using the per-rank minimum datum eigenvalues.

use crate::covariance::{MahalanobisFactors, lift_covariance_2d};
use crate::errors::CovarianceError;
use crate::float_types::Real;
use crate::float_types::parry3d::query::PointQuery;
use crate::geometry::ellipsoid_intersects_obb;
use crate::pdtree::{DatumMatch, DatumSet, Node, SearchAlgorithm};
use nalgebra::{Matrix2, Matrix3, Point2, Point3, Vector3};

/// A measurement together with its noise model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MlpQuery {
    pub point: Point3<Real>,
    pub covariance: Matrix3<Real>,
    /// Factors of `covariance` alone, reused for datums without noise.
    pub factors: MahalanobisFactors,
}

impl MlpQuery {
    /// Validate `covariance` (symmetric, positive definite) and precompute
    /// its eigen decomposition.
    pub fn new(point: Point3<Real>, covariance: Matrix3<Real>) -> Result<Self, CovarianceError> {
        let factors = MahalanobisFactors::new(&covariance)?;
        Ok(Self {
            point,
            covariance,
            factors,
        })
    }

    /// Isotropic noise `variance * I`.
    pub fn isotropic(point: Point3<Real>, variance: Real) -> Result<Self, CovarianceError> {
        Self::new(point, Matrix3::identity() * variance)
    }

    /// A planar measurement against a segment set. The out-of-plane variance
    /// is 1 so the lifted covariance adds nothing to the log-determinant.
    pub fn planar(point: Point2<Real>, covariance: Matrix2<Real>) -> Result<Self, CovarianceError> {
        Self::new(
            Point3::new(point.x, point.y, 0.0),
            lift_covariance_2d(&covariance, 1.0),
        )
    }

    /// Eigenvalues of the measurement covariance, descending.
    #[inline]
    pub const fn eigenvalues(&self) -> &Vector3<Real> {
        &self.factors.eigenvalues
    }

    /// Lower bound on `ln det(Mx + My)` over every datum covariance `My`
    /// whose descending eigenvalues are at least `datum_rank_min` rank by rank.
    fn min_log_det(&self, datum_rank_min: &Vector3<Real>) -> Real {
        let ex = self.eigenvalues();
        // Fiedler: det(A + B) >= prod(a_i + b_i) with both sorted alike
        (0..3).map(|i| (ex[i] + datum_rank_min[i]).ln()).sum()
    }
}

/// Minimise the most-likely-point error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MostLikelyPoint;

impl<D: DatumSet + ?Sized> SearchAlgorithm<D> for MostLikelyPoint {
    type Query = MlpQuery;

    fn query_point(&self, query: &MlpQuery) -> Point3<Real> {
        query.point
    }

    fn node_might_be_closer(&self, _data: &D, query: &MlpQuery, node: &Node, bound: Real) -> bool {
        let node_error_bound = bound - query.min_log_det(&node.noise.eig_rank_min);
        if node_error_bound < 0.0 {
            return false;
        }

        // M_node = Mx + eig_max I shares the eigenvectors of Mx
        let values = query.eigenvalues().add_scalar(node.noise.eig_max);
        let node_factors = MahalanobisFactors::from_eigen(&values, &query.factors.eigenvectors);
        let d_min = 1.0 / values[0].sqrt();

        ellipsoid_intersects_obb(
            &query.point,
            &node.bounds,
            &node.frame,
            &node_factors.n,
            node_error_bound,
            d_min,
        )
    }

    fn datum_might_be_closer(&self, data: &D, query: &MlpQuery, datum: usize, bound: Real) -> bool {
        let eig = data.covariance_eigenvalues(datum);
        let min_log_det = query.min_log_det(&eig);
        if bound < min_log_det {
            return false;
        }
        // quadratic term is at least |y - x|^2 / lambda_max(Mx + My)
        let r2 = (bound - min_log_det) * (query.eigenvalues()[0] + eig[0]);
        let d = data.datum_aabb(datum).distance_to_local_point(&query.point, true);
        d * d <= r2
    }

    fn closest_point_on_datum(&self, data: &D, query: &MlpQuery, datum: usize) -> DatumMatch {
        let factors = if data.covariance_eigenvalues(datum)[0] > 0.0 {
            MahalanobisFactors::from_positive_definite(&(query.covariance + data.covariance(datum)))
        } else {
            query.factors
        };
        let (point, feature) = data.most_likely_point(datum, &query.point, &factors);
        DatumMatch {
            point,
            feature,
            error: factors.squared_norm(&(point - query.point)) + factors.log_det,
        }
    }
}
