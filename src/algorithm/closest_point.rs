//! Plain Euclidean closest-point search.

use crate::float_types::Real;
use crate::float_types::parry3d::query::PointQuery;
use crate::pdtree::{DatumMatch, DatumSet, Node, SearchAlgorithm};
use nalgebra::Point3;

/// Minimise the squared Euclidean distance between the query point and the
/// datum set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClosestPoint;

impl<D: DatumSet + ?Sized> SearchAlgorithm<D> for ClosestPoint {
    type Query = Point3<Real>;

    fn query_point(&self, query: &Point3<Real>) -> Point3<Real> {
        *query
    }

    fn node_might_be_closer(&self, _data: &D, query: &Point3<Real>, node: &Node, bound: Real) -> bool {
        let local = node.frame.transform_point(query);
        node.bounds.squared_distance(&local) <= bound
    }

    fn datum_might_be_closer(
        &self,
        data: &D,
        query: &Point3<Real>,
        datum: usize,
        bound: Real,
    ) -> bool {
        let d = data.datum_aabb(datum).distance_to_local_point(query, true);
        d * d <= bound
    }

    fn closest_point_on_datum(&self, data: &D, query: &Point3<Real>, datum: usize) -> DatumMatch {
        let (point, feature) = data.closest_point(datum, query);
        DatumMatch {
            point,
            feature,
            error: (point - query).norm_squared(),
        }
    }
}
