use super::Feature;
use crate::covariance::MahalanobisFactors;
use crate::float_types::{Real, tolerance};
use nalgebra::Point3;

/// Closest point to `point` on the segment `a`-`b`.
///
/// A zero-length segment reports its first endpoint.
pub fn closest_point_on_segment(
    point: &Point3<Real>,
    a: &Point3<Real>,
    b: &Point3<Real>,
) -> (Point3<Real>, Feature) {
    let d = b - a;
    let len2 = d.norm_squared();
    if len2 <= tolerance() * tolerance() {
        return (*a, Feature::Vertex1);
    }
    let t = (point - a).dot(&d) / len2;
    if t <= 0.0 {
        (*a, Feature::Vertex1)
    } else if t >= 1.0 {
        (*b, Feature::Vertex2)
    } else {
        (a + d * t, Feature::Edge12)
    }
}

/// Squared distance from `point` to the segment `a`-`b`.
#[inline]
pub fn squared_distance_to_segment(
    point: &Point3<Real>,
    a: &Point3<Real>,
    b: &Point3<Real>,
) -> Real {
    let (c, _) = closest_point_on_segment(point, a, b);
    (c - point).norm_squared()
}

/// Most likely point on the segment `a`-`b` for a measurement at `point`
/// with Mahalanobis factors `factors`: warp the segment so the metric
/// becomes Euclidean, solve there, and map the answer back.
pub fn most_likely_point_on_segment(
    point: &Point3<Real>,
    a: &Point3<Real>,
    b: &Point3<Real>,
    factors: &MahalanobisFactors,
) -> (Point3<Real>, Feature) {
    let wa = Point3::from(factors.n * (a - point));
    let wb = Point3::from(factors.n * (b - point));
    let (c, feature) = closest_point_on_segment(&Point3::origin(), &wa, &wb);
    (point + factors.n_inv * c.coords, feature)
}
