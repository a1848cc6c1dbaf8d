//! Closest point on a triangle.
//!
//! The triangle is moved into a local frame where vertex 1 sits at the
//! origin, vertex 2 on the +y axis and vertex 3 in the xy-plane with positive
//! x. Locating the closest point then reduces to classifying the projected
//! query against the Voronoi regions of the triangle's edges and corners in
//! 2D (M. W. Jones, "3D Distance from a Point to a Triangle", CSR-5-95).

use super::Feature;
use super::segment::closest_point_on_segment;
use crate::covariance::MahalanobisFactors;
use crate::float_types::{Real, tolerance};
use nalgebra::{IsometryMatrix3, Matrix3, Point2, Point3, Rotation3, Translation3, Vector2};

/// Edge function: signed area spanned by `p - origin` and `dir`.
#[inline]
fn edge(p: &Point2<Real>, origin: &Point2<Real>, dir: &Vector2<Real>) -> Real {
    (p - origin).perp(dir)
}

/// Per-triangle precomputation for repeated closest-point queries.
#[derive(Debug, Clone, PartialEq)]
pub struct TriangleFrame {
    /// world -> local
    pub to_local: IsometryMatrix3<Real>,
    /// local -> world
    pub to_world: IsometryMatrix3<Real>,
    /// vertex 2 in local coordinates (x is always 0)
    pub p2: Point2<Real>,
    /// vertex 3 in local coordinates (x is always positive)
    pub p3: Point2<Real>,
    /// unit direction 1 -> 3
    pub dir13: Vector2<Real>,
    /// unit direction 2 -> 3
    pub dir23: Vector2<Real>,
    /// outward normal of edge 1-3 (not normalised); edge 1-2 always has (-1, 0)
    pub out13: Vector2<Real>,
    /// outward normal of edge 2-3
    pub out23: Vector2<Real>,
}

impl TriangleFrame {
    /// Precompute the local frame of triangle `v1`, `v2`, `v3`.
    ///
    /// Returns `None` for degenerate triangles (coincident or collinear
    /// vertices), for which no such frame exists.
    pub fn new(v1: &Point3<Real>, v2: &Point3<Real>, v3: &Point3<Real>) -> Option<Self> {
        let tol = tolerance();
        let y_axis = (v2 - v1).try_normalize(tol)?;
        let d13 = (v3 - v1).try_normalize(tol)?;
        let z_axis = d13.cross(&y_axis).try_normalize(tol)?;
        let x_axis = y_axis.cross(&z_axis);

        let r = Matrix3::from_rows(&[x_axis.transpose(), y_axis.transpose(), z_axis.transpose()]);
        let rotation = Rotation3::from_matrix_unchecked(r);
        let translation = Translation3::from(-(rotation * v1.coords));
        let to_local = IsometryMatrix3::from_parts(translation, rotation);
        let to_world = to_local.inverse();

        let l2 = to_local.transform_point(v2);
        let l3 = to_local.transform_point(v3);
        let p2 = Point2::new(l2.x, l2.y);
        let p3 = Point2::new(l3.x, l3.y);

        let dir13 = p3.coords.normalize();
        let dir23 = (p3 - p2).try_normalize(tol)?;
        let out13 = Vector2::new(p3.y, -p3.x);
        let out23 = Vector2::new(-dir23.y, dir23.x);

        Some(Self {
            to_local,
            to_world,
            p2,
            p3,
            dir13,
            dir23,
            out13,
            out23,
        })
    }

    /// Closest point on the triangle to `point`, in world coordinates.
    pub fn closest_point(&self, point: &Point3<Real>) -> (Point3<Real>, Feature) {
        let (local, feature) = self.closest_point_local(point);
        (self.to_world.transform_point(&local), feature)
    }

    fn closest_point_local(&self, point: &Point3<Real>) -> (Point3<Real>, Feature) {
        let p1 = Point2::origin();
        let (p2, p3) = (self.p2, self.p3);
        let local = self.to_local.transform_point(point);
        let pt = Point2::new(local.x, local.y);
        let lift = |p: Point2<Real>| Point3::new(p.x, p.y, 0.0);

        // edge 1-2 lies on the y axis
        if pt.x <= 0.0 {
            if pt.y <= 0.0 {
                if edge(&pt, &p1, &self.out13) >= 0.0 {
                    return (lift(p1), Feature::Vertex1);
                }
            } else if pt.y >= p2.y {
                if edge(&pt, &p2, &self.out23) <= 0.0 {
                    return (lift(p2), Feature::Vertex2);
                }
            } else {
                return (Point3::new(0.0, pt.y, 0.0), Feature::Edge12);
            }
        }

        // edge 1-3
        if edge(&pt, &p1, &self.dir13) >= 0.0 {
            if edge(&pt, &p1, &self.out13) >= 0.0 {
                return (lift(p1), Feature::Vertex1);
            } else if edge(&pt, &p3, &self.out13) <= 0.0 {
                if edge(&pt, &p3, &self.out23) >= 0.0 {
                    return (lift(p3), Feature::Vertex3);
                }
            } else {
                let proj = self.dir13 * pt.coords.dot(&self.dir13);
                return (Point3::new(proj.x, proj.y, 0.0), Feature::Edge13);
            }
        }

        // edge 2-3
        if edge(&pt, &p2, &self.dir23) <= 0.0 {
            if edge(&pt, &p2, &self.out23) <= 0.0 {
                return (lift(p2), Feature::Vertex2);
            } else if edge(&pt, &p3, &self.out23) >= 0.0 {
                return (lift(p3), Feature::Vertex3);
            }
            let proj = p2 + self.dir23 * (pt - p2).dot(&self.dir23);
            return (lift(proj), Feature::Edge23);
        }

        (Point3::new(pt.x, pt.y, 0.0), Feature::Interior)
    }
}

/// Closest point on the triangle `v1`, `v2`, `v3` to `point`, building the
/// local frame on the fly.
///
/// Degenerate triangles have no interior; for those the closest point over
/// the three edges is returned.
pub fn closest_point_on_triangle(
    point: &Point3<Real>,
    v1: &Point3<Real>,
    v2: &Point3<Real>,
    v3: &Point3<Real>,
) -> (Point3<Real>, Feature) {
    match TriangleFrame::new(v1, v2, v3) {
        Some(frame) => frame.closest_point(point),
        None => closest_point_on_degenerate_triangle(point, v1, v2, v3),
    }
}

/// Closest point over the three edges of a triangle.
pub fn closest_point_on_degenerate_triangle(
    point: &Point3<Real>,
    v1: &Point3<Real>,
    v2: &Point3<Real>,
    v3: &Point3<Real>,
) -> (Point3<Real>, Feature) {
    let relabel = |f: Feature, first: Feature, second: Feature, edge: Feature| match f {
        Feature::Vertex1 => first,
        Feature::Vertex2 => second,
        _ => edge,
    };

    let (c12, f12) = closest_point_on_segment(point, v1, v2);
    let (c13, f13) = closest_point_on_segment(point, v1, v3);
    let (c23, f23) = closest_point_on_segment(point, v2, v3);
    let candidates = [
        (c12, relabel(f12, Feature::Vertex1, Feature::Vertex2, Feature::Edge12)),
        (c13, relabel(f13, Feature::Vertex1, Feature::Vertex3, Feature::Edge13)),
        (c23, relabel(f23, Feature::Vertex2, Feature::Vertex3, Feature::Edge23)),
    ];

    let mut best = candidates[0];
    let mut best_d2 = (best.0 - point).norm_squared();
    for candidate in &candidates[1..] {
        let d2 = (candidate.0 - point).norm_squared();
        if d2 < best_d2 {
            best = *candidate;
            best_d2 = d2;
        }
    }
    best
}

/// Most likely point on triangle `v1`, `v2`, `v3` for a measurement at
/// `point` under the Mahalanobis metric described by `factors`.
///
/// The triangle is translated so the measurement sits at the origin and
/// warped by `N`, which turns the metric ellipsoid into a sphere. The
/// Euclidean closest point to the origin on the warped triangle is then
/// mapped back through `N^-1`. Affine maps preserve the feature tag.
pub fn most_likely_point_on_triangle(
    point: &Point3<Real>,
    v1: &Point3<Real>,
    v2: &Point3<Real>,
    v3: &Point3<Real>,
    factors: &MahalanobisFactors,
) -> (Point3<Real>, Feature) {
    let w1 = Point3::from(factors.n * (v1 - point));
    let w2 = Point3::from(factors.n * (v2 - point));
    let w3 = Point3::from(factors.n * (v3 - point));
    let (c, feature) = closest_point_on_triangle(&Point3::origin(), &w1, &w2, &w3);
    (point + factors.n_inv * c.coords, feature)
}
