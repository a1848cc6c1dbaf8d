//! Overlap test between a Mahalanobis ellipsoid and an oriented box.
//!
//! The ellipsoid `{y : |N (y - v)|^2 <= bound}` becomes a sphere of radius
//! `sqrt(bound)` around the origin once space is warped by `N`; the box turns
//! into a parallelepiped. The two overlap iff the squared distance from the
//! origin to the parallelepiped is at most `bound`, and that distance is
//! realised on one of the (at most three) faces visible from the origin.

use super::bounds::BoundingBox;
use super::segment::squared_distance_to_segment;
use crate::float_types::Real;
use nalgebra::{IsometryMatrix3, Matrix3, Point3, Vector3};

/// True if the ellipsoid centred at `v` with squared Mahalanobis radius
/// `node_error_bound` (metric `inv(M) = N'N`) overlaps the box `bounds`
/// expressed in `frame` (world -> box coordinates).
///
/// `d_min` is `1 / sqrt(lambda_max(M))`; `sqrt(node_error_bound) / d_min` is
/// then the radius of a sphere enclosing the ellipsoid, used for a quick
/// rejection before the exact test.
pub fn ellipsoid_intersects_obb(
    v: &Point3<Real>,
    bounds: &BoundingBox,
    frame: &IsometryMatrix3<Real>,
    n: &Matrix3<Real>,
    node_error_bound: Real,
    d_min: Real,
) -> bool {
    if node_error_bound < 0.0 {
        return false;
    }
    let radius = node_error_bound.sqrt() / d_min;
    let fv = frame.transform_point(v);

    // (axis, coordinate of the face plane) for every face the centre sees
    let mut visible: [(usize, Real); 3] = [(0, 0.0); 3];
    let mut num_visible = 0;
    for axis in 0..3 {
        if fv[axis] >= bounds.maxs[axis] {
            if fv[axis] > bounds.maxs[axis] + radius {
                return false;
            }
            visible[num_visible] = (axis, bounds.maxs[axis]);
            num_visible += 1;
        } else if fv[axis] <= bounds.mins[axis] {
            if fv[axis] < bounds.mins[axis] - radius {
                return false;
            }
            visible[num_visible] = (axis, bounds.mins[axis]);
            num_visible += 1;
        }
    }
    if num_visible == 0 {
        // centre inside the box
        return true;
    }

    // warped box: local point q maps to origin + axes * q
    let to_world = frame.inverse();
    let axes = n * to_world.rotation.matrix();
    let origin = n * (to_world.translation.vector - v.coords);
    let warp = |q: &Vector3<Real>| Point3::from(origin + axes * q);

    visible[..num_visible].iter().any(|&(axis, plane)| {
        let (a, b) = ((axis + 1) % 3, (axis + 2) % 3);
        let mut corner = bounds.mins.coords;
        corner[axis] = plane;
        let mut along_a = Vector3::zeros();
        along_a[a] = bounds.maxs[a] - bounds.mins[a];
        let mut along_b = Vector3::zeros();
        along_b[b] = bounds.maxs[b] - bounds.mins[b];

        let o = warp(&corner);
        let ea = axes * along_a;
        let eb = axes * along_b;
        squared_distance_to_parallelogram(&o, &ea, &eb) <= node_error_bound
    })
}

/// Squared distance from the origin to the parallelogram `o + s ea + t eb`,
/// `s, t` in `[0, 1]`.
fn squared_distance_to_parallelogram(
    o: &Point3<Real>,
    ea: &Vector3<Real>,
    eb: &Vector3<Real>,
) -> Real {
    let w = -o.coords;
    let aa = ea.norm_squared();
    let ab = ea.dot(eb);
    let bb = eb.norm_squared();
    let det = aa * bb - ab * ab;

    if det > Real::EPSILON * aa * bb {
        let wa = w.dot(ea);
        let wb = w.dot(eb);
        let s = (bb * wa - ab * wb) / det;
        let t = (aa * wb - ab * wa) / det;
        if (0.0..=1.0).contains(&s) && (0.0..=1.0).contains(&t) {
            return (o.coords + ea * s + eb * t).norm_squared();
        }
    }

    let origin = Point3::origin();
    let p1 = o + ea;
    let p2 = o + eb;
    let p3 = o + ea + eb;
    [
        squared_distance_to_segment(&origin, o, &p1),
        squared_distance_to_segment(&origin, o, &p2),
        squared_distance_to_segment(&origin, &p1, &p3),
        squared_distance_to_segment(&origin, &p2, &p3),
    ]
    .into_iter()
    .fold(Real::MAX, Real::min)
}
