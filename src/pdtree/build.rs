//! Recursive top-down tree construction.

#[cfg(feature = "parallel")]
use rayon::join;

use crate::covariance::{mean_and_covariance, principal_frame};
use crate::float_types::{Real, tolerance};
use crate::geometry::BoundingBox;
use crate::pdtree::node::{Node, NoiseBounds, OrientationStats, SplitPlane};
use crate::pdtree::traits::DatumSet;
use crate::pdtree::{BoundsMode, TreeParams};
use nalgebra::{IsometryMatrix3, Point3, Rotation3, Translation3, Vector3};

/// Below this many datums a node's own covariance is too poorly determined
/// to orient a box; it inherits its parent's axes instead.
const MIN_DATUMS_FOR_FRAME: usize = 5;

/// Subtrees smaller than this are built on the current thread.
#[cfg(feature = "parallel")]
const PARALLEL_MIN_DATUMS: usize = 1024;

/// Build the subtree over `indices`, which is the slice
/// `start..start + indices.len()` of the tree's index array. `indices` is
/// reordered in place so that every node owns a contiguous run.
pub(crate) fn build_subtree<D: DatumSet + ?Sized>(
    data: &D,
    indices: &mut [usize],
    start: usize,
    params: &TreeParams,
    parent_rotation: Option<&Rotation3<Real>>,
) -> Node {
    let count = indices.len();
    let (mean, cov) = mean_and_covariance(indices.iter().map(|&i| data.sort_point(i)));

    let frame = match params.bounds {
        BoundsMode::AxisAligned => IsometryMatrix3::identity(),
        BoundsMode::Oriented => match parent_rotation {
            Some(rotation) if count < MIN_DATUMS_FOR_FRAME => centred_frame(rotation, &mean),
            _ => principal_frame(&cov, &mean),
        },
    };

    let mut bounds = BoundingBox::empty();
    for &datum in indices.iter() {
        data.enlarge_bounds(&frame, datum, &mut bounds);
    }

    let mut node = Node {
        start,
        count,
        frame,
        bounds,
        split: None,
        left: None,
        right: None,
        depth: 0,
        orientation: None,
        noise: noise_bounds(data, indices),
    };

    if count <= params.count_threshold || bounds.diagonal_length() < params.diagonal_threshold {
        node.orientation = orientation_stats(data, indices, None);
        return node;
    }

    let split = match params.bounds {
        BoundsMode::Oriented => SplitPlane {
            origin: mean,
            normal: frame.inverse_transform_vector(&Vector3::x()),
        },
        BoundsMode::AxisAligned => {
            let mut normal = Vector3::zeros();
            normal[bounds.longest_axis()] = 1.0;
            SplitPlane {
                origin: mean,
                normal,
            }
        },
    };

    let top = partition(data, indices, &split);

    // node statistics need at least two datums on each side
    if top < 2 || count - top < 2 {
        node.orientation = orientation_stats(data, indices, None);
        return node;
    }

    let rotation = frame.rotation;
    let (left_indices, right_indices) = indices.split_at_mut(top);

    #[cfg(feature = "parallel")]
    let (left, right) = if count >= PARALLEL_MIN_DATUMS {
        join(
            || build_subtree(data, left_indices, start, params, Some(&rotation)),
            || build_subtree(data, right_indices, start + top, params, Some(&rotation)),
        )
    } else {
        (
            build_subtree(data, left_indices, start, params, Some(&rotation)),
            build_subtree(data, right_indices, start + top, params, Some(&rotation)),
        )
    };

    #[cfg(not(feature = "parallel"))]
    let (left, right) = (
        build_subtree(data, left_indices, start, params, Some(&rotation)),
        build_subtree(data, right_indices, start + top, params, Some(&rotation)),
    );

    node.depth = 1 + left.depth.max(right.depth);
    let children_sum = match (&left.orientation, &right.orientation) {
        (Some(l), Some(r)) => Some(l.sum + r.sum),
        _ => None,
    };
    node.orientation = orientation_stats(data, indices, children_sum);
    node.split = Some(split);
    node.left = Some(Box::new(left));
    node.right = Some(Box::new(right));
    node
}

/// `rotation` applied about a new origin at `mean`.
fn centred_frame(rotation: &Rotation3<Real>, mean: &Point3<Real>) -> IsometryMatrix3<Real> {
    let translation = Translation3::from(-(rotation * mean.coords));
    IsometryMatrix3::from_parts(translation, *rotation)
}

/// Single-pass in-place partition: datums on the positive side of `split`
/// are swapped to the end. Returns the index of the first such datum.
pub(crate) fn partition<D: DatumSet + ?Sized>(
    data: &D,
    indices: &mut [usize],
    split: &SplitPlane,
) -> usize {
    let mut top = indices.len();
    let mut k = 0;
    while k < top {
        if split.is_right(&data.sort_point(indices[k])) {
            loop {
                top -= 1;
                if top <= k {
                    break;
                }
                if !split.is_right(&data.sort_point(indices[top])) {
                    indices.swap(k, top);
                    break;
                }
            }
        }
        k += 1;
    }
    top
}

fn noise_bounds<D: DatumSet + ?Sized>(data: &D, indices: &[usize]) -> NoiseBounds {
    let mut eig_max: Real = 0.0;
    let mut eig_rank_min = Vector3::repeat(Real::MAX);
    for &datum in indices {
        let eig = data.covariance_eigenvalues(datum);
        eig_max = eig_max.max(eig[0]);
        eig_rank_min = eig_rank_min.inf(&eig);
    }
    NoiseBounds {
        eig_max,
        eig_rank_min,
    }
}

/// Normal-cone statistics over `indices`. `sum` is the precomputed sum of
/// the children's normals for interior nodes. Returns `None` as soon as any
/// datum has no normal.
fn orientation_stats<D: DatumSet + ?Sized>(
    data: &D,
    indices: &[usize],
    sum: Option<Vector3<Real>>,
) -> Option<OrientationStats> {
    let sum = match sum {
        Some(sum) => sum,
        None => {
            let mut sum = Vector3::zeros();
            for &datum in indices {
                sum += data.normal(datum)?;
            }
            sum
        },
    };
    let average = sum.try_normalize(tolerance()).unwrap_or_else(Vector3::z);

    let mut theta_max: Real = 0.0;
    for &datum in indices {
        let n = data.normal(datum)?;
        theta_max = theta_max.max(n.dot(&average).clamp(-1.0, 1.0).acos());
    }

    Some(OrientationStats {
        sum,
        average,
        theta_max,
    })
}
