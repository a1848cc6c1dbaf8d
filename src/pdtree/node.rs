//! PD tree node data structure

use crate::float_types::Real;
use crate::geometry::BoundingBox;
use nalgebra::{IsometryMatrix3, Point3, Vector3};
use std::ops::Range;

/// Plane separating the two children of an interior node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitPlane {
    pub origin: Point3<Real>,
    pub normal: Vector3<Real>,
}

impl SplitPlane {
    /// Datums whose sort point lies strictly on the positive side go right.
    #[inline]
    pub fn is_right(&self, p: &Point3<Real>) -> bool {
        self.normal.dot(&(p - self.origin)) > 0.0
    }
}

/// Normal-cone statistics of the datums below a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientationStats {
    /// Sum of the unit normals.
    pub sum: Vector3<Real>,
    /// Normalised `sum`, or +z when the normals cancel out.
    pub average: Vector3<Real>,
    /// Largest angle between `average` and any datum normal.
    pub theta_max: Real,
}

/// Bounds on the datum noise covariances below a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseBounds {
    /// Largest covariance eigenvalue of any datum.
    pub eig_max: Real,
    /// Per-rank minimum of the descending covariance eigenvalues.
    pub eig_rank_min: Vector3<Real>,
}

impl Default for NoiseBounds {
    fn default() -> Self {
        Self {
            eig_max: 0.0,
            eig_rank_min: Vector3::zeros(),
        }
    }
}

/// A PD tree node: a contiguous run `start..start + count` of the tree's
/// datum index array, a box enclosing those datums in the node frame, and
/// either two children or none.
#[derive(Debug, Clone)]
pub struct Node {
    pub start: usize,
    pub count: usize,

    /// World -> node coordinates. Identity for axis-aligned trees.
    pub frame: IsometryMatrix3<Real>,
    /// Bounds of every datum in this node, in `frame`.
    pub bounds: BoundingBox,

    /// Split used to partition the children, **None** for leaves.
    pub split: Option<SplitPlane>,
    pub left: Option<Box<Node>>,
    pub right: Option<Box<Node>>,

    /// Height of the subtree; 0 for leaves.
    pub depth: usize,
    /// Present when every datum carries a normal.
    pub orientation: Option<OrientationStats>,
    pub noise: NoiseBounds,
}

impl Node {
    #[inline]
    pub const fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    /// Range of the tree's index array owned by this node.
    #[inline]
    pub const fn range(&self) -> Range<usize> {
        self.start..self.start + self.count
    }

    /// Both children of an interior node.
    pub fn children(&self) -> Option<(&Node, &Node)> {
        match (&self.left, &self.right) {
            (Some(left), Some(right)) => Some((&**left, &**right)),
            _ => None,
        }
    }

    /// Child on the side of `p` according to the split plane.
    pub fn child_for(&self, p: &Point3<Real>) -> Option<&Node> {
        let split = self.split.as_ref()?;
        let (left, right) = self.children()?;
        Some(if split.is_right(p) { right } else { left })
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn subtree_size(&self) -> usize {
        1 + self.children().map_or(0, |(l, r)| l.subtree_size() + r.subtree_size())
    }

    /// Push every leaf of this subtree onto `out`, left to right.
    pub fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Node>) {
        match self.children() {
            Some((left, right)) => {
                left.collect_leaves(out);
                right.collect_leaves(out);
            },
            None => out.push(self),
        }
    }
}
