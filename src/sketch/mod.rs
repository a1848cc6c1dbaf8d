//! Planar line segments.
//!
//! A `SegmentSet` lives in the z = 0 plane of the tree's 3D space: vertices,
//! normals and covariances are lifted with a zero z component, so the same
//! tree and strategies serve 2D contours and 3D meshes.

use crate::covariance::{MahalanobisFactors, lift_covariance_2d, validate_datum_covariance};
use crate::errors::{MeshError, TreeError};
use crate::float_types::parry3d::bounding_volume::Aabb;
use crate::float_types::{Real, tolerance};
use crate::geometry::{
    BoundingBox, Feature, closest_point_on_segment, most_likely_point_on_segment,
};
use crate::pdtree::{ClosestMatch, DatumSet, PdTree, TreeParams};
use nalgebra::{IsometryMatrix3, Matrix2, Matrix3, Point2, Point3, Vector2, Vector3};

#[inline]
fn lift(p: &Point2<Real>) -> Point3<Real> {
    Point3::new(p.x, p.y, 0.0)
}

/// Indexed 2D segments with one unit normal and one noise covariance each.
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentSet {
    vertices: Vec<Point2<Real>>,
    segments: Vec<[usize; 2]>,
    normals: Vec<Vector2<Real>>,
    covariances: Vec<Matrix2<Real>>,
    /// Eigenvalues of the lifted covariances, descending (the last is 0).
    covariance_eigenvalues: Vec<Vector3<Real>>,
}

impl SegmentSet {
    /// Build a segment set from a vertex list and vertex index pairs.
    ///
    /// The normal of segment `a -> b` points to its right, `(d.y, -d.x)` for
    /// `d = b - a`, so a counter-clockwise contour has outward normals.
    /// Zero-length segments get a zero normal.
    pub fn new(vertices: Vec<Point2<Real>>, segments: Vec<[usize; 2]>) -> Result<Self, MeshError> {
        if vertices.is_empty() || segments.is_empty() {
            return Err(MeshError::Empty);
        }
        if let Some(index) = vertices
            .iter()
            .position(|v| !v.coords.iter().all(|c| c.is_finite()))
        {
            return Err(MeshError::InvalidCoordinate { index });
        }
        for (datum, seg) in segments.iter().enumerate() {
            if let Some(&index) = seg.iter().find(|&&i| i >= vertices.len()) {
                return Err(MeshError::VertexIndexOutOfRange {
                    datum,
                    index,
                    vertex_count: vertices.len(),
                });
            }
        }

        let normals: Vec<Vector2<Real>> = segments
            .iter()
            .map(|&[a, b]| {
                let d = vertices[b] - vertices[a];
                Vector2::new(d.y, -d.x)
                    .try_normalize(tolerance())
                    .unwrap_or_else(Vector2::zeros)
            })
            .collect();
        let degenerate = normals.iter().filter(|n| n.norm_squared() == 0.0).count();
        if degenerate > 0 {
            log::warn!("segment set: {degenerate} segments have zero length");
        }

        let count = segments.len();
        Ok(Self {
            vertices,
            segments,
            normals,
            covariances: vec![Matrix2::zeros(); count],
            covariance_eigenvalues: vec![Vector3::zeros(); count],
        })
    }

    /// Closed polyline through `points` (last point joins the first).
    pub fn closed_contour(points: Vec<Point2<Real>>) -> Result<Self, MeshError> {
        let n = points.len();
        let segments = (0..n).map(|i| [i, (i + 1) % n]).collect();
        Self::new(points, segments)
    }

    /// Replace the derived normals. Normals are normalised; zero stays zero.
    pub fn with_normals(mut self, normals: Vec<Vector2<Real>>) -> Result<Self, MeshError> {
        if normals.len() != self.segments.len() {
            return Err(MeshError::LengthMismatch {
                what: "normals",
                expected: self.segments.len(),
                actual: normals.len(),
            });
        }
        if let Some(index) = normals.iter().position(|n| !n.iter().all(|c| c.is_finite())) {
            return Err(MeshError::InvalidCoordinate { index });
        }
        self.normals = normals
            .into_iter()
            .map(|n| n.try_normalize(tolerance()).unwrap_or_else(Vector2::zeros))
            .collect();
        Ok(self)
    }

    /// Variance `normal_var` across each segment and `in_line_var` along it.
    pub fn with_noise_model(self, in_line_var: Real, normal_var: Real) -> Result<Self, MeshError> {
        let covariances = self
            .normals
            .iter()
            .map(|n| {
                let n = if n.norm_squared() == 0.0 { Vector2::x() } else { *n };
                Matrix2::identity() * in_line_var + (n * n.transpose()) * (normal_var - in_line_var)
            })
            .collect();
        self.with_covariances(covariances)
    }

    /// Attach one positive semi-definite 2x2 covariance per segment.
    pub fn with_covariances(mut self, covariances: Vec<Matrix2<Real>>) -> Result<Self, MeshError> {
        if covariances.len() != self.segments.len() {
            return Err(MeshError::LengthMismatch {
                what: "covariances",
                expected: self.segments.len(),
                actual: covariances.len(),
            });
        }
        self.covariance_eigenvalues = covariances
            .iter()
            .map(|c| validate_datum_covariance(&lift_covariance_2d(c, 0.0)))
            .collect::<Result<_, _>>()?;
        self.covariances = covariances;
        Ok(self)
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn vertices(&self) -> &[Point2<Real>] {
        &self.vertices
    }

    pub fn segments(&self) -> &[[usize; 2]] {
        &self.segments
    }

    pub fn normal(&self, seg: usize) -> Vector2<Real> {
        self.normals[seg]
    }

    pub fn covariance(&self, seg: usize) -> Matrix2<Real> {
        self.covariances[seg]
    }

    pub fn endpoints(&self, seg: usize) -> [Point2<Real>; 2] {
        self.segments[seg].map(|i| self.vertices[i])
    }

    pub fn midpoint(&self, seg: usize) -> Point2<Real> {
        let [a, b] = self.endpoints(seg);
        Point2::from((a.coords + b.coords) * 0.5)
    }

    fn endpoints_3d(&self, seg: usize) -> [Point3<Real>; 2] {
        self.endpoints(seg).map(|p| lift(&p))
    }
}

impl DatumSet for SegmentSet {
    fn len(&self) -> usize {
        self.segments.len()
    }

    fn sort_point(&self, datum: usize) -> Point3<Real> {
        lift(&self.midpoint(datum))
    }

    fn enlarge_bounds(&self, frame: &IsometryMatrix3<Real>, datum: usize, bounds: &mut BoundingBox) {
        for p in &self.endpoints_3d(datum) {
            bounds.include(&frame.transform_point(p));
        }
    }

    fn datum_aabb(&self, datum: usize) -> Aabb {
        let b = BoundingBox::from_points(&self.endpoints_3d(datum));
        Aabb::new(b.mins, b.maxs)
    }

    fn normal(&self, datum: usize) -> Option<Vector3<Real>> {
        let n = self.normals[datum];
        Some(Vector3::new(n.x, n.y, 0.0))
    }

    fn covariance(&self, datum: usize) -> Matrix3<Real> {
        lift_covariance_2d(&self.covariances[datum], 0.0)
    }

    fn covariance_eigenvalues(&self, datum: usize) -> Vector3<Real> {
        self.covariance_eigenvalues[datum]
    }

    fn closest_point(&self, datum: usize, point: &Point3<Real>) -> (Point3<Real>, Feature) {
        let [a, b] = self.endpoints_3d(datum);
        closest_point_on_segment(point, &a, &b)
    }

    fn most_likely_point(
        &self,
        datum: usize,
        point: &Point3<Real>,
        factors: &MahalanobisFactors,
    ) -> (Point3<Real>, Feature) {
        let [a, b] = self.endpoints_3d(datum);
        most_likely_point_on_segment(point, &a, &b, factors)
    }
}

impl<'a> PdTree<&'a SegmentSet> {
    /// Index the segments of `segments`.
    pub fn from_segments(segments: &'a SegmentSet, params: TreeParams) -> Result<Self, TreeError> {
        Self::with_params(segments, params)
    }

    /// Euclidean closest point on the segment set to a planar point.
    pub fn find_closest_point_2d(&self, point: &Point2<Real>) -> ClosestMatch {
        self.find_closest_point(&lift(point))
    }
}
