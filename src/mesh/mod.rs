//! `TriangleMesh` struct, its noise model, and the `MeshDatums` view that
//! lets a [`PdTree`](crate::pdtree::PdTree) index its triangles.

use crate::covariance::{MahalanobisFactors, point_covariance, validate_datum_covariance};
use crate::errors::{MeshError, TreeError};
use crate::float_types::parry3d::bounding_volume::Aabb;
use crate::float_types::{Real, tolerance};
use crate::geometry::{BoundingBox, Feature};
use crate::pdtree::{DatumSet, PdTree, TreeParams};
use nalgebra::{IsometryMatrix3, Matrix3, Point3, Vector3};
use std::sync::OnceLock;

pub mod solver;

pub use solver::TriangleClosestPointSolver;

/// An indexed triangle mesh with one unit normal and one noise covariance
/// per triangle.
#[derive(Clone, Debug)]
pub struct TriangleMesh {
    vertices: Vec<Point3<Real>>,
    triangles: Vec<[usize; 3]>,
    face_normals: Vec<Vector3<Real>>,
    covariances: Vec<Matrix3<Real>>,
    covariance_eigenvalues: Vec<Vector3<Real>>,

    /// Lazily calculated box that spans `vertices`.
    bounding_box: OnceLock<BoundingBox>,
}

impl TriangleMesh {
    /// Build a mesh from a vertex list and vertex index triples.
    ///
    /// Face normals follow the winding `v1 -> v2 -> v3`. Degenerate triangles
    /// are kept (searches fall back to their edges) but get a zero normal.
    /// Every triangle starts without noise (zero covariance).
    pub fn new(
        vertices: Vec<Point3<Real>>,
        triangles: Vec<[usize; 3]>,
    ) -> Result<Self, MeshError> {
        if vertices.is_empty() || triangles.is_empty() {
            return Err(MeshError::Empty);
        }
        if let Some(index) = vertices
            .iter()
            .position(|v| !v.coords.iter().all(|c| c.is_finite()))
        {
            return Err(MeshError::InvalidCoordinate { index });
        }
        for (datum, tri) in triangles.iter().enumerate() {
            if let Some(&index) = tri.iter().find(|&&i| i >= vertices.len()) {
                return Err(MeshError::VertexIndexOutOfRange {
                    datum,
                    index,
                    vertex_count: vertices.len(),
                });
            }
        }

        let mut degenerate = 0usize;
        let face_normals: Vec<Vector3<Real>> = triangles
            .iter()
            .map(|&[a, b, c]| {
                let n = (vertices[b] - vertices[a]).cross(&(vertices[c] - vertices[a]));
                n.try_normalize(tolerance()).unwrap_or_else(|| {
                    degenerate += 1;
                    Vector3::zeros()
                })
            })
            .collect();
        if degenerate > 0 {
            log::warn!("triangle mesh: {degenerate} degenerate triangles have no face normal");
        }

        let count = triangles.len();
        Ok(Self {
            vertices,
            triangles,
            face_normals,
            covariances: vec![Matrix3::zeros(); count],
            covariance_eigenvalues: vec![Vector3::zeros(); count],
            bounding_box: OnceLock::new(),
        })
    }

    /// Replace the winding-derived normals. Normals are normalised; a zero
    /// normal stays zero.
    pub fn with_face_normals(mut self, normals: Vec<Vector3<Real>>) -> Result<Self, MeshError> {
        if normals.len() != self.triangles.len() {
            return Err(MeshError::LengthMismatch {
                what: "face normals",
                expected: self.triangles.len(),
                actual: normals.len(),
            });
        }
        if let Some(index) = normals.iter().position(|n| !n.iter().all(|c| c.is_finite())) {
            return Err(MeshError::InvalidCoordinate { index });
        }
        self.face_normals = normals
            .into_iter()
            .map(|n| n.try_normalize(tolerance()).unwrap_or_else(Vector3::zeros))
            .collect();
        Ok(self)
    }

    /// Give every triangle the surface noise model: variance `normal_var`
    /// along its face normal and `in_plane_var` in its plane.
    pub fn with_noise_model(self, in_plane_var: Real, normal_var: Real) -> Result<Self, MeshError> {
        let covariances = self
            .face_normals
            .iter()
            .map(|n| point_covariance(n, normal_var, in_plane_var))
            .collect();
        self.with_covariances(covariances)
    }

    /// Attach one positive semi-definite covariance per triangle.
    pub fn with_covariances(mut self, covariances: Vec<Matrix3<Real>>) -> Result<Self, MeshError> {
        if covariances.len() != self.triangles.len() {
            return Err(MeshError::LengthMismatch {
                what: "covariances",
                expected: self.triangles.len(),
                actual: covariances.len(),
            });
        }
        self.covariance_eigenvalues = covariances
            .iter()
            .map(validate_datum_covariance)
            .collect::<Result<_, _>>()?;
        self.covariances = covariances;
        Ok(self)
    }

    /// Number of triangles.
    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn vertices(&self) -> &[Point3<Real>] {
        &self.vertices
    }

    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    pub fn face_normals(&self) -> &[Vector3<Real>] {
        &self.face_normals
    }

    pub fn face_normal(&self, tri: usize) -> Vector3<Real> {
        self.face_normals[tri]
    }

    pub fn covariance(&self, tri: usize) -> Matrix3<Real> {
        self.covariances[tri]
    }

    /// Eigenvalues of the triangle's covariance, descending.
    pub fn covariance_eigenvalues(&self, tri: usize) -> Vector3<Real> {
        self.covariance_eigenvalues[tri]
    }

    pub fn face_vertices(&self, tri: usize) -> [Point3<Real>; 3] {
        self.triangles[tri].map(|i| self.vertices[i])
    }

    pub fn centroid(&self, tri: usize) -> Point3<Real> {
        let [a, b, c] = self.face_vertices(tri);
        Point3::from((a.coords + b.coords + c.coords) / 3.0)
    }

    /// World-axis box around every vertex.
    pub fn bounding_box(&self) -> BoundingBox {
        *self
            .bounding_box
            .get_or_init(|| BoundingBox::from_points(&self.vertices))
    }
}

/// A [`TriangleMesh`] paired with its per-triangle solver, ready to be indexed
/// by a tree.
#[derive(Clone, Debug)]
pub struct MeshDatums<'a> {
    mesh: &'a TriangleMesh,
    solver: TriangleClosestPointSolver<'a>,
}

impl<'a> MeshDatums<'a> {
    pub fn new(mesh: &'a TriangleMesh) -> Self {
        Self {
            mesh,
            solver: TriangleClosestPointSolver::new(mesh),
        }
    }

    pub const fn mesh(&self) -> &'a TriangleMesh {
        self.mesh
    }

    pub const fn solver(&self) -> &TriangleClosestPointSolver<'a> {
        &self.solver
    }
}

impl DatumSet for MeshDatums<'_> {
    fn len(&self) -> usize {
        self.mesh.len()
    }

    fn sort_point(&self, datum: usize) -> Point3<Real> {
        self.mesh.centroid(datum)
    }

    fn enlarge_bounds(&self, frame: &IsometryMatrix3<Real>, datum: usize, bounds: &mut BoundingBox) {
        for v in &self.mesh.face_vertices(datum) {
            bounds.include(&frame.transform_point(v));
        }
    }

    fn datum_aabb(&self, datum: usize) -> Aabb {
        let b = BoundingBox::from_points(&self.mesh.face_vertices(datum));
        Aabb::new(b.mins, b.maxs)
    }

    fn normal(&self, datum: usize) -> Option<Vector3<Real>> {
        Some(self.mesh.face_normal(datum))
    }

    fn covariance(&self, datum: usize) -> Matrix3<Real> {
        self.mesh.covariance(datum)
    }

    fn covariance_eigenvalues(&self, datum: usize) -> Vector3<Real> {
        self.mesh.covariance_eigenvalues(datum)
    }

    fn closest_point(&self, datum: usize, point: &Point3<Real>) -> (Point3<Real>, Feature) {
        self.solver.closest_point(datum, point)
    }

    fn most_likely_point(
        &self,
        datum: usize,
        point: &Point3<Real>,
        factors: &MahalanobisFactors,
    ) -> (Point3<Real>, Feature) {
        self.solver.most_likely_point(datum, point, factors)
    }
}

impl<'a> PdTree<MeshDatums<'a>> {
    /// Index the triangles of `mesh`.
    pub fn from_mesh(mesh: &'a TriangleMesh, params: TreeParams) -> Result<Self, TreeError> {
        Self::with_params(MeshDatums::new(mesh), params)
    }

    pub fn mesh(&self) -> &'a TriangleMesh {
        self.data().mesh()
    }
}
