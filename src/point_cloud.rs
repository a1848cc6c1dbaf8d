//! Point datums: a tree over a point cloud answers nearest-neighbour queries
//! with the same strategies used for meshes.

use crate::covariance::{MahalanobisFactors, point_covariance, validate_datum_covariance};
use crate::errors::MeshError;
use crate::float_types::parry3d::bounding_volume::Aabb;
use crate::float_types::{Real, tolerance};
use crate::geometry::{BoundingBox, Feature};
use crate::mesh::TriangleMesh;
use crate::pdtree::DatumSet;
use nalgebra::{IsometryMatrix3, Matrix3, Point3, Vector3};

/// A set of points with optional unit normals and per-point noise.
#[derive(Clone, Debug, PartialEq)]
pub struct PointCloud {
    points: Vec<Point3<Real>>,
    normals: Option<Vec<Vector3<Real>>>,
    covariances: Vec<Matrix3<Real>>,
    covariance_eigenvalues: Vec<Vector3<Real>>,
}

impl PointCloud {
    pub fn new(points: Vec<Point3<Real>>) -> Result<Self, MeshError> {
        if points.is_empty() {
            return Err(MeshError::Empty);
        }
        if let Some(index) = points
            .iter()
            .position(|p| !p.coords.iter().all(|c| c.is_finite()))
        {
            return Err(MeshError::InvalidCoordinate { index });
        }
        let count = points.len();
        Ok(Self {
            points,
            normals: None,
            covariances: vec![Matrix3::zeros(); count],
            covariance_eigenvalues: vec![Vector3::zeros(); count],
        })
    }

    /// One point per triangle centroid, carrying the face normal and the
    /// triangle's noise covariance.
    pub fn from_mesh(mesh: &TriangleMesh) -> Self {
        Self {
            points: (0..mesh.len()).map(|tri| mesh.centroid(tri)).collect(),
            normals: Some(mesh.face_normals().to_vec()),
            covariances: (0..mesh.len()).map(|tri| mesh.covariance(tri)).collect(),
            covariance_eigenvalues: (0..mesh.len())
                .map(|tri| mesh.covariance_eigenvalues(tri))
                .collect(),
        }
    }

    /// One point per triangle centroid with standard deviation `normal_sd`
    /// along the face normal. The in-plane variance of each point is the
    /// mean squared distance from the centroid to the triangle's vertices,
    /// so larger triangles give blurrier points.
    pub fn from_mesh_with_normal_noise(
        mesh: &TriangleMesh,
        normal_sd: Real,
    ) -> Result<Self, MeshError> {
        let normal_var = normal_sd * normal_sd;
        let mut points = Vec::with_capacity(mesh.len());
        let mut covariances = Vec::with_capacity(mesh.len());
        for tri in 0..mesh.len() {
            let centroid = mesh.centroid(tri);
            let in_plane_var = mesh
                .face_vertices(tri)
                .iter()
                .map(|v| (v - centroid).norm_squared())
                .sum::<Real>()
                / 3.0;
            points.push(centroid);
            covariances.push(point_covariance(&mesh.face_normal(tri), normal_var, in_plane_var));
        }
        Self::new(points)?
            .with_normals(mesh.face_normals().to_vec())?
            .with_covariances(covariances)
    }

    /// Attach one normal per point. Normals are normalised; zero stays zero.
    pub fn with_normals(mut self, normals: Vec<Vector3<Real>>) -> Result<Self, MeshError> {
        if normals.len() != self.points.len() {
            return Err(MeshError::LengthMismatch {
                what: "normals",
                expected: self.points.len(),
                actual: normals.len(),
            });
        }
        if let Some(index) = normals.iter().position(|n| !n.iter().all(|c| c.is_finite())) {
            return Err(MeshError::InvalidCoordinate { index });
        }
        self.normals = Some(
            normals
                .into_iter()
                .map(|n| n.try_normalize(tolerance()).unwrap_or_else(Vector3::zeros))
                .collect(),
        );
        Ok(self)
    }

    /// Surface noise aligned with each point's normal. Needs normals.
    pub fn with_noise_model(self, in_plane_var: Real, normal_var: Real) -> Result<Self, MeshError> {
        let normals = self.normals.as_ref().ok_or(MeshError::NormalsRequired)?;
        let covariances = normals
            .iter()
            .map(|n| point_covariance(n, normal_var, in_plane_var))
            .collect();
        self.with_covariances(covariances)
    }

    /// Attach one positive semi-definite covariance per point.
    pub fn with_covariances(mut self, covariances: Vec<Matrix3<Real>>) -> Result<Self, MeshError> {
        if covariances.len() != self.points.len() {
            return Err(MeshError::LengthMismatch {
                what: "covariances",
                expected: self.points.len(),
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

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point3<Real>] {
        &self.points
    }

    pub fn point(&self, i: usize) -> Point3<Real> {
        self.points[i]
    }

    pub fn normals(&self) -> Option<&[Vector3<Real>]> {
        self.normals.as_deref()
    }
}

impl DatumSet for PointCloud {
    fn len(&self) -> usize {
        self.points.len()
    }

    fn sort_point(&self, datum: usize) -> Point3<Real> {
        self.points[datum]
    }

    fn enlarge_bounds(&self, frame: &IsometryMatrix3<Real>, datum: usize, bounds: &mut BoundingBox) {
        bounds.include(&frame.transform_point(&self.points[datum]));
    }

    fn datum_aabb(&self, datum: usize) -> Aabb {
        Aabb::new(self.points[datum], self.points[datum])
    }

    fn normal(&self, datum: usize) -> Option<Vector3<Real>> {
        self.normals.as_ref().map(|n| n[datum])
    }

    fn covariance(&self, datum: usize) -> Matrix3<Real> {
        self.covariances[datum]
    }

    fn covariance_eigenvalues(&self, datum: usize) -> Vector3<Real> {
        self.covariance_eigenvalues[datum]
    }

    fn closest_point(&self, datum: usize, _point: &Point3<Real>) -> (Point3<Real>, Feature) {
        (self.points[datum], Feature::Vertex1)
    }

    fn most_likely_point(
        &self,
        datum: usize,
        _point: &Point3<Real>,
        _factors: &MahalanobisFactors,
    ) -> (Point3<Real>, Feature) {
        (self.points[datum], Feature::Vertex1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_triangles() -> TriangleMesh {
        TriangleMesh::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(3.0, 0.0, 0.0),
                Point3::new(0.0, 3.0, 0.0),
                Point3::new(0.0, 0.0, 1.0),
                Point3::new(0.0, 0.3, 1.0),
                Point3::new(0.0, 0.0, 1.3),
            ],
            vec![[0, 1, 2], [3, 4, 5]],
        )
        .expect("valid mesh")
    }

    fn is_descending(v: &Vector3<Real>) -> bool {
        v[0] >= v[1] && v[1] >= v[2]
    }

    #[test]
    fn from_mesh_copies_centroids_normals_and_noise() {
        let mesh = two_triangles().with_noise_model(0.5, 0.1).expect("valid variances");
        let cloud = PointCloud::from_mesh(&mesh);
        assert_eq!(cloud.len(), 2);
        assert_eq!(cloud.point(0), Point3::new(1.0, 1.0, 0.0));
        assert_eq!(cloud.normals(), Some(mesh.face_normals()));
        for i in 0..cloud.len() {
            assert_eq!(cloud.covariance(i), mesh.covariance(i));
            let eig = cloud.covariance_eigenvalues(i);
            assert!(is_descending(&eig));
            assert!((eig - Vector3::new(0.5, 0.5, 0.1)).norm() < 1e-9);
        }
    }

    #[test]
    fn normal_noise_scales_with_triangle_size() {
        let mesh = two_triangles();
        let cloud = PointCloud::from_mesh_with_normal_noise(&mesh, 0.5).expect("valid noise");

        // big triangle: in-plane variance (2 + 5 + 5) / 3 = 4 dominates 0.25
        let big = cloud.covariance_eigenvalues(0);
        assert!(is_descending(&big));
        assert!((big - Vector3::new(4.0, 4.0, 0.25)).norm() < 1e-9);
        let n = mesh.face_normal(0);
        assert!((n.dot(&(cloud.covariance(0) * n)) - 0.25).abs() < 1e-12);

        // small triangle: 0.04 in plane, the normal variance leads
        let small = cloud.covariance_eigenvalues(1);
        assert!(is_descending(&small));
        assert!((small - Vector3::new(0.25, 0.04, 0.04)).norm() < 1e-9);

        assert!(matches!(
            PointCloud::from_mesh_with_normal_noise(&mesh, Real::NAN),
            Err(MeshError::Covariance(_))
        ));
    }
}
