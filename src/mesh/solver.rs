//! Per-triangle closest-point solver with cached local frames.

use super::TriangleMesh;
use crate::covariance::MahalanobisFactors;
use crate::float_types::Real;
use crate::geometry::triangle::closest_point_on_degenerate_triangle;
use crate::geometry::{Feature, TriangleFrame, most_likely_point_on_triangle};
use nalgebra::Point3;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Caches one [`TriangleFrame`] per triangle of a mesh so every query pays
/// only for a transform and a handful of edge tests.
#[derive(Clone, Debug)]
pub struct TriangleClosestPointSolver<'a> {
    mesh: &'a TriangleMesh,
    /// `None` marks a degenerate triangle.
    frames: Vec<Option<TriangleFrame>>,
}

impl<'a> TriangleClosestPointSolver<'a> {
    pub fn new(mesh: &'a TriangleMesh) -> Self {
        let frame = |tri: usize| {
            let [a, b, c] = mesh.face_vertices(tri);
            TriangleFrame::new(&a, &b, &c)
        };

        #[cfg(feature = "parallel")]
        let frames: Vec<_> = (0..mesh.len()).into_par_iter().map(frame).collect();
        #[cfg(not(feature = "parallel"))]
        let frames: Vec<_> = (0..mesh.len()).map(frame).collect();

        let degenerate = frames.iter().filter(|f| f.is_none()).count();
        if degenerate > 0 {
            log::warn!(
                "closest point solver: {degenerate} of {} triangles are degenerate, using their edges",
                mesh.len()
            );
        }
        Self { mesh, frames }
    }

    pub const fn mesh(&self) -> &'a TriangleMesh {
        self.mesh
    }

    /// Cached frame of `tri`, `None` if the triangle is degenerate.
    pub fn frame(&self, tri: usize) -> Option<&TriangleFrame> {
        self.frames[tri].as_ref()
    }

    /// Euclidean closest point on triangle `tri` to `point`.
    pub fn closest_point(&self, tri: usize, point: &Point3<Real>) -> (Point3<Real>, Feature) {
        match &self.frames[tri] {
            Some(frame) => frame.closest_point(point),
            None => {
                let [a, b, c] = self.mesh.face_vertices(tri);
                closest_point_on_degenerate_triangle(point, &a, &b, &c)
            },
        }
    }

    /// Most likely point on triangle `tri` under the metric `factors`. The
    /// warp changes the triangle's shape, so cached frames do not apply.
    pub fn most_likely_point(
        &self,
        tri: usize,
        point: &Point3<Real>,
        factors: &MahalanobisFactors,
    ) -> (Point3<Real>, Feature) {
        let [a, b, c] = self.mesh.face_vertices(tri);
        most_likely_point_on_triangle(point, &a, &b, &c, factors)
    }
}
