use super::IoError;
use crate::float_types::Real;
use crate::mesh::TriangleMesh;
use nalgebra::Point3;
use std::io::Cursor;
use std::path::Path;

impl TriangleMesh {
    /// Read a mesh from ASCII or binary STL data.
    ///
    /// `stl_io` merges coincident vertices while reading, so the result is
    /// indexed. Facet normals stored in the file are ignored in favour of the
    /// winding order.
    pub fn from_stl(stl_data: &[u8]) -> Result<Self, IoError> {
        let mut cursor = Cursor::new(stl_data);
        let indexed = stl_io::read_stl(&mut cursor)?;

        let vertices = indexed
            .vertices
            .iter()
            .map(|v| Point3::new(v[0] as Real, v[1] as Real, v[2] as Real))
            .collect();
        let triangles = indexed.faces.iter().map(|face| face.vertices).collect();
        Ok(Self::new(vertices, triangles)?)
    }

    /// Read a mesh from an STL file on disk.
    pub fn from_stl_file<P: AsRef<Path>>(path: P) -> Result<Self, IoError> {
        let data = std::fs::read(path)?;
        Self::from_stl(&data)
    }

    /// Encode the mesh as binary STL.
    pub fn to_stl_binary(&self) -> std::io::Result<Vec<u8>> {
        use stl_io::{Normal, Triangle, Vertex, write_stl};

        #[allow(clippy::unnecessary_cast)]
        let triangles: Vec<Triangle> = (0..self.len())
            .map(|tri| {
                let n = self.face_normal(tri);
                Triangle {
                    normal: Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                    vertices: self
                        .face_vertices(tri)
                        .map(|p| Vertex::new([p.x as f32, p.y as f32, p.z as f32])),
                }
            })
            .collect();

        let mut cursor = Cursor::new(Vec::new());
        write_stl(&mut cursor, triangles.iter())?;
        Ok(cursor.into_inner())
    }
}
