#![cfg(feature = "stl-io")]

mod support;

use nalgebra::{Point3, Vector3};
use pdtree::{PdTree, TreeParams, TriangleMesh, io::IoError};

use crate::support::{approx_eq, cube};

#[test]
fn binary_stl_round_trip_keeps_the_surface() -> Result<(), Box<dyn std::error::Error>> {
    let mesh = cube(1.0);
    let bytes = mesh.to_stl_binary()?;
    // 80 byte header, triangle count, 50 bytes per facet
    assert_eq!(bytes.len(), 84 + 50 * 12);

    let read = TriangleMesh::from_stl(&bytes)?;
    assert_eq!(read.len(), 12);
    // coincident corners are merged while reading
    assert_eq!(read.vertices().len(), 8);

    let top = (0..read.len())
        .filter(|&tri| (read.face_normal(tri) - Vector3::z()).norm() < 1e-12)
        .count();
    assert_eq!(top, 2);

    let tree = PdTree::from_mesh(&read, TreeParams::default())?;
    let hit = tree.find_closest_point(&Point3::new(0.2, -0.1, 3.0));
    assert!(approx_eq(hit.distance, 2.0, 1e-12));
    Ok(())
}

#[test]
fn stl_file_on_disk() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::temp_dir().join(format!("pdtree_cube_{}.stl", std::process::id()));
    std::fs::write(&path, cube(0.5).to_stl_binary()?)?;
    let read = TriangleMesh::from_stl_file(&path);
    let _ = std::fs::remove_file(&path);
    assert_eq!(read?.len(), 12);

    assert!(matches!(
        TriangleMesh::from_stl_file(std::env::temp_dir().join("pdtree_missing.stl")),
        Err(IoError::StdIo(_))
    ));
    Ok(())
}

#[test]
fn garbage_is_rejected() {
    assert!(TriangleMesh::from_stl(b"definitely not an stl file").is_err());
}
