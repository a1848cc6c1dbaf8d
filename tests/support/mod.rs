//! Test support library
//! Mesh builders, random generators and a brute-force closest-point oracle.

use nalgebra::{Matrix3, Point3, Vector3};
use pdtree::float_types::{
    Real,
    parry3d::{query::PointQuery, shape::Triangle},
};
use pdtree::mesh::TriangleMesh;
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Quick helper to compare floating-point results with an acceptable tolerance.
pub fn approx_eq(a: Real, b: Real, eps: Real) -> bool {
    (a - b).abs() < eps
}

/// Seeded generator so failures reproduce.
pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Triangle (0,0,0), (1,0,0), (0,1,0).
pub fn unit_right_triangle() -> TriangleMesh {
    TriangleMesh::new(
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ],
        vec![[0, 1, 2]],
    )
    .expect("valid triangle")
}

/// Closed cube `[-half, half]^3` with outward winding, 12 triangles.
pub fn cube(half: Real) -> TriangleMesh {
    let h = half;
    let vertices = vec![
        Point3::new(-h, -h, -h),
        Point3::new(h, -h, -h),
        Point3::new(h, h, -h),
        Point3::new(-h, h, -h),
        Point3::new(-h, -h, h),
        Point3::new(h, -h, h),
        Point3::new(h, h, h),
        Point3::new(-h, h, h),
    ];
    let triangles = vec![
        [0, 2, 1],
        [0, 3, 2],
        [4, 5, 6],
        [4, 6, 7],
        [0, 1, 5],
        [0, 5, 4],
        [2, 3, 7],
        [2, 7, 6],
        [1, 2, 6],
        [1, 6, 5],
        [0, 4, 7],
        [0, 7, 3],
    ];
    TriangleMesh::new(vertices, triangles).expect("valid cube")
}

/// Regular grid of `n x n` quads (two triangles each) over `[0, 1]^2` at
/// height `z = f(x, y)`.
pub fn height_field(n: usize, f: impl Fn(Real, Real) -> Real) -> TriangleMesh {
    let mut vertices = Vec::with_capacity((n + 1) * (n + 1));
    for j in 0..=n {
        for i in 0..=n {
            let (x, y) = (i as Real / n as Real, j as Real / n as Real);
            vertices.push(Point3::new(x, y, f(x, y)));
        }
    }
    let mut triangles = Vec::with_capacity(2 * n * n);
    for j in 0..n {
        for i in 0..n {
            let a = j * (n + 1) + i;
            let (b, c, d) = (a + 1, a + n + 2, a + n + 1);
            triangles.push([a, b, c]);
            triangles.push([a, c, d]);
        }
    }
    TriangleMesh::new(vertices, triangles).expect("valid height field")
}

pub fn random_point(rng: &mut StdRng, extent: Real) -> Point3<Real> {
    Point3::new(
        rng.gen_range(-extent..extent),
        rng.gen_range(-extent..extent),
        rng.gen_range(-extent..extent),
    )
}

pub fn random_unit_vector(rng: &mut StdRng) -> Vector3<Real> {
    loop {
        let v = random_point(rng, 1.0).coords;
        if let Some(n) = v.try_normalize(1e-3) {
            return n;
        }
    }
}

/// `count` independent triangles with centres in `[-extent, extent]^3` and
/// edges up to about `size` long.
pub fn random_soup(rng: &mut StdRng, count: usize, extent: Real, size: Real) -> TriangleMesh {
    let mut vertices = Vec::with_capacity(3 * count);
    for _ in 0..count {
        let centre = random_point(rng, extent);
        for _ in 0..3 {
            vertices.push(centre + random_point(rng, size).coords);
        }
    }
    let triangles = (0..count).map(|i| [3 * i, 3 * i + 1, 3 * i + 2]).collect();
    TriangleMesh::new(vertices, triangles).expect("valid soup")
}

/// Random symmetric positive definite matrix with eigenvalues in roughly
/// `[min_var, min_var + scale]`.
pub fn random_covariance(rng: &mut StdRng, min_var: Real, scale: Real) -> Matrix3<Real> {
    let a = Matrix3::<Real>::from_fn(|_, _| rng.gen_range(-1.0..1.0)) * scale.sqrt();
    a * a.transpose() / 3.0 + Matrix3::identity() * min_var
}

/// Closest point on triangle `tri` computed by parry.
pub fn parry_closest_point(mesh: &TriangleMesh, tri: usize, p: &Point3<Real>) -> Point3<Real> {
    let [a, b, c] = mesh.face_vertices(tri);
    Triangle::new(a, b, c).project_local_point(p, true).point
}

/// Brute-force scan over every triangle with parry: `(triangle, distance)`.
pub fn brute_force_closest(mesh: &TriangleMesh, p: &Point3<Real>) -> (usize, Real) {
    (0..mesh.len())
        .map(|tri| (tri, (parry_closest_point(mesh, tri, p) - p).norm()))
        .fold((0, Real::MAX), |best, cur| if cur.1 < best.1 { cur } else { best })
}
