mod support;

use nalgebra::{Matrix3, Point3};
use pdtree::{
    Feature, TriangleClosestPointSolver, TriangleMesh,
    covariance::MahalanobisFactors,
    float_types::Real,
    geometry::{closest_point_on_triangle, most_likely_point_on_triangle},
};

use crate::support::{
    approx_eq, parry_closest_point, random_covariance, random_point, rng, unit_right_triangle,
};

#[test]
fn feature_classification_on_unit_right_triangle() {
    let mesh = unit_right_triangle();
    let solver = TriangleClosestPointSolver::new(&mesh);

    let cases: [([Real; 3], [Real; 3], Feature); 7] = [
        ([1.0 / 3.0, 1.0 / 3.0, 2.0], [1.0 / 3.0, 1.0 / 3.0, 0.0], Feature::Interior),
        ([-1.0, -1.0, 0.5], [0.0, 0.0, 0.0], Feature::Vertex1),
        ([2.0, -0.5, -0.5], [1.0, 0.0, 0.0], Feature::Vertex2),
        ([-0.5, 2.0, 0.0], [0.0, 1.0, 0.0], Feature::Vertex3),
        ([0.5, -1.0, 1.0], [0.5, 0.0, 0.0], Feature::Edge12),
        ([-1.0, 0.5, -1.0], [0.0, 0.5, 0.0], Feature::Edge13),
        ([1.0, 1.0, 0.3], [0.5, 0.5, 0.0], Feature::Edge23),
    ];

    for (query, expected, feature) in cases {
        let q = Point3::new(query[0], query[1], query[2]);
        let e = Point3::new(expected[0], expected[1], expected[2]);

        let (p, f) = solver.closest_point(0, &q);
        assert_eq!(f, feature, "cached frame, query {q:?}");
        assert!((p - e).norm() < 1e-12, "cached frame, query {q:?}: {p:?}");

        let [a, b, c] = mesh.face_vertices(0);
        let (p, f) = closest_point_on_triangle(&q, &a, &b, &c);
        assert_eq!(f, feature, "explicit vertices, query {q:?}");
        assert!((p - e).norm() < 1e-12);
    }
}

#[test]
fn grid_of_queries_matches_parry() {
    let mesh = unit_right_triangle();
    let solver = TriangleClosestPointSolver::new(&mesh);
    for i in -4..=8 {
        for j in -4..=8 {
            for k in [-1.0, 0.0, 0.7] {
                let q = Point3::new(i as Real * 0.25, j as Real * 0.25, k);
                let (p, _) = solver.closest_point(0, &q);
                let oracle = parry_closest_point(&mesh, 0, &q);
                assert!((p - oracle).norm() < 1e-9, "query {q:?}: {p:?} vs {oracle:?}");
            }
        }
    }
}

#[test]
fn random_triangles_match_parry() {
    let mut rng = rng(7);
    for _ in 0..200 {
        let vertices = vec![
            random_point(&mut rng, 2.0),
            random_point(&mut rng, 2.0),
            random_point(&mut rng, 2.0),
        ];
        let mesh = TriangleMesh::new(vertices, vec![[0, 1, 2]]).expect("valid triangle");
        let solver = TriangleClosestPointSolver::new(&mesh);
        for _ in 0..20 {
            let q = random_point(&mut rng, 4.0);
            let (p, _) = solver.closest_point(0, &q);
            let oracle = parry_closest_point(&mesh, 0, &q);
            assert!(
                approx_eq((p - q).norm(), (oracle - q).norm(), 1e-9),
                "query {q:?}: {p:?} vs {oracle:?}"
            );
        }
    }
}

#[test]
fn permuting_vertices_relabels_features_but_keeps_the_point() {
    let a = Point3::new(0.0, 0.0, 0.0);
    let b = Point3::new(2.0, 0.0, 0.0);
    let c = Point3::new(0.0, 3.0, 1.0);
    let q = Point3::new(3.0, -1.0, 0.0);

    let (p1, f1) = closest_point_on_triangle(&q, &a, &b, &c);
    let (p2, f2) = closest_point_on_triangle(&q, &b, &c, &a);
    assert!((p1 - p2).norm() < 1e-12);
    assert_eq!(f1, Feature::Vertex2);
    assert_eq!(f2, Feature::Vertex1);
}

#[test]
fn collinear_triangle_falls_back_to_edges() {
    let mesh = TriangleMesh::new(
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(3.0, 3.0, 3.0),
        ],
        vec![[0, 1, 2]],
    )
    .expect("degenerate triangles are accepted");
    assert_eq!(mesh.face_normal(0).norm(), 0.0);

    let solver = TriangleClosestPointSolver::new(&mesh);
    assert!(solver.frame(0).is_none());

    let (p, f) = solver.closest_point(0, &Point3::new(5.0, 5.0, 5.0));
    assert!((p - Point3::new(3.0, 3.0, 3.0)).norm() < 1e-12);
    assert_eq!(f, Feature::Vertex3);

    let (p, f) = solver.closest_point(0, &Point3::new(2.0, 2.0, 2.0));
    assert!((p - Point3::new(2.0, 2.0, 2.0)).norm() < 1e-12);
    assert!(f.is_edge());
}

#[test]
fn isotropic_most_likely_point_is_the_closest_point() {
    let mut rng = rng(11);
    let factors = MahalanobisFactors::new(&(Matrix3::identity() * 0.3)).expect("positive definite");
    for _ in 0..200 {
        let [a, b, c] = [
            random_point(&mut rng, 1.0),
            random_point(&mut rng, 1.0),
            random_point(&mut rng, 1.0),
        ];
        let q = random_point(&mut rng, 3.0);
        let (p, f) = closest_point_on_triangle(&q, &a, &b, &c);
        let (m, g) = most_likely_point_on_triangle(&q, &a, &b, &c, &factors);
        assert!((p - m).norm() < 1e-9);
        assert_eq!(f, g);
    }
}

#[test]
fn most_likely_point_minimises_the_mahalanobis_distance() {
    let mut rng = rng(13);
    for _ in 0..50 {
        let [a, b, c] = [
            random_point(&mut rng, 1.0),
            random_point(&mut rng, 1.0),
            random_point(&mut rng, 1.0),
        ];
        let q = random_point(&mut rng, 2.0);
        let factors =
            MahalanobisFactors::new(&random_covariance(&mut rng, 0.05, 1.0)).expect("positive definite");
        let (m, _) = most_likely_point_on_triangle(&q, &a, &b, &c, &factors);
        let best = factors.squared_norm(&(m - q));

        // no barycentric sample does better
        for i in 0..=20 {
            for j in 0..=(20 - i) {
                let (u, v) = (i as Real / 20.0, j as Real / 20.0);
                let y = a + (b - a) * u + (c - a) * v;
                assert!(factors.squared_norm(&(y - q)) >= best - 1e-9);
            }
        }
    }
}
