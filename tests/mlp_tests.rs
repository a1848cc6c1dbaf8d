mod support;

use nalgebra::{Matrix3, Point3, Vector3};
use pdtree::{
    BoundsMode, CovarianceError, MlpQuery, MostLikelyPoint, PdTree, TreeParams, float_types::Real,
};

use crate::support::{
    approx_eq, random_covariance, random_point, random_soup, random_unit_vector, rng,
};

fn close(a: Real, b: Real) -> bool {
    approx_eq(a, b, 1e-8 * a.abs().max(b.abs()).max(1.0))
}

#[test]
fn isotropic_noise_reduces_to_closest_point() {
    let mut rng = rng(21);
    let mesh = random_soup(&mut rng, 300, 6.0, 1.0);
    let tree = PdTree::from_mesh(&mesh, TreeParams::default()).expect("tree");
    let variance: Real = 0.5;

    for _ in 0..100 {
        let q = random_point(&mut rng, 8.0);
        let query = MlpQuery::isotropic(q, variance).expect("positive variance");
        let mlp = tree.search(&MostLikelyPoint, &query);
        let euclid = tree.find_closest_point(&q);

        assert!(approx_eq(mlp.distance, euclid.distance, 1e-9));
        let expected = euclid.distance.powi(2) / variance + 3.0 * variance.ln();
        assert!(close(mlp.error, expected), "{} vs {}", mlp.error, expected);
    }
}

#[test]
fn randomized_search_matches_linear_scan_with_surface_noise() {
    let mut rng = rng(22);
    let mesh = random_soup(&mut rng, 300, 6.0, 1.0)
        .with_noise_model(0.01, 0.2)
        .expect("valid variances");

    for bounds in [BoundsMode::Oriented, BoundsMode::AxisAligned] {
        let params = TreeParams::default().with_count_threshold(4).with_bounds(bounds);
        let tree = PdTree::from_mesh(&mesh, params).expect("tree");
        for _ in 0..100 {
            let q = random_point(&mut rng, 7.0);
            let cov = random_covariance(&mut rng, 0.01, 0.5);
            let query = MlpQuery::new(q, cov).expect("positive definite");

            let hit = tree.search(&MostLikelyPoint, &query);
            let scan = tree.validate_closest_datum(&MostLikelyPoint, &query);
            assert!(close(hit.error, scan.error), "{bounds:?}: {} vs {}", hit.error, scan.error);
        }
    }
}

#[test]
fn randomized_search_matches_linear_scan_with_arbitrary_noise() {
    let mut rng = rng(23);
    let mesh = random_soup(&mut rng, 250, 5.0, 1.0);
    let covariances = (0..mesh.len())
        .map(|i| {
            if i % 5 == 0 {
                Matrix3::zeros()
            } else {
                random_covariance(&mut rng, 0.0, 0.3)
            }
        })
        .collect();
    let mesh = mesh.with_covariances(covariances).expect("positive semi-definite");
    let tree = PdTree::from_mesh(&mesh, TreeParams::default().with_count_threshold(3))
        .expect("tree");

    for _ in 0..100 {
        let q = random_point(&mut rng, 6.0);
        let query = MlpQuery::new(q, random_covariance(&mut rng, 0.05, 1.0))
            .expect("positive definite");
        let (hit, stats) = tree.search_from(&MostLikelyPoint, &query, None);
        let scan = tree.validate_closest_datum(&MostLikelyPoint, &query);
        assert!(close(hit.error, scan.error), "{} vs {}", hit.error, scan.error);
        assert!(stats.nodes_visited > 0);
    }
}

#[test]
fn anisotropic_noise_prefers_the_long_axis() {
    // two parallel triangles: one 1.0 away along x, one 0.6 away along y
    let mesh = pdtree::TriangleMesh::new(
        vec![
            Point3::new(1.0, -1.0, -1.0),
            Point3::new(1.0, 1.0, -1.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(-1.0, 0.6, -1.0),
            Point3::new(1.0, 0.6, -1.0),
            Point3::new(0.0, 0.6, 1.0),
        ],
        vec![[0, 1, 2], [3, 4, 5]],
    )
    .expect("valid mesh");
    let tree = PdTree::from_mesh(&mesh, TreeParams::default()).expect("tree");

    let q = Point3::origin();
    assert_eq!(tree.find_closest_point(&q).datum, 1);

    // large variance along x makes the x-offset triangle more likely
    let cov = Matrix3::from_diagonal(&Vector3::new(4.0, 0.01, 0.01));
    let query = MlpQuery::new(q, cov).expect("positive definite");
    let hit = tree.search(&MostLikelyPoint, &query);
    assert_eq!(hit.datum, 0);
    assert!(approx_eq(hit.point.x, 1.0, 1e-9));
}

#[test]
fn batched_queries_match_single_queries() {
    let mut rng = rng(24);
    let mesh = random_soup(&mut rng, 100, 4.0, 1.0)
        .with_noise_model(0.02, 0.1)
        .expect("valid variances");
    let tree = PdTree::from_mesh(&mesh, TreeParams::default()).expect("tree");
    let queries: Vec<MlpQuery> = (0..32)
        .map(|_| {
            let n = random_unit_vector(&mut rng);
            let cov = pdtree::covariance::point_covariance(&n, 0.3, 0.05);
            MlpQuery::new(random_point(&mut rng, 5.0), cov).expect("positive definite")
        })
        .collect();
    let batch = tree.search_batch(&MostLikelyPoint, &queries);
    for (query, hit) in queries.iter().zip(&batch) {
        assert_eq!(*hit, tree.search(&MostLikelyPoint, query));
    }
}

#[test]
fn query_covariance_must_be_positive_definite() {
    let q = Point3::origin();
    assert!(matches!(
        MlpQuery::new(q, Matrix3::from_diagonal(&Vector3::new(1.0, 1.0, 0.0))),
        Err(CovarianceError::NotPositiveDefinite { .. })
    ));
    assert!(matches!(
        MlpQuery::isotropic(q, Real::NAN),
        Err(CovarianceError::NonFinite)
    ));
    let asymmetric = Matrix3::new(1.0, 0.5, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0);
    assert_eq!(MlpQuery::new(q, asymmetric).unwrap_err(), CovarianceError::NotSymmetric);
}
