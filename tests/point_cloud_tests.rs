mod support;

use nalgebra::{Matrix3, Point3, Vector3};
use pdtree::{
    BoundsMode, Directional, DirectionalQuery, Feature, MeshError, MlpQuery, MostLikelyPoint,
    PdTree, PointCloud, TreeParams, float_types::Real,
};

use crate::support::{approx_eq, random_covariance, random_point, random_unit_vector, rng};

fn random_cloud(seed: u64, count: usize) -> PointCloud {
    let mut rng = rng(seed);
    let points = (0..count).map(|_| random_point(&mut rng, 10.0)).collect();
    let normals = (0..count).map(|_| random_unit_vector(&mut rng)).collect();
    PointCloud::new(points)
        .and_then(|cloud| cloud.with_normals(normals))
        .expect("valid cloud")
}

#[test]
fn nearest_neighbour_matches_brute_force() {
    let cloud = random_cloud(51, 1000);
    let mut rng = rng(52);
    for bounds in [BoundsMode::Oriented, BoundsMode::AxisAligned] {
        let tree = PdTree::with_params(&cloud, TreeParams::default().with_bounds(bounds))
            .expect("tree");

        for _ in 0..200 {
            let q = random_point(&mut rng, 12.0);
            let expected = cloud
                .points()
                .iter()
                .map(|p| (p - q).norm())
                .fold(Real::MAX, Real::min);
            let hit = tree.find_closest_point(&q);
            assert!(approx_eq(hit.distance, expected, 1e-12));
            assert_eq!(hit.point, cloud.point(hit.datum));
            assert_eq!(hit.feature, Feature::Vertex1);
        }
    }
}

#[test]
fn radius_query_on_points() {
    let cloud = random_cloud(53, 500);
    let tree = PdTree::new(&cloud).expect("tree");
    let q = Point3::new(1.0, -2.0, 0.5);
    let mut found: Vec<usize> = tree.find_datums_within(&q, 3.0).iter().map(|m| m.datum).collect();
    found.sort_unstable();
    let expected: Vec<usize> = (0..cloud.len())
        .filter(|&i| (cloud.point(i) - q).norm() <= 3.0)
        .collect();
    assert_eq!(found, expected);
}

#[test]
fn most_likely_point_matches_linear_scan() {
    let cloud = random_cloud(54, 400)
        .with_noise_model(0.05, 0.5)
        .expect("cloud has normals");
    let tree = PdTree::with_params(&cloud, TreeParams::default().with_count_threshold(4))
        .expect("tree");
    let mut rng = rng(55);
    for _ in 0..100 {
        let query = MlpQuery::new(random_point(&mut rng, 10.0), random_covariance(&mut rng, 0.1, 2.0))
            .expect("positive definite");
        let hit = tree.search(&MostLikelyPoint, &query);
        let scan = tree.validate_closest_datum(&MostLikelyPoint, &query);
        assert!(approx_eq(hit.error, scan.error, 1e-8 * scan.error.abs().max(1.0)));
    }
}

#[test]
fn directional_matches_linear_scan() {
    let cloud = random_cloud(56, 400);
    let tree = PdTree::new(&cloud).expect("tree");
    let algorithm = Directional::new(3.0, 2.0).expect("valid weights");
    let mut rng = rng(57);
    for _ in 0..100 {
        let query = DirectionalQuery::new(random_point(&mut rng, 10.0), random_unit_vector(&mut rng));
        let hit = tree.search(&algorithm, &query);
        let scan = tree.validate_closest_datum(&algorithm, &query);
        assert!(approx_eq(hit.error, scan.error, 1e-9 * scan.error.abs().max(1.0)));
    }
}

#[test]
fn noise_model_needs_normals() {
    let cloud = PointCloud::new(vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0)]).expect("cloud");
    assert_eq!(cloud.normals(), None);
    assert_eq!(
        cloud.clone().with_noise_model(0.1, 0.2).unwrap_err(),
        MeshError::NormalsRequired
    );

    let with_cov = cloud
        .with_covariances(vec![Matrix3::identity(), Matrix3::zeros()])
        .expect("positive semi-definite");
    let tree = PdTree::new(&with_cov).expect("tree");
    assert!(approx_eq(tree.root().noise.eig_max, 1.0, 1e-12));
    assert_eq!(tree.root().noise.eig_rank_min, Vector3::zeros());
}
