//! Branch-and-bound queries.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::algorithm::closest_point::ClosestPoint;
use crate::float_types::Real;
use crate::geometry::Feature;
use crate::pdtree::PdTree;
use crate::pdtree::node::Node;
use crate::pdtree::traits::{DatumMatch, DatumSet, SearchAlgorithm};
use crate::float_types::parry3d::query::PointQuery;
use nalgebra::{Point3, Vector3};

/// Best match of a query against the whole tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestMatch {
    pub datum: usize,
    pub point: Point3<Real>,
    /// Surface normal of the matched datum, if it carries one.
    pub normal: Option<Vector3<Real>>,
    pub feature: Feature,
    /// Objective value of the search strategy (squared distance for plain
    /// closest-point search).
    pub error: Real,
    /// Euclidean distance between the query point and `point`.
    pub distance: Real,
}

/// Traversal counters of a single query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Nodes whose bounds were tested.
    pub nodes_visited: usize,
    /// Leaves whose datums were examined.
    pub nodes_searched: usize,
}

/// Per-query mutable state.
struct SearchState {
    bound: Real,
    best: Option<(usize, DatumMatch)>,
    stats: SearchStats,
}

impl<D: DatumSet> PdTree<D> {
    /// Search with `algorithm`, seeding the bound with a datum picked by
    /// [`fast_initialize`](Self::fast_initialize).
    pub fn search<A: SearchAlgorithm<D>>(&self, algorithm: &A, query: &A::Query) -> ClosestMatch {
        self.search_from(algorithm, query, None).0
    }

    /// Search with `algorithm`, seeding the bound with `hint` (typically the
    /// datum matched by the same measurement on the previous registration
    /// iteration). A good hint tightens the bound early and prunes more.
    pub fn search_from<A: SearchAlgorithm<D>>(
        &self,
        algorithm: &A,
        query: &A::Query,
        hint: Option<usize>,
    ) -> (ClosestMatch, SearchStats) {
        let seed = match hint {
            Some(datum) if datum < self.len() => datum,
            _ => self.fast_initialize(&algorithm.query_point(query)).0,
        };
        let seed_match = algorithm.closest_point_on_datum(&self.data, query, seed);

        let mut state = SearchState {
            bound: seed_match.error,
            best: Some((seed, seed_match)),
            stats: SearchStats::default(),
        };
        let improved = self.search_root(algorithm, query, &mut state);

        log::trace!(
            "search: {} nodes visited, {} leaves searched, seed {} {}",
            state.stats.nodes_visited,
            state.stats.nodes_searched,
            seed,
            if improved.is_some() { "improved" } else { "kept" }
        );
        let (datum, m) = state.best.unwrap_or((seed, seed_match));
        (self.to_match(algorithm, query, datum, m), state.stats)
    }

    /// Search with `algorithm` for a match whose error is strictly below
    /// `bound`. `None` means no datum is in range.
    pub fn search_within<A: SearchAlgorithm<D>>(
        &self,
        algorithm: &A,
        query: &A::Query,
        bound: Real,
    ) -> Option<ClosestMatch> {
        let mut state = SearchState {
            bound,
            best: None,
            stats: SearchStats::default(),
        };
        self.search_root(algorithm, query, &mut state)?;
        state
            .best
            .map(|(datum, m)| self.to_match(algorithm, query, datum, m))
    }

    /// Exhaustive linear scan with the same objective as `algorithm`, for
    /// verifying the pruned search.
    pub fn validate_closest_datum<A: SearchAlgorithm<D>>(
        &self,
        algorithm: &A,
        query: &A::Query,
    ) -> ClosestMatch {
        let mut best = (0, algorithm.closest_point_on_datum(&self.data, query, 0));
        for datum in 1..self.data.len() {
            let m = algorithm.closest_point_on_datum(&self.data, query, datum);
            if m.error < best.1.error {
                best = (datum, m);
            }
        }
        self.to_match(algorithm, query, best.0, best.1)
    }

    /// Run `algorithm` over many queries. Queries are independent and run in
    /// parallel when the `parallel` feature is enabled.
    #[cfg(not(feature = "parallel"))]
    pub fn search_batch<A: SearchAlgorithm<D>>(
        &self,
        algorithm: &A,
        queries: &[A::Query],
    ) -> Vec<ClosestMatch> {
        queries.iter().map(|q| self.search(algorithm, q)).collect()
    }

    #[cfg(feature = "parallel")]
    pub fn search_batch<A>(&self, algorithm: &A, queries: &[A::Query]) -> Vec<ClosestMatch>
    where
        A: SearchAlgorithm<D> + Sync,
        A::Query: Sync,
    {
        queries.par_iter().map(|q| self.search(algorithm, q)).collect()
    }

    /// Euclidean closest point on the datum set.
    pub fn find_closest_point(&self, point: &Point3<Real>) -> ClosestMatch {
        self.search(&ClosestPoint, point)
    }

    /// Euclidean closest point, seeding the bound with `hint`.
    pub fn find_closest_point_from(&self, point: &Point3<Real>, hint: usize) -> ClosestMatch {
        self.search_from(&ClosestPoint, point, Some(hint)).0
    }

    /// Euclidean closest point strictly closer than `max_distance`. A
    /// negative or NaN range matches nothing.
    pub fn find_closest_point_within(
        &self,
        point: &Point3<Real>,
        max_distance: Real,
    ) -> Option<ClosestMatch> {
        if max_distance.is_nan() || max_distance < 0.0 {
            return None;
        }
        self.search_within(&ClosestPoint, point, max_distance * max_distance)
    }

    /// Euclidean closest points for many query points.
    pub fn find_closest_points(&self, points: &[Point3<Real>]) -> Vec<ClosestMatch> {
        self.search_batch(&ClosestPoint, points)
    }

    /// Drop straight down the split planes to the leaf containing `point`
    /// and return its first datum together with that datum's sort point.
    pub fn fast_initialize(&self, point: &Point3<Real>) -> (usize, Point3<Real>) {
        let mut node: &Node = &self.root;
        while let Some(child) = node.child_for(point) {
            node = child;
        }
        let datum = self.indices[node.start];
        (datum, self.data.sort_point(datum))
    }

    /// Every datum whose Euclidean closest point lies within `radius` of
    /// `point`, in tree order.
    pub fn find_datums_within(&self, point: &Point3<Real>, radius: Real) -> Vec<ClosestMatch> {
        let mut found = Vec::new();
        if radius >= 0.0 {
            self.collect_within(&self.root, point, radius, &mut found);
        }
        found
    }

    fn collect_within(
        &self,
        node: &Node,
        point: &Point3<Real>,
        radius: Real,
        found: &mut Vec<ClosestMatch>,
    ) {
        let local = node.frame.transform_point(point);
        if node.bounds.squared_distance(&local) > radius * radius {
            return;
        }
        if let Some((left, right)) = node.children() {
            self.collect_within(left, point, radius, found);
            self.collect_within(right, point, radius, found);
            return;
        }
        for &datum in self.node_datums(node) {
            if self.data.datum_aabb(datum).distance_to_local_point(point, true) > radius {
                continue;
            }
            let (closest, feature) = self.data.closest_point(datum, point);
            let distance = (closest - point).norm();
            if distance <= radius {
                found.push(ClosestMatch {
                    datum,
                    point: closest,
                    normal: self.data.normal(datum),
                    feature,
                    error: distance * distance,
                    distance,
                });
            }
        }
    }

    /// Every datum is inside the root, so its bound check is skipped and the
    /// search starts from its children. Returns the datum of the last
    /// improvement, if any.
    fn search_root<A: SearchAlgorithm<D>>(
        &self,
        algorithm: &A,
        query: &A::Query,
        state: &mut SearchState,
    ) -> Option<usize> {
        match self.root.children() {
            Some((left, right)) => {
                state.stats.nodes_visited += 1;
                let from_left = self.find_closest_datum(algorithm, query, left, state);
                let from_right = self.find_closest_datum(algorithm, query, right, state);
                from_right.or(from_left)
            },
            None => self.find_closest_datum(algorithm, query, &self.root, state),
        }
    }

    /// Returns the datum of the last improvement found in this subtree.
    fn find_closest_datum<A: SearchAlgorithm<D>>(
        &self,
        algorithm: &A,
        query: &A::Query,
        node: &Node,
        state: &mut SearchState,
    ) -> Option<usize> {
        state.stats.nodes_visited += 1;
        if !algorithm.node_might_be_closer(&self.data, query, node, state.bound) {
            return None;
        }

        if let Some((left, right)) = node.children() {
            let from_left = self.find_closest_datum(algorithm, query, left, state);
            let from_right = self.find_closest_datum(algorithm, query, right, state);
            return from_right.or(from_left);
        }

        state.stats.nodes_searched += 1;
        let mut improved = None;
        for &datum in self.node_datums(node) {
            if !algorithm.datum_might_be_closer(&self.data, query, datum, state.bound) {
                continue;
            }
            let m = algorithm.closest_point_on_datum(&self.data, query, datum);
            if m.error < state.bound {
                state.bound = m.error;
                state.best = Some((datum, m));
                improved = Some(datum);
            }
        }
        improved
    }

    fn to_match<A: SearchAlgorithm<D>>(
        &self,
        algorithm: &A,
        query: &A::Query,
        datum: usize,
        m: DatumMatch,
    ) -> ClosestMatch {
        ClosestMatch {
            datum,
            point: m.point,
            normal: self.data.normal(datum),
            feature: m.feature,
            error: m.error,
            distance: (m.point - algorithm.query_point(query)).norm(),
        }
    }
}
