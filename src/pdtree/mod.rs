//! Principal-direction (PD) tree.
//!
//! A binary partition of a datum set in which every node stores a box fitted
//! to its datums, either along the principal axes of the datum positions
//! (oriented bounds) or along the world axes. Queries run a branch-and-bound
//! search whose pruning rules are supplied by a [`SearchAlgorithm`].

pub mod build;
pub mod node;
pub mod search;
pub mod traits;

pub use node::{Node, NoiseBounds, OrientationStats, SplitPlane};
pub use search::{ClosestMatch, SearchStats};
pub use traits::{DatumMatch, DatumSet, SearchAlgorithm};

use crate::errors::TreeError;
use crate::float_types::Real;

/// How node bounds are aligned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundsMode {
    /// Boxes follow the principal axes of each node's datum positions and
    /// nodes split at the centroid across the direction of largest spread.
    #[default]
    Oriented,
    /// Boxes follow the world axes and nodes split at the centroid across the
    /// axis of greatest extent.
    AxisAligned,
}

/// Stopping criteria and bounds mode for tree construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeParams {
    /// A node with at most this many datums becomes a leaf.
    pub count_threshold: usize,
    /// A node whose bounds diagonal is shorter than this becomes a leaf.
    pub diagonal_threshold: Real,
    pub bounds: BoundsMode,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            count_threshold: 16,
            diagonal_threshold: 0.0,
            bounds: BoundsMode::Oriented,
        }
    }
}

impl TreeParams {
    pub const fn with_count_threshold(mut self, count_threshold: usize) -> Self {
        self.count_threshold = count_threshold;
        self
    }

    pub const fn with_diagonal_threshold(mut self, diagonal_threshold: Real) -> Self {
        self.diagonal_threshold = diagonal_threshold;
        self
    }

    pub const fn with_bounds(mut self, bounds: BoundsMode) -> Self {
        self.bounds = bounds;
        self
    }

    fn validate(&self) -> Result<(), TreeError> {
        if self.count_threshold == 0 {
            return Err(TreeError::InvalidThreshold(
                "count threshold must be at least 1".to_string(),
            ));
        }
        if !self.diagonal_threshold.is_finite() || self.diagonal_threshold < 0.0 {
            return Err(TreeError::InvalidThreshold(format!(
                "diagonal threshold must be finite and non-negative, got {}",
                self.diagonal_threshold
            )));
        }
        Ok(())
    }
}

/// A PD tree over the datum set `D`.
///
/// The tree owns `D` (typically a thin view borrowing a mesh), a single
/// index array reordered during construction, and the node hierarchy. It is
/// immutable once built, so any number of threads may query it at once.
#[derive(Debug, Clone)]
pub struct PdTree<D: DatumSet> {
    data: D,
    indices: Vec<usize>,
    root: Box<Node>,
    params: TreeParams,
    node_count: usize,
}

impl<D: DatumSet> PdTree<D> {
    /// Build a tree with [`TreeParams::default`].
    pub fn new(data: D) -> Result<Self, TreeError> {
        Self::with_params(data, TreeParams::default())
    }

    /// Build a tree with explicit parameters.
    pub fn with_params(data: D, params: TreeParams) -> Result<Self, TreeError> {
        params.validate()?;
        if data.is_empty() {
            return Err(TreeError::NoData);
        }

        let mut indices: Vec<usize> = (0..data.len()).collect();
        let root = build::build_subtree(&data, &mut indices, 0, &params, None);
        let node_count = root.subtree_size();
        log::debug!(
            "built PD tree: {} datums, {} nodes, depth {}, {:?} bounds",
            data.len(),
            node_count,
            root.depth,
            params.bounds
        );

        Ok(Self {
            data,
            indices,
            root: Box::new(root),
            params,
            node_count,
        })
    }

    pub const fn data(&self) -> &D {
        &self.data
    }

    pub const fn params(&self) -> &TreeParams {
        &self.params
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Number of datums.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub const fn node_count(&self) -> usize {
        self.node_count
    }

    /// Height of the tree; 0 when the root is a leaf.
    pub fn depth(&self) -> usize {
        self.root.depth
    }

    /// The reordered datum index array.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Datum indices owned by `node`.
    pub fn node_datums(&self, node: &Node) -> &[usize] {
        &self.indices[node.range()]
    }

    /// All leaves, left to right.
    pub fn leaves(&self) -> Vec<&Node> {
        let mut leaves = Vec::new();
        self.root.collect_leaves(&mut leaves);
        leaves
    }

    /// The leaf holding `datum`, if it is in the tree.
    pub fn find_leaf(&self, datum: usize) -> Option<&Node> {
        self.leaves()
            .into_iter()
            .find(|leaf| self.node_datums(leaf).contains(&datum))
    }
}
