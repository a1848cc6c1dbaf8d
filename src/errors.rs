//! Construction and input validation errors

use crate::float_types::Real;

/// Problems detected while validating a mesh, segment set or point cloud.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeshError {
    /// The datum set holds no vertices or no datums
    #[error("(Empty) the input holds no datums")]
    Empty,
    /// A datum references a vertex that does not exist
    #[error(
        "(VertexIndexOutOfRange) datum {datum} references vertex {index} but only {vertex_count} vertices exist"
    )]
    VertexIndexOutOfRange {
        datum: usize,
        index: usize,
        vertex_count: usize,
    },
    /// A per-datum attribute array has the wrong length
    #[error("(LengthMismatch) expected {expected} {what}, got {actual}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    /// The coordinate has a NaN or infinite component
    #[error("(InvalidCoordinate) vertex {index} has a NaN or infinite coordinate")]
    InvalidCoordinate { index: usize },
    /// The operation needs surface normals and the datum set carries none
    #[error("(NormalsRequired) this datum set carries no surface normals")]
    NormalsRequired,
    /// A supplied noise covariance is not usable
    #[error(transparent)]
    Covariance(#[from] CovarianceError),
}

/// Problems detected while building a tree.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TreeError {
    /// Zero datums were handed to the builder
    #[error("(NoData) cannot build a tree over zero datums")]
    NoData,
    /// A stopping threshold is out of range
    #[error("(InvalidThreshold) {0}")]
    InvalidThreshold(String),
    /// The datum set is not suitable for the requested search
    #[error(transparent)]
    Mesh(#[from] MeshError),
}

/// Problems with a noise covariance matrix.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum CovarianceError {
    /// Smallest eigenvalue is zero, negative or below tolerance
    #[error("(NotPositiveDefinite) smallest eigenvalue is {min_eigenvalue}")]
    NotPositiveDefinite { min_eigenvalue: Real },
    /// Matrix holds NaN or infinite entries
    #[error("(NonFinite) covariance holds a NaN or infinite entry")]
    NonFinite,
    /// Matrix is not symmetric
    #[error("(NotSymmetric) covariance is not symmetric")]
    NotSymmetric,
}

/// Problems with the weights of a search strategy.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum ParameterError {
    /// Orientation weight is negative, NaN or infinite
    #[error("(InvalidWeight) orientation weight must be finite and non-negative, got {0}")]
    InvalidWeight(Real),
    /// Positional variance is zero, negative, NaN or infinite
    #[error("(InvalidVariance) positional variance must be finite and positive, got {0}")]
    InvalidVariance(Real),
}
