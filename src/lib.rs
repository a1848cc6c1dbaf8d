//! **Principal-direction (PD) trees** for closest-point and most-likely-point
//! search over triangle meshes, planar segment sets and point clouds, as used
//! by iterative registration loops.
//!
//! A [`PdTree`] partitions the datums of a [`DatumSet`] into nodes bounded by
//! boxes fitted to the principal axes of their contents (or to the world axes).
//! A query walks the tree branch-and-bound style, with the pruning rules
//! supplied by a [`SearchAlgorithm`]:
//! - [`ClosestPoint`]: Euclidean distance
//! - [`MostLikelyPoint`]: Mahalanobis distance plus log-determinant under
//!   anisotropic measurement and model noise
//! - [`Directional`]: distance combined with surface normal agreement
//!
//! ```rust
//! # use pdtree::{PdTree, TreeParams, TriangleMesh};
//! # use nalgebra::Point3;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mesh = TriangleMesh::new(
//!     vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)],
//!     vec![[0, 1, 2]],
//! )?;
//! let tree = PdTree::from_mesh(&mesh, TreeParams::default())?;
//! let hit = tree.find_closest_point(&Point3::new(0.25, 0.25, 1.0));
//! assert!((hit.distance - 1.0).abs() < 1e-9);
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//! #### Default
//! - **f64**: use f64 as Real
//! - [**stl-io**](https://en.wikipedia.org/wiki/STL_(file_format)): `.stl` import/export
//!
//! #### Optional
//! - **f32**: use f32 as Real, this conflicts with f64
//! - **parallel**: use rayon to build subtrees and answer query batches in parallel

#![forbid(unsafe_code)]
#![warn(clippy::missing_const_for_fn, clippy::approx_constant, clippy::all)]

pub mod algorithm;
pub mod covariance;
pub mod errors;
pub mod float_types;
pub mod geometry;
pub mod io;
pub mod mesh;
pub mod pdtree;
pub mod point_cloud;
pub mod sketch;

#[cfg(any(all(feature = "f64", feature = "f32"), not(any(feature = "f64", feature = "f32"))))]
compile_error!("Either 'f64' or 'f32' feature must be specified, but not both");

pub use algorithm::{ClosestPoint, Directional, DirectionalQuery, MlpQuery, MostLikelyPoint};
pub use errors::{CovarianceError, MeshError, ParameterError, TreeError};
pub use float_types::Real;
pub use geometry::Feature;
pub use mesh::{MeshDatums, TriangleClosestPointSolver, TriangleMesh};
pub use pdtree::{
    BoundsMode, ClosestMatch, DatumSet, PdTree, SearchAlgorithm, SearchStats, TreeParams,
};
pub use point_cloud::PointCloud;
pub use sketch::SegmentSet;
