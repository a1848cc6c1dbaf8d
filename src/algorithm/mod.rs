//! Search strategies.
//!
//! Each strategy implements [`SearchAlgorithm`](crate::pdtree::SearchAlgorithm)
//! for every datum set, supplying the objective and the admissible node and
//! datum bounds used to prune the tree walk.

pub mod closest_point;
pub mod directional;
pub mod most_likely_point;

pub use closest_point::ClosestPoint;
pub use directional::{Directional, DirectionalQuery};
pub use most_likely_point::{MlpQuery, MostLikelyPoint};
