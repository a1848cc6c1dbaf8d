//! Exact geometry used by the search: bounding boxes, closest points on
//! triangles and segments, and the ellipsoid / oriented box overlap test.

pub mod bounds;
pub mod ellipsoid;
pub mod segment;
pub mod triangle;

pub use bounds::BoundingBox;
pub use ellipsoid::ellipsoid_intersects_obb;
pub use segment::{closest_point_on_segment, most_likely_point_on_segment};
pub use triangle::{TriangleFrame, closest_point_on_triangle, most_likely_point_on_triangle};

/// Topological feature of a datum on which a closest point was found.
///
/// Segments only ever report `Vertex1`, `Vertex2` or `Edge12`; point datums
/// always report `Vertex1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Vertex1,
    Vertex2,
    Vertex3,
    Edge12,
    Edge13,
    Edge23,
    Interior,
}

impl Feature {
    /// True for the three corner features.
    pub const fn is_vertex(self) -> bool {
        matches!(self, Feature::Vertex1 | Feature::Vertex2 | Feature::Vertex3)
    }

    /// True for the three edge features.
    pub const fn is_edge(self) -> bool {
        matches!(self, Feature::Edge12 | Feature::Edge13 | Feature::Edge23)
    }
}
