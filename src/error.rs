//! Error types for meshl.
//!
//! [`MeshError`] covers construction and bulk operations on a mesh.
//! [`EulerError`] is the structured reason an Euler operator refuses to run; an
//! operator that returns it has not touched the mesh.

use thiserror::Error;

/// Result type alias using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Result type alias using [`EulerError`].
pub type EulerResult<T> = std::result::Result<T, EulerError>;

/// Errors that can occur during mesh operations.
#[derive(Error, Debug)]
pub enum MeshError {
    /// The mesh has no faces.
    #[error("mesh has no faces")]
    EmptyMesh,

    /// A face references an invalid vertex index.
    #[error("face {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The face index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// A face has duplicate vertex indices.
    #[error("face {face} is degenerate (has duplicate vertices)")]
    DegenerateFace {
        /// The face index.
        face: usize,
    },

    /// A face has fewer than three vertices.
    #[error("face {face} has {count} vertices, at least 3 are required")]
    TooFewFaceVertices {
        /// The face index.
        face: usize,
        /// Number of vertices given.
        count: usize,
    },

    /// Invalid mesh state for the requested operation.
    #[error("invalid mesh state: {0}")]
    InvalidState(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },

    /// An Euler operator refused to run.
    #[error(transparent)]
    Euler(#[from] EulerError),
}

impl MeshError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        MeshError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }
}

/// Why an Euler operator rejected its arguments.
///
/// Element handles are reported by their raw index.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EulerError {
    /// A handle does not refer to a live element.
    #[error("{kind} {index} is not a live element of the mesh")]
    StaleHandle {
        /// Element kind ("vertex", "face", "halfedge").
        kind: &'static str,
        /// Raw index of the handle.
        index: usize,
    },

    /// No edge joins the two vertices.
    #[error("no edge between vertices {v0} and {v1}")]
    EdgeNotFound {
        /// First vertex.
        v0: usize,
        /// Second vertex.
        v1: usize,
    },

    /// The edge already exists, adding it again would make it non-manifold.
    #[error("edge between vertices {v0} and {v1} already exists")]
    EdgeExists {
        /// First vertex.
        v0: usize,
        /// Second vertex.
        v1: usize,
    },

    /// The halfedge has no mate.
    #[error("halfedge {halfedge} lies on the boundary")]
    BoundaryEdge {
        /// The halfedge.
        halfedge: usize,
    },

    /// Both sides of the edge belong to the same face.
    #[error("halfedge {halfedge} and its mate belong to the same face")]
    SelfLoopEdge {
        /// The halfedge.
        halfedge: usize,
    },

    /// The halfedge is not part of any face.
    #[error("halfedge {halfedge} is not attached to a face")]
    DetachedHalfedge {
        /// The halfedge.
        halfedge: usize,
    },

    /// Two halfedges were expected in the same face.
    #[error("halfedges {h0} and {h1} are not in the same face")]
    NotInSameFace {
        /// First halfedge.
        h0: usize,
        /// Second halfedge.
        h1: usize,
    },

    /// Two distinct vertices were expected.
    #[error("vertex {vertex} given twice")]
    CoincidentVertices {
        /// The repeated vertex.
        vertex: usize,
    },

    /// The two halfedges are consecutive, the new edge would duplicate an existing one.
    #[error("halfedges {h0} and {h1} are adjacent")]
    AdjacentHalfedges {
        /// First halfedge.
        h0: usize,
        /// Second halfedge.
        h1: usize,
    },

    /// The vertex is not on the boundary of the face.
    #[error("vertex {vertex} is not on face {face}")]
    VertexNotInFace {
        /// The vertex.
        vertex: usize,
        /// The face.
        face: usize,
    },

    /// Not enough vertices to make a face.
    #[error("{count} vertices given, a face needs at least 3")]
    TooFewVertices {
        /// Number of vertices given.
        count: usize,
    },

    /// The directed edge is already used by a face, so the new face would be
    /// oriented against its neighbour.
    #[error("directed edge {v0} -> {v1} is already used by face {face}")]
    OrientationConflict {
        /// Start vertex.
        v0: usize,
        /// End vertex.
        v1: usize,
        /// The face already using the edge.
        face: usize,
    },

    /// The face has no halfedges.
    #[error("face {face} has no halfedges")]
    EmptyFace {
        /// The face.
        face: usize,
    },

    /// The vertex does not have exactly two neighbours.
    #[error("vertex {vertex} has valence {valence}, expected 2")]
    NotValenceTwo {
        /// The vertex.
        vertex: usize,
        /// Number of outgoing halfedges found.
        valence: usize,
    },

    /// The operation would leave a face with fewer than three sides.
    #[error("face {face} has {sides} sides and cannot lose one")]
    FaceTooSmall {
        /// The face.
        face: usize,
        /// Current number of sides.
        sides: usize,
    },

    /// The two faces touch in more than the edge being removed.
    #[error("faces {f0} and {f1} share more than one edge")]
    SharedBoundary {
        /// First face.
        f0: usize,
        /// Second face.
        f1: usize,
    },

    /// Walking the face cycle did not return to its start.
    #[error("halfedge cycle of face {face} does not close")]
    BrokenCycle {
        /// The face.
        face: usize,
    },
}
