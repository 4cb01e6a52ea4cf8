//! Structured diagnostics for tolerated input problems.
//!
//! Operations that keep going in the face of non-manifold or otherwise suspicious
//! input (connectivity construction, connectivity cleanup, consistency checks)
//! describe what they skipped as [`Diagnostic`] values. The values are returned to
//! the caller inside the operation's report and are also logged at `warn` level
//! through the `log` facade.

use std::fmt;

/// A problem found and tolerated while processing a mesh.
///
/// Element handles are reported by their raw index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A third halfedge was found on an edge that already has two.
    NonManifoldEdge {
        /// Start vertex of the edge.
        v0: usize,
        /// End vertex of the edge.
        v1: usize,
        /// Face of the extra halfedge.
        face: usize,
        /// The extra halfedge, left unmated.
        halfedge: usize,
    },

    /// Two halfedges on one edge run in the same direction.
    BadOrientation {
        /// Start vertex of the edge.
        v0: usize,
        /// End vertex of the edge.
        v1: usize,
        /// Face of the offending halfedge.
        face: usize,
        /// The offending halfedge, left unmated.
        halfedge: usize,
    },

    /// Both halfedges of an edge belong to the same face.
    SelfLoopEdge {
        /// The face.
        face: usize,
        /// The halfedge left unmated.
        halfedge: usize,
    },

    /// A face with two or more boundary halfedges was deleted.
    IsolatedFace {
        /// The deleted face.
        face: usize,
    },

    /// A vertex used by no face was deleted.
    UnusedVertex {
        /// The deleted vertex.
        vertex: usize,
    },

    /// Halfedges without a vertex or face were deleted.
    DanglingHalfedges {
        /// How many were deleted.
        count: usize,
    },

    /// A mate link that is not symmetric, points at a dead halfedge, or joins
    /// two halfedges that do not run opposite each other.
    InconsistentMate {
        /// The halfedge holding the bad link.
        halfedge: usize,
    },

    /// A vertex halfedge that does not start at its vertex.
    InconsistentVertexHalfedge {
        /// The vertex.
        vertex: usize,
    },

    /// A face whose `next` walk does not close after `size` steps.
    BrokenFaceCycle {
        /// The face.
        face: usize,
    },

    /// Boundary walking stopped before returning to its start.
    OpenBoundaryLoop {
        /// The vertex the walk started from.
        start: usize,
        /// The vertex where it stopped.
        stopped_at: usize,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::NonManifoldEdge { v0, v1, face, halfedge } => write!(
                f,
                "edge ({}, {}) has more than two halfedges: halfedge {} of face {} left unmated",
                v0, v1, halfedge, face
            ),
            Diagnostic::BadOrientation { v0, v1, face, halfedge } => write!(
                f,
                "invalid halfedge pair on edge ({}, {}): halfedge {} of face {} runs the same way",
                v0, v1, halfedge, face
            ),
            Diagnostic::SelfLoopEdge { face, halfedge } => write!(
                f,
                "halfedge {} would mate inside its own face {}",
                halfedge, face
            ),
            Diagnostic::IsolatedFace { face } => {
                write!(f, "face {} is isolated, deleted", face)
            }
            Diagnostic::UnusedVertex { vertex } => {
                write!(f, "vertex {} is not used by any face, deleted", vertex)
            }
            Diagnostic::DanglingHalfedges { count } => {
                write!(f, "cleaned up {} dangling halfedges", count)
            }
            Diagnostic::InconsistentMate { halfedge } => {
                write!(f, "halfedge {} has an inconsistent mate", halfedge)
            }
            Diagnostic::InconsistentVertexHalfedge { vertex } => write!(
                f,
                "vertex {} points at a halfedge that does not start there",
                vertex
            ),
            Diagnostic::BrokenFaceCycle { face } => {
                write!(f, "halfedge cycle of face {} does not close", face)
            }
            Diagnostic::OpenBoundaryLoop { start, stopped_at } => write!(
                f,
                "boundary walk from vertex {} stopped at vertex {}",
                start, stopped_at
            ),
        }
    }
}

/// Log a diagnostic and record it.
pub(crate) fn emit(sink: &mut Vec<Diagnostic>, diagnostic: Diagnostic) {
    log::warn!("{}", diagnostic);
    sink.push(diagnostic);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_records() {
        let mut sink = Vec::new();
        emit(&mut sink, Diagnostic::IsolatedFace { face: 3 });
        emit(&mut sink, Diagnostic::DanglingHalfedges { count: 2 });
        assert_eq!(sink.len(), 2);
        assert_eq!(sink[0], Diagnostic::IsolatedFace { face: 3 });
    }

    #[test]
    fn test_display() {
        let d = Diagnostic::NonManifoldEdge {
            v0: 1,
            v1: 2,
            face: 7,
            halfedge: 21,
        };
        let text = d.to_string();
        assert!(text.contains("(1, 2)"));
        assert!(text.contains("face 7"));
    }
}
