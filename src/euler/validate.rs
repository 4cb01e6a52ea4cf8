//! Whole-mesh counts and health checks.

use std::collections::HashMap;

use crate::mesh::{Mesh, MeshIndex, VertexId};

/// Unique undirected edges of a mesh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeCount {
    /// Edges with a face on one side only.
    pub boundary: usize,
    /// Edges with a face on both sides.
    pub internal: usize,
}

impl EdgeCount {
    /// Total number of edges.
    #[inline]
    pub fn total(&self) -> usize {
        self.boundary + self.internal
    }
}

/// Summary of a mesh's counts and reference integrity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshHealth {
    /// Number of vertices.
    pub vertices: usize,
    /// Number of unique undirected edges.
    pub edges: usize,
    /// Number of faces.
    pub faces: usize,
    /// V - E + F.
    pub euler_characteristic: i64,
    /// Edges on the boundary.
    pub boundary_edges: usize,
    /// Edges shared by two faces.
    pub internal_edges: usize,
    /// Every stored handle refers to a live element.
    pub references_ok: bool,
}

impl MeshHealth {
    /// Euler characteristic in the range of a connected orientable surface
    /// with or without boundary.
    #[inline]
    pub fn euler_ok(&self) -> bool {
        (0..=2).contains(&self.euler_characteristic)
    }

    /// References are intact and the Euler characteristic is plausible.
    #[inline]
    pub fn is_healthy(&self) -> bool {
        self.references_ok && self.euler_ok()
    }
}

impl<I: MeshIndex> Mesh<I> {
    /// Count unique undirected edges over all face halfedges.
    ///
    /// An edge is internal when one of its halfedges has a live mate in
    /// another face. Edges without such a mate count as boundary, so a mesh
    /// without connectivity has no internal edges.
    pub fn count_unique_edges(&self) -> EdgeCount {
        let mut edges: HashMap<(VertexId<I>, VertexId<I>), bool> = HashMap::new();
        for f in self.face_ids() {
            for he in self.face_halfedges(f) {
                let (a, b) = (self.origin(he), self.dest(he));
                let key = if a < b { (a, b) } else { (b, a) };
                let mated = self.mate(he).map_or(false, |m| {
                    self.contains_halfedge(m) && self.face_of(m).map_or(false, |g| g != f)
                });
                *edges.entry(key).or_insert(false) |= mated;
            }
        }

        let internal = edges.values().filter(|&&mated| mated).count();
        EdgeCount {
            boundary: edges.len() - internal,
            internal,
        }
    }

    /// Counts, Euler characteristic and a reference scan.
    ///
    /// The reference scan checks that every face halfedge points at a live
    /// vertex, a live `next`, `prev` and mate, and that every vertex halfedge
    /// is live.
    pub fn validate_mesh(&self) -> MeshHealth {
        let edges = self.count_unique_edges();
        let vertices = self.num_vertices();
        let faces = self.num_faces();
        let euler_characteristic = vertices as i64 - edges.total() as i64 + faces as i64;

        let halfedges_ok = self.halfedges().all(|(_, h)| {
            !h.face.is_valid()
                || (self.contains_vertex(h.vertex)
                    && self.contains_face(h.face)
                    && self.contains_halfedge(h.next)
                    && self.contains_halfedge(h.prev)
                    && (!h.mate.is_valid() || self.contains_halfedge(h.mate)))
        });
        let vertices_ok = self
            .vertices()
            .all(|(_, v)| !v.halfedge.is_valid() || self.contains_halfedge(v.halfedge));
        let faces_ok = self
            .faces()
            .all(|(_, f)| f.halfedges().iter().all(|&h| self.contains_halfedge(h)));
        let references_ok = halfedges_ok && vertices_ok && faces_ok;
        if !references_ok {
            log::warn!("mesh has dangling references");
        }

        MeshHealth {
            vertices,
            edges: edges.total(),
            faces,
            euler_characteristic,
            boundary_edges: edges.boundary,
            internal_edges: edges.internal,
            references_ok,
        }
    }
}
