//! Euler operators on a half-edge mesh.
//!
//! This module provides [`EulerOps`], the set of local topological edits that
//! keep a mesh a valid polygon surface:
//!
//! - **MEV / KEV**: split an edge with a new vertex, and remove such a vertex again
//! - **MEF / KEMR**: split a face with a new edge, and merge two faces by removing
//!   the edge between them
//! - **KFMRH / MFKRH**: punch a face out as a hole, and fill a hole with a new face
//!
//! Every operator first validates its arguments without touching the mesh and
//! returns an [`EulerError`] naming the failed precondition. Once validation
//! passes the edit always completes. Mates and vertex halfedges are repaired
//! locally through the mesh's directed-edge index, so no operator rescans the
//! whole mesh. The full rescans [`EulerOps::update_all_mates`] and
//! [`EulerOps::ensure_vertex_halfedges`] remain available as repair passes.
//!
//! # Example
//!
//! ```
//! use meshl::euler::EulerOps;
//! use meshl::mesh::{tetrahedron, Mesh, VertexId};
//! use nalgebra::Point3;
//!
//! let mut mesh: Mesh = tetrahedron();
//! let mut ops = EulerOps::new(&mut mesh);
//!
//! let v = ops
//!     .make_edge_vertex(VertexId::new(0), VertexId::new(1), Point3::new(1.0, 0.0, 0.0))
//!     .unwrap();
//! assert_eq!(ops.mesh().valence(v), 2);
//!
//! ops.kill_edge_vertex(v).unwrap();
//! assert_eq!(ops.validate_mesh().euler_characteristic, 2);
//! ```

mod kill;
mod make;
mod validate;

pub use validate::{EdgeCount, MeshHealth};

use crate::diagnostics::{self, Diagnostic};
use crate::error::{EulerError, EulerResult};
use crate::mesh::{FaceId, HalfedgeId, Mesh, MeshIndex, VertexId};

/// Euler operators bound to one mesh.
///
/// Holds the mesh mutably for its whole lifetime.
#[derive(Debug)]
pub struct EulerOps<'a, I: MeshIndex = u32> {
    mesh: &'a mut Mesh<I>,
}

impl<'a, I: MeshIndex> EulerOps<'a, I> {
    /// Bind the operators to a mesh.
    pub fn new(mesh: &'a mut Mesh<I>) -> Self {
        Self { mesh }
    }

    /// The mesh being edited.
    #[inline]
    pub fn mesh(&self) -> &Mesh<I> {
        self.mesh
    }

    /// Mutable access to the mesh being edited.
    #[inline]
    pub fn mesh_mut(&mut self) -> &mut Mesh<I> {
        self.mesh
    }

    // ==================== Validation Helpers ====================

    fn live_vertex(&self, v: VertexId<I>) -> EulerResult<()> {
        if self.mesh.contains_vertex(v) {
            Ok(())
        } else {
            Err(EulerError::StaleHandle {
                kind: "vertex",
                index: v.index(),
            })
        }
    }

    fn live_face(&self, f: FaceId<I>) -> EulerResult<()> {
        if self.mesh.contains_face(f) {
            Ok(())
        } else {
            Err(EulerError::StaleHandle {
                kind: "face",
                index: f.index(),
            })
        }
    }

    /// The face of a live, attached halfedge.
    fn attached_face(&self, he: HalfedgeId<I>) -> EulerResult<FaceId<I>> {
        let rec = self.mesh.get_halfedge(he).ok_or(EulerError::StaleHandle {
            kind: "halfedge",
            index: he.index(),
        })?;
        rec.face
            .valid()
            .filter(|&f| self.mesh.contains_face(f))
            .ok_or(EulerError::DetachedHalfedge {
                halfedge: he.index(),
            })
    }

    /// Check that walking `next` around `f` visits exactly its halfedge list
    /// and then returns to the start.
    fn check_cycle(&self, f: FaceId<I>) -> EulerResult<()> {
        let broken = EulerError::BrokenCycle { face: f.index() };
        let list = self.mesh.face(f).halfedges();
        let Some(&start) = list.first() else {
            return Err(EulerError::EmptyFace { face: f.index() });
        };

        let mut he = start;
        for &expected in list {
            if he != expected {
                return Err(broken);
            }
            let rec = self.mesh.get_halfedge(he).ok_or(broken.clone())?;
            if rec.face != f {
                return Err(broken);
            }
            he = rec.next;
        }
        if he == start {
            Ok(())
        } else {
            Err(broken)
        }
    }

    // ==================== Local Mate Repair ====================

    /// Pair every unmated halfedge of `f` with an unmated halfedge running the
    /// other way in another face. Returns the number of pairs formed.
    fn connect_mates(&mut self, f: FaceId<I>) -> usize {
        let members: Vec<HalfedgeId<I>> = self.mesh.face(f).halfedges().to_vec();
        let mut paired = 0;
        for he in members {
            if self.mesh.mate(he).is_some() {
                continue;
            }
            let (a, b) = (self.mesh.origin(he), self.mesh.dest(he));
            let candidate = self
                .mesh
                .directed_halfedges(b, a)
                .iter()
                .copied()
                .find(|&c| self.mesh.mate(c).is_none() && self.mesh.face_of(c) != Some(f));
            if let Some(c) = candidate {
                self.mesh.set_both_mate(he, c);
                paired += 1;
            }
        }
        paired
    }

    // ==================== Repair Passes ====================

    /// Rescan every halfedge: drop mates that are not a valid opposite pair,
    /// then pair every unmated halfedge with an unmated opposite halfedge.
    ///
    /// Returns the number of pairs formed.
    pub fn update_all_mates(&mut self) -> usize {
        let ids: Vec<HalfedgeId<I>> = self.mesh.halfedge_ids().collect();
        for &he in &ids {
            let Some(m) = self.mesh.mate(he) else {
                continue;
            };
            let consistent = self.mesh.contains_halfedge(m)
                && self.mesh.mate(m) == Some(he)
                && self.mesh.face_of(he) != self.mesh.face_of(m)
                && self.mesh.is_mate_valid(he, m);
            if !consistent {
                self.mesh.set_mate(he, HalfedgeId::invalid());
            }
        }

        let faces: Vec<FaceId<I>> = self.mesh.face_ids().collect();
        let paired: usize = faces.into_iter().map(|f| self.connect_mates(f)).sum();
        log::debug!("update_all_mates formed {} pairs", paired);
        paired
    }

    /// Give every vertex a live outgoing halfedge, preferring a boundary one.
    ///
    /// Returns the number of vertices whose halfedge changed.
    pub fn ensure_vertex_halfedges(&mut self) -> usize {
        let ids: Vec<VertexId<I>> = self.mesh.vertex_ids().collect();
        let mut changed = 0;
        for v in ids {
            let before = self.mesh.vertex(v).halfedge;
            self.mesh.reset_vertex_halfedge(v);
            if self.mesh.vertex(v).halfedge != before {
                changed += 1;
            }
        }
        changed
    }

    /// Scan the whole mesh for broken references and report each one.
    ///
    /// Looks for asymmetric or same-face mates, vertices whose halfedge does
    /// not start at them and faces whose `next` walk does not close. Findings
    /// are logged at `warn` level.
    pub fn check_consistency(&self) -> Vec<Diagnostic> {
        let mut found = Vec::new();
        for he in self.mesh.halfedge_ids() {
            if let Some(m) = self.mesh.mate(he) {
                let symmetric = self.mesh.contains_halfedge(m) && self.mesh.mate(m) == Some(he);
                if !symmetric || self.mesh.face_of(he) == self.mesh.face_of(m) {
                    diagnostics::emit(&mut found, Diagnostic::InconsistentMate { halfedge: he.index() });
                }
            }
        }
        for (v, vert) in self.mesh.vertices() {
            let he = vert.halfedge;
            if he.is_valid()
                && self
                    .mesh
                    .get_halfedge(he)
                    .map_or(true, |h| h.vertex != v || !h.face.is_valid())
            {
                diagnostics::emit(
                    &mut found,
                    Diagnostic::InconsistentVertexHalfedge { vertex: v.index() },
                );
            }
        }
        for f in self.mesh.face_ids() {
            if self.check_cycle(f).is_err() {
                diagnostics::emit(&mut found, Diagnostic::BrokenFaceCycle { face: f.index() });
            }
        }
        found
    }

    // ==================== Dry Runs ====================

    /// True if [`kill_edge_vertex`](EulerOps::kill_edge_vertex) would accept `v`.
    pub fn can_kill_edge_vertex(&self, v: VertexId<I>) -> bool {
        self.check_kill_edge_vertex(v).is_ok()
    }

    /// True if [`kill_edge_make_ring`](EulerOps::kill_edge_make_ring) would
    /// accept `he`.
    pub fn can_kill_edge_make_ring(&self, he: HalfedgeId<I>) -> bool {
        self.check_kill_edge_make_ring(he).is_ok()
    }

    // ==================== Validation ====================

    /// Counts, Euler characteristic and a reference scan of the mesh.
    pub fn validate_mesh(&self) -> MeshHealth {
        self.mesh.validate_mesh()
    }

    /// Unique undirected edges, split into boundary and internal ones.
    pub fn count_unique_edges(&self) -> EdgeCount {
        self.mesh.count_unique_edges()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{cube, grid, tetrahedron};
    use nalgebra::Point3;

    #[test]
    fn test_consistency_of_generated_shapes() {
        let mut tet: Mesh = tetrahedron();
        assert!(EulerOps::new(&mut tet).check_consistency().is_empty());
        let mut cube: Mesh = cube();
        assert!(EulerOps::new(&mut cube).check_consistency().is_empty());
    }

    #[test]
    fn test_update_all_mates_repairs_cleared_mates() {
        let mut mesh: Mesh = grid(2, 2);
        let before = mesh.count_unique_edges();
        mesh.delete_connectivity();
        assert!(mesh.halfedges().all(|(_, h)| h.is_boundary()));
        let unmated = mesh.count_unique_edges();
        assert_eq!(unmated.internal, 0);
        assert_eq!(unmated.boundary, before.total());

        let mut ops = EulerOps::new(&mut mesh);
        assert_eq!(ops.update_all_mates(), before.internal);
        assert_eq!(ops.ensure_vertex_halfedges(), 9);
        assert!(ops.check_consistency().is_empty());
        assert_eq!(ops.count_unique_edges(), before);
    }

    #[test]
    fn test_update_all_mates_drops_asymmetric_mate() {
        let mut mesh: Mesh = grid(2, 1);
        let he = mesh
            .find_directed_halfedge(VertexId::new(1), VertexId::new(4))
            .unwrap();
        let stray = mesh
            .find_directed_halfedge(VertexId::new(0), VertexId::new(1))
            .unwrap();
        mesh.set_mate(stray, he);

        let mut ops = EulerOps::new(&mut mesh);
        let found = ops.check_consistency();
        assert_eq!(
            found,
            vec![Diagnostic::InconsistentMate {
                halfedge: stray.index()
            }]
        );
        ops.update_all_mates();
        assert!(ops.check_consistency().is_empty());
        assert_eq!(ops.mesh().mate(stray), None);
    }

    #[test]
    fn test_stale_handles_are_rejected() {
        let mut mesh: Mesh = tetrahedron();
        let mut ops = EulerOps::new(&mut mesh);
        let err = ops
            .make_edge_vertex(VertexId::new(0), VertexId::new(99), Point3::origin())
            .unwrap_err();
        assert_eq!(
            err,
            EulerError::StaleHandle {
                kind: "vertex",
                index: 99
            }
        );
        assert!(ops.kill_face_make_ring_hole(FaceId::new(42)).is_err());
        assert_eq!(ops.mesh().num_vertices(), 4);
    }
}
