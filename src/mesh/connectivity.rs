//! Building, tearing down and repairing halfedge connectivity.
//!
//! Faces are created without mates. [`Mesh::create_connectivity`] pairs every
//! halfedge with the opposite halfedge of its neighbouring face by collecting
//! full edges keyed by their vertex pair. Input that cannot be paired
//! (non-manifold edges, inconsistent orientation) is reported as
//! [`Diagnostic`]s and left unmated.

use std::collections::HashMap;

use super::halfedge::Mesh;
use super::index::{BoundaryLoopId, EdgeId, FaceId, HalfedgeId, MeshIndex, VertexId};
use super::loops::BoundaryLoopOptions;
use crate::diagnostics::{emit, Diagnostic};

/// Full edges keyed by their unordered vertex pair.
#[derive(Debug, Default)]
pub struct EdgeList<I: MeshIndex = u32> {
    edges: HashMap<(VertexId<I>, VertexId<I>), EdgeId<I>>,
}

impl<I: MeshIndex> EdgeList<I> {
    /// Create an empty edge list.
    pub fn new() -> Self {
        Self {
            edges: HashMap::new(),
        }
    }

    fn key(v0: VertexId<I>, v1: VertexId<I>) -> (VertexId<I>, VertexId<I>) {
        if v0 <= v1 {
            (v0, v1)
        } else {
            (v1, v0)
        }
    }

    /// The edge joining `v0` and `v1` in either direction.
    pub fn find_edge(&self, v0: VertexId<I>, v1: VertexId<I>) -> Option<EdgeId<I>> {
        self.edges.get(&Self::key(v0, v1)).copied()
    }

    /// Record an edge.
    pub fn push(&mut self, v0: VertexId<I>, v1: VertexId<I>, edge: EdgeId<I>) {
        self.edges.insert(Self::key(v0, v1), edge);
    }

    /// Number of recorded edges.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// True if no edge is recorded.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Options for [`Mesh::create_connectivity`].
#[derive(Debug, Clone, Default)]
pub struct ConnectivityOptions {
    /// Keep the full edges created while pairing halfedges.
    pub retain_edges: bool,
}

impl ConnectivityOptions {
    /// Keep or drop the full edges after pairing.
    pub fn with_retain_edges(mut self, retain: bool) -> Self {
        self.retain_edges = retain;
        self
    }
}

/// Outcome of [`Mesh::create_connectivity`].
#[derive(Debug, Clone, Default)]
pub struct ConnectivityReport {
    /// Number of halfedge pairs mated.
    pub mated_pairs: usize,
    /// Number of full edges found.
    pub edges: usize,
    /// Problems found and skipped.
    pub diagnostics: Vec<Diagnostic>,
}

impl ConnectivityReport {
    /// True if every edge was paired without complaint.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Outcome of [`Mesh::check_connectivity`].
#[derive(Debug, Clone, Default)]
pub struct CleanupReport {
    /// Faces deleted as isolated.
    pub deleted_faces: usize,
    /// Vertices deleted as unused.
    pub deleted_vertices: usize,
    /// Halfedges deleted for lacking a vertex or face.
    pub deleted_halfedges: usize,
    /// What was deleted and why.
    pub diagnostics: Vec<Diagnostic>,
}

impl<I: MeshIndex> Mesh<I> {
    // ==================== Construction ====================

    /// Pair every face halfedge with its opposite halfedge.
    ///
    /// Existing connectivity is torn down first. A third halfedge on an edge,
    /// a second halfedge running the same way, or a pair inside a single face
    /// is reported and left unmated. Afterwards every vertex points at its
    /// boundary halfedge if it has one.
    pub fn create_connectivity(&mut self, options: &ConnectivityOptions) -> ConnectivityReport {
        if self.connectivity {
            self.delete_all_edges();
            self.delete_connectivity();
        }

        let mut report = ConnectivityReport::default();
        let mut edge_list = EdgeList::new();
        let faces: Vec<FaceId<I>> = self.face_ids().collect();

        for f in faces {
            let members = self.face(f).halfedges.clone();
            for he in members {
                let sv = self.origin(he);
                let ev = self.dest(he);
                if !sv.is_valid() || !ev.is_valid() {
                    continue;
                }
                self.vertex_mut(sv).halfedge = he;

                let Some(e) = edge_list.find_edge(sv, ev) else {
                    let e = self.add_edge(sv, ev);
                    self.edges[e].lhe = he;
                    self.halfedge_mut(he).edge = e;
                    edge_list.push(sv, ev, e);
                    continue;
                };

                let edge = self.edges[e];
                if edge.rhe.is_valid() {
                    emit(
                        &mut report.diagnostics,
                        Diagnostic::NonManifoldEdge {
                            v0: sv.index(),
                            v1: ev.index(),
                            face: f.index(),
                            halfedge: he.index(),
                        },
                    );
                } else if self.face_of(edge.lhe) == Some(f) {
                    emit(
                        &mut report.diagnostics,
                        Diagnostic::SelfLoopEdge {
                            face: f.index(),
                            halfedge: he.index(),
                        },
                    );
                } else if self.is_mate_valid(edge.lhe, he) {
                    self.set_both_mate(edge.lhe, he);
                    self.edges[e].rhe = he;
                    self.halfedge_mut(he).edge = e;
                    report.mated_pairs += 1;
                } else {
                    emit(
                        &mut report.diagnostics,
                        Diagnostic::BadOrientation {
                            v0: sv.index(),
                            v1: ev.index(),
                            face: f.index(),
                            halfedge: he.index(),
                        },
                    );
                }
            }
        }
        report.edges = edge_list.len();

        self.reset_all_vertex_halfedges();
        if !options.retain_edges {
            self.delete_all_edges();
        }
        self.connectivity = true;

        log::debug!(
            "connectivity: {} edges, {} mated pairs, {} diagnostics",
            report.edges,
            report.mated_pairs,
            report.diagnostics.len()
        );
        report
    }

    /// Clear every mate and vertex halfedge.
    pub fn delete_connectivity(&mut self) {
        for (_, v) in self.vertices.iter_mut() {
            v.halfedge = HalfedgeId::invalid();
        }
        for (_, h) in self.halfedges.iter_mut() {
            h.mate = HalfedgeId::invalid();
        }
        self.connectivity = false;
    }

    /// Rotate `he` around its origin to a boundary halfedge, if there is one.
    ///
    /// Returns `he` itself for an interior vertex or a halfedge without a mate.
    pub fn reset_halfedge(&self, he: HalfedgeId<I>) -> HalfedgeId<I> {
        let Some(start) = self.get_halfedge(he) else {
            return he;
        };
        let v = start.vertex;
        let mut current = he;
        for _ in 0..self.num_halfedges() {
            let Some(mate) = self.get_halfedge(current).and_then(|h| h.mate.valid()) else {
                return current;
            };
            let Some(next) = self.get_halfedge(mate).and_then(|h| h.next.valid()) else {
                return current;
            };
            if next == he {
                return he;
            }
            if self.get_halfedge(next).map(|h| h.vertex) != Some(v) {
                return current;
            }
            current = next;
        }
        current
    }

    /// Point every vertex at its boundary halfedge if it has one.
    pub fn reset_all_vertex_halfedges(&mut self) {
        let ids: Vec<VertexId<I>> = self.vertex_ids().collect();
        for v in ids {
            let he = self.vertex(v).halfedge;
            if self.contains_halfedge(he) {
                let reset = self.reset_halfedge(he);
                self.vertex_mut(v).halfedge = reset;
            }
        }
    }

    // ==================== Cleanup ====================

    /// Remove isolated faces, unused vertices and dangling halfedges.
    ///
    /// Meant to run after [`create_connectivity`](Mesh::create_connectivity):
    /// a face with two or more boundary halfedges counts as isolated. Boundary
    /// loops that lost a vertex are traced again.
    pub fn check_connectivity(&mut self) -> CleanupReport {
        let mut report = CleanupReport::default();
        self.delete_isolated_faces(&mut report);
        self.delete_isolated_vertices(&mut report);
        report
    }

    fn delete_isolated_faces(&mut self, report: &mut CleanupReport) {
        let isolated: Vec<FaceId<I>> = self
            .face_ids()
            .filter(|&f| {
                self.face_halfedges(f)
                    .filter(|&he| self.is_boundary_halfedge(he))
                    .count()
                    >= 2
            })
            .collect();

        for f in isolated {
            emit(&mut report.diagnostics, Diagnostic::IsolatedFace { face: f.index() });
            self.delete_face(f);
            report.deleted_faces += 1;
        }
    }

    fn delete_isolated_vertices(&mut self, report: &mut CleanupReport) {
        let mut used = vec![false; self.vertices.next_id().index()];
        for (_, h) in self.halfedges() {
            if h.vertex.is_valid() && h.face.is_valid() {
                if let Some(slot) = used.get_mut(h.vertex.index()) {
                    *slot = true;
                }
            }
        }

        let unused: Vec<VertexId<I>> = self
            .vertex_ids()
            .filter(|v| !used[v.index()])
            .collect();

        let mut retrace: Vec<BoundaryLoopId<I>> = Vec::new();
        for v in unused {
            for (id, bl) in self.boundary_loops() {
                if bl.is_vertex(v) && !retrace.contains(&id) {
                    retrace.push(id);
                }
            }
            emit(
                &mut report.diagnostics,
                Diagnostic::UnusedVertex { vertex: v.index() },
            );
            self.delete_vertex(v);
            report.deleted_vertices += 1;
        }

        let dangling = self.cleanup_dangling_halfedges();
        if dangling > 0 {
            emit(
                &mut report.diagnostics,
                Diagnostic::DanglingHalfedges { count: dangling },
            );
            report.deleted_halfedges = dangling;
        }
        self.rebuild_all_face_halfedge_lists();

        for id in retrace {
            self.retrace_boundary_loop(id);
        }
    }

    /// Delete halfedges without a live vertex or face. Returns how many.
    pub fn cleanup_dangling_halfedges(&mut self) -> usize {
        let dangling: Vec<HalfedgeId<I>> = self
            .halfedges()
            .filter(|(_, h)| !self.contains_vertex(h.vertex) || !self.contains_face(h.face))
            .map(|(id, _)| id)
            .collect();
        let count = dangling.len();
        for he in dangling {
            self.delete_halfedge(he);
        }
        count
    }

    /// Drop halfedges that no longer belong to their face from every face list.
    pub fn rebuild_all_face_halfedge_lists(&mut self) {
        let faces: Vec<FaceId<I>> = self.face_ids().collect();
        for f in faces {
            let list = self.face(f).halfedges.clone();
            let kept: Vec<HalfedgeId<I>> = list
                .iter()
                .copied()
                .filter(|&he| {
                    self.get_halfedge(he)
                        .map_or(false, |h| h.face == f && self.contains_vertex(h.vertex))
                })
                .collect();
            if kept.len() != list.len() {
                self.set_face_halfedges(f, kept);
            }
        }
    }

    fn retrace_boundary_loop(&mut self, id: BoundaryLoopId<I>) {
        let Some(bl) = self.boundary_loop(id) else {
            return;
        };
        let start = bl.vertices().first().copied();
        let corners = bl.num_corners().max(1);
        self.delete_boundary_loop(id);
        if let Some(start) = start {
            let options = BoundaryLoopOptions::default().with_corners(corners);
            self.create_boundary_loop_from(start, &options);
        }
    }
}
