//! Operators that remove elements: KEV, KEMR, KEF and KFMRH.

use std::iter;

use super::EulerOps;
use crate::error::{EulerError, EulerResult};
use crate::mesh::{FaceId, HalfedgeId, MeshIndex, VertexId};

/// A validated vertex removal.
///
/// `sides` holds each outgoing halfedge of the vertex with its face. For an
/// interior vertex `rejoin` holds the two incoming halfedges that become
/// mates once the vertex is gone.
#[derive(Debug, Clone)]
pub(super) struct VertexRemoval<I: MeshIndex> {
    vertex: VertexId<I>,
    sides: Vec<(HalfedgeId<I>, FaceId<I>)>,
    rejoin: Option<(HalfedgeId<I>, HalfedgeId<I>)>,
    ends: (VertexId<I>, VertexId<I>),
}

/// A validated face merge across the edge under `halfedge`.
#[derive(Debug, Clone, Copy)]
pub(super) struct FaceMerge<I: MeshIndex> {
    halfedge: HalfedgeId<I>,
    mate: HalfedgeId<I>,
    keep: FaceId<I>,
    remove: FaceId<I>,
}

impl<'a, I: MeshIndex> EulerOps<'a, I> {
    // ==================== Kill Edge Vertex ====================

    /// Remove a vertex with exactly two neighbours, joining its two edges into
    /// one (KEV). Inverse of [`make_edge_vertex`](EulerOps::make_edge_vertex)
    /// and [`split_edge`](EulerOps::split_edge).
    ///
    /// Each face around the vertex loses one side and must keep at least three.
    pub fn kill_edge_vertex(&mut self, v: VertexId<I>) -> EulerResult<()> {
        let removal = self.check_kill_edge_vertex(v)?;
        self.commit_kill_edge_vertex(removal);
        Ok(())
    }

    pub(super) fn check_kill_edge_vertex(&self, v: VertexId<I>) -> EulerResult<VertexRemoval<I>> {
        self.live_vertex(v)?;
        let mesh = &*self.mesh;
        let outs = mesh.outgoing_halfedges(v);

        let mut neighbours: Vec<VertexId<I>> = outs
            .iter()
            .flat_map(|&o| [mesh.dest(o), mesh.prev_vertex(o)])
            .collect();
        neighbours.sort();
        neighbours.dedup();
        let not_two = |valence| EulerError::NotValenceTwo {
            vertex: v.index(),
            valence,
        };
        if neighbours.len() != 2 {
            return Err(not_two(neighbours.len()));
        }

        let (sides, rejoin) = match outs.as_slice() {
            &[o1] => {
                let p1 = mesh.prev(o1);
                if mesh.mate(o1).is_some() || mesh.mate(p1).is_some() {
                    return Err(not_two(neighbours.len()));
                }
                (vec![(o1, self.attached_face(o1)?)], None)
            }
            &[o1, o2] => {
                let (p1, p2) = (mesh.prev(o1), mesh.prev(o2));
                if mesh.mate(o1) != Some(p2) || mesh.mate(o2) != Some(p1) {
                    return Err(not_two(neighbours.len()));
                }
                let (f1, f2) = (self.attached_face(o1)?, self.attached_face(o2)?);
                if f1 == f2 {
                    return Err(EulerError::SelfLoopEdge {
                        halfedge: o1.index(),
                    });
                }
                (vec![(o1, f1), (o2, f2)], Some((p1, p2)))
            }
            _ => return Err(not_two(outs.len())),
        };

        for &(_, f) in &sides {
            self.check_cycle(f)?;
            let size = mesh.face(f).size();
            if size < 4 {
                return Err(EulerError::FaceTooSmall {
                    face: f.index(),
                    sides: size,
                });
            }
        }

        let o1 = sides[0].0;
        let (a, b) = (mesh.prev_vertex(o1), mesh.dest(o1));
        if mesh.find_halfedge(a, b).is_some() {
            return Err(EulerError::EdgeExists {
                v0: a.index(),
                v1: b.index(),
            });
        }

        Ok(VertexRemoval {
            vertex: v,
            sides,
            rejoin,
            ends: (a, b),
        })
    }

    fn commit_kill_edge_vertex(&mut self, removal: VertexRemoval<I>) {
        for &(o, f) in &removal.sides {
            let list: Vec<HalfedgeId<I>> = self
                .mesh
                .face(f)
                .halfedges()
                .iter()
                .copied()
                .filter(|&h| h != o)
                .collect();
            self.mesh.set_face_halfedges(f, list);
        }
        for &(o, _) in &removal.sides {
            self.mesh.discard_halfedge(o);
        }
        if let Some((p1, p2)) = removal.rejoin {
            self.mesh.set_both_mate(p1, p2);
        }
        self.mesh.delete_vertex(removal.vertex);

        let (a, b) = removal.ends;
        self.mesh.reset_vertex_halfedge(a);
        self.mesh.reset_vertex_halfedge(b);
        log::debug!("removed {} between {} and {}", removal.vertex, a, b);
    }

    // ==================== Kill Edge Make Ring ====================

    /// Remove the edge under `he` and merge the two faces on either side
    /// (KEMR).
    ///
    /// The face of `he` survives and is returned; the face of its mate is
    /// deleted. The two faces must not touch anywhere except along this edge.
    pub fn kill_edge_make_ring(&mut self, he: HalfedgeId<I>) -> EulerResult<FaceId<I>> {
        let merge = self.check_kill_edge_make_ring(he)?;
        Ok(self.commit_merge(merge))
    }

    /// Remove the internal edge between `v1` and `v2`, merging its faces
    /// (KEF).
    pub fn kill_edge_face(&mut self, v1: VertexId<I>, v2: VertexId<I>) -> EulerResult<FaceId<I>> {
        self.live_vertex(v1)?;
        self.live_vertex(v2)?;
        let he = self
            .mesh
            .find_halfedge(v1, v2)
            .ok_or(EulerError::EdgeNotFound {
                v0: v1.index(),
                v1: v2.index(),
            })?;
        self.kill_edge_make_ring(he)
    }

    pub(super) fn check_kill_edge_make_ring(&self, he: HalfedgeId<I>) -> EulerResult<FaceMerge<I>> {
        let keep = self.attached_face(he)?;
        let mate = self.mesh.mate(he).ok_or(EulerError::BoundaryEdge {
            halfedge: he.index(),
        })?;
        let remove = self.attached_face(mate)?;
        if keep == remove {
            return Err(EulerError::SelfLoopEdge {
                halfedge: he.index(),
            });
        }
        self.check_cycle(keep)?;
        self.check_cycle(remove)?;

        let (v1, v2) = (self.mesh.origin(he), self.mesh.dest(he));
        let touches_elsewhere = self
            .mesh
            .face_vertices(keep)
            .any(|v| v != v1 && v != v2 && self.mesh.is_vertex_in_face(remove, v));
        if touches_elsewhere {
            return Err(EulerError::SharedBoundary {
                f0: keep.index(),
                f1: remove.index(),
            });
        }

        Ok(FaceMerge {
            halfedge: he,
            mate,
            keep,
            remove,
        })
    }

    fn commit_merge(&mut self, merge: FaceMerge<I>) -> FaceId<I> {
        let FaceMerge {
            halfedge,
            mate,
            keep,
            remove,
        } = merge;
        let (v1, v2) = (self.mesh.origin(halfedge), self.mesh.dest(halfedge));

        let mut merged = self.rest_of_cycle(halfedge);
        merged.extend(self.rest_of_cycle(mate));
        self.mesh.set_face_halfedges(keep, merged);
        self.mesh.delete_face(remove);
        self.mesh.discard_halfedge(halfedge);

        self.mesh.reset_vertex_halfedge(v1);
        self.mesh.reset_vertex_halfedge(v2);
        log::debug!("merged {} into {} across {} - {}", remove, keep, v1, v2);
        keep
    }

    /// The halfedges of a validated cycle after `he`, up to and excluding `he`.
    fn rest_of_cycle(&self, he: HalfedgeId<I>) -> Vec<HalfedgeId<I>> {
        let size = self.mesh.face(self.mesh.halfedge(he).face).size();
        iter::successors(Some(self.mesh.next(he)), |&h| Some(self.mesh.next(h)))
            .take(size - 1)
            .collect()
    }

    // ==================== Kill Face Make Ring Hole ====================

    /// Delete a face, leaving a hole (KFMRH).
    ///
    /// The mates of its halfedges become boundary halfedges.
    pub fn kill_face_make_ring_hole(&mut self, f: FaceId<I>) -> EulerResult<()> {
        self.live_face(f)?;
        if self.mesh.face(f).size() == 0 {
            return Err(EulerError::EmptyFace { face: f.index() });
        }

        let corners: Vec<VertexId<I>> = self.mesh.face_vertices(f).collect();
        self.mesh.delete_face(f);
        for v in corners {
            self.mesh.reset_vertex_halfedge(v);
        }
        log::debug!("punched hole at {}", f);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{build_from_triangles, cube, grid, tetrahedron, Mesh};
    use nalgebra::Point3;

    fn counts(mesh: &Mesh) -> (usize, usize, usize) {
        (mesh.num_vertices(), mesh.count_unique_edges().total(), mesh.num_faces())
    }

    #[test]
    fn test_make_then_kill_edge_vertex_round_trip() {
        let mut mesh: Mesh = cube();
        let before = counts(&mesh);
        let sizes_before: Vec<usize> = mesh.faces().map(|(_, f)| f.size()).collect();

        let mut ops = EulerOps::new(&mut mesh);
        let v = ops
            .make_edge_vertex(VertexId::new(0), VertexId::new(1), Point3::new(0.5, 0.0, 0.0))
            .unwrap();
        assert_eq!(counts(ops.mesh()), (before.0 + 1, before.1 + 1, before.2));
        assert!(ops.can_kill_edge_vertex(v));

        ops.kill_edge_vertex(v).unwrap();
        let mesh = ops.mesh();
        assert_eq!(counts(mesh), before);
        let sizes_after: Vec<usize> = mesh.faces().map(|(_, f)| f.size()).collect();
        assert_eq!(sizes_after, sizes_before);
        assert!(!mesh.contains_vertex(v));

        let edge = mesh
            .find_directed_halfedge(VertexId::new(0), VertexId::new(1))
            .unwrap();
        let mate = mesh.mate(edge).unwrap();
        assert_eq!(mesh.mate(mate), Some(edge));
        assert_eq!(mesh.origin(mate), VertexId::new(1));
        assert!(EulerOps::new(&mut mesh.clone()).check_consistency().is_empty());
    }

    #[test]
    fn test_kill_boundary_edge_vertex() {
        let mut mesh: Mesh = grid(1, 1);
        let he = mesh
            .find_directed_halfedge(VertexId::new(0), VertexId::new(1))
            .unwrap();
        let mut ops = EulerOps::new(&mut mesh);
        let v = ops.split_edge(he, Point3::new(0.5, 0.0, 0.0)).unwrap();
        ops.kill_edge_vertex(v).unwrap();

        let mesh = ops.mesh();
        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.face(mesh.face_ids().next().unwrap()).size(), 4);
        assert!(mesh.find_directed_halfedge(VertexId::new(0), VertexId::new(1)).is_some());
    }

    #[test]
    fn test_kill_edge_vertex_preconditions() {
        let mut mesh: Mesh = tetrahedron();
        let mut ops = EulerOps::new(&mut mesh);
        // Valence three.
        assert_eq!(
            ops.kill_edge_vertex(VertexId::new(0)),
            Err(EulerError::NotValenceTwo {
                vertex: 0,
                valence: 3
            })
        );


        // Removing a corner of a lone triangle would leave two sides.
        let mut tri = Mesh::<u32>::new();
        let v0 = tri.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let v1 = tri.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let v2 = tri.add_vertex(Point3::new(0.0, 1.0, 0.0));
        let f = tri.add_triangle(v0, v1, v2);
        let mut ops = EulerOps::new(&mut tri);
        assert_eq!(
            ops.kill_edge_vertex(v0),
            Err(EulerError::FaceTooSmall {
                face: f.index(),
                sides: 3
            })
        );
        assert!(!ops.can_kill_edge_vertex(v0));
        assert_eq!(ops.mesh().num_vertices(), 3);
    }

    #[test]
    fn test_kill_corner_of_quad_leaves_triangle() {
        let mut mesh: Mesh = grid(1, 1);
        let mut ops = EulerOps::new(&mut mesh);
        ops.kill_edge_vertex(VertexId::new(0)).unwrap();

        let mesh = ops.mesh();
        let f = mesh.face_ids().next().unwrap();
        assert_eq!(mesh.face(f).size(), 3);
        assert_eq!(mesh.num_vertices(), 3);
        assert!(mesh.find_halfedge(VertexId::new(1), VertexId::new(2)).is_some());
    }

    #[test]
    fn test_kill_edge_make_ring_round_trip() {
        let mut mesh: Mesh = cube();
        let f = mesh.face_ids().next().unwrap();
        let before = counts(&mesh);
        let corners: Vec<VertexId> = mesh.face_vertices(f).collect();

        let mut ops = EulerOps::new(&mut mesh);
        let n1 = ops.make_edge_kill_ring(corners[0], corners[2], f).unwrap();
        assert_eq!(counts(ops.mesh()), (before.0, before.1 + 1, before.2 + 1));

        let merged = ops.kill_edge_make_ring(n1).unwrap();
        assert_eq!(merged, f);
        let mesh = ops.mesh();
        assert_eq!(counts(mesh), before);
        let after: Vec<VertexId> = mesh.face_vertices(f).collect();
        assert_eq!(after.len(), 4);
        let start = after.iter().position(|&v| v == corners[0]).unwrap();
        let rotated: Vec<VertexId> = (0..4).map(|i| after[(start + i) % 4]).collect();
        assert_eq!(rotated, corners);
        assert_eq!(mesh.validate_mesh().euler_characteristic, 2);
    }

    #[test]
    fn test_kill_edge_make_ring_on_self_loop_edge_fails() {
        // A single triangle whose edge 0-1 is mated to itself by hand.
        let mut mesh = Mesh::<u32>::new();
        let v0 = mesh.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let v1 = mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let v2 = mesh.add_vertex(Point3::new(0.0, 1.0, 0.0));
        let f = mesh.add_triangle(v0, v1, v2);
        let h0 = mesh.face_find_halfedge(f, v0).unwrap();
        let h2 = mesh.face_find_halfedge(f, v2).unwrap();
        mesh.set_both_mate(h0, h2);
        let before = (mesh.num_vertices(), mesh.num_halfedges(), mesh.num_faces());

        let mut ops = EulerOps::new(&mut mesh);
        assert_eq!(
            ops.kill_edge_make_ring(h0),
            Err(EulerError::SelfLoopEdge {
                halfedge: h0.index()
            })
        );
        assert!(!ops.can_kill_edge_make_ring(h0));
        let mesh = ops.mesh();
        assert_eq!((mesh.num_vertices(), mesh.num_halfedges(), mesh.num_faces()), before);
    }

    #[test]
    fn test_kill_edge_make_ring_preconditions() {
        let mut mesh: Mesh = tetrahedron();
        let mut ops = EulerOps::new(&mut mesh);
        ops.kill_edge_face(VertexId::new(0), VertexId::new(1)).unwrap();
        assert_eq!(ops.mesh().validate_mesh().euler_characteristic, 2);
        // The merged quad and the remaining triangle on 1-2 also meet at 3.
        assert!(matches!(
            ops.kill_edge_face(VertexId::new(1), VertexId::new(2)),
            Err(EulerError::SharedBoundary { .. })
        ));
        assert_eq!(ops.mesh().num_faces(), 3);

        let mut grid: Mesh = grid(1, 1);
        let boundary = grid
            .find_directed_halfedge(VertexId::new(0), VertexId::new(1))
            .unwrap();
        let mut ops = EulerOps::new(&mut grid);
        assert_eq!(
            ops.kill_edge_make_ring(boundary),
            Err(EulerError::BoundaryEdge {
                halfedge: boundary.index()
            })
        );
        assert_eq!(
            ops.kill_edge_face(VertexId::new(0), VertexId::new(3)),
            Err(EulerError::EdgeNotFound { v0: 0, v1: 3 })
        );
    }

    #[test]
    fn test_kill_edge_face_on_square() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mut mesh: Mesh = build_from_triangles(&vertices, &[[0, 1, 2], [0, 2, 3]]).unwrap();
        let mut ops = EulerOps::new(&mut mesh);
        let f = ops.kill_edge_face(VertexId::new(2), VertexId::new(0)).unwrap();

        let mesh = ops.mesh();
        assert_eq!(mesh.num_faces(), 1);
        assert_eq!(mesh.face(f).size(), 4);
        let count = mesh.count_unique_edges();
        assert_eq!((count.boundary, count.internal), (4, 0));
        assert!(mesh.vertex_ids().all(|v| mesh.is_boundary_vertex(v)));
    }

    #[test]
    fn test_kill_face_make_ring_hole_on_closed_mesh() {
        let mut mesh: Mesh = tetrahedron();
        assert_eq!(mesh.validate_mesh().euler_characteristic, 2);
        let f = mesh.face_ids().next().unwrap();

        let mut ops = EulerOps::new(&mut mesh);
        ops.kill_face_make_ring_hole(f).unwrap();
        assert_eq!(
            ops.kill_face_make_ring_hole(f),
            Err(EulerError::StaleHandle {
                kind: "face",
                index: f.index()
            })
        );

        let mesh = ops.mesh();
        let health = mesh.validate_mesh();
        assert_eq!(health.euler_characteristic, 1);
        assert_eq!(health.boundary_edges, 3);
        assert!(health.is_healthy());
        for v in mesh.vertex_ids() {
            let he = mesh.vertex(v).halfedge;
            if mesh.is_boundary_vertex(v) {
                assert!(mesh.halfedge(he).is_boundary());
            }
        }
        assert_eq!(mesh.vertex_ids().filter(|&v| mesh.is_boundary_vertex(v)).count(), 3);
    }

    #[test]
    fn test_kill_empty_face_fails() {
        let mut mesh = Mesh::<u32>::new();
        let f = mesh.add_face();
        let mut ops = EulerOps::new(&mut mesh);
        assert_eq!(
            ops.kill_face_make_ring_hole(f),
            Err(EulerError::EmptyFace { face: f.index() })
        );
    }
}
