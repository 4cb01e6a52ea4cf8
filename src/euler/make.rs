//! Operators that add elements: MEV, MEF, MEKR, MFKRH and face creation.

use std::iter;

use nalgebra::Point3;

use super::EulerOps;
use crate::error::{EulerError, EulerResult};
use crate::mesh::{FaceId, HalfedgeId, MeshIndex, VertexId};

/// A validated request to split a face between the origins of two of its
/// halfedges.
#[derive(Debug, Clone, Copy)]
struct FaceSplit<I: MeshIndex> {
    face: FaceId<I>,
    h1: HalfedgeId<I>,
    h2: HalfedgeId<I>,
}

impl<'a, I: MeshIndex> EulerOps<'a, I> {
    // ==================== Make Edge Vertex ====================

    /// Split the internal edge between `v1` and `v2` with a new vertex at `p`
    /// (MEV).
    ///
    /// Both faces keep their cycle order and gain one side each: the edge is
    /// replaced by two halfedges on either side, four new halfedges in total,
    /// and the two old ones are removed. Returns the new vertex.
    pub fn make_edge_vertex(
        &mut self,
        v1: VertexId<I>,
        v2: VertexId<I>,
        p: Point3<f64>,
    ) -> EulerResult<VertexId<I>> {
        self.live_vertex(v1)?;
        self.live_vertex(v2)?;
        if v1 == v2 {
            return Err(EulerError::CoincidentVertices { vertex: v1.index() });
        }
        let he = self
            .mesh
            .find_halfedge(v1, v2)
            .ok_or(EulerError::EdgeNotFound {
                v0: v1.index(),
                v1: v2.index(),
            })?;
        if self.mesh.mate(he).is_none() {
            return Err(EulerError::BoundaryEdge {
                halfedge: he.index(),
            });
        }
        self.check_split_edge(he)?;
        Ok(self.commit_split_edge(he, p))
    }

    /// Split the edge under `he` with a new vertex at `p`.
    ///
    /// Works on boundary edges too, where only one face gains a side.
    pub fn split_edge(&mut self, he: HalfedgeId<I>, p: Point3<f64>) -> EulerResult<VertexId<I>> {
        self.check_split_edge(he)?;
        Ok(self.commit_split_edge(he, p))
    }

    fn check_split_edge(&self, he: HalfedgeId<I>) -> EulerResult<()> {
        let f1 = self.attached_face(he)?;
        self.check_cycle(f1)?;
        if let Some(m) = self.mesh.mate(he) {
            let f2 = self.attached_face(m)?;
            if f2 == f1 {
                return Err(EulerError::SelfLoopEdge {
                    halfedge: he.index(),
                });
            }
            self.check_cycle(f2)?;
        }
        Ok(())
    }

    fn commit_split_edge(&mut self, he: HalfedgeId<I>, p: Point3<f64>) -> VertexId<I> {
        let (v1, v2) = (self.mesh.origin(he), self.mesh.dest(he));
        let mate = self.mesh.mate(he);
        let n = self.mesh.add_vertex(p);

        let (a1, a2) = self.replace_with_pair(he, n);
        if let Some(m) = mate {
            let (b1, b2) = self.replace_with_pair(m, n);
            self.mesh.set_both_mate(a1, b2);
            self.mesh.set_both_mate(a2, b1);
            self.mesh.discard_halfedge(m);
        }
        self.mesh.discard_halfedge(he);

        self.mesh.vertex_mut(n).halfedge = a2;
        for v in [n, v1, v2] {
            self.mesh.reset_vertex_halfedge(v);
        }
        log::debug!("split edge {} - {} with {}", v1, v2, n);
        n
    }

    /// Replace `he` in its face by `origin(he) -> n -> dest(he)`, leaving `he`
    /// detached. The first new halfedge keeps the corner attributes of `he`.
    fn replace_with_pair(
        &mut self,
        he: HalfedgeId<I>,
        n: VertexId<I>,
    ) -> (HalfedgeId<I>, HalfedgeId<I>) {
        let old = *self.mesh.halfedge(he);
        let first = self.mesh.alloc_halfedge(old.vertex);
        let second = self.mesh.alloc_halfedge(n);
        {
            let rec = self.mesh.halfedge_mut(first);
            rec.normal = old.normal;
            rec.texcoord = old.texcoord;
            rec.selected = old.selected;
        }
        self.mesh.halfedge_mut(second).selected = old.selected;

        let list: Vec<HalfedgeId<I>> = self
            .mesh
            .face(old.face)
            .halfedges()
            .iter()
            .flat_map(|&h| {
                if h == he {
                    vec![first, second]
                } else {
                    vec![h]
                }
            })
            .collect();
        self.mesh.set_face_halfedges(old.face, list);
        (first, second)
    }

    // ==================== Make Edge Face ====================

    /// Add an edge between the origins of two halfedges of one face, splitting
    /// it in two (MEF).
    ///
    /// The old face keeps the side running from `h1` up to `h2`; the side from
    /// `h2` up to `h1` becomes the returned new face.
    pub fn make_edge_face(&mut self, h1: HalfedgeId<I>, h2: HalfedgeId<I>) -> EulerResult<FaceId<I>> {
        let split = self.check_split_face(h1, h2)?;
        Ok(self.commit_split_face(split).0)
    }

    /// Add an edge between two vertices of face `f` (MEKR).
    ///
    /// Returns the new halfedge left in `f`, running from `v2` to `v1`.
    pub fn make_edge_kill_ring(
        &mut self,
        v1: VertexId<I>,
        v2: VertexId<I>,
        f: FaceId<I>,
    ) -> EulerResult<HalfedgeId<I>> {
        self.live_face(f)?;
        self.live_vertex(v1)?;
        self.live_vertex(v2)?;
        let corner = |v: VertexId<I>| {
            self.mesh
                .face_find_halfedge(f, v)
                .ok_or(EulerError::VertexNotInFace {
                    vertex: v.index(),
                    face: f.index(),
                })
        };
        let (h1, h2) = (corner(v1)?, corner(v2)?);
        let split = self.check_split_face(h1, h2)?;
        Ok(self.commit_split_face(split).1)
    }

    fn check_split_face(&self, h1: HalfedgeId<I>, h2: HalfedgeId<I>) -> EulerResult<FaceSplit<I>> {
        let face = self.attached_face(h1)?;
        if self.attached_face(h2)? != face {
            return Err(EulerError::NotInSameFace {
                h0: h1.index(),
                h1: h2.index(),
            });
        }
        self.check_cycle(face)?;

        let (v1, v2) = (self.mesh.origin(h1), self.mesh.origin(h2));
        if v1 == v2 {
            return Err(EulerError::CoincidentVertices { vertex: v1.index() });
        }
        if self.mesh.next(h1) == h2 || self.mesh.next(h2) == h1 {
            return Err(EulerError::AdjacentHalfedges {
                h0: h1.index(),
                h1: h2.index(),
            });
        }
        if self.mesh.find_halfedge(v1, v2).is_some() {
            return Err(EulerError::EdgeExists {
                v0: v1.index(),
                v1: v2.index(),
            });
        }
        Ok(FaceSplit { face, h1, h2 })
    }

    /// Returns the new face and the new halfedge kept in the old face.
    fn commit_split_face(&mut self, split: FaceSplit<I>) -> (FaceId<I>, HalfedgeId<I>) {
        let FaceSplit { face, h1, h2 } = split;
        let (v1, v2) = (self.mesh.origin(h1), self.mesh.origin(h2));
        let mut kept = self.walk(h1, h2);
        let mut moved = self.walk(h2, h1);

        let n1 = self.mesh.alloc_halfedge(v2);
        let n2 = self.mesh.alloc_halfedge(v1);
        let g = self.mesh.add_face();
        let (tex_id, selected, normal) = {
            let old = self.mesh.face(face);
            (old.tex_id, old.selected, old.normal)
        };
        {
            let new = self.mesh.face_mut(g);
            new.tex_id = tex_id;
            new.selected = selected;
            new.normal = normal;
        }

        kept.push(n1);
        self.mesh.set_face_halfedges(face, kept);
        moved.push(n2);
        self.mesh.set_face_halfedges(g, moved);
        self.mesh.set_both_mate(n1, n2);

        self.mesh.reset_vertex_halfedge(v1);
        self.mesh.reset_vertex_halfedge(v2);
        log::debug!("split {} off {} along {} - {}", g, face, v1, v2);
        (g, n1)
    }

    /// Halfedges from `from` up to, not including, `to` along a validated cycle.
    fn walk(&self, from: HalfedgeId<I>, to: HalfedgeId<I>) -> Vec<HalfedgeId<I>> {
        let size = self.mesh.face(self.mesh.halfedge(from).face).size();
        iter::successors(Some(from), |&h| Some(self.mesh.next(h)))
            .take(size)
            .take_while(|&h| h != to)
            .collect()
    }

    // ==================== New Faces ====================

    /// Fill a hole with a face through `vertices`, in order (MFKRH).
    ///
    /// Rejected if any directed edge of the new face is already used by
    /// another face, since the two would be oriented against each other.
    /// Sides that run opposite an existing boundary halfedge are mated to it.
    pub fn make_face_kill_ring_hole(&mut self, vertices: &[VertexId<I>]) -> EulerResult<FaceId<I>> {
        self.check_new_face(vertices)?;
        let n = vertices.len();
        for i in 0..n {
            let (a, b) = (vertices[i], vertices[(i + 1) % n]);
            if let Some(&h) = self.mesh.directed_halfedges(a, b).first() {
                return Err(EulerError::OrientationConflict {
                    v0: a.index(),
                    v1: b.index(),
                    face: self.mesh.halfedge(h).face.index(),
                });
            }
        }
        Ok(self.commit_new_face(vertices))
    }

    /// Create a triangle through three vertices, mating its sides to existing
    /// opposite halfedges.
    pub fn create_triangle(
        &mut self,
        v0: VertexId<I>,
        v1: VertexId<I>,
        v2: VertexId<I>,
    ) -> EulerResult<FaceId<I>> {
        self.create_face(&[v0, v1, v2])
    }

    /// Create a quad through four vertices.
    pub fn create_quad(
        &mut self,
        v0: VertexId<I>,
        v1: VertexId<I>,
        v2: VertexId<I>,
        v3: VertexId<I>,
    ) -> EulerResult<FaceId<I>> {
        self.create_face(&[v0, v1, v2, v3])
    }

    /// Create a face through `vertices`, in order.
    ///
    /// Unlike [`make_face_kill_ring_hole`](EulerOps::make_face_kill_ring_hole)
    /// a side that repeats an existing directed edge is accepted and left
    /// unmated.
    pub fn create_face(&mut self, vertices: &[VertexId<I>]) -> EulerResult<FaceId<I>> {
        self.check_new_face(vertices)?;
        Ok(self.commit_new_face(vertices))
    }

    fn check_new_face(&self, vertices: &[VertexId<I>]) -> EulerResult<()> {
        if vertices.len() < 3 {
            return Err(EulerError::TooFewVertices {
                count: vertices.len(),
            });
        }
        for (i, &v) in vertices.iter().enumerate() {
            self.live_vertex(v)?;
            if vertices[..i].contains(&v) {
                return Err(EulerError::CoincidentVertices { vertex: v.index() });
            }
        }
        Ok(())
    }

    fn commit_new_face(&mut self, vertices: &[VertexId<I>]) -> FaceId<I> {
        let f = self.mesh.add_face();
        let list: Vec<HalfedgeId<I>> = vertices
            .iter()
            .map(|&v| self.mesh.alloc_halfedge(v))
            .collect();
        self.mesh.set_face_halfedges(f, list);
        let paired = self.connect_mates(f);
        for &v in vertices {
            self.mesh.reset_vertex_halfedge(v);
        }
        self.mesh.calc_face_normal(f);
        log::debug!("created {} with {} sides, {} mated", f, vertices.len(), paired);
        f
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{cube, grid, tetrahedron, Mesh};

    fn assert_mates_symmetric(mesh: &Mesh) {
        for he in mesh.halfedge_ids() {
            if let Some(m) = mesh.mate(he) {
                assert_eq!(mesh.mate(m), Some(he));
                assert_ne!(mesh.face_of(he), mesh.face_of(m));
                assert_eq!(mesh.origin(m), mesh.dest(he));
            }
        }
    }

    fn assert_cycles_close(mesh: &Mesh) {
        for (f, face) in mesh.faces() {
            let start = face.halfedges()[0];
            let mut he = start;
            for _ in 0..face.size() {
                assert_eq!(mesh.face_of(he), Some(f));
                assert_eq!(mesh.dest(mesh.prev(he)), mesh.origin(he));
                he = mesh.next(he);
            }
            assert_eq!(he, start);
        }
    }

    #[test]
    fn test_make_edge_vertex_on_tetrahedron() {
        let mut mesh: Mesh = tetrahedron();
        let (a, b) = (VertexId::new(0), VertexId::new(1));
        let mut ops = EulerOps::new(&mut mesh);
        let n = ops.make_edge_vertex(a, b, Point3::new(1.0, 0.0, 0.0)).unwrap();

        let mesh = ops.mesh();
        assert_eq!(mesh.num_vertices(), 5);
        assert_eq!(mesh.num_faces(), 4);
        assert_eq!(mesh.num_halfedges(), 14);
        assert_eq!(mesh.valence(n), 2);
        assert!(!mesh.is_boundary_vertex(n));
        assert!(mesh.find_halfedge(a, b).is_none());
        assert!(mesh.find_directed_halfedge(a, n).is_some() || mesh.find_directed_halfedge(n, a).is_some());
        assert_eq!(mesh.faces().filter(|(_, f)| f.size() == 4).count(), 2);
        assert_eq!(mesh.validate_mesh().euler_characteristic, 2);
        assert_mates_symmetric(mesh);
        assert_cycles_close(mesh);
    }

    #[test]
    fn test_make_edge_vertex_rejects_boundary_edge() {
        let mut mesh: Mesh = grid(1, 1);
        let mut ops = EulerOps::new(&mut mesh);
        let err = ops
            .make_edge_vertex(VertexId::new(0), VertexId::new(1), Point3::origin())
            .unwrap_err();
        assert!(matches!(err, EulerError::BoundaryEdge { .. }));

        let err = ops
            .make_edge_vertex(VertexId::new(0), VertexId::new(3), Point3::origin())
            .unwrap_err();
        assert_eq!(err, EulerError::EdgeNotFound { v0: 0, v1: 3 });
        assert_eq!(ops.mesh().num_vertices(), 4);
    }

    #[test]
    fn test_split_boundary_edge() {
        let mut mesh: Mesh = grid(1, 1);
        let he = mesh
            .find_directed_halfedge(VertexId::new(0), VertexId::new(1))
            .unwrap();
        let mut ops = EulerOps::new(&mut mesh);
        let n = ops.split_edge(he, Point3::new(0.5, 0.0, 0.0)).unwrap();

        let mesh = ops.mesh();
        assert!(!mesh.contains_halfedge(he));
        assert_eq!(mesh.face(mesh.face_ids().next().unwrap()).size(), 5);
        assert!(mesh.is_boundary_vertex(n));
        assert_eq!(mesh.valence(n), 2);
        let count = mesh.count_unique_edges();
        assert_eq!((count.boundary, count.internal), (5, 0));
        assert_cycles_close(mesh);
    }

    #[test]
    fn test_make_edge_face_splits_quad() {
        let mut mesh: Mesh = grid(1, 1);
        let f = mesh.face_ids().next().unwrap();
        let h0 = mesh.face_find_halfedge(f, VertexId::new(0)).unwrap();
        let h3 = mesh.face_find_halfedge(f, VertexId::new(3)).unwrap();

        let mut ops = EulerOps::new(&mut mesh);
        let g = ops.make_edge_face(h0, h3).unwrap();

        let mesh = ops.mesh();
        assert_eq!(mesh.num_faces(), 2);
        assert_eq!(mesh.face(f).size(), 3);
        assert_eq!(mesh.face(g).size(), 3);
        // The old face keeps the side starting at h0.
        assert!(mesh.is_vertex_in_face(f, VertexId::new(1)));
        assert!(mesh.is_vertex_in_face(g, VertexId::new(2)));

        let diagonal = mesh
            .find_directed_halfedge(VertexId::new(3), VertexId::new(0))
            .unwrap();
        assert_eq!(mesh.face_of(diagonal), Some(f));
        let count = mesh.count_unique_edges();
        assert_eq!((count.boundary, count.internal), (4, 1));
        assert_eq!(mesh.validate_mesh().euler_characteristic, 1);
        assert_mates_symmetric(mesh);
        assert_cycles_close(mesh);
    }

    #[test]
    fn test_make_edge_face_preconditions() {
        let mut mesh: Mesh = grid(2, 1);
        let faces: Vec<FaceId> = mesh.face_ids().collect();
        let h0 = mesh.face_find_halfedge(faces[0], VertexId::new(0)).unwrap();
        let h1 = mesh.face_find_halfedge(faces[0], VertexId::new(1)).unwrap();
        let other = mesh.face_find_halfedge(faces[1], VertexId::new(2)).unwrap();

        let mut ops = EulerOps::new(&mut mesh);
        assert_eq!(
            ops.make_edge_face(h0, h0),
            Err(EulerError::CoincidentVertices { vertex: 0 })
        );
        assert!(matches!(
            ops.make_edge_face(h0, h1),
            Err(EulerError::AdjacentHalfedges { .. })
        ));
        assert!(matches!(
            ops.make_edge_face(h0, other),
            Err(EulerError::NotInSameFace { .. })
        ));
        assert_eq!(ops.mesh().num_faces(), 2);
    }

    #[test]
    fn test_make_edge_kill_ring() {
        let mut mesh: Mesh = cube();
        let f = mesh.face_ids().next().unwrap();
        let corners: Vec<VertexId> = mesh.face_vertices(f).collect();

        let mut ops = EulerOps::new(&mut mesh);
        assert!(matches!(
            ops.make_edge_kill_ring(corners[0], VertexId::new(6), f),
            Err(EulerError::VertexNotInFace { .. })
        ));
        let n1 = ops.make_edge_kill_ring(corners[0], corners[2], f).unwrap();

        let mesh = ops.mesh();
        assert_eq!(mesh.face_of(n1), Some(f));
        assert_eq!(mesh.origin(n1), corners[2]);
        assert_eq!(mesh.dest(n1), corners[0]);
        assert_eq!(mesh.num_faces(), 7);
        assert_eq!(mesh.validate_mesh().euler_characteristic, 2);
        assert_mates_symmetric(mesh);
    }

    #[test]
    fn test_make_face_kill_ring_hole_fills_hole() {
        let mut mesh: Mesh = tetrahedron();
        let f = mesh.face_ids().next().unwrap();
        let corners: Vec<VertexId> = mesh.face_vertices(f).collect();

        let mut ops = EulerOps::new(&mut mesh);
        ops.kill_face_make_ring_hole(f).unwrap();
        assert_eq!(ops.validate_mesh().euler_characteristic, 1);

        // Same orientation as the neighbours' boundary: conflict.
        let reversed: Vec<VertexId> = corners.iter().rev().copied().collect();
        assert!(matches!(
            ops.make_face_kill_ring_hole(&reversed),
            Err(EulerError::OrientationConflict { .. })
        ));

        let g = ops.make_face_kill_ring_hole(&corners).unwrap();
        let mesh = ops.mesh();
        assert!(mesh.face_halfedges(g).all(|he| mesh.mate(he).is_some()));
        assert_eq!(mesh.validate_mesh().euler_characteristic, 2);
        assert!(mesh.vertex_ids().all(|v| !mesh.is_boundary_vertex(v)));
        assert_mates_symmetric(mesh);
    }

    #[test]
    fn test_create_faces_from_scratch() {
        let mut mesh = Mesh::<u32>::new();
        let v: Vec<VertexId> = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (2.0, 0.5)]
            .iter()
            .map(|&(x, y)| mesh.add_vertex(Point3::new(x, y, 0.0)))
            .collect();

        let mut ops = EulerOps::new(&mut mesh);
        assert_eq!(
            ops.create_face(&v[..2]),
            Err(EulerError::TooFewVertices { count: 2 })
        );
        assert_eq!(
            ops.create_triangle(v[0], v[1], v[0]),
            Err(EulerError::CoincidentVertices { vertex: 0 })
        );

        let quad = ops.create_quad(v[0], v[1], v[2], v[3]).unwrap();
        let tri = ops.create_triangle(v[1], v[4], v[2]).unwrap();

        let mesh = ops.mesh();
        let shared = mesh.find_directed_halfedge(v[2], v[1]).unwrap();
        assert_eq!(mesh.face_of(shared), Some(tri));
        assert_eq!(mesh.face_of(mesh.mate(shared).unwrap()), Some(quad));
        assert!((mesh.face(quad).normal.z - 1.0).abs() < 1e-10);
        assert!(mesh.is_boundary_vertex(v[1]));
        assert!(mesh.halfedge(mesh.vertex(v[1]).halfedge).is_boundary());
        let count = mesh.count_unique_edges();
        assert_eq!((count.boundary, count.internal, count.total()), (5, 1, 6));
        assert_mates_symmetric(mesh);
    }
}
