//! Vertex reordering, index-buffer rebuilds and id compaction.
//!
//! Arena slots are never reused, so a mesh that has seen many deletions keeps
//! sparse ids. [`Mesh::compact`] renumbers every element kind densely in its
//! current order and [`Mesh::reorder_vertices`] does the same with a caller
//! chosen vertex order. Every handle held outside the mesh is invalidated.

use super::arena::Arena;
use super::connectivity::ConnectivityOptions;
use super::halfedge::Mesh;
use super::index::{ElementId, FaceId, MeshIndex, VertexId};
use crate::error::{MeshError, Result};

/// Move the elements listed in `order` into a fresh arena, returning it with
/// the old-slot to new-id map.
fn rebuild<K: ElementId, T>(mut old: Arena<K, T>, order: &[K]) -> (Arena<K, T>, Vec<Option<K>>) {
    let mut map = vec![None; old.next_id().to_index()];
    let mut arena = Arena::with_capacity(order.len());
    for &id in order {
        if let Some(value) = old.remove(id) {
            map[id.to_index()] = Some(arena.insert(value));
        }
    }
    (arena, map)
}

#[inline]
fn lookup<K: ElementId>(map: &[Option<K>], id: K) -> Option<K> {
    map.get(id.to_index()).copied().flatten()
}

impl<I: MeshIndex> Mesh<I> {
    /// Renumber every element densely, keeping the current order.
    pub fn compact(&mut self) {
        let order: Vec<VertexId<I>> = self.vertex_ids().collect();
        self.renumber(&order);
    }

    /// Renumber vertices so that the `i`-th vertex becomes `order[i]`-th of
    /// the current vertex sequence.
    ///
    /// `order` must be a permutation of `0..num_vertices()`. The other element
    /// kinds are compacted as well.
    pub fn reorder_vertices(&mut self, order: &[usize]) -> Result<()> {
        let live: Vec<VertexId<I>> = self.vertex_ids().collect();
        if order.len() != live.len() {
            return Err(MeshError::invalid_param(
                "order",
                order.len(),
                "must list every vertex exactly once",
            ));
        }
        let mut seen = vec![false; live.len()];
        for &i in order {
            if i >= live.len() || seen[i] {
                return Err(MeshError::invalid_param(
                    "order",
                    i,
                    "out of range or repeated",
                ));
            }
            seen[i] = true;
        }

        let new_order: Vec<VertexId<I>> = order.iter().map(|&i| live[i]).collect();
        self.renumber(&new_order);
        log::debug!("reordered {} vertices", new_order.len());
        Ok(())
    }

    /// Replace every face by the triangles of an index buffer.
    ///
    /// Indices refer to the current vertex sequence. If the mesh had
    /// connectivity it is rebuilt for the new faces.
    pub fn reorder_indices(&mut self, indices: &[usize]) -> Result<()> {
        if indices.len() % 3 != 0 {
            return Err(MeshError::invalid_param(
                "indices",
                indices.len(),
                "length must be a multiple of 3",
            ));
        }
        let live: Vec<VertexId<I>> = self.vertex_ids().collect();
        for (face, tri) in indices.chunks(3).enumerate() {
            if let Some(&vertex) = tri.iter().find(|&&i| i >= live.len()) {
                return Err(MeshError::InvalidVertexIndex { face, vertex });
            }
            if tri[0] == tri[1] || tri[1] == tri[2] || tri[0] == tri[2] {
                return Err(MeshError::DegenerateFace { face });
            }
        }

        let had_connectivity = self.has_connectivity();
        let old: Vec<FaceId<I>> = self.face_ids().collect();
        for f in old {
            self.delete_face(f);
        }
        for tri in indices.chunks(3) {
            self.add_triangle(live[tri[0]], live[tri[1]], live[tri[2]]);
        }
        if had_connectivity {
            self.create_connectivity(&ConnectivityOptions::default());
        }
        Ok(())
    }

    fn renumber(&mut self, vertex_order: &[VertexId<I>]) {
        let (mut vertices, vmap) = rebuild(std::mem::take(&mut self.vertices), vertex_order);

        let order: Vec<_> = self.halfedges.ids().collect();
        let (mut halfedges, hmap) = rebuild(std::mem::take(&mut self.halfedges), &order);
        let order: Vec<_> = self.faces.ids().collect();
        let (mut faces, fmap) = rebuild(std::mem::take(&mut self.faces), &order);
        let order: Vec<_> = self.edges.ids().collect();
        let (mut edges, emap) = rebuild(std::mem::take(&mut self.edges), &order);
        let order: Vec<_> = self.normals.ids().collect();
        let (normals, nmap) = rebuild(std::mem::take(&mut self.normals), &order);
        let order: Vec<_> = self.texcoords.ids().collect();
        let (texcoords, tmap) = rebuild(std::mem::take(&mut self.texcoords), &order);
        let order: Vec<_> = self.loops.ids().collect();
        let (mut loops, _) = rebuild(std::mem::take(&mut self.loops), &order);
        let order: Vec<_> = self.boundary_loops.ids().collect();
        let (mut boundary_loops, _) = rebuild(std::mem::take(&mut self.boundary_loops), &order);

        let v = |id| lookup(&vmap, id);
        let h = |id| lookup(&hmap, id);

        for (_, vert) in vertices.iter_mut() {
            vert.halfedge = h(vert.halfedge).into();
        }
        for (_, he) in halfedges.iter_mut() {
            he.vertex = v(he.vertex).into();
            he.face = lookup(&fmap, he.face).into();
            he.next = h(he.next).into();
            he.prev = h(he.prev).into();
            he.mate = h(he.mate).into();
            he.edge = lookup(&emap, he.edge).into();
            he.normal = lookup(&nmap, he.normal).into();
            he.texcoord = lookup(&tmap, he.texcoord).into();
        }
        for (_, face) in faces.iter_mut() {
            face.halfedges = face.halfedges.iter().filter_map(|&id| h(id)).collect();
        }
        for (_, edge) in edges.iter_mut() {
            edge.sv = v(edge.sv).into();
            edge.ev = v(edge.ev).into();
            edge.lhe = h(edge.lhe).into();
            edge.rhe = h(edge.rhe).into();
        }
        for (_, lp) in loops.iter_mut() {
            lp.remap(v, h);
        }
        for (_, bl) in boundary_loops.iter_mut() {
            bl.remap(v, h);
        }

        self.vertices = vertices;
        self.halfedges = halfedges;
        self.faces = faces;
        self.edges = edges;
        self.normals = normals;
        self.texcoords = texcoords;
        self.loops = loops;
        self.boundary_loops = boundary_loops;
        self.rebuild_directed_index();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{grid, tetrahedron};
    use nalgebra::Point3;

    #[test]
    fn test_reorder_vertices_reverses_positions() {
        let mut mesh: Mesh = tetrahedron();
        let before: Vec<Point3<f64>> = mesh.vertices().map(|(_, v)| v.position).collect();
        mesh.reorder_vertices(&[3, 2, 1, 0]).unwrap();

        let after: Vec<Point3<f64>> = mesh.vertices().map(|(_, v)| v.position).collect();
        let reversed: Vec<Point3<f64>> = before.into_iter().rev().collect();
        assert_eq!(after, reversed);

        // Topology survives: still a closed tetrahedron.
        for v in mesh.vertex_ids() {
            assert_eq!(mesh.valence(v), 3);
            assert!(!mesh.is_boundary_vertex(v));
        }
        for he in mesh.halfedge_ids() {
            let m = mesh.mate(he).unwrap();
            assert_eq!(mesh.mate(m), Some(he));
        }
    }

    #[test]
    fn test_reorder_vertices_rejects_bad_order() {
        let mut mesh: Mesh = tetrahedron();
        assert!(mesh.reorder_vertices(&[0, 1, 2]).is_err());
        assert!(mesh.reorder_vertices(&[0, 1, 1, 2]).is_err());
        assert!(mesh.reorder_vertices(&[0, 1, 2, 7]).is_err());
    }

    #[test]
    fn test_compact_after_deletions() {
        let mut mesh: Mesh = grid(2, 1);
        let first = mesh.face_ids().next().unwrap();
        mesh.delete_face(first);
        mesh.check_connectivity();
        mesh.compact();

        assert_eq!(mesh.num_faces(), 1);
        assert_eq!(mesh.num_vertices(), 4);
        let ids: Vec<usize> = mesh.vertex_ids().map(|v| v.index()).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
        let hes: Vec<usize> = mesh.halfedge_ids().map(|h| h.index()).collect();
        assert_eq!(hes, vec![0, 1, 2, 3]);

        let f = mesh.face_ids().next().unwrap();
        assert_eq!(f.index(), 0);
        for he in mesh.face_halfedges(f) {
            assert_eq!(mesh.next(mesh.prev(he)), he);
            assert!(mesh.contains_vertex(mesh.origin(he)));
            let d = mesh.dest(he);
            assert_eq!(mesh.find_directed_halfedge(mesh.origin(he), d), Some(he));
        }
    }

    #[test]
    fn test_reorder_indices() {
        let mut mesh: Mesh = grid(1, 1);
        mesh.reorder_indices(&[0, 1, 3, 0, 3, 2]).unwrap();
        assert_eq!(mesh.num_faces(), 2);
        assert!(mesh.faces().all(|(_, f)| f.size() == 3));
        let diagonal = mesh
            .find_directed_halfedge(VertexId::new(0), VertexId::new(3))
            .unwrap();
        assert!(mesh.mate(diagonal).is_some());
    }

    #[test]
    fn test_reorder_indices_rejects_bad_input() {
        let mut mesh: Mesh = grid(1, 1);
        assert!(mesh.reorder_indices(&[0, 1]).is_err());
        assert!(matches!(
            mesh.reorder_indices(&[0, 1, 9]),
            Err(MeshError::InvalidVertexIndex { face: 0, vertex: 9 })
        ));
        assert!(matches!(
            mesh.reorder_indices(&[0, 1, 2, 1, 1, 3]),
            Err(MeshError::DegenerateFace { face: 1 })
        ));
        assert_eq!(mesh.num_faces(), 1);
    }
}
