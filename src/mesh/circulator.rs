//! Rotation around a vertex.
//!
//! A [`VertexCirculator`] walks the fan of faces around a vertex, starting at
//! the vertex's stored halfedge and stepping with `mate(prev(he))`. The walk
//! stops when it meets a boundary (a missing mate) and the caller stops it
//! when it comes back to the first element; the circulator itself never
//! compares against its start.
//!
//! Starting from a boundary vertex's boundary halfedge (which
//! [`Mesh::create_connectivity`] arranges) the forward walk covers the whole
//! fan. The neighbour walk additionally yields the far vertex of the last
//! face once the boundary is hit.
//!
//! The iterators returned by [`Mesh::vertex_halfedges`] and friends wrap the
//! circulator and do the start comparison themselves.

use super::halfedge::Mesh;
use super::index::{FaceId, HalfedgeId, MeshIndex, VertexId};

/// Stateful rotation around one vertex.
#[derive(Debug, Clone)]
pub struct VertexCirculator<'a, I: MeshIndex = u32> {
    mesh: &'a Mesh<I>,
    vertex: VertexId<I>,
    first: Option<HalfedgeId<I>>,
    cursor: Option<HalfedgeId<I>>,
}

impl<'a, I: MeshIndex> VertexCirculator<'a, I> {
    /// Create a circulator around `vertex`. Nothing is yielded until one of
    /// the `begin_*` methods is called.
    pub fn new(mesh: &'a Mesh<I>, vertex: VertexId<I>) -> Self {
        Self {
            mesh,
            vertex,
            first: None,
            cursor: None,
        }
    }

    /// The vertex being circulated.
    #[inline]
    pub fn vertex(&self) -> VertexId<I> {
        self.vertex
    }

    /// Start walks at `he` instead of the vertex's stored halfedge.
    pub fn set_first_halfedge(&mut self, he: HalfedgeId<I>) {
        self.first = Some(he);
    }

    fn start(&self) -> Option<HalfedgeId<I>> {
        let he = match self.first {
            Some(he) => he,
            None => self.mesh.get_vertex(self.vertex)?.halfedge.valid()?,
        };
        self.mesh.contains_halfedge(he).then_some(he)
    }

    fn step(&self, he: HalfedgeId<I>) -> Option<HalfedgeId<I>> {
        let prev = self.mesh.halfedge(he).prev.valid()?;
        self.mesh.mate(prev)
    }

    // ==================== Faces ====================

    /// Start the face walk and return the first face.
    pub fn begin_face(&mut self) -> Option<FaceId<I>> {
        self.cursor = self.start();
        self.mesh.face_of(self.cursor?)
    }

    /// Advance to the next face; `None` at the boundary.
    pub fn next_face(&mut self) -> Option<FaceId<I>> {
        self.cursor = self.step(self.cursor?);
        self.mesh.face_of(self.cursor?)
    }

    /// The face the walk starts with.
    pub fn first_face(&self) -> Option<FaceId<I>> {
        self.mesh.face_of(self.start()?)
    }

    /// The face across the starting halfedge, which the walk reaches last
    /// around an interior vertex.
    pub fn last_face(&self) -> Option<FaceId<I>> {
        let mate = self.mesh.mate(self.start()?)?;
        self.mesh.face_of(mate)
    }

    // ==================== Vertices ====================

    /// Start the neighbour walk and return the first neighbour.
    pub fn begin_vertex(&mut self) -> Option<VertexId<I>> {
        self.cursor = self.start();
        Some(self.mesh.dest(self.cursor?))
    }

    /// Advance to the next neighbour.
    ///
    /// At the boundary this yields the origin of the last face's incoming
    /// halfedge once, then `None`.
    pub fn next_vertex(&mut self) -> Option<VertexId<I>> {
        let current = self.cursor?;
        match self.step(current) {
            Some(he) => {
                self.cursor = Some(he);
                Some(self.mesh.dest(he))
            }
            None => {
                self.cursor = None;
                let prev = self.mesh.halfedge(current).prev.valid()?;
                Some(self.mesh.origin(prev))
            }
        }
    }

    /// The first neighbour.
    pub fn first_vertex(&self) -> Option<VertexId<I>> {
        Some(self.mesh.dest(self.start()?))
    }

    /// The neighbour reached just before the walk wraps around.
    pub fn last_vertex(&self) -> Option<VertexId<I>> {
        Some(self.mesh.dest(self.last_halfedge()?))
    }

    // ==================== Outgoing Halfedges ====================

    /// Start the outgoing halfedge walk.
    pub fn begin_halfedge(&mut self) -> Option<HalfedgeId<I>> {
        self.cursor = self.start();
        self.cursor
    }

    /// Advance to the next outgoing halfedge; `None` at the boundary.
    pub fn next_halfedge(&mut self) -> Option<HalfedgeId<I>> {
        self.cursor = self.step(self.cursor?);
        self.cursor
    }

    /// Step back to the previous outgoing halfedge with `next(mate(he))`.
    pub fn prev_halfedge(&mut self) -> Option<HalfedgeId<I>> {
        let mate = self.mesh.mate(self.cursor?);
        self.cursor = mate.and_then(|m| self.mesh.halfedge(m).next.valid());
        self.cursor
    }

    /// The first outgoing halfedge.
    pub fn first_halfedge(&self) -> Option<HalfedgeId<I>> {
        self.start()
    }

    /// The outgoing halfedge one step backwards from the first.
    pub fn last_halfedge(&self) -> Option<HalfedgeId<I>> {
        let mate = self.mesh.mate(self.start()?)?;
        self.mesh.halfedge(mate).next.valid()
    }

    // ==================== Incoming Halfedges ====================

    /// Start the incoming halfedge walk at `prev` of the starting halfedge.
    pub fn begin_rev_halfedge(&mut self) -> Option<HalfedgeId<I>> {
        let start = self.start()?;
        self.cursor = self.mesh.halfedge(start).prev.valid();
        self.cursor
    }

    /// Advance to the next incoming halfedge with `prev(mate(he))`.
    pub fn next_rev_halfedge(&mut self) -> Option<HalfedgeId<I>> {
        let mate = self.mesh.mate(self.cursor?);
        self.cursor = mate.and_then(|m| self.mesh.halfedge(m).prev.valid());
        self.cursor
    }

    /// The first incoming halfedge.
    pub fn first_rev_halfedge(&self) -> Option<HalfedgeId<I>> {
        self.mesh.halfedge(self.start()?).prev.valid()
    }

    /// The mate of the starting halfedge.
    pub fn last_rev_halfedge(&self) -> Option<HalfedgeId<I>> {
        self.mesh.mate(self.start()?)
    }

    // ==================== Counting ====================

    /// Number of distinct neighbours.
    pub fn num_vertices(&self) -> usize {
        self.mesh.vertex_neighbors(self.vertex).count()
    }

    /// Number of faces around the vertex.
    pub fn num_faces(&self) -> usize {
        self.mesh.vertex_faces(self.vertex).count()
    }
}

/// Iterator over outgoing halfedges of a vertex.
pub struct VertexHalfedgeIter<'a, I: MeshIndex = u32> {
    circ: VertexCirculator<'a, I>,
    first: Option<HalfedgeId<I>>,
    pending: Option<HalfedgeId<I>>,
    budget: usize,
}

impl<'a, I: MeshIndex> VertexHalfedgeIter<'a, I> {
    fn new(mesh: &'a Mesh<I>, v: VertexId<I>) -> Self {
        let mut circ = VertexCirculator::new(mesh, v);
        let first = circ.begin_halfedge();
        Self {
            circ,
            first,
            pending: first,
            budget: mesh.num_halfedges(),
        }
    }
}

impl<'a, I: MeshIndex> Iterator for VertexHalfedgeIter<'a, I> {
    type Item = HalfedgeId<I>;

    fn next(&mut self) -> Option<Self::Item> {
        let result = self.pending?;
        self.budget = self.budget.saturating_sub(1);
        self.pending = match self.circ.next_halfedge() {
            Some(he) if Some(he) != self.first && self.budget > 0 => Some(he),
            _ => None,
        };
        Some(result)
    }
}

/// Iterator over neighbours of a vertex.
///
/// Around a boundary vertex this includes both boundary neighbours.
pub struct VertexNeighborIter<'a, I: MeshIndex = u32> {
    circ: VertexCirculator<'a, I>,
    first: Option<VertexId<I>>,
    pending: Option<VertexId<I>>,
    budget: usize,
}

impl<'a, I: MeshIndex> VertexNeighborIter<'a, I> {
    fn new(mesh: &'a Mesh<I>, v: VertexId<I>) -> Self {
        let mut circ = VertexCirculator::new(mesh, v);
        let first = circ.begin_vertex();
        Self {
            circ,
            first,
            pending: first,
            budget: mesh.num_halfedges() + 1,
        }
    }
}

impl<'a, I: MeshIndex> Iterator for VertexNeighborIter<'a, I> {
    type Item = VertexId<I>;

    fn next(&mut self) -> Option<Self::Item> {
        let result = self.pending?;
        self.budget = self.budget.saturating_sub(1);
        self.pending = match self.circ.next_vertex() {
            Some(v) if Some(v) != self.first && self.budget > 0 => Some(v),
            _ => None,
        };
        Some(result)
    }
}

impl<I: MeshIndex> Mesh<I> {
    /// A circulator around `v`.
    pub fn circulator(&self, v: VertexId<I>) -> VertexCirculator<'_, I> {
        VertexCirculator::new(self, v)
    }

    /// Iterate over outgoing halfedges of a vertex, starting at its stored
    /// halfedge.
    pub fn vertex_halfedges(&self, v: VertexId<I>) -> VertexHalfedgeIter<'_, I> {
        VertexHalfedgeIter::new(self, v)
    }

    /// Iterate over halfedges ending at a vertex, in the same order as
    /// [`vertex_halfedges`](Mesh::vertex_halfedges).
    pub fn vertex_rev_halfedges(&self, v: VertexId<I>) -> impl Iterator<Item = HalfedgeId<I>> + '_ {
        self.vertex_halfedges(v).map(move |he| self.prev(he))
    }

    /// Iterate over vertices adjacent to a vertex.
    pub fn vertex_neighbors(&self, v: VertexId<I>) -> VertexNeighborIter<'_, I> {
        VertexNeighborIter::new(self, v)
    }

    /// Iterate over faces around a vertex.
    pub fn vertex_faces(&self, v: VertexId<I>) -> impl Iterator<Item = FaceId<I>> + '_ {
        self.vertex_halfedges(v).filter_map(move |he| self.face_of(he))
    }

    /// True if the vertex lies on the boundary. Isolated vertices count as
    /// boundary vertices.
    pub fn is_boundary_vertex(&self, v: VertexId<I>) -> bool {
        let mut circ = self.circulator(v);
        let Some(first) = circ.begin_halfedge() else {
            return true;
        };
        for _ in 0..self.num_halfedges() {
            match circ.next_halfedge() {
                None => return true,
                Some(he) if he == first => return false,
                Some(_) => {}
            }
        }
        true
    }

    /// Number of neighbours of a vertex.
    pub fn valence(&self, v: VertexId<I>) -> usize {
        self.vertex_neighbors(v).count()
    }

    /// The halfedge joining `o` to `target`, found by circulating around `o`.
    ///
    /// Returns the outgoing halfedge `o -> target` if there is one, otherwise
    /// the incoming halfedge `target -> o`.
    pub fn find_halfedge_around(&self, o: VertexId<I>, target: VertexId<I>) -> Option<HalfedgeId<I>> {
        let mut incoming = None;
        for he in self.vertex_halfedges(o) {
            if self.dest(he) == target {
                return Some(he);
            }
            let prev = self.prev(he);
            if incoming.is_none() && self.origin(prev) == target {
                incoming = Some(prev);
            }
        }
        incoming
    }

    /// Unit normal at a vertex: the average of its faces' normals.
    pub fn vertex_normal(&self, v: VertexId<I>) -> nalgebra::Vector3<f64> {
        let sum: nalgebra::Vector3<f64> = self.vertex_faces(v).map(|f| self.face_normal(f)).sum();
        sum.try_normalize(super::face::ZERO_EPS)
            .unwrap_or_else(nalgebra::Vector3::zeros)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{grid, tetrahedron};

    #[test]
    fn test_interior_vertex_of_closed_mesh() {
        let mesh: Mesh = tetrahedron();
        for v in mesh.vertex_ids() {
            assert_eq!(mesh.valence(v), 3);
            assert_eq!(mesh.vertex_faces(v).count(), 3);
            assert!(!mesh.is_boundary_vertex(v));
            for he in mesh.vertex_halfedges(v) {
                assert_eq!(mesh.origin(he), v);
            }
        }
    }

    #[test]
    fn test_neighbors_are_distinct() {
        let mesh: Mesh = tetrahedron();
        let v = mesh.vertex_ids().next().unwrap();
        let mut n: Vec<_> = mesh.vertex_neighbors(v).collect();
        n.sort();
        n.dedup();
        assert_eq!(n.len(), 3);
        assert!(!n.contains(&v));
    }

    #[test]
    fn test_grid_corner_and_center() {
        // 2x2 grid: vertex 0 is a corner, 4 the center, 1 a side midpoint.
        let mesh: Mesh = grid(2, 2);
        let corner = VertexId::new(0);
        let side = VertexId::new(1);
        let center = VertexId::new(4);

        assert!(mesh.is_boundary_vertex(corner));
        assert_eq!(mesh.valence(corner), 2);
        assert_eq!(mesh.vertex_faces(corner).count(), 1);

        assert!(mesh.is_boundary_vertex(side));
        assert_eq!(mesh.valence(side), 3);
        assert_eq!(mesh.vertex_faces(side).count(), 2);

        assert!(!mesh.is_boundary_vertex(center));
        assert_eq!(mesh.valence(center), 4);
        assert_eq!(mesh.vertex_faces(center).count(), 4);
    }

    #[test]
    fn test_boundary_neighbor_walk_ends_with_last_vertex() {
        let mesh: Mesh = grid(2, 2);
        let side = VertexId::new(1);
        let mut circ = mesh.circulator(side);
        let first = circ.begin_vertex().unwrap();
        let second = circ.next_vertex().unwrap();
        let third = circ.next_vertex().unwrap();
        assert_eq!(circ.next_vertex(), None);

        let mut seen = vec![first, second, third];
        seen.sort();
        assert_eq!(seen, vec![VertexId::new(0), VertexId::new(2), VertexId::new(4)]);
        assert_eq!(first, VertexId::new(2));
        assert_eq!(third, VertexId::new(0));
    }

    #[test]
    fn test_face_walk_stops_at_boundary() {
        let mesh: Mesh = grid(2, 2);
        let mut circ = mesh.circulator(VertexId::new(1));
        assert!(circ.begin_face().is_some());
        assert!(circ.next_face().is_some());
        assert_eq!(circ.next_face(), None);
        assert_eq!(circ.num_faces(), 2);
        assert_eq!(circ.num_vertices(), 3);
    }

    #[test]
    fn test_rev_halfedges_are_incoming() {
        let mesh: Mesh = tetrahedron();
        let v = mesh.vertex_ids().next().unwrap();
        let mut circ = mesh.circulator(v);
        let mut he = circ.begin_rev_halfedge();
        let mut count = 0;
        while let Some(h) = he {
            assert_eq!(mesh.dest(h), v);
            count += 1;
            he = circ.next_rev_halfedge();
            if he == circ.first_rev_halfedge() {
                break;
            }
        }
        assert_eq!(count, 3);
        assert_eq!(circ.last_rev_halfedge(), mesh.mate(circ.first_halfedge().unwrap()));
    }

    #[test]
    fn test_prev_halfedge_undoes_next() {
        let mesh: Mesh = tetrahedron();
        let v = mesh.vertex_ids().next().unwrap();
        let mut circ = mesh.circulator(v);
        let first = circ.begin_halfedge().unwrap();
        circ.next_halfedge().unwrap();
        assert_eq!(circ.prev_halfedge(), Some(first));
        assert_eq!(circ.prev_halfedge(), circ.last_halfedge());
    }

    #[test]
    fn test_find_halfedge_around() {
        let mesh: Mesh = grid(1, 1);
        // Single quad 0-1-3-2.
        let (v0, v1, v2) = (VertexId::new(0), VertexId::new(1), VertexId::new(2));
        let out = mesh.find_halfedge_around(v0, v1).unwrap();
        assert_eq!(mesh.origin(out), v0);
        let inc = mesh.find_halfedge_around(v0, v2).unwrap();
        assert_eq!(mesh.origin(inc), v2);
        assert_eq!(mesh.find_halfedge_around(v0, VertexId::new(3)), None);
    }

    #[test]
    fn test_isolated_vertex() {
        let mut mesh: Mesh = grid(1, 1);
        let lonely = mesh.add_vertex(nalgebra::Point3::new(5.0, 5.0, 5.0));
        assert!(mesh.is_boundary_vertex(lonely));
        assert_eq!(mesh.valence(lonely), 0);
        assert_eq!(mesh.circulator(lonely).begin_face(), None);
    }

    #[test]
    fn test_vertex_normal_on_flat_grid() {
        let mesh: Mesh = grid(2, 2);
        let n = mesh.vertex_normal(VertexId::new(4));
        assert!((n - nalgebra::Vector3::new(0.0, 0.0, 1.0)).norm() < 1e-10);
    }
}
