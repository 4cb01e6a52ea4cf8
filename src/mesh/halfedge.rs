//! Half-edge mesh data structure.
//!
//! This module provides [`Mesh`], a half-edge representation for polygonal
//! meshes with faces of any size.
//!
//! # Structure
//!
//! - Each face owns an ordered list of **halfedges**, one per side
//! - Each halfedge knows its **origin vertex**, owning **face**, **next** and
//!   **prev** halfedge around that face and, once connectivity exists, its
//!   **mate** (the opposite halfedge in the neighbouring face)
//! - Each vertex stores one outgoing halfedge
//!
//! # Boundary Handling
//!
//! There are no halfedges outside faces. A halfedge without a mate lies on the
//! boundary, and a boundary vertex points at one of its boundary halfedges once
//! [`create_connectivity`](Mesh::create_connectivity) has run.
//!
//! # Storage
//!
//! Every element kind lives in its own arena. Ids are assigned in increasing
//! order and deleted slots are never reused, so deleting an element never moves
//! or invalidates the handles of the others.

use std::collections::BTreeMap;

use nalgebra::{Point3, Vector3};

use super::arena::Arena;
use super::element::{Edge, Face, Halfedge, Normal, Texcoord, Vertex};
use super::index::{
    BoundaryLoopId, EdgeId, FaceId, HalfedgeId, LoopId, MeshIndex, NormalId, TexcoordId, VertexId,
};
use super::loops::{BoundaryLoop, Loop};

type DirectedKey<I> = (VertexId<I>, VertexId<I>);

/// A half-edge polygon mesh.
///
/// Owns every vertex, halfedge, face, edge, normal, texture coordinate and loop
/// that refers to it. All cross references are handles into this mesh.
#[derive(Debug, Clone)]
pub struct Mesh<I: MeshIndex = u32> {
    pub(crate) vertices: Arena<VertexId<I>, Vertex<I>>,
    pub(crate) halfedges: Arena<HalfedgeId<I>, Halfedge<I>>,
    pub(crate) faces: Arena<FaceId<I>, Face<I>>,
    pub(crate) edges: Arena<EdgeId<I>, Edge<I>>,
    pub(crate) normals: Arena<NormalId<I>, Normal>,
    pub(crate) texcoords: Arena<TexcoordId<I>, Texcoord>,
    pub(crate) loops: Arena<LoopId<I>, Loop<I>>,
    pub(crate) boundary_loops: Arena<BoundaryLoopId<I>, BoundaryLoop<I>>,

    /// Face halfedges keyed by (origin, destination).
    pub(crate) directed: BTreeMap<DirectedKey<I>, Vec<HalfedgeId<I>>>,

    pub(crate) connectivity: bool,
    pub(crate) center: Point3<f64>,
    pub(crate) max_length: f64,
    pub(crate) normalized: bool,
    pub(crate) tex_id: u32,
}

impl<I: MeshIndex> Default for Mesh<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: MeshIndex> Mesh<I> {
    /// Create a new empty mesh.
    pub fn new() -> Self {
        Self {
            vertices: Arena::new(),
            halfedges: Arena::new(),
            faces: Arena::new(),
            edges: Arena::new(),
            normals: Arena::new(),
            texcoords: Arena::new(),
            loops: Arena::new(),
            boundary_loops: Arena::new(),
            directed: BTreeMap::new(),
            connectivity: false,
            center: Point3::origin(),
            max_length: 1.0,
            normalized: false,
            tex_id: 0,
        }
    }

    /// Create a mesh with pre-allocated capacity.
    pub fn with_capacity(num_vertices: usize, num_faces: usize) -> Self {
        // Triangle meshes dominate: three halfedges per face.
        let mut mesh = Self::new();
        mesh.vertices = Arena::with_capacity(num_vertices);
        mesh.halfedges = Arena::with_capacity(num_faces * 3);
        mesh.faces = Arena::with_capacity(num_faces);
        mesh
    }

    // ==================== Accessors ====================

    /// Get the number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of halfedges.
    #[inline]
    pub fn num_halfedges(&self) -> usize {
        self.halfedges.len()
    }

    /// Get the number of faces.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Get the number of materialised full edges.
    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Get the number of per-corner normals.
    #[inline]
    pub fn num_normals(&self) -> usize {
        self.normals.len()
    }

    /// Get the number of texture coordinates.
    #[inline]
    pub fn num_texcoords(&self) -> usize {
        self.texcoords.len()
    }

    /// Get the number of loops.
    #[inline]
    pub fn num_loops(&self) -> usize {
        self.loops.len()
    }

    /// Get the number of boundary loops.
    #[inline]
    pub fn num_boundary_loops(&self) -> usize {
        self.boundary_loops.len()
    }

    /// True once connectivity has been built and not torn down since.
    #[inline]
    pub fn has_connectivity(&self) -> bool {
        self.connectivity
    }

    /// Get a vertex by ID.
    ///
    /// # Panics
    /// Panics if the vertex has been deleted.
    #[inline]
    pub fn vertex(&self, id: VertexId<I>) -> &Vertex<I> {
        &self.vertices[id]
    }

    /// Get a mutable vertex by ID.
    #[inline]
    pub fn vertex_mut(&mut self, id: VertexId<I>) -> &mut Vertex<I> {
        &mut self.vertices[id]
    }

    /// Get a vertex, or `None` for a deleted or foreign handle.
    #[inline]
    pub fn get_vertex(&self, id: VertexId<I>) -> Option<&Vertex<I>> {
        self.vertices.get(id)
    }

    /// True if the vertex is live.
    #[inline]
    pub fn contains_vertex(&self, id: VertexId<I>) -> bool {
        self.vertices.contains(id)
    }

    /// Get a halfedge by ID.
    #[inline]
    pub fn halfedge(&self, id: HalfedgeId<I>) -> &Halfedge<I> {
        &self.halfedges[id]
    }

    /// Get a mutable halfedge by ID.
    ///
    /// Rewriting `vertex`, `next`, `prev` or `face` through this reference
    /// bypasses the directed-edge index. Use the mesh operations instead.
    #[inline]
    pub fn halfedge_mut(&mut self, id: HalfedgeId<I>) -> &mut Halfedge<I> {
        &mut self.halfedges[id]
    }

    /// Get a halfedge, or `None` for a deleted or foreign handle.
    #[inline]
    pub fn get_halfedge(&self, id: HalfedgeId<I>) -> Option<&Halfedge<I>> {
        self.halfedges.get(id)
    }

    /// True if the halfedge is live.
    #[inline]
    pub fn contains_halfedge(&self, id: HalfedgeId<I>) -> bool {
        self.halfedges.contains(id)
    }

    /// Get a face by ID.
    #[inline]
    pub fn face(&self, id: FaceId<I>) -> &Face<I> {
        &self.faces[id]
    }

    /// Get a mutable face by ID.
    #[inline]
    pub fn face_mut(&mut self, id: FaceId<I>) -> &mut Face<I> {
        &mut self.faces[id]
    }

    /// Get a face, or `None` for a deleted or foreign handle.
    #[inline]
    pub fn get_face(&self, id: FaceId<I>) -> Option<&Face<I>> {
        self.faces.get(id)
    }

    /// True if the face is live.
    #[inline]
    pub fn contains_face(&self, id: FaceId<I>) -> bool {
        self.faces.contains(id)
    }

    /// Get an edge by ID.
    #[inline]
    pub fn edge(&self, id: EdgeId<I>) -> &Edge<I> {
        &self.edges[id]
    }

    /// Get a normal by ID.
    #[inline]
    pub fn normal(&self, id: NormalId<I>) -> &Normal {
        &self.normals[id]
    }

    /// Get a mutable normal by ID.
    #[inline]
    pub fn normal_mut(&mut self, id: NormalId<I>) -> &mut Normal {
        &mut self.normals[id]
    }

    /// Get a texture coordinate by ID.
    #[inline]
    pub fn texcoord(&self, id: TexcoordId<I>) -> &Texcoord {
        &self.texcoords[id]
    }

    /// Get a mutable texture coordinate by ID.
    #[inline]
    pub fn texcoord_mut(&mut self, id: TexcoordId<I>) -> &mut Texcoord {
        &mut self.texcoords[id]
    }

    /// Get a loop by ID.
    #[inline]
    pub fn get_loop(&self, id: LoopId<I>) -> Option<&Loop<I>> {
        self.loops.get(id)
    }

    /// Get a mutable loop by ID.
    #[inline]
    pub fn get_loop_mut(&mut self, id: LoopId<I>) -> Option<&mut Loop<I>> {
        self.loops.get_mut(id)
    }

    /// Get a boundary loop by ID.
    #[inline]
    pub fn boundary_loop(&self, id: BoundaryLoopId<I>) -> Option<&BoundaryLoop<I>> {
        self.boundary_loops.get(id)
    }

    /// Get a mutable boundary loop by ID.
    #[inline]
    pub fn boundary_loop_mut(&mut self, id: BoundaryLoopId<I>) -> Option<&mut BoundaryLoop<I>> {
        self.boundary_loops.get_mut(id)
    }

    /// Get the position of a vertex.
    #[inline]
    pub fn position(&self, v: VertexId<I>) -> &Point3<f64> {
        &self.vertex(v).position
    }

    /// Set the position of a vertex.
    #[inline]
    pub fn set_position(&mut self, v: VertexId<I>, pos: Point3<f64>) {
        self.vertex_mut(v).position = pos;
    }

    /// Default texture id given to new faces.
    #[inline]
    pub fn tex_id(&self) -> u32 {
        self.tex_id
    }

    /// Set the default texture id given to new faces.
    #[inline]
    pub fn set_tex_id(&mut self, tex_id: u32) {
        self.tex_id = tex_id;
    }

    // ==================== Topology Queries ====================

    /// The vertex a halfedge starts from.
    #[inline]
    pub fn origin(&self, he: HalfedgeId<I>) -> VertexId<I> {
        self.halfedge(he).vertex
    }

    /// The vertex a halfedge points to (the origin of its successor).
    #[inline]
    pub fn dest(&self, he: HalfedgeId<I>) -> VertexId<I> {
        self.origin(self.next(he))
    }

    /// The next halfedge around the face.
    #[inline]
    pub fn next(&self, he: HalfedgeId<I>) -> HalfedgeId<I> {
        self.halfedge(he).next
    }

    /// The previous halfedge around the face.
    #[inline]
    pub fn prev(&self, he: HalfedgeId<I>) -> HalfedgeId<I> {
        self.halfedge(he).prev
    }

    /// The opposite halfedge, `None` on the boundary.
    #[inline]
    pub fn mate(&self, he: HalfedgeId<I>) -> Option<HalfedgeId<I>> {
        self.halfedge(he).mate.valid()
    }

    /// The face owning a halfedge, `None` for a detached halfedge.
    #[inline]
    pub fn face_of(&self, he: HalfedgeId<I>) -> Option<FaceId<I>> {
        self.halfedge(he).face.valid()
    }

    /// The origin of the previous halfedge.
    #[inline]
    pub fn prev_vertex(&self, he: HalfedgeId<I>) -> VertexId<I> {
        self.origin(self.prev(he))
    }

    /// True if the halfedge has no mate.
    #[inline]
    pub fn is_boundary_halfedge(&self, he: HalfedgeId<I>) -> bool {
        self.halfedge(he).is_boundary()
    }

    /// True if `h1` and `h2` run in opposite directions over the same edge.
    pub fn is_mate_valid(&self, h1: HalfedgeId<I>, h2: HalfedgeId<I>) -> bool {
        self.directed_key(h1)
            .zip(self.directed_key(h2))
            .map_or(false, |((a0, a1), (b0, b1))| a0 == b1 && a1 == b0)
    }

    /// Find a face halfedge running from `v0` to `v1`.
    pub fn find_directed_halfedge(&self, v0: VertexId<I>, v1: VertexId<I>) -> Option<HalfedgeId<I>> {
        self.directed
            .get(&(v0, v1))
            .and_then(|list| list.first().copied())
    }

    /// Every face halfedge running from `v0` to `v1`. More than one means the
    /// edge is non-manifold or badly oriented.
    pub fn directed_halfedges(&self, v0: VertexId<I>, v1: VertexId<I>) -> &[HalfedgeId<I>] {
        self.directed.get(&(v0, v1)).map_or(&[], |list| list.as_slice())
    }

    /// All face halfedges starting at `v`, in no particular order.
    pub fn outgoing_halfedges(&self, v: VertexId<I>) -> Vec<HalfedgeId<I>> {
        self.directed
            .range((v, VertexId::new(0))..=(v, VertexId::invalid()))
            .flat_map(|(_, list)| list.iter().copied())
            .collect()
    }

    // ==================== Iteration ====================

    /// Iterate over all live vertex IDs.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.vertices.ids()
    }

    /// Iterate over all live vertices with their IDs.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId<I>, &Vertex<I>)> + '_ {
        self.vertices.iter()
    }

    /// Iterate over all live halfedge IDs.
    pub fn halfedge_ids(&self) -> impl Iterator<Item = HalfedgeId<I>> + '_ {
        self.halfedges.ids()
    }

    /// Iterate over all live halfedges with their IDs.
    pub fn halfedges(&self) -> impl Iterator<Item = (HalfedgeId<I>, &Halfedge<I>)> + '_ {
        self.halfedges.iter()
    }

    /// Iterate over all live face IDs.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId<I>> + '_ {
        self.faces.ids()
    }

    /// Iterate over all live faces with their IDs.
    pub fn faces(&self) -> impl Iterator<Item = (FaceId<I>, &Face<I>)> + '_ {
        self.faces.iter()
    }

    /// Iterate over all materialised edges with their IDs.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId<I>, &Edge<I>)> + '_ {
        self.edges.iter()
    }

    /// Iterate over all loops with their IDs.
    pub fn loops(&self) -> impl Iterator<Item = (LoopId<I>, &Loop<I>)> + '_ {
        self.loops.iter()
    }

    /// Iterate over all boundary loops with their IDs.
    pub fn boundary_loops(&self) -> impl Iterator<Item = (BoundaryLoopId<I>, &BoundaryLoop<I>)> + '_ {
        self.boundary_loops.iter()
    }

    /// Iterate over the halfedges of a face in cycle order.
    pub fn face_halfedges(&self, f: FaceId<I>) -> impl Iterator<Item = HalfedgeId<I>> + '_ {
        self.face(f).halfedges.iter().copied()
    }

    /// Iterate over the vertices of a face in cycle order.
    pub fn face_vertices(&self, f: FaceId<I>) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.face_halfedges(f).map(move |he| self.origin(he))
    }

    // ==================== Construction ====================

    /// Add a new vertex and return its ID.
    pub fn add_vertex(&mut self, position: Point3<f64>) -> VertexId<I> {
        self.vertices.insert(Vertex::new(position))
    }

    /// Add a new empty face using the mesh's current texture id.
    pub fn add_face(&mut self) -> FaceId<I> {
        let mut face = Face::new();
        face.tex_id = self.tex_id;
        self.faces.insert(face)
    }

    /// Append a halfedge starting at `v` to the end of a face's cycle.
    ///
    /// The vertex's outgoing halfedge is set to the new halfedge. Mates are not
    /// wired; see [`create_connectivity`](Mesh::create_connectivity).
    pub fn add_halfedge(&mut self, face: FaceId<I>, v: VertexId<I>) -> HalfedgeId<I> {
        let he = self.alloc_halfedge(v);
        let mut list = self.face(face).halfedges.clone();
        list.push(he);
        self.set_face_halfedges(face, list);
        self.vertex_mut(v).halfedge = he;
        he
    }

    /// Insert a halfedge starting at `v` right after `after` in its face.
    ///
    /// Returns `None` if `after` is not attached to a face.
    pub fn insert_halfedge(
        &mut self,
        after: HalfedgeId<I>,
        v: VertexId<I>,
    ) -> Option<HalfedgeId<I>> {
        let face = self.get_halfedge(after)?.face.valid()?;
        let pos = self.face(face).halfedges.iter().position(|&h| h == after)?;
        let he = self.alloc_halfedge(v);
        let mut list = self.face(face).halfedges.clone();
        list.insert(pos + 1, he);
        self.set_face_halfedges(face, list);
        self.vertex_mut(v).halfedge = he;
        Some(he)
    }

    /// Add a face through the given vertices, in order.
    ///
    /// Mates are not wired.
    pub fn add_polygon(&mut self, vertices: &[VertexId<I>]) -> FaceId<I> {
        let face = self.add_face();
        let list: Vec<_> = vertices.iter().map(|&v| self.alloc_halfedge(v)).collect();
        self.set_face_halfedges(face, list.clone());
        for (&v, &he) in vertices.iter().zip(&list) {
            self.vertex_mut(v).halfedge = he;
        }
        face
    }

    /// Add a triangle through three vertices.
    pub fn add_triangle(&mut self, v0: VertexId<I>, v1: VertexId<I>, v2: VertexId<I>) -> FaceId<I> {
        self.add_polygon(&[v0, v1, v2])
    }

    /// Add a full edge between two vertices.
    pub fn add_edge(&mut self, sv: VertexId<I>, ev: VertexId<I>) -> EdgeId<I> {
        self.edges.insert(Edge::new(sv, ev))
    }

    /// Add a per-corner normal.
    pub fn add_normal(&mut self, vector: Vector3<f64>) -> NormalId<I> {
        self.normals.insert(Normal { vector })
    }

    /// Add a texture coordinate.
    pub fn add_texcoord(&mut self, point: Point3<f64>) -> TexcoordId<I> {
        self.texcoords.insert(Texcoord { point })
    }

    /// Add an empty loop.
    pub fn add_loop(&mut self) -> LoopId<I> {
        self.loops.insert(Loop::new())
    }

    /// Add an empty boundary loop.
    pub fn add_boundary_loop(&mut self) -> BoundaryLoopId<I> {
        self.boundary_loops.insert(BoundaryLoop::new())
    }

    /// Set the normal of a halfedge corner.
    pub fn set_halfedge_normal(&mut self, he: HalfedgeId<I>, normal: NormalId<I>) {
        self.halfedge_mut(he).normal = normal;
    }

    /// Set the texture coordinate of a halfedge corner.
    pub fn set_halfedge_texcoord(&mut self, he: HalfedgeId<I>, texcoord: TexcoordId<I>) {
        self.halfedge_mut(he).texcoord = texcoord;
    }

    /// Make `he` point at `mate`, one direction only.
    pub fn set_mate(&mut self, he: HalfedgeId<I>, mate: HalfedgeId<I>) {
        self.halfedge_mut(he).mate = mate;
    }

    /// Make `h1` and `h2` each other's mate.
    pub fn set_both_mate(&mut self, h1: HalfedgeId<I>, h2: HalfedgeId<I>) {
        self.halfedge_mut(h1).mate = h2;
        self.halfedge_mut(h2).mate = h1;
    }

    // ==================== Destruction ====================

    /// Delete a vertex. Halfedges starting at it are left without a vertex and
    /// are removed by [`check_connectivity`](Mesh::check_connectivity).
    pub fn delete_vertex(&mut self, v: VertexId<I>) {
        if !self.vertices.contains(v) {
            return;
        }

        let users: Vec<HalfedgeId<I>> = self
            .halfedges
            .iter()
            .filter(|(_, h)| h.vertex == v)
            .map(|(id, _)| id)
            .collect();
        for he in users {
            let prev = self.halfedges[he].prev;
            self.unindex_halfedge(he);
            if prev.is_valid() {
                self.unindex_halfedge(prev);
            }
            self.halfedges[he].vertex = VertexId::invalid();
        }

        let stale_edges: Vec<EdgeId<I>> = self
            .edges
            .iter()
            .filter(|(_, e)| e.sv == v || e.ev == v)
            .map(|(id, _)| id)
            .collect();
        for e in stale_edges {
            self.delete_edge(e);
        }

        for (_, lp) in self.loops.iter_mut() {
            lp.remove_vertex(v);
        }
        for (_, bl) in self.boundary_loops.iter_mut() {
            bl.remove_vertex(v);
        }

        self.vertices.remove(v);
    }

    /// Delete a face together with its halfedges.
    ///
    /// Mates of the deleted halfedges become boundary halfedges and vertices
    /// that pointed at them are re-pointed at a surviving outgoing halfedge.
    pub fn delete_face(&mut self, f: FaceId<I>) {
        if !self.faces.contains(f) {
            return;
        }
        let members = self.face(f).halfedges.clone();
        self.set_face_halfedges(f, Vec::new());
        for he in members {
            self.discard_halfedge(he);
        }
        self.faces.remove(f);
    }

    /// Delete a single halfedge, closing the gap in its face's cycle.
    pub fn delete_halfedge(&mut self, he: HalfedgeId<I>) {
        let Some(face) = self.get_halfedge(he).map(|h| h.face) else {
            return;
        };
        if self.faces.contains(face) {
            let list: Vec<_> = self
                .face(face)
                .halfedges
                .iter()
                .copied()
                .filter(|&h| h != he)
                .collect();
            self.set_face_halfedges(face, list);
        }
        self.discard_halfedge(he);
    }

    /// Delete a full edge. Halfedges keep existing.
    pub fn delete_edge(&mut self, e: EdgeId<I>) {
        if let Some(edge) = self.edges.remove(e) {
            for he in [edge.lhe, edge.rhe] {
                if let Some(h) = self.halfedges.get_mut(he) {
                    if h.edge == e {
                        h.edge = EdgeId::invalid();
                    }
                }
            }
        }
    }

    /// Delete every full edge.
    pub fn delete_all_edges(&mut self) {
        for (_, h) in self.halfedges.iter_mut() {
            h.edge = EdgeId::invalid();
        }
        self.edges.clear();
    }

    /// Delete a normal and clear the corners using it.
    pub fn delete_normal(&mut self, n: NormalId<I>) {
        if self.normals.remove(n).is_some() {
            for (_, h) in self.halfedges.iter_mut() {
                if h.normal == n {
                    h.normal = NormalId::invalid();
                }
            }
        }
    }

    /// Delete a texture coordinate and clear the corners using it.
    pub fn delete_texcoord(&mut self, t: TexcoordId<I>) {
        if self.texcoords.remove(t).is_some() {
            for (_, h) in self.halfedges.iter_mut() {
                if h.texcoord == t {
                    h.texcoord = TexcoordId::invalid();
                }
            }
        }
    }

    /// Delete a loop.
    pub fn delete_loop(&mut self, id: LoopId<I>) {
        self.loops.remove(id);
    }

    /// Delete a boundary loop.
    pub fn delete_boundary_loop(&mut self, id: BoundaryLoopId<I>) {
        self.boundary_loops.remove(id);
    }

    /// Delete every element and reset the mesh to its empty state.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    // ==================== Face Cycle Maintenance ====================

    /// Create a halfedge that belongs to no face yet.
    pub(crate) fn alloc_halfedge(&mut self, v: VertexId<I>) -> HalfedgeId<I> {
        self.halfedges.insert(Halfedge::new(v))
    }

    /// Replace the halfedge cycle of `f` with `list`.
    ///
    /// This is the only place `next`, `prev` and `face` are rewritten.
    /// Halfedges taken from another face are removed from that face's cycle,
    /// which is relinked. Halfedges dropped from `f` are left detached.
    pub(crate) fn set_face_halfedges(&mut self, f: FaceId<I>, list: Vec<HalfedgeId<I>>) {
        let old = std::mem::take(&mut self.faces[f].halfedges);
        for &he in &old {
            self.unindex_halfedge(he);
        }

        let mut donors: Vec<FaceId<I>> = Vec::new();
        for &he in &list {
            let owner = self.halfedges[he].face;
            if owner.is_valid() && owner != f && self.faces.contains(owner) && !donors.contains(&owner) {
                let members = self.faces[owner].halfedges.clone();
                for h in members {
                    self.unindex_halfedge(h);
                }
                donors.push(owner);
            }
        }
        for &g in &donors {
            self.faces[g].halfedges.retain(|h| !list.contains(h));
        }

        for &he in &old {
            if !list.contains(&he) {
                let rec = &mut self.halfedges[he];
                rec.face = FaceId::invalid();
                rec.next = HalfedgeId::invalid();
                rec.prev = HalfedgeId::invalid();
            }
        }

        self.faces[f].halfedges = list;
        self.link_face(f);
        for g in donors {
            self.link_face(g);
        }
    }

    fn link_face(&mut self, f: FaceId<I>) {
        let list = self.faces[f].halfedges.clone();
        let n = list.len();
        for (i, &he) in list.iter().enumerate() {
            let rec = &mut self.halfedges[he];
            rec.face = f;
            rec.next = list[(i + 1) % n];
            rec.prev = list[(i + n - 1) % n];
        }
        for &he in &list {
            self.index_halfedge(he);
        }
    }

    /// Remove a halfedge that is no longer part of any face cycle.
    pub(crate) fn discard_halfedge(&mut self, he: HalfedgeId<I>) {
        let Some(rec) = self.halfedges.get(he).copied() else {
            return;
        };
        self.unindex_halfedge(he);

        if let Some(m) = self.halfedges.get_mut(rec.mate) {
            if m.mate == he {
                m.mate = HalfedgeId::invalid();
            }
        }
        if let Some(e) = self.edges.get_mut(rec.edge) {
            if e.lhe == he {
                e.lhe = HalfedgeId::invalid();
            }
            if e.rhe == he {
                e.rhe = HalfedgeId::invalid();
            }
        }
        self.halfedges.remove(he);

        if self.vertices.get(rec.vertex).map_or(false, |v| v.halfedge == he) {
            self.reset_vertex_halfedge(rec.vertex);
        }
    }

    /// Point `v` at a live outgoing halfedge, preferring a boundary one.
    pub fn reset_vertex_halfedge(&mut self, v: VertexId<I>) {
        let Some(current) = self.vertices.get(v).map(|vert| vert.halfedge) else {
            return;
        };
        let usable = self
            .halfedges
            .get(current)
            .map_or(false, |h| h.vertex == v && h.face.is_valid());
        let start = if usable {
            Some(current)
        } else {
            self.outgoing_halfedges(v).first().copied()
        };
        let chosen = start.map_or_else(HalfedgeId::invalid, |h| self.reset_halfedge(h));
        self.vertices[v].halfedge = chosen;
    }

    /// Rebuild the directed-edge index from scratch.
    pub(crate) fn rebuild_directed_index(&mut self) {
        self.directed.clear();
        let ids: Vec<HalfedgeId<I>> = self.halfedges.ids().collect();
        for he in ids {
            if self.halfedges[he].face.is_valid() {
                self.index_halfedge(he);
            }
        }
    }

    fn directed_key(&self, he: HalfedgeId<I>) -> Option<DirectedKey<I>> {
        let rec = self.halfedges.get(he)?;
        if !rec.vertex.is_valid() {
            return None;
        }
        let dest = self.halfedges.get(rec.next)?.vertex;
        if !dest.is_valid() || dest == rec.vertex {
            return None;
        }
        Some((rec.vertex, dest))
    }

    fn index_halfedge(&mut self, he: HalfedgeId<I>) {
        if let Some(key) = self.directed_key(he) {
            let list = self.directed.entry(key).or_default();
            if !list.contains(&he) {
                list.push(he);
            }
        }
    }

    fn unindex_halfedge(&mut self, he: HalfedgeId<I>) {
        let Some(key) = self.directed_key(he) else {
            return;
        };
        if let Some(list) = self.directed.get_mut(&key) {
            list.retain(|&h| h != he);
            if list.is_empty() {
                self.directed.remove(&key);
            }
        }
    }
}
