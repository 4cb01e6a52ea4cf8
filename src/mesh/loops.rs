//! Vertex/halfedge loops and boundary loops.
//!
//! A [`Loop`] is an ordered list of vertices and halfedges with a cursor for
//! stepping through either list. A [`BoundaryLoop`] is a loop traced along the
//! mesh boundary, with a corner flag per vertex.

use std::f64::consts::PI;

use nalgebra::Point3;

use super::halfedge::Mesh;
use super::index::{BoundaryLoopId, HalfedgeId, MeshIndex, VertexId};
use crate::diagnostics::Diagnostic;

/// An ordered loop of vertices and halfedges with stepping cursors.
#[derive(Debug, Clone)]
pub struct Loop<I: MeshIndex = u32> {
    vertices: Vec<VertexId<I>>,
    halfedges: Vec<HalfedgeId<I>>,
    vertex_cursor: usize,
    halfedge_cursor: usize,
    closed: bool,
    /// Selection flag.
    pub selected: bool,
}

impl<I: MeshIndex> Default for Loop<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: MeshIndex> Loop<I> {
    /// Create an empty open loop.
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            halfedges: Vec::new(),
            vertex_cursor: 0,
            halfedge_cursor: 0,
            closed: false,
            selected: false,
        }
    }

    /// True if stepping wraps around at either end.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Set whether stepping wraps around.
    #[inline]
    pub fn set_closed(&mut self, closed: bool) {
        self.closed = closed;
    }

    /// Reset both cursors to the start.
    pub fn reset(&mut self) {
        self.vertex_cursor = 0;
        self.halfedge_cursor = 0;
    }

    /// Rewrite every handle after elements were renumbered, dropping the ones
    /// that map to nothing.
    pub(crate) fn remap(
        &mut self,
        vertex: impl Fn(VertexId<I>) -> Option<VertexId<I>>,
        halfedge: impl Fn(HalfedgeId<I>) -> Option<HalfedgeId<I>>,
    ) {
        self.vertices = self.vertices.iter().filter_map(|&v| vertex(v)).collect();
        self.halfedges = self.halfedges.iter().filter_map(|&h| halfedge(h)).collect();
        self.reset();
    }

    // ==================== Vertices ====================

    /// The vertices in loop order.
    #[inline]
    pub fn vertices(&self) -> &[VertexId<I>] {
        &self.vertices
    }

    /// Number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Append a vertex.
    pub fn add_vertex(&mut self, v: VertexId<I>) {
        self.vertices.push(v);
    }

    /// Remove every occurrence of a vertex.
    pub fn remove_vertex(&mut self, v: VertexId<I>) {
        self.vertices.retain(|&x| x != v);
        self.vertex_cursor = self.vertex_cursor.min(self.vertices.len().saturating_sub(1));
    }

    /// Drop all vertices.
    pub fn clear_vertices(&mut self) {
        self.vertices.clear();
        self.vertex_cursor = 0;
    }

    /// The vertex at position `i`.
    #[inline]
    pub fn vertex(&self, i: usize) -> Option<VertexId<I>> {
        self.vertices.get(i).copied()
    }

    /// True if `v` is on the loop.
    pub fn contains_vertex(&self, v: VertexId<I>) -> bool {
        self.vertices.contains(&v)
    }

    /// Move the vertex cursor to the start and return the first vertex.
    pub fn begin_vertex(&mut self) -> Option<VertexId<I>> {
        self.vertex_cursor = 0;
        self.vertex(0)
    }

    /// The first vertex.
    pub fn first_vertex(&self) -> Option<VertexId<I>> {
        self.vertices.first().copied()
    }

    /// The last vertex.
    pub fn last_vertex(&self) -> Option<VertexId<I>> {
        self.vertices.last().copied()
    }

    /// Advance the vertex cursor. Open loops stop at the end, closed loops wrap.
    pub fn next_vertex(&mut self) -> Option<VertexId<I>> {
        self.vertex_cursor = step_forward(self.vertex_cursor, self.vertices.len(), self.closed)?;
        self.vertex(self.vertex_cursor)
    }

    /// Move the vertex cursor back. Open loops stop at the start, closed loops wrap.
    pub fn prev_vertex(&mut self) -> Option<VertexId<I>> {
        self.vertex_cursor = step_back(self.vertex_cursor, self.vertices.len(), self.closed)?;
        self.vertex(self.vertex_cursor)
    }

    /// Reset the vertex cursor to the start.
    pub fn reset_vertex(&mut self) {
        self.vertex_cursor = 0;
    }

    // ==================== Halfedges ====================

    /// The halfedges in loop order.
    #[inline]
    pub fn halfedges(&self) -> &[HalfedgeId<I>] {
        &self.halfedges
    }

    /// Number of halfedges.
    #[inline]
    pub fn num_halfedges(&self) -> usize {
        self.halfedges.len()
    }

    /// Append a halfedge.
    pub fn add_halfedge(&mut self, he: HalfedgeId<I>) {
        self.halfedges.push(he);
    }

    /// Drop all halfedges.
    pub fn clear_halfedges(&mut self) {
        self.halfedges.clear();
        self.halfedge_cursor = 0;
    }

    /// The halfedge at position `i`.
    #[inline]
    pub fn halfedge(&self, i: usize) -> Option<HalfedgeId<I>> {
        self.halfedges.get(i).copied()
    }

    /// Move the halfedge cursor to the start and return the first halfedge.
    pub fn begin_halfedge(&mut self) -> Option<HalfedgeId<I>> {
        self.halfedge_cursor = 0;
        self.halfedge(0)
    }

    /// The first halfedge.
    pub fn first_halfedge(&self) -> Option<HalfedgeId<I>> {
        self.halfedges.first().copied()
    }

    /// The last halfedge.
    pub fn last_halfedge(&self) -> Option<HalfedgeId<I>> {
        self.halfedges.last().copied()
    }

    /// Advance the halfedge cursor.
    pub fn next_halfedge(&mut self) -> Option<HalfedgeId<I>> {
        self.halfedge_cursor =
            step_forward(self.halfedge_cursor, self.halfedges.len(), self.closed)?;
        self.halfedge(self.halfedge_cursor)
    }

    /// Move the halfedge cursor back.
    pub fn prev_halfedge(&mut self) -> Option<HalfedgeId<I>> {
        self.halfedge_cursor = step_back(self.halfedge_cursor, self.halfedges.len(), self.closed)?;
        self.halfedge(self.halfedge_cursor)
    }

    /// Reset the halfedge cursor to the start.
    pub fn reset_halfedge(&mut self) {
        self.halfedge_cursor = 0;
    }
}

fn step_forward(cursor: usize, len: usize, closed: bool) -> Option<usize> {
    if len == 0 {
        None
    } else if cursor + 1 < len {
        Some(cursor + 1)
    } else if closed {
        Some(0)
    } else {
        None
    }
}

fn step_back(cursor: usize, len: usize, closed: bool) -> Option<usize> {
    if len == 0 {
        None
    } else if cursor > 0 {
        Some(cursor - 1)
    } else if closed {
        Some(len - 1)
    } else {
        None
    }
}

/// A closed loop traced along the mesh boundary.
///
/// `corners[i]` flags whether `vertices()[i]` is a corner of the boundary
/// polygon.
#[derive(Debug, Clone)]
pub struct BoundaryLoop<I: MeshIndex = u32> {
    lp: Loop<I>,
    corners: Vec<bool>,
}

impl<I: MeshIndex> Default for BoundaryLoop<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: MeshIndex> BoundaryLoop<I> {
    /// Create an empty boundary loop.
    pub fn new() -> Self {
        let mut lp = Loop::new();
        lp.set_closed(true);
        Self {
            lp,
            corners: Vec::new(),
        }
    }

    /// The underlying loop.
    #[inline]
    pub fn as_loop(&self) -> &Loop<I> {
        &self.lp
    }

    /// The underlying loop, mutably.
    #[inline]
    pub fn as_loop_mut(&mut self) -> &mut Loop<I> {
        &mut self.lp
    }

    /// The boundary vertices in walk order.
    #[inline]
    pub fn vertices(&self) -> &[VertexId<I>] {
        self.lp.vertices()
    }

    /// The boundary halfedge leaving each vertex, in walk order.
    #[inline]
    pub fn halfedges(&self) -> &[HalfedgeId<I>] {
        self.lp.halfedges()
    }

    /// Number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.lp.num_vertices()
    }

    /// The vertex at position `i`.
    #[inline]
    pub fn vertex(&self, i: usize) -> Option<VertexId<I>> {
        self.lp.vertex(i)
    }

    /// True if `v` is on this boundary loop.
    pub fn is_vertex(&self, v: VertexId<I>) -> bool {
        self.lp.contains_vertex(v)
    }

    /// Append a vertex (not a corner).
    pub fn add_vertex(&mut self, v: VertexId<I>) {
        self.lp.add_vertex(v);
        self.corners.push(false);
    }

    /// Append a boundary halfedge.
    pub fn add_halfedge(&mut self, he: HalfedgeId<I>) {
        self.lp.add_halfedge(he);
    }

    /// Append a corner flag, for callers filling flags separately.
    pub fn add_is_corner(&mut self, corner: bool) {
        self.corners.push(corner);
    }

    /// Remove a vertex together with its corner flag.
    pub fn remove_vertex(&mut self, v: VertexId<I>) {
        let keep: Vec<bool> = self.lp.vertices().iter().map(|&x| x != v).collect();
        let mut flags = keep.iter();
        self.corners.retain(|_| flags.next().copied().unwrap_or(true));
        self.lp.remove_vertex(v);
    }

    pub(crate) fn remap(
        &mut self,
        vertex: impl Fn(VertexId<I>) -> Option<VertexId<I>>,
        halfedge: impl Fn(HalfedgeId<I>) -> Option<HalfedgeId<I>>,
    ) {
        let mapped: Vec<Option<VertexId<I>>> = self.lp.vertices().iter().map(|&v| vertex(v)).collect();
        let mut flags = mapped.iter();
        self.corners.retain(|_| flags.next().map_or(true, |m| m.is_some()));
        self.lp.remap(vertex, halfedge);
    }

    /// Set or clear the corner flag of vertex `i`. Out of range indices are ignored.
    pub fn set_corner(&mut self, i: usize, corner: bool) {
        if let Some(flag) = self.corners.get_mut(i) {
            *flag = corner;
        }
    }

    /// True if vertex `i` is a corner.
    pub fn is_corner(&self, i: usize) -> bool {
        self.corners.get(i).copied().unwrap_or(false)
    }

    /// The corner flags.
    #[inline]
    pub fn corners(&self) -> &[bool] {
        &self.corners
    }

    /// Number of corners.
    pub fn num_corners(&self) -> usize {
        self.corners.iter().filter(|&&c| c).count()
    }

    /// Choose `n` corners: vertex 0 plus the `n - 1` other vertices where the
    /// boundary turns most sharply.
    ///
    /// `positions[i]` is the position of `vertices()[i]`.
    pub fn optimize(&mut self, positions: &[Point3<f64>], n: usize) {
        let len = self.num_vertices().min(positions.len());
        self.corners = vec![false; self.num_vertices()];
        if n == 0 || len == 0 {
            return;
        }
        self.corners[0] = true;

        let mut turning: Vec<(usize, f64)> = (1..len)
            .map(|i| {
                let prev = positions[(i + len - 1) % len];
                let next = positions[(i + 1) % len];
                let a = prev - positions[i];
                let b = next - positions[i];
                let angle = if a.norm() > 0.0 && b.norm() > 0.0 {
                    a.angle(&b)
                } else {
                    PI
                };
                (i, PI - angle)
            })
            .collect();
        turning.sort_by(|x, y| y.1.total_cmp(&x.1).then(x.0.cmp(&y.0)));

        for &(i, _) in turning.iter().take(n - 1) {
            self.corners[i] = true;
        }
    }
}

/// Options for tracing a boundary loop.
#[derive(Debug, Clone)]
pub struct BoundaryLoopOptions {
    /// Number of corners to mark. Vertex 0 is always one of them.
    pub corners: usize,
}

impl Default for BoundaryLoopOptions {
    fn default() -> Self {
        Self { corners: 4 }
    }
}

impl BoundaryLoopOptions {
    /// Set the number of corners.
    pub fn with_corners(mut self, corners: usize) -> Self {
        self.corners = corners;
        self
    }
}

impl<I: MeshIndex> Mesh<I> {
    /// The boundary halfedge leaving `v`, if `v` lies on the boundary.
    pub fn boundary_halfedge_of(&self, v: VertexId<I>) -> Option<HalfedgeId<I>> {
        let start = self.get_vertex(v)?.halfedge.valid()?;
        let he = self.reset_halfedge(start);
        if self.is_boundary_halfedge(he) {
            Some(he)
        } else {
            None
        }
    }

    /// Trace the boundary through `start` into a new boundary loop.
    ///
    /// Builds connectivity first if it does not exist. The walk follows the
    /// boundary halfedge leaving each vertex until it returns to `start`.
    /// Returns `None` if `start` is not a boundary vertex or the walk breaks off.
    pub fn create_boundary_loop_from(
        &mut self,
        start: VertexId<I>,
        options: &BoundaryLoopOptions,
    ) -> Option<BoundaryLoopId<I>> {
        if !self.connectivity {
            self.create_connectivity(&Default::default());
        }
        let (vertices, halfedges) = self.trace_boundary(start)?;

        let mut bl = BoundaryLoop::new();
        for (&v, &he) in vertices.iter().zip(&halfedges) {
            bl.add_vertex(v);
            bl.add_halfedge(he);
        }
        let positions: Vec<Point3<f64>> = vertices.iter().map(|&v| *self.position(v)).collect();
        bl.optimize(&positions, options.corners);

        log::debug!(
            "boundary loop from {:?}: {} vertices, {} corners",
            start,
            bl.num_vertices(),
            bl.num_corners()
        );
        Some(self.boundary_loops.insert(bl))
    }

    /// Trace a boundary loop from the first boundary vertex found.
    pub fn create_boundary_loop(
        &mut self,
        options: &BoundaryLoopOptions,
    ) -> Option<BoundaryLoopId<I>> {
        if !self.connectivity {
            self.create_connectivity(&Default::default());
        }
        let start = self
            .vertex_ids()
            .find(|&v| self.boundary_halfedge_of(v).is_some())?;
        self.create_boundary_loop_from(start, options)
    }

    /// Re-run corner selection on an existing boundary loop.
    ///
    /// Vertices and halfedges that are no longer live are dropped from the
    /// loop first.
    pub fn optimize_boundary_loop(&mut self, id: BoundaryLoopId<I>, n: usize) {
        let Some(bl) = self.boundary_loops.get_mut(id) else {
            return;
        };
        let vertices = &self.vertices;
        let halfedges = &self.halfedges;
        bl.remap(
            |v| vertices.contains(v).then_some(v),
            |h| halfedges.contains(h).then_some(h),
        );
        let positions: Vec<Point3<f64>> = bl
            .vertices()
            .iter()
            .map(|&v| vertices[v].position)
            .collect();
        bl.optimize(&positions, n);
    }

    fn trace_boundary(
        &self,
        start: VertexId<I>,
    ) -> Option<(Vec<VertexId<I>>, Vec<HalfedgeId<I>>)> {
        let mut vertices = Vec::new();
        let mut halfedges = Vec::new();
        let mut prev: Option<VertexId<I>> = None;
        let mut current = start;

        loop {
            let he = self.boundary_halfedge_of(current)?;
            vertices.push(current);
            halfedges.push(he);

            let next = self.dest(he);
            if next == start {
                return Some((vertices, halfedges));
            }
            if Some(next) == prev || vertices.len() > self.num_vertices() {
                log::warn!(
                    "{}",
                    Diagnostic::OpenBoundaryLoop {
                        start: start.index(),
                        stopped_at: current.index(),
                    }
                );
                return None;
            }
            prev = Some(current);
            current = next;
        }
    }
}
