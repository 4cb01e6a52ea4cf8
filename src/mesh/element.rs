//! Element records stored by a [`Mesh`](super::Mesh).
//!
//! Records hold plain data and handles. Links that may be absent (a vertex
//! without an outgoing halfedge, a boundary halfedge without a mate) hold the
//! invalid handle; the mesh accessors turn those into `Option`s.

use nalgebra::{Point2, Point3, Vector3};

use super::index::{EdgeId, FaceId, HalfedgeId, MeshIndex, NormalId, TexcoordId, VertexId};

/// A vertex of the mesh.
#[derive(Debug, Clone)]
pub struct Vertex<I: MeshIndex = u32> {
    /// The 3D position of this vertex.
    pub position: Point3<f64>,

    /// One outgoing halfedge. After connectivity is built this is a boundary
    /// halfedge whenever the vertex lies on the boundary.
    pub halfedge: HalfedgeId<I>,

    /// Selection flag.
    pub selected: bool,
}

impl<I: MeshIndex> Vertex<I> {
    /// Create a new vertex at the given position.
    pub fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            halfedge: HalfedgeId::invalid(),
            selected: false,
        }
    }

    /// Create a new vertex from coordinates.
    pub fn from_coords(x: f64, y: f64, z: f64) -> Self {
        Self::new(Point3::new(x, y, z))
    }
}

/// A halfedge: one directed side of an edge, owned by exactly one face.
///
/// `next` and `prev` mirror the order of the owning face's halfedge list and
/// are only rewritten by the mesh when that list changes.
#[derive(Debug, Clone, Copy)]
pub struct Halfedge<I: MeshIndex = u32> {
    /// The vertex this halfedge starts from.
    pub vertex: VertexId<I>,

    /// The owning face.
    pub face: FaceId<I>,

    /// The next halfedge around the face.
    pub next: HalfedgeId<I>,

    /// The previous halfedge around the face.
    pub prev: HalfedgeId<I>,

    /// The opposite halfedge in the neighbouring face. Invalid on the boundary.
    pub mate: HalfedgeId<I>,

    /// The full edge this halfedge is part of, while edges exist.
    pub edge: EdgeId<I>,

    /// Per-corner normal.
    pub normal: NormalId<I>,

    /// Per-corner texture coordinate.
    pub texcoord: TexcoordId<I>,

    /// Selection flag.
    pub selected: bool,
}

impl<I: MeshIndex> Halfedge<I> {
    /// Create a detached halfedge starting at `vertex`.
    pub fn new(vertex: VertexId<I>) -> Self {
        Self {
            vertex,
            face: FaceId::invalid(),
            next: HalfedgeId::invalid(),
            prev: HalfedgeId::invalid(),
            mate: HalfedgeId::invalid(),
            edge: EdgeId::invalid(),
            normal: NormalId::invalid(),
            texcoord: TexcoordId::invalid(),
            selected: false,
        }
    }

    /// True if the halfedge has no mate.
    #[inline]
    pub fn is_boundary(&self) -> bool {
        !self.mate.is_valid()
    }
}

impl<I: MeshIndex> Default for Halfedge<I> {
    fn default() -> Self {
        Self::new(VertexId::invalid())
    }
}

/// A polygonal face, described by the ordered cycle of its halfedges.
#[derive(Debug, Clone)]
pub struct Face<I: MeshIndex = u32> {
    pub(crate) halfedges: Vec<HalfedgeId<I>>,

    /// Cached unit normal, refreshed by the normal computations.
    pub normal: Vector3<f64>,

    /// Texture id.
    pub tex_id: u32,

    /// Selection flag.
    pub selected: bool,
}

impl<I: MeshIndex> Face<I> {
    /// Create an empty face.
    pub fn new() -> Self {
        Self {
            halfedges: Vec::new(),
            normal: Vector3::zeros(),
            tex_id: 0,
            selected: false,
        }
    }

    /// The halfedges of this face in cycle order.
    #[inline]
    pub fn halfedges(&self) -> &[HalfedgeId<I>] {
        &self.halfedges
    }

    /// Number of sides.
    #[inline]
    pub fn size(&self) -> usize {
        self.halfedges.len()
    }
}

impl<I: MeshIndex> Default for Face<I> {
    fn default() -> Self {
        Self::new()
    }
}

/// A full edge, materialised while building connectivity.
#[derive(Debug, Clone, Copy)]
pub struct Edge<I: MeshIndex = u32> {
    /// Start vertex.
    pub sv: VertexId<I>,
    /// End vertex.
    pub ev: VertexId<I>,
    /// Halfedge running from `sv` to `ev`.
    pub lhe: HalfedgeId<I>,
    /// Halfedge running from `ev` to `sv`, if any.
    pub rhe: HalfedgeId<I>,
}

impl<I: MeshIndex> Edge<I> {
    /// Create an edge between two vertices with no halfedges attached yet.
    pub fn new(sv: VertexId<I>, ev: VertexId<I>) -> Self {
        Self {
            sv,
            ev,
            lhe: HalfedgeId::invalid(),
            rhe: HalfedgeId::invalid(),
        }
    }

    /// The vertex at the other end from `v`.
    pub fn other(&self, v: VertexId<I>) -> Option<VertexId<I>> {
        if v == self.sv {
            Some(self.ev)
        } else if v == self.ev {
            Some(self.sv)
        } else {
            None
        }
    }
}

/// A per-corner normal vector.
#[derive(Debug, Clone, Copy)]
pub struct Normal {
    /// The normal direction.
    pub vector: Vector3<f64>,
}

/// A per-corner texture coordinate.
///
/// The third component is only used by meshes carrying a 3D parameterisation.
#[derive(Debug, Clone, Copy)]
pub struct Texcoord {
    /// The (u, v, w) coordinate.
    pub point: Point3<f64>,
}

impl Texcoord {
    /// Create a 2D texture coordinate.
    pub fn new_2d(u: f64, v: f64) -> Self {
        Self {
            point: Point3::new(u, v, 0.0),
        }
    }

    /// The (u, v) part.
    #[inline]
    pub fn uv(&self) -> Point2<f64> {
        Point2::new(self.point.x, self.point.y)
    }
}
