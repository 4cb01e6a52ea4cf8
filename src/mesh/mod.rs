//! Core mesh data structures.
//!
//! This module provides the half-edge mesh representation and the queries and
//! bulk edits built on it.
//!
//! # Overview
//!
//! The primary type is [`Mesh`], a polygon mesh stored as a half-edge
//! structure. Every face owns an ordered cycle of halfedges, halfedges are
//! paired with the opposite halfedge of the neighbouring face (their *mate*),
//! and each vertex stores one outgoing halfedge. Local topological edits go
//! through [`crate::euler::EulerOps`].
//!
//! # Index Types
//!
//! Mesh elements are identified by type-safe handles:
//! - [`VertexId`], [`HalfedgeId`], [`FaceId`], [`EdgeId`]
//! - [`NormalId`], [`TexcoordId`] for per-corner attributes
//! - [`LoopId`], [`BoundaryLoopId`] for vertex loops
//!
//! Handles are generic over the underlying integer type ([`MeshIndex`] trait),
//! so `u16`, `u32` or `u64` can be chosen based on mesh size. A handle is the
//! slot of its element in an [`Arena`]; slots are never reused.
//!
//! # Construction
//!
//! Meshes are built element by element or from face-vertex lists:
//!
//! ```
//! use meshl::mesh::{build_from_polygons, Mesh};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let faces = vec![vec![0, 1, 2, 3]];
//!
//! let mesh: Mesh = build_from_polygons(&vertices, &faces).unwrap();
//! assert_eq!(mesh.num_halfedges(), 4);
//! ```

mod arena;
mod attributes;
mod builder;
mod circulator;
mod connectivity;
mod element;
mod face;
mod halfedge;
mod index;
mod loops;
mod normalize;
mod reorder;

pub use arena::Arena;
pub use attributes::MeshInfo;
pub use builder::{
    build_from_polygons, build_from_quads, build_from_triangles, cube, grid, tetrahedron,
    to_face_vertex, to_triangles,
};
pub use circulator::{VertexCirculator, VertexHalfedgeIter, VertexNeighborIter};
pub use connectivity::{CleanupReport, ConnectivityOptions, ConnectivityReport, EdgeList};
pub use element::{Edge, Face, Halfedge, Normal, Texcoord, Vertex};
pub use face::{is_left_side_2d, segments_cross_2d, tri_area_2d, TriangleRadii, ZERO_EPS};
pub use halfedge::Mesh;
pub use index::{
    BoundaryLoopId, EdgeId, ElementId, FaceId, HalfedgeId, LoopId, MeshIndex, NormalId,
    TexcoordId, VertexId,
};
pub use loops::{BoundaryLoop, BoundaryLoopOptions, Loop};
