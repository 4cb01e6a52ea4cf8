//! # meshl
//!
//! A half-edge polygon mesh kernel with Euler operators.
//!
//! meshl stores a polygon surface as faces, each owning a cycle of halfedges,
//! with every interior halfedge paired to its opposite (its *mate*). On top of
//! that it provides the Euler operators that edit the surface locally while
//! keeping it a valid 2-manifold, plus the bulk tools a mesh kernel needs:
//! connectivity construction and cleanup, normalization, reordering and
//! boundary loop tracing.
//!
//! ## Features
//!
//! - **Half-edge data structure**: constant-time adjacency with type-safe handles
//! - **Flexible indexing**: 16-bit, 32-bit or 64-bit handles
//! - **Euler operators**: MEV, KEV, MEF, KEMR, KFMRH and face creation, each
//!   validated before anything is changed
//! - **Per-corner attributes**: normals and texture coordinates on halfedges
//! - **Vertex loops**: ordered vertex paths and traced boundary loops with corners
//!
//! ## Quick Start
//!
//! ```
//! use meshl::prelude::*;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2], [0, 2, 3]];
//!
//! let mesh: Mesh = build_from_triangles(&vertices, &faces).unwrap();
//! let health = mesh.validate_mesh();
//! assert_eq!(health.edges, 5);
//! assert_eq!(health.euler_characteristic, 1);
//! ```
//!
//! ## Editing With Euler Operators
//!
//! ```
//! use meshl::prelude::*;
//!
//! let mut mesh: Mesh = cube();
//! let f = mesh.face_ids().next().unwrap();
//! let corners: Vec<VertexId> = mesh.face_vertices(f).collect();
//!
//! let mut ops = EulerOps::new(&mut mesh);
//! // Cut the first face along its diagonal, then merge it back.
//! let diagonal = ops.make_edge_kill_ring(corners[0], corners[2], f).unwrap();
//! assert_eq!(ops.mesh().num_faces(), 7);
//! ops.kill_edge_make_ring(diagonal).unwrap();
//! assert_eq!(ops.mesh().num_faces(), 6);
//! ```
//!
//! ## Mesh Traversal
//!
//! ```
//! use meshl::prelude::*;
//!
//! let mesh: Mesh = grid(2, 2);
//! let centre = VertexId::new(4);
//! assert_eq!(mesh.vertex_neighbors(centre).count(), 4);
//! assert_eq!(mesh.vertex_faces(centre).count(), 4);
//! assert!(!mesh.is_boundary_vertex(centre));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod diagnostics;
pub mod error;
pub mod euler;
pub mod mesh;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use meshl::prelude::*;
/// ```
pub mod prelude {
    pub use crate::diagnostics::Diagnostic;
    pub use crate::error::{EulerError, EulerResult, MeshError, Result};
    pub use crate::euler::{EdgeCount, EulerOps, MeshHealth};
    pub use crate::mesh::{
        build_from_polygons, build_from_triangles, cube, grid, tetrahedron, to_face_vertex,
        BoundaryLoop, BoundaryLoopOptions, ConnectivityOptions, Face, FaceId, Halfedge,
        HalfedgeId, Loop, Mesh, MeshIndex, Vertex, VertexId,
    };
}

// Re-export nalgebra types for convenience
pub use nalgebra;

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use nalgebra::Point3;

    fn assert_mates_symmetric(mesh: &Mesh) {
        for (he, h) in mesh.halfedges() {
            if let Some(m) = h.mate.valid() {
                assert_eq!(mesh.mate(m), Some(he), "mate of {} is not symmetric", he);
                assert_eq!(mesh.origin(m), mesh.dest(he));
                assert_eq!(mesh.dest(m), mesh.origin(he));
            }
        }
    }

    #[test]
    fn test_tetrahedron() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ];

        let faces = vec![
            [0, 2, 1], // bottom
            [0, 1, 3], // front
            [1, 2, 3], // right
            [2, 0, 3], // left
        ];

        let mesh: Mesh = build_from_triangles(&vertices, &faces).unwrap();

        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_faces(), 4);
        assert_eq!(mesh.num_halfedges(), 12);
        assert!(mesh.validate_mesh().is_healthy());
        assert_mates_symmetric(&mesh);

        for v in mesh.vertex_ids() {
            assert!(!mesh.is_boundary_vertex(v), "vertex {:?} should not be on boundary", v);
        }
    }

    #[test]
    fn test_edit_sequence_keeps_euler_characteristic() {
        let mut mesh: Mesh = cube();
        let mut ops = EulerOps::new(&mut mesh);

        let mid = ops
            .make_edge_vertex(VertexId::new(0), VertexId::new(1), Point3::new(0.5, 0.0, 0.0))
            .unwrap();
        assert_eq!(ops.validate_mesh().euler_characteristic, 2);

        // The new vertex lies on the bottom face; connect it across that face.
        let bottom = ops.mesh().vertex_faces(mid).find(|&f| {
            ops.mesh().is_vertex_in_face(f, VertexId::new(2))
        });
        let bottom = bottom.unwrap();
        let cut = ops
            .make_edge_kill_ring(mid, VertexId::new(2), bottom)
            .unwrap();
        let health = ops.validate_mesh();
        assert_eq!((health.vertices, health.edges, health.faces), (9, 14, 7));
        assert_eq!(health.euler_characteristic, 2);

        ops.kill_edge_make_ring(cut).unwrap();
        ops.kill_edge_vertex(mid).unwrap();
        let health = ops.validate_mesh();
        assert_eq!((health.vertices, health.edges, health.faces), (8, 12, 6));
        assert!(ops.check_consistency().is_empty());
        assert_mates_symmetric(ops.mesh());
    }

    #[test]
    fn test_hole_and_boundary_loop() {
        let mut mesh: Mesh = cube();
        let top = mesh
            .face_ids()
            .find(|&f| mesh.face_normal(f).z > 0.5)
            .unwrap();

        EulerOps::new(&mut mesh).kill_face_make_ring_hole(top).unwrap();
        let health = mesh.validate_mesh();
        assert_eq!(health.euler_characteristic, 1);
        assert_eq!(health.boundary_edges, 4);

        let id = mesh
            .create_boundary_loop(&BoundaryLoopOptions::default())
            .unwrap();
        let bl = mesh.boundary_loop(id).unwrap();
        assert_eq!(bl.num_vertices(), 4);
        assert!(bl.vertices().iter().all(|&v| mesh.position(v).z > 0.5));
    }

    #[test]
    fn test_faces_created_one_by_one_get_mated() {
        let mut mesh = Mesh::<u32>::new();
        let v: Vec<VertexId> = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ]
        .into_iter()
        .map(|p| mesh.add_vertex(p))
        .collect();

        let mut ops = EulerOps::new(&mut mesh);
        ops.create_triangle(v[0], v[1], v[2]).unwrap();
        ops.create_triangle(v[0], v[2], v[3]).unwrap();

        let count = ops.count_unique_edges();
        assert_eq!(count, EdgeCount { boundary: 4, internal: 1 });
        assert_mates_symmetric(ops.mesh());
        assert!(ops.mesh().find_directed_halfedge(v[2], v[0]).is_some());
    }

    fn unit_square() -> Mesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        build_from_triangles(&vertices, &[[0, 1, 2], [0, 2, 3]]).unwrap()
    }

    fn mated_pairs(mesh: &Mesh) -> Vec<(VertexId, VertexId)> {
        let mut pairs: Vec<_> = mesh
            .halfedge_ids()
            .filter(|&he| mesh.mate(he).is_some())
            .map(|he| (mesh.origin(he), mesh.dest(he)))
            .collect();
        pairs.sort();
        pairs
    }

    #[test]
    fn test_split_and_remove_diagonal_vertex() {
        let mut mesh = unit_square();
        let sizes: Vec<usize> = mesh.faces().map(|(_, f)| f.size()).collect();
        let pairs = mated_pairs(&mesh);

        let mut ops = EulerOps::new(&mut mesh);
        let v = ops
            .make_edge_vertex(VertexId::new(0), VertexId::new(2), Point3::new(0.5, 0.5, 0.0))
            .unwrap();
        assert!(ops.mesh().faces().all(|(_, f)| f.size() == 4));
        ops.kill_edge_vertex(v).unwrap();

        let mesh = ops.mesh();
        let after: Vec<usize> = mesh.faces().map(|(_, f)| f.size()).collect();
        assert_eq!(after, sizes);
        assert_eq!(mated_pairs(mesh), pairs);
        assert_eq!(mesh.num_halfedges(), 6);
    }

    #[test]
    fn test_split_quad_and_merge_back() {
        let mut mesh: Mesh = grid(1, 1);
        let f = mesh.face_ids().next().unwrap();
        let ring: Vec<VertexId> = mesh.face_vertices(f).collect();
        let h1 = mesh.face_find_halfedge(f, VertexId::new(0)).unwrap();
        let h2 = mesh.face_find_halfedge(f, VertexId::new(3)).unwrap();

        let mut ops = EulerOps::new(&mut mesh);
        let g = ops.make_edge_face(h1, h2).unwrap();
        assert_eq!(ops.mesh().face(f).size(), 3);
        assert_eq!(ops.mesh().face(g).size(), 3);

        let diagonal = ops.mesh().find_directed_halfedge(VertexId::new(3), VertexId::new(0)).unwrap();
        assert_eq!(ops.mesh().face_of(diagonal), Some(f));
        ops.kill_edge_make_ring(diagonal).unwrap();

        let mesh = ops.mesh();
        assert_eq!(mesh.num_faces(), 1);
        let merged: Vec<VertexId> = mesh.face_vertices(f).collect();
        assert_eq!(merged.len(), 4);
        let start = merged.iter().position(|&v| v == ring[0]).unwrap();
        let rotated: Vec<VertexId> = (0..4).map(|i| merged[(start + i) % 4]).collect();
        assert_eq!(rotated, ring);
        assert!(mesh.halfedges().all(|(_, h)| h.is_boundary()));
    }

    #[test]
    fn test_boundary_detection_before_and_after_connectivity() {
        let mut mesh = Mesh::<u32>::new();
        let v: Vec<VertexId> = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ]
        .into_iter()
        .map(|p| mesh.add_vertex(p))
        .collect();

        let f0 = mesh.add_triangle(v[0], v[1], v[2]);
        assert!(mesh.face_halfedges(f0).all(|he| mesh.is_boundary_halfedge(he)));

        mesh.add_triangle(v[0], v[2], v[3]);
        let report = mesh.create_connectivity(&ConnectivityOptions::default());
        assert!(report.is_clean());
        assert_eq!(report.mated_pairs, 1);

        let interior: Vec<HalfedgeId> = mesh
            .halfedge_ids()
            .filter(|&he| !mesh.is_boundary_halfedge(he))
            .collect();
        assert_eq!(interior.len(), 2);
        assert_eq!(mesh.mate(interior[0]), Some(interior[1]));
        assert_eq!(mesh.count_unique_edges().total(), 5);
    }
}
