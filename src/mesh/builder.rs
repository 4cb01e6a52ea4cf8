//! Mesh construction utilities.
//!
//! This module provides functions for building half-edge meshes from
//! face-vertex lists as commonly found in mesh file formats, for exporting a
//! mesh back to such lists, and a few generated shapes.

use std::collections::HashMap;

use nalgebra::Point3;

use super::connectivity::ConnectivityOptions;
use super::halfedge::Mesh;
use super::index::{MeshIndex, VertexId};
use crate::error::{MeshError, Result};

/// Build a half-edge mesh from vertices and polygon faces of any size.
///
/// Connectivity is built before returning; problems it tolerates are logged.
///
/// # Arguments
/// * `vertices` - List of vertex positions
/// * `faces` - List of faces, each as a list of at least three vertex indices
///
/// # Returns
/// A half-edge mesh, or an error if the input is invalid.
pub fn build_from_polygons<I: MeshIndex>(
    vertices: &[Point3<f64>],
    faces: &[Vec<usize>],
) -> Result<Mesh<I>> {
    build_checked(vertices, faces.iter().map(|f| f.as_slice()), faces.len())
}

/// Build a half-edge mesh from vertices and triangle faces.
///
/// # Example
/// ```
/// use meshl::mesh::{build_from_triangles, Mesh};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
/// ];
/// let faces = vec![[0, 1, 2]];
///
/// let mesh: Mesh = build_from_triangles(&vertices, &faces).unwrap();
/// assert_eq!(mesh.num_vertices(), 3);
/// assert_eq!(mesh.num_faces(), 1);
/// ```
pub fn build_from_triangles<I: MeshIndex>(
    vertices: &[Point3<f64>],
    faces: &[[usize; 3]],
) -> Result<Mesh<I>> {
    build_checked(vertices, faces.iter().map(|f| f.as_slice()), faces.len())
}

/// Build a half-edge mesh from vertices and quad faces.
pub fn build_from_quads<I: MeshIndex>(
    vertices: &[Point3<f64>],
    faces: &[[usize; 4]],
) -> Result<Mesh<I>> {
    build_checked(vertices, faces.iter().map(|f| f.as_slice()), faces.len())
}

fn build_checked<'a, I: MeshIndex>(
    vertices: &[Point3<f64>],
    faces: impl Iterator<Item = &'a [usize]> + Clone,
    num_faces: usize,
) -> Result<Mesh<I>> {
    if num_faces == 0 {
        return Err(MeshError::EmptyMesh);
    }

    // Validate vertex indices
    for (fi, face) in faces.clone().enumerate() {
        if face.len() < 3 {
            return Err(MeshError::TooFewFaceVertices {
                face: fi,
                count: face.len(),
            });
        }
        for &vi in face {
            if vi >= vertices.len() {
                return Err(MeshError::InvalidVertexIndex { face: fi, vertex: vi });
            }
        }
        // Check for degenerate faces
        for (i, &a) in face.iter().enumerate() {
            if face[i + 1..].contains(&a) {
                return Err(MeshError::DegenerateFace { face: fi });
            }
        }
    }

    let mut mesh = Mesh::with_capacity(vertices.len(), num_faces);
    let vertex_ids: Vec<VertexId<I>> = vertices.iter().map(|&pos| mesh.add_vertex(pos)).collect();

    let mut corners = Vec::new();
    for face in faces {
        corners.clear();
        corners.extend(face.iter().map(|&vi| vertex_ids[vi]));
        mesh.add_polygon(&corners);
    }

    let report = mesh.create_connectivity(&ConnectivityOptions::default());
    if !report.is_clean() {
        log::warn!(
            "built mesh with {} connectivity problems",
            report.diagnostics.len()
        );
    }
    Ok(mesh)
}

/// Convert a mesh back to a face-vertex representation.
///
/// Vertices are renumbered densely in id order, so the output is valid even
/// after deletions.
pub fn to_face_vertex<I: MeshIndex>(mesh: &Mesh<I>) -> (Vec<Point3<f64>>, Vec<Vec<usize>>) {
    let mut remap: HashMap<VertexId<I>, usize> = HashMap::with_capacity(mesh.num_vertices());
    let mut vertices = Vec::with_capacity(mesh.num_vertices());
    for (id, v) in mesh.vertices() {
        remap.insert(id, vertices.len());
        vertices.push(v.position);
    }

    let faces = mesh
        .face_ids()
        .map(|f| {
            mesh.face_vertices(f)
                .filter_map(|v| remap.get(&v).copied())
                .collect()
        })
        .collect();

    (vertices, faces)
}

/// Convert a mesh to vertices and triangles, fanning polygons from their first
/// vertex.
pub fn to_triangles<I: MeshIndex>(mesh: &Mesh<I>) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
    let (vertices, polygons) = to_face_vertex(mesh);
    let mut triangles = Vec::with_capacity(polygons.len());
    for poly in &polygons {
        for i in 1..poly.len().saturating_sub(1) {
            triangles.push([poly[0], poly[i], poly[i + 1]]);
        }
    }
    (vertices, triangles)
}

// ==================== Generated Shapes ====================

/// A regular tetrahedron centred on the origin, outward oriented.
pub fn tetrahedron<I: MeshIndex>() -> Mesh<I> {
    let vertices = [
        Point3::new(1.0, 1.0, 1.0),
        Point3::new(1.0, -1.0, -1.0),
        Point3::new(-1.0, 1.0, -1.0),
        Point3::new(-1.0, -1.0, 1.0),
    ];
    let faces = [[0, 1, 2], [0, 3, 1], [0, 2, 3], [1, 3, 2]];
    from_valid_input(&vertices, faces.iter().map(|f| f.as_slice()), faces.len())
}

/// An axis-aligned unit cube made of six quads, outward oriented.
pub fn cube<I: MeshIndex>() -> Mesh<I> {
    let vertices = [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(0.0, 0.0, 1.0),
        Point3::new(1.0, 0.0, 1.0),
        Point3::new(1.0, 1.0, 1.0),
        Point3::new(0.0, 1.0, 1.0),
    ];
    let faces = [
        [0, 3, 2, 1],
        [4, 5, 6, 7],
        [0, 1, 5, 4],
        [1, 2, 6, 5],
        [2, 3, 7, 6],
        [3, 0, 4, 7],
    ];
    from_valid_input(&vertices, faces.iter().map(|f| f.as_slice()), faces.len())
}

/// A flat `nx` by `ny` grid of quads in the XY plane, spanning `[0, nx] x [0, ny]`.
///
/// Zero dimensions are clamped to one cell.
pub fn grid<I: MeshIndex>(nx: usize, ny: usize) -> Mesh<I> {
    let (nx, ny) = (nx.max(1), ny.max(1));
    let mut vertices = Vec::with_capacity((nx + 1) * (ny + 1));
    for j in 0..=ny {
        for i in 0..=nx {
            vertices.push(Point3::new(i as f64, j as f64, 0.0));
        }
    }
    let mut faces = Vec::with_capacity(nx * ny);
    for j in 0..ny {
        for i in 0..nx {
            let v00 = j * (nx + 1) + i;
            let v10 = v00 + 1;
            let v01 = v00 + nx + 1;
            let v11 = v01 + 1;
            faces.push([v00, v10, v11, v01]);
        }
    }
    from_valid_input(&vertices, faces.iter().map(|f| f.as_slice()), faces.len())
}

fn from_valid_input<'a, I: MeshIndex>(
    vertices: &[Point3<f64>],
    faces: impl Iterator<Item = &'a [usize]> + Clone,
    num_faces: usize,
) -> Mesh<I> {
    match build_checked(vertices, faces, num_faces) {
        Ok(mesh) => mesh,
        // Inputs are fixed tables above.
        Err(e) => unreachable!("generated shape rejected: {}", e),
    }
}
