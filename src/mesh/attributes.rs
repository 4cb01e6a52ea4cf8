//! Selection flags, texture ids, lookups and summary information.

use std::fmt;

use nalgebra::{Point3, Vector3};

use super::halfedge::Mesh;
use super::index::{FaceId, HalfedgeId, MeshIndex, NormalId, TexcoordId, VertexId};
use crate::error::{MeshError, Result};

/// Element counts of a mesh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeshInfo {
    /// Number of vertices.
    pub vertices: usize,
    /// Number of halfedges.
    pub halfedges: usize,
    /// Number of faces.
    pub faces: usize,
    /// Number of normals.
    pub normals: usize,
    /// Number of texture coordinates.
    pub texcoords: usize,
    /// Number of loops.
    pub loops: usize,
    /// Number of boundary loops.
    pub boundary_loops: usize,
}

impl fmt::Display for MeshInfo {
    /// Prints only the non-empty counts, e.g. `mesh v 4 f 4`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mesh")?;
        let parts = [
            ("v", self.vertices),
            ("n", self.normals),
            ("t", self.texcoords),
            ("f", self.faces),
            ("l", self.loops),
            ("bl", self.boundary_loops),
        ];
        for (tag, count) in parts {
            if count > 0 {
                write!(f, " {} {}", tag, count)?;
            }
        }
        Ok(())
    }
}

impl<I: MeshIndex> Mesh<I> {
    /// Element counts.
    pub fn info(&self) -> MeshInfo {
        MeshInfo {
            vertices: self.num_vertices(),
            halfedges: self.num_halfedges(),
            faces: self.num_faces(),
            normals: self.num_normals(),
            texcoords: self.num_texcoords(),
            loops: self.num_loops(),
            boundary_loops: self.num_boundary_loops(),
        }
    }

    // ==================== Lookup ====================

    /// The halfedge joining `sv` and `ev` in either direction, preferring
    /// `sv -> ev`.
    pub fn find_halfedge(&self, sv: VertexId<I>, ev: VertexId<I>) -> Option<HalfedgeId<I>> {
        self.find_directed_halfedge(sv, ev)
            .or_else(|| self.find_directed_halfedge(ev, sv))
    }

    /// The first selected vertex.
    pub fn find_selected_vertex(&self) -> Option<VertexId<I>> {
        self.vertices().find(|(_, v)| v.selected).map(|(id, _)| id)
    }

    /// The first vertex that lies on the boundary and is used by a face.
    pub fn find_boundary_vertex(&self) -> Option<VertexId<I>> {
        self.vertices()
            .find(|&(id, v)| v.halfedge.is_valid() && self.is_boundary_vertex(id))
            .map(|(id, _)| id)
    }

    /// The vertex of a triangle's third corner, opposite to `he`.
    pub fn opposite_vertex(&self, he: HalfedgeId<I>) -> VertexId<I> {
        self.origin(self.next(self.next(he)))
    }

    /// Destination vertex of a halfedge.
    #[inline]
    pub fn next_vertex(&self, he: HalfedgeId<I>) -> VertexId<I> {
        self.dest(he)
    }

    /// Append a halfedge with a corner normal and texture coordinate.
    ///
    /// Pass invalid ids to leave either attribute unset.
    pub fn add_halfedge_with(
        &mut self,
        face: FaceId<I>,
        v: VertexId<I>,
        normal: NormalId<I>,
        texcoord: TexcoordId<I>,
    ) -> HalfedgeId<I> {
        let he = self.add_halfedge(face, v);
        let rec = self.halfedge_mut(he);
        rec.normal = normal;
        rec.texcoord = texcoord;
        he
    }

    // ==================== Selection ====================

    /// True if any vertex is selected.
    pub fn is_vertices_selected(&self) -> bool {
        self.vertices().any(|(_, v)| v.selected)
    }

    /// True if any face is selected.
    pub fn is_faces_selected(&self) -> bool {
        self.faces().any(|(_, f)| f.selected)
    }

    /// Select every vertex.
    pub fn set_all_vertices_selected(&mut self) {
        self.set_vertices_selected(true);
    }

    /// Deselect every vertex.
    pub fn clear_all_vertices_selected(&mut self) {
        self.set_vertices_selected(false);
    }

    /// Select every face.
    pub fn set_all_faces_selected(&mut self) {
        self.set_faces_selected(true);
    }

    /// Deselect every face.
    pub fn clear_all_faces_selected(&mut self) {
        self.set_faces_selected(false);
    }

    fn set_vertices_selected(&mut self, selected: bool) {
        for (_, v) in self.vertices.iter_mut() {
            v.selected = selected;
        }
    }

    fn set_faces_selected(&mut self, selected: bool) {
        for (_, f) in self.faces.iter_mut() {
            f.selected = selected;
        }
    }

    // ==================== Texture Ids ====================

    /// Give faces the texture id `id`, only the selected ones if
    /// `selected_only` is set.
    pub fn set_tex_id_to_faces(&mut self, id: u32, selected_only: bool) {
        for (_, f) in self.faces.iter_mut() {
            if !selected_only || f.selected {
                f.tex_id = id;
            }
        }
    }

    /// Replace texture id `from` by `to` on every face and make `to` the
    /// mesh's current id.
    pub fn change_tex_id(&mut self, from: u32, to: u32) {
        self.tex_id = to;
        for (_, f) in self.faces.iter_mut() {
            if f.tex_id == from {
                f.tex_id = to;
            }
        }
    }

    // ==================== Texture Space Swaps ====================

    /// Move every vertex to the texture coordinate with the same rank and
    /// return the previous positions, to be put back with
    /// [`restore_vertices`](Mesh::restore_vertices).
    pub fn copy_texcoords_to_vertices(&mut self) -> Result<Vec<Point3<f64>>> {
        if self.num_texcoords() < self.num_vertices() {
            return Err(MeshError::InvalidState(format!(
                "{} texture coordinates for {} vertices",
                self.num_texcoords(),
                self.num_vertices()
            )));
        }
        let targets: Vec<Point3<f64>> = self.texcoords.values().map(|t| t.point).collect();
        let mut saved = Vec::with_capacity(self.num_vertices());
        for ((_, v), &p) in self.vertices.iter_mut().zip(&targets) {
            saved.push(v.position);
            v.position = p;
        }
        Ok(saved)
    }

    /// Set vertex positions in vertex order.
    pub fn restore_vertices(&mut self, points: &[Point3<f64>]) -> Result<()> {
        if points.len() != self.num_vertices() {
            return Err(MeshError::invalid_param(
                "points",
                points.len(),
                "must match the number of vertices",
            ));
        }
        for ((_, v), &p) in self.vertices.iter_mut().zip(points) {
            v.position = p;
        }
        Ok(())
    }

    /// Average of every selected vertex position.
    pub fn selected_centroid(&self) -> Option<Point3<f64>> {
        let (sum, n) = self
            .vertices()
            .filter(|(_, v)| v.selected)
            .fold((Vector3::zeros(), 0usize), |(s, n), (_, v)| (s + v.position.coords, n + 1));
        (n > 0).then(|| Point3::from(sum / n as f64))
    }
}
