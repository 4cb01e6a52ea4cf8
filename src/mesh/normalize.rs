//! Normalization into the unit box, bounding boxes and vertex normals.

use nalgebra::{Point3, Vector3};

use super::face::ZERO_EPS;
use super::halfedge::Mesh;
use super::index::{HalfedgeId, MeshIndex, VertexId};

impl<I: MeshIndex> Mesh<I> {
    /// Compute the bounding box of the mesh.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let mut positions = self.vertices().map(|(_, v)| v.position);
        let first = positions.next()?;
        let (mut min, mut max) = (first, first);

        for p in positions {
            for i in 0..3 {
                min[i] = min[i].min(p[i]);
                max[i] = max[i].max(p[i]);
            }
        }

        Some((min, max))
    }

    /// True while positions are in normalized coordinates.
    #[inline]
    pub fn is_normalized(&self) -> bool {
        self.normalized
    }

    /// Center used by the last normalization.
    #[inline]
    pub fn center(&self) -> Point3<f64> {
        self.center
    }

    /// Scale used by the last normalization.
    #[inline]
    pub fn max_length(&self) -> f64 {
        self.max_length
    }

    /// Center the mesh on its bounding-box center and scale its largest
    /// extent to one. Does nothing if already normalized.
    pub fn normalize(&mut self) {
        if self.normalized {
            return;
        }
        let Some((min, max)) = self.bounding_box() else {
            return;
        };
        let center = Point3::from((min.coords + max.coords) * 0.5);
        let extent = max - min;
        self.normalize_with(center, extent.max());
    }

    /// Normalize with an explicit center and scale.
    ///
    /// A scale of zero (a single point) is treated as one.
    pub fn normalize_with(&mut self, center: Point3<f64>, max_length: f64) {
        if self.normalized {
            return;
        }
        let max_length = if max_length > ZERO_EPS { max_length } else { 1.0 };
        for (_, v) in self.vertices.iter_mut() {
            v.position = Point3::from((v.position - center) / max_length);
        }
        self.center = center;
        self.max_length = max_length;
        self.normalized = true;
    }

    /// Undo [`normalize`](Mesh::normalize).
    pub fn unnormalize(&mut self) {
        if !self.normalized {
            return;
        }
        let (center, scale) = (self.center, self.max_length);
        for (_, v) in self.vertices.iter_mut() {
            v.position = center + v.position.coords * scale;
        }
        self.normalized = false;
    }

    /// Map texture coordinates (u, v) into the unit square, keeping their
    /// aspect ratio.
    pub fn normalize_texcoords(&mut self) {
        let mut iter = self.texcoords.values().map(|t| t.point);
        let Some(first) = iter.next() else {
            return;
        };
        let (mut min, mut max) = (first, first);
        for p in iter {
            for i in 0..2 {
                min[i] = min[i].min(p[i]);
                max[i] = max[i].max(p[i]);
            }
        }
        let extent = (max.x - min.x).max(max.y - min.y);
        let scale = if extent > ZERO_EPS { extent } else { 1.0 };
        for (_, t) in self.texcoords.iter_mut() {
            t.point.x = (t.point.x - min.x) / scale;
            t.point.y = (t.point.y - min.y) / scale;
        }
    }

    /// Attach a smooth normal to every halfedge corner.
    ///
    /// Each vertex gets the area-weighted average of its faces' normals, shared
    /// by all of its corners. Does nothing if the mesh already has normals.
    pub fn calc_smooth_vertex_normals(&mut self) {
        if self.num_normals() > 0 {
            return;
        }

        let mut sums: Vec<Vector3<f64>> = vec![Vector3::zeros(); self.vertices.next_id().index()];
        for (_, face) in self.faces() {
            let p: Vec<Point3<f64>> = face
                .halfedges()
                .iter()
                .map(|&he| *self.position(self.origin(he)))
                .collect();
            if p.len() < 3 {
                continue;
            }
            // Unnormalized cross product weights by area.
            let weighted = (p[1] - p[0]).cross(&(p[2] - p[0]));
            for &he in face.halfedges() {
                sums[self.origin(he).index()] += weighted;
            }
        }

        let ids: Vec<VertexId<I>> = self.vertex_ids().collect();
        for v in ids {
            let n = sums[v.index()]
                .try_normalize(ZERO_EPS)
                .unwrap_or_else(Vector3::zeros);
            let normal = self.add_normal(n);
            let corners: Vec<HalfedgeId<I>> = self
                .halfedges()
                .filter(|(_, h)| h.vertex == v && h.face.is_valid())
                .map(|(id, _)| id)
                .collect();
            for he in corners {
                self.set_halfedge_normal(he, normal);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{cube, grid};

    #[test]
    fn test_bounding_box() {
        let mesh: Mesh = grid(3, 2);
        let (min, max) = mesh.bounding_box().unwrap();
        assert_eq!(min, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(max, Point3::new(3.0, 2.0, 0.0));
        assert!(Mesh::<u32>::new().bounding_box().is_none());
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let mut mesh: Mesh = grid(4, 2);
        mesh.normalize();
        let once: Vec<_> = mesh.vertices().map(|(_, v)| v.position).collect();
        mesh.normalize();
        let twice: Vec<_> = mesh.vertices().map(|(_, v)| v.position).collect();
        assert_eq!(once, twice);

        let (min, max) = mesh.bounding_box().unwrap();
        assert!((max.x - min.x - 1.0).abs() < 1e-10);
        assert!((max.y - min.y - 0.5).abs() < 1e-10);
        assert!(((min.x + max.x) * 0.5).abs() < 1e-10);
        assert!((mesh.center() - Point3::new(2.0, 1.0, 0.0)).norm() < 1e-10);
        assert!((mesh.max_length() - 4.0).abs() < 1e-10);
    }

    #[test]
    fn test_unnormalize_restores_positions() {
        let mut mesh: Mesh = cube();
        let before: Vec<_> = mesh.vertices().map(|(_, v)| v.position).collect();
        mesh.normalize();
        assert!(mesh.is_normalized());
        mesh.unnormalize();
        assert!(!mesh.is_normalized());
        for ((_, v), p) in mesh.vertices().zip(&before) {
            assert!((v.position - p).norm() < 1e-10);
        }
    }

    #[test]
    fn test_single_point_normalize() {
        let mut mesh = Mesh::<u32>::new();
        mesh.add_vertex(Point3::new(2.0, 2.0, 2.0));
        mesh.normalize();
        let (_, v) = mesh.vertices().next().unwrap();
        assert_eq!(v.position, Point3::origin());
    }

    #[test]
    fn test_normalize_texcoords() {
        let mut mesh = Mesh::<u32>::new();
        mesh.add_texcoord(Point3::new(2.0, 1.0, 0.0));
        mesh.add_texcoord(Point3::new(6.0, 3.0, 0.0));
        mesh.normalize_texcoords();
        let pts: Vec<_> = mesh.texcoords.values().map(|t| t.point).collect();
        assert!((pts[0] - Point3::new(0.0, 0.0, 0.0)).norm() < 1e-10);
        assert!((pts[1] - Point3::new(1.0, 0.5, 0.0)).norm() < 1e-10);
    }

    #[test]
    fn test_smooth_vertex_normals() {
        let mut mesh: Mesh = cube();
        mesh.calc_smooth_vertex_normals();
        assert_eq!(mesh.num_normals(), 8);

        // Corner (1, 1, 1) points along the diagonal.
        let corner = mesh
            .vertex_ids()
            .find(|&v| *mesh.position(v) == Point3::new(1.0, 1.0, 1.0))
            .unwrap();
        let expected = Vector3::new(1.0, 1.0, 1.0).normalize();
        for (_, h) in mesh.halfedges().filter(|(_, h)| h.vertex == corner) {
            assert!((mesh.normal(h.normal).vector - expected).norm() < 1e-10);
        }

        mesh.calc_smooth_vertex_normals();
        assert_eq!(mesh.num_normals(), 8);
    }
}
