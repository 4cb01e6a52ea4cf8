//! Per-face and per-halfedge geometry.
//!
//! Normals, areas and triangle radii are computed from vertex positions.
//! The texture-space queries use the per-corner texture coordinates and return
//! `None` when a corner has none.

use nalgebra::{Point2, Point3, Vector3};

use super::halfedge::Mesh;
use super::index::{FaceId, HalfedgeId, MeshIndex, VertexId};

/// Below this, areas and lengths count as zero.
pub const ZERO_EPS: f64 = 1.0e-16;

/// Dihedral angle (degrees) beyond which two neighbouring faces count as
/// flipped against each other.
const REVERSED_ANGLE_DEG: f64 = 150.0;

/// Signed area of a 2D triangle, positive when counter-clockwise.
pub fn tri_area_2d(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> f64 {
    0.5 * ((b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y))
}

/// True if `p` lies on the left of (or on) the directed line `a -> b`.
pub fn is_left_side_2d(p: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>) -> bool {
    tri_area_2d(a, b, p) >= 0.0
}

/// True if the segments `p0-p1` and `q0-q1` properly cross.
pub fn segments_cross_2d(
    p0: &Point2<f64>,
    p1: &Point2<f64>,
    q0: &Point2<f64>,
    q1: &Point2<f64>,
) -> bool {
    let d1 = tri_area_2d(p0, p1, q0);
    let d2 = tri_area_2d(p0, p1, q1);
    let d3 = tri_area_2d(q0, q1, p0);
    let d4 = tri_area_2d(q0, q1, p1);
    d1 * d2 < 0.0 && d3 * d4 < 0.0
}

fn triangle_area(p0: &Point3<f64>, p1: &Point3<f64>, p2: &Point3<f64>) -> f64 {
    0.5 * (p1 - p0).cross(&(p2 - p0)).norm()
}

/// Circumscribed and inscribed radius of a triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleRadii {
    /// Circumradius.
    pub circum: f64,
    /// Inradius.
    pub inner: f64,
}

impl<I: MeshIndex> Mesh<I> {
    // ==================== Face Geometry ====================

    /// Positions of a face's vertices in cycle order.
    pub fn face_positions(&self, f: FaceId<I>) -> Vec<Point3<f64>> {
        self.face_vertices(f).map(|v| *self.position(v)).collect()
    }

    /// Unit normal of a face from its first three vertices.
    ///
    /// Zero for faces with fewer than three sides or collinear corners.
    pub fn face_normal(&self, f: FaceId<I>) -> Vector3<f64> {
        let p = self.face_positions(f);
        if p.len() < 3 {
            return Vector3::zeros();
        }
        let e1 = p[1] - p[0];
        let e2 = p[2] - p[0];
        e1.cross(&e2)
            .try_normalize(ZERO_EPS)
            .unwrap_or_else(Vector3::zeros)
    }

    /// Recompute and store the cached normal of a face.
    pub fn calc_face_normal(&mut self, f: FaceId<I>) -> Vector3<f64> {
        let n = self.face_normal(f);
        self.face_mut(f).normal = n;
        n
    }

    /// Recompute every face's cached normal.
    pub fn calc_all_face_normals(&mut self) {
        let faces: Vec<FaceId<I>> = self.face_ids().collect();
        for f in faces {
            self.calc_face_normal(f);
        }
    }

    /// Area of a face, summed over a fan from its first vertex.
    pub fn face_area(&self, f: FaceId<I>) -> f64 {
        let p = self.face_positions(f);
        (1..p.len().saturating_sub(1))
            .map(|i| triangle_area(&p[0], &p[i], &p[i + 1]))
            .sum()
    }

    /// Centroid of a face's vertices.
    pub fn face_centroid(&self, f: FaceId<I>) -> Point3<f64> {
        let p = self.face_positions(f);
        if p.is_empty() {
            return Point3::origin();
        }
        let sum: Vector3<f64> = p.iter().map(|q| q.coords).sum();
        Point3::from(sum / p.len() as f64)
    }

    /// The point with barycentric coordinates `bc` in a face's first three
    /// vertices.
    pub fn face_barycentric_point(&self, f: FaceId<I>, bc: &Vector3<f64>) -> Option<Point3<f64>> {
        let p = self.face_positions(f);
        if p.len() < 3 {
            return None;
        }
        Some(Point3::from(
            p[0].coords * bc.x + p[1].coords * bc.y + p[2].coords * bc.z,
        ))
    }

    /// Circumradius and inradius of a triangular face.
    ///
    /// `None` for non-triangles and for degenerate triangles.
    pub fn face_radii(&self, f: FaceId<I>) -> Option<TriangleRadii> {
        let p = self.face_positions(f);
        if p.len() != 3 {
            return None;
        }
        let a = (p[1] - p[0]).norm();
        let b = (p[2] - p[1]).norm();
        let c = (p[0] - p[2]).norm();
        let s = 0.5 * (a + b + c);
        let area_sq = s * (s - a) * (s - b) * (s - c);
        if area_sq <= ZERO_EPS {
            return None;
        }
        let area = area_sq.sqrt();
        let circum = a * b * c / (4.0 * area);
        Some(TriangleRadii {
            circum,
            inner: area / s,
        })
    }

    /// True if `v` is one of the face's vertices.
    pub fn is_vertex_in_face(&self, f: FaceId<I>, v: VertexId<I>) -> bool {
        self.face_vertices(f).any(|x| x == v)
    }

    /// The halfedge of `f` starting at `v`.
    pub fn face_find_halfedge(&self, f: FaceId<I>, v: VertexId<I>) -> Option<HalfedgeId<I>> {
        self.face_halfedges(f).find(|&he| self.origin(he) == v)
    }

    /// The `n`-th halfedge of a face.
    pub fn face_halfedge(&self, f: FaceId<I>, n: usize) -> Option<HalfedgeId<I>> {
        self.face(f).halfedges.get(n).copied()
    }

    /// True if the face has `a` immediately followed by `b`, or `b` by `a`.
    pub fn face_has_edge(&self, f: FaceId<I>, a: VertexId<I>, b: VertexId<I>) -> bool {
        self.face_halfedges(f).any(|he| {
            let (o, d) = (self.origin(he), self.dest(he));
            (o == a && d == b) || (o == b && d == a)
        })
    }

    /// Point every vertex of the face at its halfedge in this face.
    pub fn reattach_vertex_halfedges(&mut self, f: FaceId<I>) {
        let members = self.face(f).halfedges.clone();
        for he in members {
            let v = self.origin(he);
            if let Some(vert) = self.vertices.get_mut(v) {
                vert.halfedge = he;
            }
        }
    }

    /// True if the face folds back against a neighbour: their normals differ by
    /// more than 150 degrees while both have non-zero area.
    pub fn is_face_reversed(&self, f: FaceId<I>) -> bool {
        let n = self.face_normal(f);
        if self.face_area(f) <= ZERO_EPS {
            return false;
        }
        let limit = REVERSED_ANGLE_DEG.to_radians();
        self.face_halfedges(f).any(|he| {
            let Some(g) = self.mate(he).and_then(|m| self.face_of(m)) else {
                return false;
            };
            if self.face_area(g) <= ZERO_EPS {
                return false;
            }
            let m = self.face_normal(g);
            n.norm() > 0.0 && m.norm() > 0.0 && n.angle(&m) > limit
        })
    }

    // ==================== Texture Space ====================

    fn corner_uv(&self, he: HalfedgeId<I>) -> Option<Point2<f64>> {
        let t = self.halfedge(he).texcoord;
        self.texcoords.get(t).map(|tc| tc.uv())
    }

    fn face_uvs(&self, f: FaceId<I>) -> Option<Vec<Point2<f64>>> {
        self.face_halfedges(f).map(|he| self.corner_uv(he)).collect()
    }

    /// Signed 2D area of the face in texture space.
    pub fn face_texcoord_area(&self, f: FaceId<I>) -> Option<f64> {
        let uv = self.face_uvs(f)?;
        Some(
            (1..uv.len().saturating_sub(1))
                .map(|i| tri_area_2d(&uv[0], &uv[i], &uv[i + 1]))
                .sum(),
        )
    }

    /// Area of the face using the full 3D texture coordinates.
    pub fn face_texcoord_area_3d(&self, f: FaceId<I>) -> Option<f64> {
        let pts: Option<Vec<Point3<f64>>> = self
            .face_halfedges(f)
            .map(|he| {
                let t = self.halfedge(he).texcoord;
                self.texcoords.get(t).map(|tc| tc.point)
            })
            .collect();
        let pts = pts?;
        Some(
            (1..pts.len().saturating_sub(1))
                .map(|i| triangle_area(&pts[0], &pts[i], &pts[i + 1]))
                .sum(),
        )
    }

    /// Unit normal of the face's first three texture coordinates, seen as 3D
    /// points.
    pub fn face_texcoord_normal(&self, f: FaceId<I>) -> Option<Vector3<f64>> {
        let pts: Option<Vec<Point3<f64>>> = self
            .face_halfedges(f)
            .take(3)
            .map(|he| {
                let t = self.halfedge(he).texcoord;
                self.texcoords.get(t).map(|tc| tc.point)
            })
            .collect();
        let pts = pts?;
        if pts.len() < 3 {
            return None;
        }
        (pts[1] - pts[0]).cross(&(pts[2] - pts[0])).try_normalize(ZERO_EPS)
    }

    /// Square root of the 3D texture area over the geometric area.
    pub fn face_area_scale(&self, f: FaceId<I>) -> Option<f64> {
        let area = self.face_area(f);
        if area <= ZERO_EPS {
            return None;
        }
        Some((self.face_texcoord_area_3d(f)? / area).sqrt())
    }

    /// Barycentric coordinates of `p` in the texture-space triangle of the
    /// face's first three corners.
    pub fn face_texcoord_barycentric(&self, f: FaceId<I>, p: &Point2<f64>) -> Option<Vector3<f64>> {
        let uv = self.face_uvs(f)?;
        if uv.len() < 3 {
            return None;
        }
        let total = tri_area_2d(&uv[0], &uv[1], &uv[2]);
        if total.abs() <= ZERO_EPS {
            return None;
        }
        Some(Vector3::new(
            tri_area_2d(p, &uv[1], &uv[2]) / total,
            tri_area_2d(&uv[0], p, &uv[2]) / total,
            tri_area_2d(&uv[0], &uv[1], p) / total,
        ))
    }

    /// True if `p` lies inside the face in texture space (counter-clockwise faces).
    pub fn is_texcoord_in_face(&self, f: FaceId<I>, p: &Point2<f64>) -> bool {
        let Some(uv) = self.face_uvs(f) else {
            return false;
        };
        let n = uv.len();
        n >= 3 && (0..n).all(|i| is_left_side_2d(p, &uv[i], &uv[(i + 1) % n]))
    }

    // ==================== Halfedge Geometry ====================

    /// Length of the edge under a halfedge.
    pub fn halfedge_length(&self, he: HalfedgeId<I>) -> f64 {
        (self.position(self.dest(he)) - self.position(self.origin(he))).norm()
    }

    /// Vector from origin to destination of a halfedge.
    pub fn halfedge_vector(&self, he: HalfedgeId<I>) -> Vector3<f64> {
        self.position(self.dest(he)) - self.position(self.origin(he))
    }

    /// Midpoint of the edge under a halfedge.
    pub fn halfedge_midpoint(&self, he: HalfedgeId<I>) -> Point3<f64> {
        let p0 = self.position(self.origin(he));
        let p1 = self.position(self.dest(he));
        Point3::from((p0.coords + p1.coords) * 0.5)
    }

    /// Length of a halfedge in texture space.
    pub fn halfedge_param_length(&self, he: HalfedgeId<I>) -> Option<f64> {
        let a = self.corner_uv(he)?;
        let b = self.corner_uv(self.next(he))?;
        Some((b - a).norm())
    }

    /// Leave the face of `he` through the side crossed by the texture-space
    /// segment `p0 -> p1`.
    ///
    /// Checks the other sides of the face in order and returns the mate of the
    /// first one the segment crosses, `None` if none is crossed or the crossed
    /// side lies on the boundary.
    pub fn find_next_halfedge(
        &self,
        he: HalfedgeId<I>,
        p0: &Point2<f64>,
        p1: &Point2<f64>,
    ) -> Option<HalfedgeId<I>> {
        let f = self.face_of(he)?;
        for side in self.face_halfedges(f).filter(|&h| h != he) {
            let a = self.corner_uv(side)?;
            let b = self.corner_uv(self.next(side))?;
            if segments_cross_2d(p0, p1, &a, &b) {
                return self.mate(side);
            }
        }
        None
    }
}
