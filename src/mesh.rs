//! Faceted meshes for each particle kind.
//!
//! All meshes are flat-shaded triangle lists: every triangle carries its
//! own face normal, which gives the gem-cut look without any textures.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

/// Vertex as laid out in the mesh vertex buffer.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// A non-indexed, flat-shaded triangle list.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<MeshVertex>,
}

impl Mesh {
    /// Build from triangles whose winding already faces outward.
    pub fn from_triangles(triangles: &[[Vec3; 3]]) -> Self {
        let vertices = triangles
            .iter()
            .flat_map(|&[a, b, c]| {
                let normal = (b - a).cross(c - a).normalize_or_zero().to_array();
                [a, b, c].map(|p| MeshVertex {
                    position: p.to_array(),
                    normal,
                })
            })
            .collect();
        Self { vertices }
    }

    /// Build a convex solid centered on the origin, fixing winding so
    /// every face points away from the center.
    fn convex(triangles: impl IntoIterator<Item = [Vec3; 3]>) -> Self {
        let fixed: Vec<[Vec3; 3]> = triangles
            .into_iter()
            .map(|[a, b, c]| {
                let centroid = (a + b + c) / 3.0;
                if (b - a).cross(c - a).dot(centroid) < 0.0 {
                    [a, c, b]
                } else {
                    [a, b, c]
                }
            })
            .collect();
        Self::from_triangles(&fixed)
    }

    #[inline]
    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    /// Tetrahedron inscribed in the unit sphere.
    pub fn tetrahedron() -> Self {
        let v = [
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(-1.0, -1.0, 1.0),
            Vec3::new(-1.0, 1.0, -1.0),
            Vec3::new(1.0, -1.0, -1.0),
        ]
        .map(Vec3::normalize);
        let faces = [[2, 1, 0], [0, 3, 2], [1, 3, 0], [2, 3, 1]];
        Self::convex(faces.iter().map(|f| f.map(|i| v[i])))
    }

    /// Unit cube (edge 1) centered on the origin.
    pub fn cube() -> Self {
        let s = 0.5;
        let c = |x: f32, y: f32, z: f32| Vec3::new(x * s, y * s, z * s);
        let quads = [
            [c(1., -1., -1.), c(1., 1., -1.), c(1., 1., 1.), c(1., -1., 1.)],
            [c(-1., -1., -1.), c(-1., -1., 1.), c(-1., 1., 1.), c(-1., 1., -1.)],
            [c(-1., 1., -1.), c(-1., 1., 1.), c(1., 1., 1.), c(1., 1., -1.)],
            [c(-1., -1., -1.), c(1., -1., -1.), c(1., -1., 1.), c(-1., -1., 1.)],
            [c(-1., -1., 1.), c(1., -1., 1.), c(1., 1., 1.), c(-1., 1., 1.)],
            [c(-1., -1., -1.), c(-1., 1., -1.), c(1., 1., -1.), c(1., -1., -1.)],
        ];
        Self::convex(quads.iter().flat_map(|q| [[q[0], q[1], q[2]], [q[0], q[2], q[3]]]))
    }

    /// Icosahedron on the unit sphere; each `detail` level splits every
    /// face into four and pushes the new points out to the sphere.
    pub fn icosahedron(detail: u32) -> Self {
        let t = (1.0 + 5.0_f32.sqrt()) / 2.0;
        let v = [
            Vec3::new(-1.0, t, 0.0),
            Vec3::new(1.0, t, 0.0),
            Vec3::new(-1.0, -t, 0.0),
            Vec3::new(1.0, -t, 0.0),
            Vec3::new(0.0, -1.0, t),
            Vec3::new(0.0, 1.0, t),
            Vec3::new(0.0, -1.0, -t),
            Vec3::new(0.0, 1.0, -t),
            Vec3::new(t, 0.0, -1.0),
            Vec3::new(t, 0.0, 1.0),
            Vec3::new(-t, 0.0, -1.0),
            Vec3::new(-t, 0.0, 1.0),
        ]
        .map(Vec3::normalize);

        let faces: [[usize; 3]; 20] = [
            [0, 11, 5], [0, 5, 1], [0, 1, 7], [0, 7, 10], [0, 10, 11],
            [1, 5, 9], [5, 11, 4], [11, 10, 2], [10, 7, 6], [7, 1, 8],
            [3, 9, 4], [3, 4, 2], [3, 2, 6], [3, 6, 8], [3, 8, 9],
            [4, 9, 5], [2, 4, 11], [6, 2, 10], [8, 6, 7], [9, 8, 1],
        ];

        let mut tris: Vec<[Vec3; 3]> = faces.iter().map(|f| f.map(|i| v[i])).collect();
        for _ in 0..detail {
            tris = tris
                .into_iter()
                .flat_map(|[a, b, c]| {
                    let ab = ((a + b) / 2.0).normalize();
                    let bc = ((b + c) / 2.0).normalize();
                    let ca = ((c + a) / 2.0).normalize();
                    [[a, ab, ca], [ab, b, bc], [ca, bc, c], [ab, bc, ca]]
                })
                .collect();
        }
        Self::convex(tris)
    }

    /// Six-point heart outline extruded along Z by `depth`, centered on Z.
    pub fn heart(depth: f32) -> Self {
        // Counter-clockwise, seen from +Z. Star-shaped around the tip at index 0.
        let outline = [
            Vec2::new(0.0, -0.4),
            Vec2::new(0.6, 0.2),
            Vec2::new(0.4, 0.6),
            Vec2::new(0.0, 0.25),
            Vec2::new(-0.4, 0.6),
            Vec2::new(-0.6, 0.2),
        ];
        let front = depth / 2.0;
        let back = -depth / 2.0;
        let at = |p: Vec2, z: f32| Vec3::new(p.x, p.y, z);

        let mut tris = Vec::new();
        for i in 1..outline.len() - 1 {
            let (a, b, c) = (outline[0], outline[i], outline[i + 1]);
            tris.push([at(a, front), at(b, front), at(c, front)]);
            tris.push([at(a, back), at(c, back), at(b, back)]);
        }
        for i in 0..outline.len() {
            let a = outline[i];
            let b = outline[(i + 1) % outline.len()];
            tris.push([at(a, back), at(b, back), at(b, front)]);
            tris.push([at(a, back), at(b, front), at(a, front)]);
        }
        Self::from_triangles(&tris)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normals_are_unit(mesh: &Mesh) {
        for v in &mesh.vertices {
            let n = Vec3::from_array(v.normal);
            assert!((n.length() - 1.0).abs() < 1e-4, "normal {n:?}");
        }
    }

    fn faces_point_outward(mesh: &Mesh) {
        for tri in mesh.vertices.chunks(3) {
            let centroid = tri
                .iter()
                .map(|v| Vec3::from_array(v.position))
                .sum::<Vec3>()
                / 3.0;
            assert!(Vec3::from_array(tri[0].normal).dot(centroid) > 0.0);
        }
    }

    #[test]
    fn test_vertex_counts() {
        assert_eq!(Mesh::tetrahedron().vertex_count(), 12);
        assert_eq!(Mesh::cube().vertex_count(), 36);
        assert_eq!(Mesh::icosahedron(0).vertex_count(), 60);
        assert_eq!(Mesh::icosahedron(1).vertex_count(), 240);
        assert_eq!(Mesh::heart(0.45).vertex_count(), 60);
    }

    #[test]
    fn test_convex_solids_are_outward() {
        for mesh in [
            Mesh::tetrahedron(),
            Mesh::cube(),
            Mesh::icosahedron(0),
            Mesh::icosahedron(1),
        ] {
            normals_are_unit(&mesh);
            faces_point_outward(&mesh);
        }
    }

    #[test]
    fn test_icosahedron_on_unit_sphere() {
        for v in Mesh::icosahedron(1).vertices {
            assert!((Vec3::from_array(v.position).length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_heart_caps_face_out() {
        let heart = Mesh::heart(0.45);
        normals_are_unit(&heart);
        for tri in heart.vertices.chunks(3) {
            let z = tri[0].position[2];
            let n = Vec3::from_array(tri[0].normal);
            let flat_cap = tri.iter().all(|v| v.position[2] == z);
            if flat_cap {
                assert_eq!(n.z.signum(), z.signum());
            } else {
                assert!(n.z.abs() < 1e-5);
            }
        }
    }
}
