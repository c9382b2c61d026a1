//! Unit icosphere built by subdividing each icosahedron face.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Vertex data for the sphere mesh (position + outward normal)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct SphereVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// Icosahedron corners (unnormalized, golden ratio layout)
fn icosahedron_vertices() -> [Vec3; 12] {
    let t = (1.0 + 5f32.sqrt()) / 2.0;
    [
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
}

/// Icosahedron faces, counter-clockwise seen from outside
const ICOSAHEDRON_FACES: [[usize; 3]; 20] = [
    [0, 11, 5],
    [0, 5, 1],
    [0, 1, 7],
    [0, 7, 10],
    [0, 10, 11],
    [1, 5, 9],
    [5, 11, 4],
    [11, 10, 2],
    [10, 7, 6],
    [7, 1, 8],
    [3, 9, 4],
    [3, 4, 2],
    [3, 2, 6],
    [3, 6, 8],
    [3, 8, 9],
    [4, 9, 5],
    [2, 4, 11],
    [6, 2, 10],
    [8, 6, 7],
    [9, 8, 1],
];

/// Subdivided unit sphere
pub struct SphereMesh {
    pub vertices: Vec<SphereVertex>,
    pub indices: Vec<u32>,
}

impl SphereMesh {
    /// Build an icosphere; each face edge is split into `detail + 1` segments
    pub fn new(detail: u32) -> Self {
        let segments = detail as usize + 1;
        let per_face = (segments + 1) * (segments + 2) / 2;
        let corners = icosahedron_vertices();

        let mut vertices = Vec::with_capacity(per_face * ICOSAHEDRON_FACES.len());
        let mut indices = Vec::with_capacity(segments * segments * 3 * ICOSAHEDRON_FACES.len());

        for face in ICOSAHEDRON_FACES {
            let [a, b, c] = face.map(|i| corners[i]);
            let base = vertices.len() as u32;

            // Barycentric grid: row i walks toward b, column j toward c
            for i in 0..=segments {
                for j in 0..=segments - i {
                    let u = i as f32 / segments as f32;
                    let v = j as f32 / segments as f32;
                    let p = (a + (b - a) * u + (c - a) * v).normalize();
                    vertices.push(SphereVertex {
                        position: p.to_array(),
                        normal: p.to_array(),
                    });
                }
            }

            let at = |i: usize, j: usize| base + grid_index(segments, i, j) as u32;
            for i in 0..segments {
                for j in 0..segments - i {
                    indices.extend_from_slice(&[at(i, j), at(i + 1, j), at(i, j + 1)]);
                    if j + 1 < segments - i {
                        indices.extend_from_slice(&[at(i + 1, j), at(i + 1, j + 1), at(i, j + 1)]);
                    }
                }
            }
        }

        Self { vertices, indices }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Offset of (row, column) in a triangular grid with `segments` steps per edge
fn grid_index(segments: usize, row: usize, column: usize) -> usize {
    row * (segments + 1) - row * row.saturating_sub(1) / 2 + column
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_icosahedron_at_detail_zero() {
        let mesh = SphereMesh::new(0);
        assert_eq!(mesh.vertices.len(), 20 * 3);
        assert_eq!(mesh.triangle_count(), 20);
    }

    #[test]
    fn test_counts() {
        let detail = 8;
        let segments = detail as usize + 1;
        let mesh = SphereMesh::new(detail);

        assert_eq!(
            mesh.vertices.len(),
            20 * (segments + 1) * (segments + 2) / 2
        );
        // Each face splits into segments^2 triangles
        assert_eq!(mesh.triangle_count(), 20 * segments * segments);
    }

    #[test]
    fn test_vertices_on_unit_sphere() {
        let mesh = SphereMesh::new(6);
        for vertex in &mesh.vertices {
            let p = Vec3::from_array(vertex.position);
            assert!((p.length() - 1.0).abs() < 1e-5);
            assert_eq!(vertex.position, vertex.normal);
        }
    }

    #[test]
    fn test_indices_in_range_and_outward() {
        let mesh = SphereMesh::new(4);
        let count = mesh.vertices.len() as u32;
        assert!(mesh.indices.iter().all(|&i| i < count));

        // Counter-clockwise from outside: face normal points away from the centre
        for tri in mesh.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]]
                .map(|i| Vec3::from_array(mesh.vertices[i as usize].position));
            let normal = (b - a).cross(c - a);
            assert!(normal.dot(a + b + c) > 0.0);
        }
    }

    #[test]
    fn test_grid_index_rows() {
        // segments = 3: rows hold 4, 3, 2, 1 vertices
        assert_eq!(grid_index(3, 0, 0), 0);
        assert_eq!(grid_index(3, 1, 0), 4);
        assert_eq!(grid_index(3, 2, 0), 7);
        assert_eq!(grid_index(3, 3, 0), 9);
    }
}
