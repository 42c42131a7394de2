// src/terrain/mesh_builder.rs
use glam::{Vec2, Vec3};

/// Finished, index-aligned mesh buffers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshGeometry {
    pub vertices: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,
}

impl MeshGeometry {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Append-only mesh accumulator with a fixed capacity.
///
/// Capacities are exact: writing past them is a bug in the caller and panics.
/// Indices may reference vertices that are added later, as long as every
/// index is valid by the time [`MeshBuilder::build`] runs.
#[derive(Debug)]
pub struct MeshBuilder {
    vertices: Vec<Vec3>,
    uvs: Vec<Vec2>,
    indices: Vec<u32>,
    vertex_capacity: usize,
    triangle_capacity: usize,
}

impl MeshBuilder {
    pub fn new(vertex_count: usize, triangle_count: usize) -> Self {
        MeshBuilder {
            vertices: Vec::with_capacity(vertex_count),
            uvs: Vec::with_capacity(vertex_count),
            indices: Vec::with_capacity(triangle_count * 3),
            vertex_capacity: vertex_count,
            triangle_capacity: triangle_count,
        }
    }

    pub fn add_vertex(&mut self, vertex: Vec3) {
        assert!(
            self.vertices.len() < self.vertex_capacity,
            "mesh builder vertex capacity {} exceeded",
            self.vertex_capacity
        );
        self.vertices.push(vertex);
    }

    pub fn add_uv(&mut self, uv: Vec2) {
        assert!(
            self.uvs.len() < self.vertex_capacity,
            "mesh builder uv capacity {} exceeded",
            self.vertex_capacity
        );
        self.uvs.push(uv);
    }

    pub fn add_vertex_with_uv(&mut self, vertex: Vec3, uv: Vec2) {
        self.add_vertex(vertex);
        self.add_uv(uv);
    }

    pub fn add_triangle(&mut self, a: u32, b: u32, c: u32) {
        assert!(
            self.indices.len() < self.triangle_capacity * 3,
            "mesh builder triangle capacity {} exceeded",
            self.triangle_capacity
        );
        self.indices.extend_from_slice(&[a, b, c]);
    }

    // Splits along the a-d diagonal; this order keeps the faces pointing up
    pub fn add_quad(&mut self, a: u32, b: u32, c: u32, d: u32) {
        self.add_triangle(a, d, c);
        self.add_triangle(d, a, b);
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn build(self) -> MeshGeometry {
        assert_eq!(
            self.vertices.len(),
            self.uvs.len(),
            "every vertex needs exactly one uv"
        );
        let vertex_count = self.vertices.len();
        if let Some(bad) = self.indices.iter().find(|&&i| i as usize >= vertex_count) {
            panic!("triangle index {} out of range for {} vertices", bad, vertex_count);
        }

        let normals = compute_normals(&self.vertices, &self.indices);
        MeshGeometry {
            vertices: self.vertices,
            normals,
            uvs: self.uvs,
            indices: self.indices,
        }
    }
}

// Area-weighted average of the face normals touching each vertex.
// Vertices that are not shared end up with their face's flat normal.
fn compute_normals(vertices: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; vertices.len()];
    for tri in indices.chunks_exact(3) {
        let (ia, ib, ic) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        let a = vertices[ia];
        let face = (vertices[ib] - a).cross(vertices[ic] - a);
        normals[ia] += face;
        normals[ib] += face;
        normals[ic] += face;
    }
    normals.iter().map(|n| n.normalize_or_zero()).collect()
}
