// src/terrain/terrain_mesh_generator.rs
use glam::{Vec2, Vec3};

use crate::terrain::height_map::HeightMap;
use crate::terrain::mesh_builder::{MeshBuilder, MeshGeometry};
use crate::terrain::terrain_config::{MeshStyle, lod_step};

// Centre of the mesh sits at the origin, +Z towards row 0
fn top_left(width: usize, height: usize) -> Vec3 {
    Vec3::new((width - 1) as f32 / -2.0, 0.0, (height - 1) as f32 / 2.0)
}

fn uv(x: usize, y: usize, width: usize, height: usize) -> Vec2 {
    Vec2::new(x as f32 / width as f32, y as f32 / height as f32)
}

fn checked_step(height_map: &HeightMap, lod: usize) -> usize {
    let step = lod_step(lod);
    let (width, height) = (height_map.width(), height_map.height());
    assert!(width >= 2 && height >= 2, "height map {}x{} is too small to mesh", width, height);
    assert!(
        (width - 1) % step == 0 && (height - 1) % step == 0,
        "lod step {} does not divide {}x{} height map",
        step,
        width,
        height
    );
    step
}

/// Grid mesh with one vertex per visited sample, shared between neighbouring quads.
pub fn generate_terrain_mesh(height_map: &HeightMap, lod: usize) -> MeshBuilder {
    let step = checked_step(height_map, lod);
    let width = height_map.width();
    let height = height_map.height();
    let origin = top_left(width, height);
    let vertices_per_line = ((width - 1) / step + 1) as u32;
    let cells = ((width - 1) / step) * ((height - 1) / step);
    let mut builder = MeshBuilder::new(width.div_ceil(step) * height.div_ceil(step), cells * 2);

    for y in (0..height).step_by(step) {
        for x in (0..width).step_by(step) {
            builder.add_vertex_with_uv(
                Vec3::new(origin.x + x as f32, height_map.height_at(x, y), origin.z - y as f32),
                uv(x, y, width, height),
            );
            if x < width - 1 && y < height - 1 {
                let index = (builder.vertex_count() - 1) as u32;
                builder.add_quad(
                    index,
                    index + 1,
                    index + vertices_per_line,
                    index + vertices_per_line + 1,
                );
            }
        }
    }

    builder
}

/// Faceted mesh: every triangle owns its three vertices, so no normal is
/// smoothed across a triangle edge. Costs three vertices per triangle.
pub fn generate_flat_terrain_mesh(height_map: &HeightMap, lod: usize) -> MeshBuilder {
    let step = checked_step(height_map, lod);
    let width = height_map.width();
    let height = height_map.height();
    let origin = top_left(width, height);
    let triangle_count = ((width - 1) / step) * ((height - 1) / step) * 2;
    let mut builder = MeshBuilder::new(triangle_count * 3, triangle_count);

    let position = |x: usize, y: usize| {
        Vec3::new(origin.x + x as f32, height_map.height_at(x, y), origin.z - y as f32)
    };

    for y in (0..height - 1).step_by(step) {
        for x in (0..width - 1).step_by(step) {
            //  a---b
            //  |   |
            //  c---d
            let a = position(x, y);
            let b = position(x + step, y);
            let c = position(x, y + step);
            let d = position(x + step, y + step);

            let ua = uv(x, y, width, height);
            let ub = uv(x + step, y, width, height);
            let uc = uv(x, y + step, width, height);
            let ud = uv(x + step, y + step, width, height);

            // Same split and order as MeshBuilder::add_quad: (a, d, c) then (d, a, b)
            for (vertex, tex) in [(a, ua), (d, ud), (c, uc)] {
                builder.add_vertex_with_uv(vertex, tex);
            }
            let last = builder.vertex_count() as u32;
            builder.add_triangle(last - 3, last - 2, last - 1);

            for (vertex, tex) in [(d, ud), (a, ua), (b, ub)] {
                builder.add_vertex_with_uv(vertex, tex);
            }
            let last = builder.vertex_count() as u32;
            builder.add_triangle(last - 3, last - 2, last - 1);
        }
    }

    builder
}

pub fn generate_mesh(height_map: &HeightMap, lod: usize, style: MeshStyle) -> MeshGeometry {
    match style {
        MeshStyle::Flat => generate_flat_terrain_mesh(height_map, lod).build(),
        MeshStyle::Shared => generate_terrain_mesh(height_map, lod).build(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::height_map::{HeightCurve, HeightGrid};
    use crate::terrain::terrain_config::{
        CHUNK_RESOLUTION, LEVELS_OF_DETAIL, cell_count, vertices_per_line,
    };
    use std::sync::Arc;

    fn ramp_map(size: usize) -> HeightMap {
        let data = (0..size * size).map(|i| (i % size) as f32 / (size - 1) as f32).collect();
        HeightMap::new(
            Arc::new(HeightGrid::from_vec(size, size, data)),
            HeightCurve::linear(),
            10.0,
        )
    }

    fn assert_valid(mesh: &MeshGeometry) {
        assert_eq!(mesh.indices.len() % 3, 0);
        assert_eq!(mesh.uvs.len(), mesh.vertices.len());
        assert_eq!(mesh.normals.len(), mesh.vertices.len());
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
    }

    #[test]
    fn every_lod_produces_valid_meshes() {
        let map = ramp_map(CHUNK_RESOLUTION);
        for lod in 0..LEVELS_OF_DETAIL {
            let cells = cell_count(CHUNK_RESOLUTION, CHUNK_RESOLUTION, lod);
            let per_line = vertices_per_line(CHUNK_RESOLUTION, lod);

            let flat = generate_mesh(&map, lod, MeshStyle::Flat);
            assert_valid(&flat);
            assert_eq!(flat.vertex_count(), 6 * cells, "flat lod {}", lod);
            assert_eq!(flat.triangle_count(), 2 * cells, "flat lod {}", lod);

            let shared = generate_mesh(&map, lod, MeshStyle::Shared);
            assert_valid(&shared);
            assert_eq!(shared.vertex_count(), per_line * per_line, "shared lod {}", lod);
            assert_eq!(shared.triangle_count(), 2 * cells, "shared lod {}", lod);
        }
    }

    #[test]
    fn flat_triangle_counts_for_chunk_resolution() {
        let map = ramp_map(CHUNK_RESOLUTION);
        assert_eq!(generate_flat_terrain_mesh(&map, 0).triangle_count(), 18432);
        assert_eq!(generate_flat_terrain_mesh(&map, 4).triangle_count(), 288);
    }

    #[test]
    fn vertices_are_centred_with_height_on_y() {
        let map = ramp_map(5);
        let mesh = generate_mesh(&map, 0, MeshStyle::Shared);

        assert_eq!(mesh.vertices[0], Vec3::new(-2.0, 0.0, 2.0));
        assert_eq!(mesh.vertices[4], Vec3::new(2.0, 10.0, 2.0));
        assert_eq!(mesh.vertices[24], Vec3::new(2.0, 10.0, -2.0));
        assert_eq!(mesh.uvs[6], Vec2::new(0.2, 0.2));
    }

    #[test]
    fn flat_mesh_duplicates_corners() {
        let map = ramp_map(3);
        let mesh = generate_mesh(&map, 1, MeshStyle::Flat);

        // One cell at step 2: a=(0,0) b=(2,0) c=(0,2) d=(2,2)
        let a = Vec3::new(-1.0, map.height_at(0, 0), 1.0);
        let b = Vec3::new(1.0, map.height_at(2, 0), 1.0);
        let c = Vec3::new(-1.0, map.height_at(0, 2), -1.0);
        let d = Vec3::new(1.0, map.height_at(2, 2), -1.0);
        assert_eq!(mesh.vertices, vec![a, d, c, d, a, b]);
        assert_eq!(mesh.indices, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn flat_mesh_normals_are_per_face() {
        let map = ramp_map(9);
        let mesh = generate_mesh(&map, 0, MeshStyle::Flat);
        for tri in mesh.indices.chunks_exact(3) {
            let n = mesh.normals[tri[0] as usize];
            assert_eq!(n, mesh.normals[tri[1] as usize]);
            assert_eq!(n, mesh.normals[tri[2] as usize]);
            assert!(n.y > 0.0);
        }
    }

    #[test]
    #[should_panic(expected = "does not divide")]
    fn uneven_step_is_rejected() {
        generate_terrain_mesh(&ramp_map(6), 1);
    }
}
