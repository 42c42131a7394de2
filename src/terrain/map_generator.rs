// src/terrain/map_generator.rs
use std::sync::Arc;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::TerrainResult;
use crate::terrain::color::{ChunkTexture, ColorBuffer, ColorGradient};
use crate::terrain::height_map::{HeightCurve, HeightMap};
use crate::terrain::mesh_builder::MeshGeometry;
use crate::terrain::noise::{NoiseField, NoiseParameters, NoiseRegion};
use crate::terrain::terrain_config::{CHUNK_RESOLUTION, ChunkPosition, MeshStyle};
use crate::terrain::terrain_mesh_generator::generate_mesh;

const MIN_NOISE_SCALE: f32 = 1e-3;

/// Everything needed to turn a chunk coordinate into a [`Map`]
/// (`[generation]` in the config file).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    #[serde(default)]
    pub noise: NoiseParameters,
    #[serde(default)]
    pub noise_shift: [f32; 2],
    #[serde(default = "default_noise_scale")]
    pub noise_scale: [f32; 2],
    #[serde(default)]
    pub height_curve: HeightCurve,
    #[serde(default = "default_height_multiplier")]
    pub height_multiplier: f32,
    #[serde(default)]
    pub color_gradient: ColorGradient,
}

fn default_noise_scale() -> [f32; 2] {
    [1.0, 1.0]
}

fn default_height_multiplier() -> f32 {
    10.0
}

impl Default for GenerationSettings {
    fn default() -> Self {
        GenerationSettings {
            noise: NoiseParameters::default(),
            noise_shift: [0.0, 0.0],
            noise_scale: default_noise_scale(),
            height_curve: HeightCurve::default(),
            height_multiplier: default_height_multiplier(),
            color_gradient: ColorGradient::default(),
        }
    }
}

impl GenerationSettings {
    pub fn sanitized(mut self) -> Self {
        self.noise = self.noise.sanitized();
        for scale in self.noise_scale.iter_mut() {
            if !(*scale >= MIN_NOISE_SCALE) {
                *scale = MIN_NOISE_SCALE;
            }
        }
        for shift in self.noise_shift.iter_mut() {
            if !shift.is_finite() {
                *shift = 0.0;
            }
        }
        if !self.height_multiplier.is_finite() {
            self.height_multiplier = default_height_multiplier();
        }
        self.height_curve = self.height_curve.sanitized();
        self.color_gradient = self.color_gradient.sanitized();
        self
    }

    pub fn seed(&self) -> i32 {
        self.noise.seed
    }

    pub fn reseed<R: Rng + ?Sized>(&mut self, rng: &mut R) -> i32 {
        self.noise.reseed(rng)
    }
}

/// Immutable result of one generation call.
#[derive(Debug, Clone)]
pub struct Map {
    pub height_map: HeightMap,
    pub color_map: ColorBuffer,
}

impl Map {
    pub fn texture(&self) -> ChunkTexture {
        ChunkTexture::new(self.height_map.width(), self.height_map.height(), self.color_map.clone())
    }
}

/// Source of chunk maps used by background builds.
pub trait MapSource: Send + Sync {
    fn generate_map(&self, position: ChunkPosition) -> TerrainResult<Map>;
}

/// Mesh plus colour data for one chunk at one level of detail.
#[derive(Debug, Clone)]
pub struct ChunkMesh {
    pub lod: usize,
    pub geometry: MeshGeometry,
    pub texture: ChunkTexture,
}

// Full build pipeline for a chunk; runs on worker threads
pub fn build_chunk_mesh(
    source: &dyn MapSource,
    position: ChunkPosition,
    lod: usize,
    style: MeshStyle,
) -> TerrainResult<ChunkMesh> {
    let map = source.generate_map(position)?;
    let geometry = generate_mesh(&map.height_map, lod, style);
    Ok(ChunkMesh { lod, geometry, texture: map.texture() })
}

#[derive(Debug, Clone, Default)]
pub struct MapGenerator {
    settings: GenerationSettings,
}

impl MapGenerator {
    pub fn new(settings: GenerationSettings) -> Self {
        MapGenerator { settings: settings.sanitized() }
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    pub fn seed(&self) -> i32 {
        self.settings.seed()
    }

    // Already-built chunks keep the terrain of the seed they were built with
    pub fn new_seed(&mut self) -> i32 {
        self.settings.reseed(&mut rand::rng())
    }

    pub fn new_seed_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> i32 {
        self.settings.reseed(rng)
    }

    pub fn generate(&self, position: ChunkPosition) -> Map {
        debug!(
            "Generating map for chunk [{}, {}], seed: {}",
            position.x, position.y, self.settings.noise.seed
        );
        let settings = &self.settings;
        let field = NoiseField::new(&settings.noise);
        let region = NoiseRegion::for_chunk(
            position,
            Vec2::from(settings.noise_shift),
            Vec2::from(settings.noise_scale),
        );
        let grid = Arc::new(field.sample_normalized(&region, CHUNK_RESOLUTION, CHUNK_RESOLUTION));

        let color_map = grid
            .values()
            .iter()
            .map(|&h| settings.color_gradient.evaluate(h))
            .collect();
        let height_map = HeightMap::new(grid, settings.height_curve.clone(), settings.height_multiplier);

        Map { height_map, color_map }
    }

    // Synchronous build of the origin chunk, for previews outside the streamer
    pub fn preview(&self, lod: usize, style: MeshStyle) -> ChunkMesh {
        let map = self.generate(ChunkPosition::new(0, 0));
        let geometry = generate_mesh(&map.height_map, lod, style);
        ChunkMesh { lod, geometry, texture: map.texture() }
    }
}

impl MapSource for MapGenerator {
    fn generate_map(&self, position: ChunkPosition) -> TerrainResult<Map> {
        Ok(self.generate(position))
    }
}
