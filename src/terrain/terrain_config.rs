// src/terrain/terrain_config.rs
use glam::Vec2;
use serde::{Deserialize, Serialize};

// Samples per chunk edge. 97 - 1 = 96 is divisible by every LOD step below.
pub const CHUNK_RESOLUTION: usize = 97;
pub const LEVELS_OF_DETAIL: usize = 5;

// World units covered by one chunk edge (resolution - 1 spacing steps)
pub const CHUNK_WORLD_SIZE: f32 = (CHUNK_RESOLUTION - 1) as f32;

pub const DEFAULT_MAX_VIEW_DISTANCE: f32 = 600.0;

/// Decimation step for a level of detail: 1 for LOD 0, `2 * lod` otherwise.
///
/// Panics when `lod` is outside `0..LEVELS_OF_DETAIL`.
pub fn lod_step(lod: usize) -> usize {
    assert!(
        lod < LEVELS_OF_DETAIL,
        "level of detail {} out of range 0..{}",
        lod,
        LEVELS_OF_DETAIL
    );
    (lod * 2).max(1)
}

// Samples visited along one edge of a `size`-sample height field
pub fn vertices_per_line(size: usize, lod: usize) -> usize {
    (size - 1) / lod_step(lod) + 1
}

// Quad cells emitted for a `width` x `height` height field
pub fn cell_count(width: usize, height: usize, lod: usize) -> usize {
    let step = lod_step(lod);
    ((width - 1) / step) * ((height - 1) / step)
}

// Unique identifier for a chunk based on its grid cell.
// `y` runs along the world Z axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkPosition {
    pub x: i32,
    pub y: i32,
}

impl ChunkPosition {
    pub const fn new(x: i32, y: i32) -> Self {
        ChunkPosition { x, y }
    }

    // Chunk containing a ground-plane (x, z) position
    pub fn from_world(position: Vec2) -> Self {
        ChunkPosition {
            x: (position.x / CHUNK_WORLD_SIZE).round() as i32,
            y: (position.y / CHUNK_WORLD_SIZE).round() as i32,
        }
    }

    // Centre of the chunk on the ground plane
    pub fn world_origin(&self) -> Vec2 {
        Vec2::new(self.x as f32, self.y as f32) * CHUNK_WORLD_SIZE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeshStyle {
    // Duplicated vertices per triangle, faceted low-poly look
    #[default]
    Flat,
    // One vertex per sample, smooth normals
    Shared,
}

/// Runtime settings for the chunk streamer (`[streaming]` in the config file).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamingSettings {
    #[serde(default = "default_max_view_distance")]
    pub max_view_distance: f32,
    // 0 picks a default from the CPU count
    #[serde(default)]
    pub worker_threads: usize,
    #[serde(default)]
    pub mesh_style: MeshStyle,
}

fn default_max_view_distance() -> f32 {
    DEFAULT_MAX_VIEW_DISTANCE
}

impl Default for StreamingSettings {
    fn default() -> Self {
        StreamingSettings {
            max_view_distance: DEFAULT_MAX_VIEW_DISTANCE,
            worker_threads: 0,
            mesh_style: MeshStyle::Flat,
        }
    }
}

impl StreamingSettings {
    // Leave one core for the control thread, but use at least one worker
    pub fn resolved_worker_threads(&self) -> usize {
        if self.worker_threads > 0 {
            self.worker_threads
        } else {
            std::cmp::max(1, num_cpus::get().saturating_sub(1))
        }
    }

    // A view distance below one chunk would never show anything but the viewer's own chunk
    pub fn sanitized(mut self) -> Self {
        if !self.max_view_distance.is_finite() || self.max_view_distance < 1.0 {
            self.max_view_distance = 1.0;
        }
        self
    }

    // Number of chunks scanned in each direction around the viewer's chunk
    pub fn max_chunks_visible(&self) -> i32 {
        (self.max_view_distance / CHUNK_WORLD_SIZE).round() as i32
    }
}
