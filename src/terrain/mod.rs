// Export all components from the terrain module
pub mod terrain_config;
pub mod noise;
pub mod height_map;
pub mod color;
pub mod mesh_builder;
pub mod terrain_mesh_generator;
pub mod map_generator;
pub mod chunk_manager;

// Re-export main types for easier access
pub use terrain_config::{CHUNK_RESOLUTION, CHUNK_WORLD_SIZE, ChunkPosition, LEVELS_OF_DETAIL, MeshStyle, StreamingSettings};
pub use height_map::{CurveKey, HeightCurve, HeightGrid, HeightMap};
pub use color::{ChunkTexture, Color, ColorBuffer, ColorGradient, GradientKey};
pub use mesh_builder::{MeshBuilder, MeshGeometry};
pub use map_generator::{ChunkMesh, GenerationSettings, Map, MapGenerator, MapSource};
pub use chunk_manager::{ChunkGrid, ChunkRenderer, NullRenderer, RequestOutcome, TerrainChunk};
