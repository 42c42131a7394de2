//! Procedural terrain generation with level-of-detail chunk streaming.
//!
//! Height fields come from seeded fractal noise ([`terrain::noise`]), are shaped
//! by a response curve ([`terrain::HeightMap`]) and tessellated into meshes
//! ([`terrain::terrain_mesh_generator`]). [`terrain::ChunkGrid`] keeps the chunks
//! around a moving viewer built at a distance-dependent level of detail, using a
//! background worker pool.

pub mod config;
pub mod error;
pub mod terrain;
pub mod threading;
pub mod utils;

pub use error::{TerrainError, TerrainResult};
