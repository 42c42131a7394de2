// src/error.rs
use std::io;

/// Errors surfaced by configuration loading and background chunk builds.
///
/// Contract violations (out-of-range height lookups, mesh builder overruns,
/// unsupported LOD levels) are not represented here; those panic.
#[derive(thiserror::Error, Debug)]
pub enum TerrainError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse TOML config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Failed to serialize TOML config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Cannot save configuration: no config path set")]
    MissingConfigPath,

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Map generation failed: {0}")]
    Generation(String),

    #[error("Chunk build panicked: {0}")]
    BuildPanicked(String),
}

impl TerrainError {
    pub fn generation<T: ToString>(msg: T) -> Self {
        TerrainError::Generation(msg.to_string())
    }
}

pub type TerrainResult<T> = Result<T, TerrainError>;
