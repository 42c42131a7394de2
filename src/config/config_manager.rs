// src/config/config_manager.rs
use std::fs;
use std::path::{Path, PathBuf};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{TerrainError, TerrainResult};
use crate::terrain::map_generator::{GenerationSettings, MapGenerator};
use crate::terrain::terrain_config::StreamingSettings;

/// Contents of the terrain TOML file.
///
/// ```toml
/// [generation]
/// height_multiplier = 10.0
///
/// [generation.noise]
/// octave_count = 6
/// seed = 1234
///
/// [streaming]
/// max_view_distance = 600.0
/// mesh_style = "flat"
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TerrainConfiguration {
    #[serde(default)]
    pub generation: GenerationSettings,
    #[serde(default)]
    pub streaming: StreamingSettings,
}

impl TerrainConfiguration {
    // Clamp everything into range instead of rejecting the file
    pub fn sanitized(self) -> Self {
        TerrainConfiguration {
            generation: self.generation.sanitized(),
            streaming: self.streaming.sanitized(),
        }
    }
}

// Holds the active configuration and where it came from
pub struct ConfigurationManager {
    current_config: TerrainConfiguration,
    config_path: Option<PathBuf>,
}

impl Default for ConfigurationManager {
    fn default() -> Self {
        Self::with_config(TerrainConfiguration::default(), None)
    }
}

impl ConfigurationManager {
    pub fn with_config(config: TerrainConfiguration, config_path: Option<PathBuf>) -> Self {
        Self {
            current_config: config.sanitized(),
            config_path,
        }
    }

    pub fn load_from_str(contents: &str) -> TerrainResult<Self> {
        let config: TerrainConfiguration = toml::from_str(contents)?;
        Ok(Self::with_config(config, None))
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> TerrainResult<Self> {
        let path_ref = path.as_ref();
        info!("Loading terrain config from: {:?}", path_ref);
        let config_str = fs::read_to_string(path_ref)?;
        let mut manager = Self::load_from_str(&config_str)?;
        manager.config_path = Some(path_ref.to_path_buf());
        Ok(manager)
    }

    // Fall back to defaults when the file is missing or broken
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path_ref = path.as_ref();
        match Self::load_from_file(path_ref) {
            Ok(manager) => manager,
            Err(e) => {
                warn!(
                    "Failed to load terrain config from {:?}: {}. Using default configuration.",
                    path_ref, e
                );
                let mut manager = Self::default();
                manager.config_path = Some(path_ref.to_path_buf());
                manager
            }
        }
    }

    pub fn save_to_file(&self) -> TerrainResult<()> {
        let path = self.config_path.as_ref().ok_or(TerrainError::MissingConfigPath)?;
        info!("Saving terrain config to: {:?}", path);
        let toml_string = toml::to_string_pretty(&self.current_config)?;
        fs::write(path, toml_string)?;
        Ok(())
    }

    pub fn set_config_path<P: AsRef<Path>>(&mut self, path: P) {
        self.config_path = Some(path.as_ref().to_path_buf());
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    pub fn update_config(&mut self, updates: TerrainConfiguration) {
        self.current_config = updates.sanitized();
    }

    pub fn get_config(&self) -> &TerrainConfiguration {
        &self.current_config
    }

    // Re-roll the generation seed. Maps generated before keep their terrain.
    pub fn new_seed<R: Rng + ?Sized>(&mut self, rng: &mut R) -> i32 {
        self.current_config.generation.reseed(rng)
    }

    // Snapshot of the generation settings for the chunk builders
    pub fn map_generator(&self) -> MapGenerator {
        MapGenerator::new(self.current_config.generation.clone())
    }
}
