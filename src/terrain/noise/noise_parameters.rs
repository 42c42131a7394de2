// src/terrain/noise/noise_parameters.rs
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const MIN_FREQUENCY: f64 = 1e-4;

/// Fractal Perlin settings for one generation call.
///
/// Values coming from configuration go through [`NoiseParameters::sanitized`]
/// before use; out-of-range input is clamped rather than rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseParameters {
    #[serde(default = "default_octave_count")]
    pub octave_count: i32,
    #[serde(default = "default_frequency")]
    pub frequency: f64,
    #[serde(default = "default_lacunarity")]
    pub lacunarity: f64,
    #[serde(default = "default_persistence")]
    pub persistence: f64,
    #[serde(default)]
    pub seed: i32,
}

fn default_octave_count() -> i32 { 6 }
fn default_frequency() -> f64 { 1.0 }
fn default_lacunarity() -> f64 { 2.0 }
fn default_persistence() -> f64 { 0.5 }

impl Default for NoiseParameters {
    fn default() -> Self {
        NoiseParameters {
            octave_count: default_octave_count(),
            frequency: default_frequency(),
            lacunarity: default_lacunarity(),
            persistence: default_persistence(),
            seed: 0,
        }
    }
}

impl NoiseParameters {
    pub fn sanitized(mut self) -> Self {
        self.octave_count = self.octave_count.max(0);
        if !(self.frequency > MIN_FREQUENCY) {
            self.frequency = MIN_FREQUENCY;
        }
        if !(self.lacunarity >= 1.0) {
            self.lacunarity = 1.0;
        }
        self.persistence = if self.persistence.is_nan() {
            default_persistence()
        } else {
            self.persistence.clamp(0.0, 1.0)
        };
        self
    }

    // Roll a fresh seed; only affects maps generated afterwards
    pub fn reseed<R: Rng + ?Sized>(&mut self, rng: &mut R) -> i32 {
        self.seed = rng.random::<i32>();
        self.seed
    }
}
