// src/terrain/noise/noise_field.rs
use glam::Vec2;
use noise::NoiseFn;

use crate::terrain::terrain_config::ChunkPosition;
use crate::terrain::height_map::HeightGrid;
use crate::terrain::noise::noise_parameters::NoiseParameters;
use crate::terrain::noise::noise_utils::{create_noise_function_from_params, normalize_sample};

/// Rectangle in noise space, endpoints inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseRegion {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl NoiseRegion {
    /// Window sampled for one chunk.
    ///
    /// Each chunk covers one noise unit per `noise_scale`, centred on its
    /// (shifted) coordinate. Grid `y` grows north while noise `y` grows with
    /// the sample row (southwards), hence the flipped sign. With inclusive
    /// endpoints the last column of chunk `x` and the first column of chunk
    /// `x + 1` land on the same noise coordinate.
    pub fn for_chunk(position: ChunkPosition, noise_shift: Vec2, noise_scale: Vec2) -> Self {
        let scale_x = noise_scale.x as f64;
        let scale_y = noise_scale.y as f64;
        let half_x = 0.5 / scale_x;
        let half_y = 0.5 / scale_y;
        let centre_x = (position.x as f64 + noise_shift.x as f64) / scale_x;
        let centre_y = (-position.y as f64 + noise_shift.y as f64) / scale_y;

        NoiseRegion {
            x_min: centre_x - half_x,
            x_max: centre_x + half_x,
            y_min: centre_y - half_y,
            y_max: centre_y + half_y,
        }
    }

    // Noise-space coordinate of pixel `i` out of `count` along each axis
    fn lerp_x(&self, i: usize, count: usize) -> f64 {
        lerp_inclusive(self.x_min, self.x_max, i, count)
    }

    fn lerp_y(&self, i: usize, count: usize) -> f64 {
        lerp_inclusive(self.y_min, self.y_max, i, count)
    }
}

fn lerp_inclusive(min: f64, max: f64, i: usize, count: usize) -> f64 {
    if count <= 1 {
        return min;
    }
    min + (max - min) * (i as f64 / (count - 1) as f64)
}

/// Seeded fractal noise sampled over rectangular regions.
pub struct NoiseField {
    params: NoiseParameters,
    function: Box<dyn NoiseFn<f64, 2> + Send + Sync>,
}

impl NoiseField {
    pub fn new(params: &NoiseParameters) -> Self {
        let params = params.clone().sanitized();
        let function = create_noise_function_from_params(&params);
        NoiseField { params, function }
    }

    pub fn parameters(&self) -> &NoiseParameters {
        &self.params
    }

    // Raw samples, roughly in [-1, 1]
    pub fn sample(&self, region: &NoiseRegion, width: usize, height: usize) -> HeightGrid {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            let ny = region.lerp_y(y, height);
            for x in 0..width {
                let nx = region.lerp_x(x, width);
                data.push(self.function.get([nx, ny]) as f32);
            }
        }
        HeightGrid::from_vec(width, height, data)
    }

    // Samples rescaled into [0, 1]
    pub fn sample_normalized(&self, region: &NoiseRegion, width: usize, height: usize) -> HeightGrid {
        let raw = self.sample(region, width, height);
        let data = raw.values().iter().map(|&v| normalize_sample(v as f64)).collect();
        HeightGrid::from_vec(width, height, data)
    }
}
