// src/terrain/noise/noise_utils.rs
use noise::{Constant, Fbm, MultiFractal, NoiseFn, Perlin};

use crate::terrain::noise::noise_parameters::NoiseParameters;

// Build the fractal noise function described by `params`.
// Zero octaves produce a flat field, matching a Perlin module with no octaves.
pub fn create_noise_function_from_params(
    params: &NoiseParameters,
) -> Box<dyn NoiseFn<f64, 2> + Send + Sync> {
    if params.octave_count <= 0 {
        return Box::new(Constant::new(0.0));
    }

    Box::new(
        Fbm::<Perlin>::new(params.seed as u32)
            .set_octaves(params.octave_count as usize)
            .set_frequency(params.frequency)
            .set_lacunarity(params.lacunarity)
            .set_persistence(params.persistence),
    )
}

// Fixed-range rescale of a raw sample into [0, 1].
// Independent of the other samples in the chunk, so neighbouring chunks agree on shared edges.
pub fn normalize_sample(value: f64) -> f32 {
    ((value + 1.0) * 0.5).clamp(0.0, 1.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_octaves_is_flat() {
        let params = NoiseParameters { octave_count: 0, ..NoiseParameters::default() };
        let noise = create_noise_function_from_params(&params);
        assert_eq!(noise.get([0.3, 0.7]), 0.0);
        assert_eq!(noise.get([12.5, -4.0]), 0.0);
    }

    #[test]
    fn same_seed_same_values() {
        let params = NoiseParameters { seed: 1234, ..NoiseParameters::default() };
        let a = create_noise_function_from_params(&params);
        let b = create_noise_function_from_params(&params);
        for point in [[0.1, 0.2], [3.7, -1.25], [-8.0, 0.5]] {
            assert_eq!(a.get(point).to_bits(), b.get(point).to_bits());
        }
    }

    #[test]
    fn normalize_maps_unit_range() {
        assert_eq!(normalize_sample(-1.0), 0.0);
        assert_eq!(normalize_sample(0.0), 0.5);
        assert_eq!(normalize_sample(1.0), 1.0);
        assert_eq!(normalize_sample(3.0), 1.0);
        assert_eq!(normalize_sample(-2.0), 0.0);
    }
}
