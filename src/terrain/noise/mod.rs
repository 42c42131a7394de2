pub mod noise_parameters;
pub mod noise_utils;
pub mod noise_field;

pub use noise_parameters::NoiseParameters;
pub use noise_field::{NoiseField, NoiseRegion};
