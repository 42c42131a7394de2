// src/terrain/color.rs
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    #[serde(default = "opaque")]
    pub a: f32,
}

fn opaque() -> f32 {
    1.0
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Color { r, g, b, a: 1.0 }
    }

    pub fn lerp(self, other: Color, t: f32) -> Color {
        Color {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }

    pub fn to_rgba8(self) -> [u8; 4] {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [channel(self.r), channel(self.g), channel(self.b), channel(self.a)]
    }
}

pub type ColorBuffer = Vec<Color>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientKey {
    pub time: f32,
    pub color: Color,
}

/// Colour ramp keyed by normalized height.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorGradient {
    #[serde(default)]
    keys: Vec<GradientKey>,
}

impl Default for ColorGradient {
    // Water, sand, grass, rock, snow
    fn default() -> Self {
        ColorGradient::new(vec![
            GradientKey { time: 0.0, color: Color::rgb(0.10, 0.20, 0.55) },
            GradientKey { time: 0.35, color: Color::rgb(0.20, 0.40, 0.80) },
            GradientKey { time: 0.40, color: Color::rgb(0.85, 0.80, 0.55) },
            GradientKey { time: 0.55, color: Color::rgb(0.30, 0.60, 0.20) },
            GradientKey { time: 0.75, color: Color::rgb(0.40, 0.32, 0.25) },
            GradientKey { time: 0.90, color: Color::rgb(0.95, 0.95, 0.95) },
        ])
    }
}

impl ColorGradient {
    pub fn new(mut keys: Vec<GradientKey>) -> Self {
        keys.retain(|k| k.time.is_finite());
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        ColorGradient { keys }
    }

    pub fn sanitized(self) -> Self {
        ColorGradient::new(self.keys)
    }

    pub fn evaluate(&self, t: f32) -> Color {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Color::WHITE,
        };
        if t <= first.time {
            return first.color;
        }
        if t >= last.time {
            return last.color;
        }

        let idx = self.keys.partition_point(|k| k.time <= t);
        let a = self.keys[idx - 1];
        let b = self.keys[idx];
        let span = b.time - a.time;
        if span <= 0.0 {
            return b.color;
        }
        a.color.lerp(b.color, (t - a.time) / span)
    }
}

/// Per-pixel colours of one chunk, ready for texture upload.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkTexture {
    pub width: usize,
    pub height: usize,
    pub pixels: ColorBuffer,
}

impl ChunkTexture {
    pub fn new(width: usize, height: usize, pixels: ColorBuffer) -> Self {
        assert_eq!(pixels.len(), width * height, "texture pixel count does not match {}x{}", width, height);
        ChunkTexture { width, height, pixels }
    }

    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|c| c.to_rgba8()).collect()
    }
}
