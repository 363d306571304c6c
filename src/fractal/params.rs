use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::{GradientNoise, LATTICE_JITTER};

/// Fractal (fBm) noise parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FractalNoiseParams {
    /// Base frequency of octave 0
    pub frequency: f32,
    /// Amplitude of octave 0
    pub amplitude: f32,
    /// Frequency multiplier between octaves
    pub lacunarity: f32,
    /// Amplitude multiplier between octaves
    pub gain: f32,
    /// Domain offset added before scaling
    pub offset: Vec3,
    pub octaves: u32,
}

impl Default for FractalNoiseParams {
    fn default() -> Self {
        Self {
            frequency: 3.28,
            amplitude: 0.24,
            lacunarity: 1.6,
            gain: 0.6,
            offset: Vec3::new(2.0, 180.0, 0.0),
            octaves: 8,
        }
    }
}

impl FractalNoiseParams {
    /// Parameters of the tiling noise volume that drives wind and emission
    pub fn noise_volume() -> Self {
        Self {
            frequency: 4.0,
            amplitude: 1.0,
            lacunarity: 2.0,
            gain: 0.5,
            offset: Vec3::ZERO,
            octaves: 4,
        }
    }

    /// Upper bound on |fBm|: the sum of octave amplitudes
    pub fn estimate_max(&self) -> f32 {
        let mut total = 0.0;
        let mut amplitude = self.amplitude;
        for _ in 0..self.octaves {
            total += amplitude;
            amplitude *= self.gain;
        }
        total
    }

    /// Clamp every parameter into its editable range
    pub fn clamped(self) -> Self {
        Self {
            frequency: self.frequency.clamp(0.01, 5.0),
            amplitude: self.amplitude.clamp(0.1, 10.0),
            lacunarity: self.lacunarity.clamp(1.0, 4.0),
            gain: self.gain.clamp(0.01, 1.0),
            offset: self.offset.clamp(Vec3::splat(-1000.0), Vec3::splat(1000.0)),
            octaves: self.octaves.clamp(1, 20),
        }
    }

    /// Host-side fBm, the same sum the terrain kernel evaluates
    pub fn fbm(&self, noise: &GradientNoise, p: Vec3) -> f32 {
        let mut total = 0.0;
        let mut amplitude = self.amplitude;
        let mut frequency = self.frequency;
        for _ in 0..self.octaves {
            total += amplitude * noise.sample(p * frequency + LATTICE_JITTER);
            amplitude *= self.gain;
            frequency *= self.lacunarity;
        }
        total
    }

    /// fBm that tiles over the unit cube: each octave's frequency is
    /// rounded to a whole lattice period.
    pub fn fbm_periodic(&self, noise: &GradientNoise, uv: Vec3) -> f32 {
        let mut total = 0.0;
        let mut amplitude = self.amplitude;
        let mut frequency = self.frequency;
        for _ in 0..self.octaves {
            let period = (frequency.round() as u32).max(1);
            total += amplitude * noise.sample_periodic(uv * period as f32 + LATTICE_JITTER, period);
            amplitude *= self.gain;
            frequency *= self.lacunarity;
        }
        total
    }

    pub fn uniforms(&self, dims: [u32; 3], periodic: bool) -> FractalUniforms {
        FractalUniforms {
            dims: [dims[0], dims[1], dims[2], 0],
            offset: [self.offset.x, self.offset.y, self.offset.z, 0.0],
            frequency: self.frequency,
            amplitude: self.amplitude,
            lacunarity: self.lacunarity,
            gain: self.gain,
            octaves: self.octaves,
            periodic: periodic as u32,
            _padding: [0; 2],
        }
    }
}

/// GPU layout of the fractal parameters
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct FractalUniforms {
    /// Output grid extent (w unused)
    pub dims: [u32; 4],
    pub offset: [f32; 4],
    pub frequency: f32,
    pub amplitude: f32,
    pub lacunarity: f32,
    pub gain: f32,
    pub octaves: u32,
    /// 1 when octave periods are rounded so the volume tiles
    pub periodic: u32,
    pub _padding: [u32; 2],
}

impl FractalUniforms {
    pub fn params(&self) -> FractalNoiseParams {
        FractalNoiseParams {
            frequency: self.frequency,
            amplitude: self.amplitude,
            lacunarity: self.lacunarity,
            gain: self.gain,
            offset: Vec3::new(self.offset[0], self.offset[1], self.offset[2]),
            octaves: self.octaves,
        }
    }

    pub fn dims(&self) -> [u32; 3] {
        [self.dims[0], self.dims[1], self.dims[2]]
    }
}
