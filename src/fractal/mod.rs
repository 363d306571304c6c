/// Procedural Noise
///
/// Perlin gradient noise and the fractal sum built on it. The host-side
/// evaluator and the WGSL helpers share one permutation table, so CPU and
/// GPU produce the same fields.

pub mod gradient;
pub mod kernels;
pub mod params;

pub use gradient::{GradientNoise, PERMUTATION_SIZE};
pub use params::{FractalNoiseParams, FractalUniforms};

use glam::Vec3;

/// Added to every octave's sample position. Gradient noise is zero on
/// integer lattice points, so unshifted lattice-aligned samples would all
/// vanish.
pub const LATTICE_JITTER: Vec3 = Vec3::splat(0.5);
