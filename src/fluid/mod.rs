/// GPU Fluid Dynamics System
///
/// Staggered-grid (MAC) smoke solver. Each step advects velocity, applies
/// vorticity confinement, projects out divergence with a fixed number of
/// Jacobi iterations and advects the density field along the result.
/// Obstacles come from the scene SDF; emission and wind from a tiling
/// noise volume.

pub mod fluid_data;
pub mod fluid_solver;
pub mod kernels;

pub use fluid_data::{FluidParams, FluidUniforms, StaggeredVelocity};
pub use fluid_solver::FluidSolver;

/// Pressure Jacobi iterations per step
pub const PRESSURE_ITERATIONS: u32 = 70;

/// Density diffusion Jacobi iterations per step (when enabled)
pub const DIFFUSION_ITERATIONS: u32 = 20;

/// Auxiliary noise volume extent
pub const NOISE_DIMENSION: u32 = 128;

/// Noise volume scroll along x per second of elapsed time, in normalized units
pub const NOISE_SCROLL_SPEED: f32 = 0.02;

#[cfg(test)]
mod tests;
