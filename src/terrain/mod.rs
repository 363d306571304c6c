/// Terrain Displacement
///
/// Fractal-noise heightfield, normals, and the terrain SDF derived from
/// them. Runs at startup and whenever the displacement parameters change.

pub mod displacement;
pub mod kernels;

pub use displacement::{DisplacementDims, DisplacementGenerator, TerrainSdfUniforms};

#[cfg(test)]
mod tests;
