//! Trilinear lookups into the host SDF mirror

use glam::Vec3;

use crate::field::trilinear_with;

/// Lattice position of a normalized coordinate
#[inline]
fn lattice_position(resolution: [u32; 3], uv: Vec3) -> Vec3 {
    uv * Vec3::new(
        resolution[0].saturating_sub(1) as f32,
        resolution[1].saturating_sub(1) as f32,
        resolution[2].saturating_sub(1) as f32,
    )
}

/// Distance at normalized coordinate `uv`; lattice points return the stored value
pub fn sample_distance(field: &[f32], resolution: [u32; 3], uv: Vec3) -> f32 {
    trilinear_with(resolution, lattice_position(resolution, uv), |i| field[i])
}

/// Gradient at normalized coordinate `uv`
pub fn sample_gradient(field: &[Vec3], resolution: [u32; 3], uv: Vec3) -> Vec3 {
    trilinear_with(resolution, lattice_position(resolution, uv), |i| field[i])
}
